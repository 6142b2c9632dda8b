/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Command implementations for the enquiry CLI
//!
//! Each command builds a templater from the service configuration and
//! delegates to enquiry-core.

use std::path::Path;

use anyhow::{Context, Result};
use enquiry_core::{ServiceConfig, Templater};

pub mod delete_value;
pub mod info;
pub mod render;

/// Load the configuration and wire up the templater.
pub async fn templater(config: Option<&Path>) -> Result<Templater> {
    let config = ServiceConfig::load(config).context("Failed to load configuration")?;
    let catalog = config.catalog.clone();
    Templater::from_config(config)
        .await
        .with_context(|| format!("Failed to set up templater for {}", catalog.display()))
}
