/*
 * delete_value.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `enquiry delete-field-value`: hide a remembered form field value.

use std::path::Path;

use anyhow::{Result, bail};
use tracing::info;

pub async fn execute(config: Option<&Path>, enquiry_id: u32, value_id: u64) -> Result<()> {
    let templater = super::templater(config).await?;
    if !templater.delete_field_value(enquiry_id, value_id).await? {
        bail!("Field value {value_id} does not belong to enquiry {enquiry_id}");
    }
    info!(enquiry_id, value_id, "Field value deleted");
    Ok(())
}
