/*
 * info.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `enquiry info`: formats and input fields as JSON.

use std::path::Path;

use anyhow::Result;

pub async fn execute(config: Option<&Path>, enquiry_id: u32) -> Result<()> {
    let templater = super::templater(config).await?;
    let info = templater.template_info(enquiry_id).await?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
