/*
 * render.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Render command implementation
 */

//! `enquiry render`: generate one report.
//!
//! The request starts from `--request FILE` when given; `--field`,
//! `--filter` and `--user` are layered on top.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use enquiry_core::{OutputFormat, TemplaterRequest};
use enquiry_template::Scalar;
use tracing::{debug, info};

/// Arguments for the render command
#[derive(Debug)]
pub struct RenderArgs {
    pub enquiry_id: u32,
    pub to: String,
    pub request: Option<PathBuf>,
    pub fields: Vec<String>,
    pub filters: Vec<String>,
    pub user: Option<u32>,
    pub output: Option<PathBuf>,
}

pub async fn execute(config: Option<&Path>, args: RenderArgs) -> Result<()> {
    let format: OutputFormat = args.to.parse()?;
    let request = build_request(&args)?;
    debug!(?request, "Render request");

    let templater = super::templater(config).await?;
    let generated = templater
        .generate(args.enquiry_id, format, &request)
        .await
        .with_context(|| format!("Failed to render enquiry {}", args.enquiry_id))?;

    let path = match &args.output {
        Some(output) => {
            std::fs::copy(&generated, output).with_context(|| {
                format!("Failed to write {}", output.display())
            })?;
            std::fs::remove_file(&generated)?;
            output.clone()
        }
        None => generated,
    };
    info!(path = %path.display(), "Rendered enquiry {}", args.enquiry_id);
    println!("{}", path.display());
    Ok(())
}

fn build_request(args: &RenderArgs) -> Result<TemplaterRequest> {
    let mut request = match &args.request {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read request {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid request {}", path.display()))?
        }
        None => TemplaterRequest::default(),
    };

    for field in &args.fields {
        let (key, value) = split_key_value(field)?;
        request.fields.insert(key.to_string(), value.to_string());
    }
    for filter in &args.filters {
        let (column, value) = split_key_value(filter)?;
        request
            .filter_params
            .entry(column.to_string())
            .or_default()
            .push(Scalar::text(value));
    }
    if args.user.is_some() {
        request.user_id = args.user;
    }
    Ok(request)
}

fn split_key_value(arg: &str) -> Result<(&str, &str)> {
    arg.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .with_context(|| format!("Expected KEY=VALUE, got '{arg}'"))
}
