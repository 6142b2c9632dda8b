/*
 * convert.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * PDF conversion through an office suite
 */

//! PDF conversion.
//!
//! [`SofficeConverter`] shells out to LibreOffice:
//!
//! ```text
//! soffice --headless --convert-to pdf --outdir <dir> <file>
//! ```
//!
//! The binary is the configured one, or `soffice` (then `libreoffice`) found
//! on `PATH`.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error};

use crate::config::ConverterConfig;
use crate::error::{EnquiryError, EnquiryResult};

/// Turns a generated document into a PDF.
#[async_trait]
pub trait PdfConverter: Send + Sync {
    /// Convert `source`, writing the PDF into `out_dir`. Returns the PDF path.
    async fn convert(&self, source: &Path, out_dir: &Path) -> EnquiryResult<PathBuf>;
}

#[derive(Debug, Clone)]
pub struct SofficeConverter {
    binary: PathBuf,
    timeout: Duration,
}

impl SofficeConverter {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        let binary = config.binary.clone().unwrap_or_else(find_soffice);
        Self::new(binary, config.timeout())
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

/// Locate the office binary on `PATH`.
///
/// Falls back to the bare name so the spawn error names what was missing.
pub fn find_soffice() -> PathBuf {
    which::which("soffice")
        .or_else(|_| which::which("libreoffice"))
        .unwrap_or_else(|_| PathBuf::from("soffice"))
}

#[async_trait]
impl PdfConverter for SofficeConverter {
    async fn convert(&self, source: &Path, out_dir: &Path) -> EnquiryResult<PathBuf> {
        let stem = source.file_stem().ok_or_else(|| {
            EnquiryError::Conversion(format!("{} has no file name", source.display()))
        })?;
        let target = out_dir.join(stem).with_extension("pdf");

        let child = Command::new(&self.binary)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(out_dir)
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                EnquiryError::Conversion(format!(
                    "failed to start {}: {e}",
                    self.binary.display()
                ))
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                EnquiryError::Conversion(format!(
                    "{} timed out after {}s",
                    source.display(),
                    self.timeout.as_secs()
                ))
            })??;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stdout.trim().is_empty() {
            debug!(source = %source.display(), "{}", stdout.trim());
        }
        if !stderr.trim().is_empty() {
            error!(source = %source.display(), "{}", stderr.trim());
        }

        if !output.status.success() {
            return Err(EnquiryError::Conversion(format!(
                "{} exited with {}",
                self.binary.display(),
                output.status
            )));
        }
        if !target.exists() {
            return Err(EnquiryError::Conversion(format!(
                "{} was not produced",
                target.display()
            )));
        }
        Ok(target)
    }
}
