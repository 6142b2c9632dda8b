/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Service configuration, read from a YAML file.
//!
//! ```yaml
//! catalog: catalog.yml
//! data-dir: data
//! field-values: state/field_values.json
//! output-dir: out
//! view-schema: cbias_spravki
//! footer:
//!   caption: Справка сформирована
//!   timestamp-format: "%d.%m.%Y %H:%M:%S"
//! converter:
//!   timeout-secs: 120
//! ```
//!
//! Every key is optional. Relative paths are resolved against the directory
//! of the configuration file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use enquiry_data::DEFAULT_VIEW_SCHEMA;
use enquiry_template::FooterStamp;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EnquiryError, EnquiryResult};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "ENQUIRY_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ServiceConfig {
    /// The enquiry catalog.
    pub catalog: PathBuf,
    /// Fixture databases, one JSON file per database.
    pub data_dir: PathBuf,
    /// Where generated reports are written.
    pub output_dir: PathBuf,
    /// JSON file remembering form field values between runs.
    pub field_values: PathBuf,
    pub view_schema: String,
    pub footer: FooterConfig,
    pub converter: ConverterConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            catalog: PathBuf::from("catalog.yml"),
            data_dir: PathBuf::from("data"),
            output_dir: std::env::temp_dir(),
            field_values: PathBuf::from("field_values.json"),
            view_schema: DEFAULT_VIEW_SCHEMA.to_string(),
            footer: FooterConfig::default(),
            converter: ConverterConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FooterConfig {
    pub caption: String,
    pub font: String,
    /// Points.
    pub size: u32,
    /// `chrono` format string.
    pub timestamp_format: String,
}

impl Default for FooterConfig {
    fn default() -> Self {
        Self {
            caption: "Справка сформирована".to_string(),
            font: "Times New Roman".to_string(),
            size: 9,
            timestamp_format: "%d.%m.%Y %H:%M:%S".to_string(),
        }
    }
}

impl FooterConfig {
    /// The stamp for a report generated at `timestamp`.
    pub fn stamp(&self, timestamp: &chrono::DateTime<chrono::Local>) -> FooterStamp {
        FooterStamp::new(
            self.caption.clone(),
            timestamp.format(&self.timestamp_format).to_string(),
        )
        .with_font(self.font.clone(), self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConverterConfig {
    /// The office binary; looked up on `PATH` when unset.
    pub binary: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            binary: None,
            timeout_secs: 120,
        }
    }
}

impl ConverterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ServiceConfig {
    /// Load the configuration from `path`, or from the file named by
    /// [`CONFIG_ENV`]. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> EnquiryResult<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match std::env::var_os(CONFIG_ENV) {
                Some(value) => PathBuf::from(value),
                None => {
                    debug!("No configuration file given, using defaults");
                    return Ok(Self::default());
                }
            },
        };
        if !path.exists() {
            debug!(path = %path.display(), "Configuration file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config = Self::from_yaml(&content).map_err(|e| EnquiryError::Config {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.resolve_paths(base))
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    fn resolve_paths(mut self, base: &Path) -> Self {
        for path in [
            &mut self.catalog,
            &mut self.data_dir,
            &mut self.output_dir,
            &mut self.field_values,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        if let Some(binary) = self.converter.binary.as_mut().filter(|b| b.components().count() > 1) {
            if binary.is_relative() {
                *binary = base.join(&*binary);
            }
        }
        self
    }
}
