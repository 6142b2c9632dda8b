/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for OOXML package handling.

use std::path::{Path, PathBuf};

use enquiry_template::TemplateError;
use thiserror::Error;

/// Errors raised while reading or writing an OOXML package.
#[derive(Debug, Error)]
pub enum OoxmlError {
    /// The ZIP container is unreadable.
    #[error("Invalid package: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The package file cannot be opened.
    #[error("Cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An entry exists but its bytes cannot be read back, e.g. a bad checksum.
    #[error("Cannot read entry {name}: {source}")]
    Entry {
        name: String,
        source: std::io::Error,
    },

    /// A part is not well-formed XML.
    #[error("XML error in {part}: {message}")]
    XmlSyntax { part: String, message: String },

    /// A part the format requires is absent.
    #[error("Missing part: {0}")]
    MissingPart(String),

    /// A part is well-formed but its content is not what the format expects.
    #[error("Invalid content in {part}: {message}")]
    InvalidContent { part: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OoxmlError {
    pub fn xml(part: &str, message: impl std::fmt::Display) -> Self {
        OoxmlError::XmlSyntax {
            part: part.to_string(),
            message: message.to_string(),
        }
    }

    pub fn invalid(part: &str, message: impl Into<String>) -> Self {
        OoxmlError::InvalidContent {
            part: part.to_string(),
            message: message.into(),
        }
    }

    /// Report this error as a failure to load the template at `path`.
    ///
    /// Only a file that cannot be opened is "not found"; anything wrong
    /// inside an existing file is a malformed template.
    pub fn into_load_error(self, path: &Path) -> TemplateError {
        match self {
            OoxmlError::Open { source, .. } => TemplateError::TemplateNotFound {
                path: path.to_path_buf(),
                source,
            },
            other => TemplateError::malformed(path, other),
        }
    }

    /// Report this error as a failure to write the output at `path`.
    pub fn into_save_error(self, path: &Path) -> TemplateError {
        TemplateError::write_failed(path, self)
    }
}

/// Result type for package operations.
pub type OoxmlResult<T> = Result<T, OoxmlError>;
