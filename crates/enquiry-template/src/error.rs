/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for template loading, expansion and saving.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while working on a template document.
///
/// Missing data and unrecognized placeholders are not errors: they are
/// rendered as empty cells, deleted rows or literal text. Only problems with
/// the template file itself, or with persisting the result, surface here.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The template file does not exist or cannot be read.
    #[error("Template not found: {}", path.display())]
    TemplateNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The template file was read but its content could not be understood.
    #[error("Malformed template {}: {message}", path.display())]
    MalformedTemplate { path: PathBuf, message: String },

    /// The expanded document could not be written.
    #[error("Failed to write {}: {message}", path.display())]
    WriteFailed { path: PathBuf, message: String },

    /// A row index outside the sheet was addressed.
    #[error("Row {row} is out of range")]
    RowOutOfRange { row: u32 },
}

impl TemplateError {
    pub fn malformed(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        TemplateError::MalformedTemplate {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn write_failed(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        TemplateError::WriteFailed {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;
