/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for report generation.

use std::path::PathBuf;

use enquiry_data::{CatalogError, EnquiryId, FieldStoreError};
use enquiry_template::TemplateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnquiryError {
    #[error("Enquiry {0} not found")]
    EnquiryNotFound(EnquiryId),

    /// The enquiry has no template for the requested format.
    #[error("Enquiry {enquiry_id} has no {format} template")]
    TemplateUnavailable { enquiry_id: EnquiryId, format: String },

    #[error("Unsupported output format '{0}' (expected xlsx, docx or pdf)")]
    UnsupportedFormat(String),

    #[error("Invalid configuration {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// PDF conversion failed or timed out.
    #[error("PDF conversion failed: {0}")]
    Conversion(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    FieldStore(#[from] FieldStoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EnquiryResult<T> = Result<T, EnquiryError>;
