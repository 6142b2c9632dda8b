/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Enquiry report generation.
//!
//! [`Templater`] ties the pieces together: the catalog and query executor
//! from `enquiry-data`, the expansion engine from `enquiry-template`, and the
//! `.xlsx`/`.docx` adapters from `enquiry-ooxml`. PDF output goes through a
//! [`PdfConverter`].
//!
//! ```no_run
//! use enquiry_core::{OutputFormat, ServiceConfig, Templater, TemplaterRequest};
//!
//! # async fn run() -> enquiry_core::EnquiryResult<()> {
//! let config = ServiceConfig::load(None)?;
//! let templater = Templater::from_config(config).await?;
//! let path = templater
//!     .generate(12, OutputFormat::Xlsx, &TemplaterRequest::default())
//!     .await?;
//! println!("{}", path.display());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod convert;
pub mod error;
pub mod templater;

pub use config::{CONFIG_ENV, ConverterConfig, FooterConfig, ServiceConfig};
pub use convert::{PdfConverter, SofficeConverter};
pub use error::{EnquiryError, EnquiryResult};
pub use templater::{
    FieldInfo, FieldValueInfo, OutputFormat, TemplateInfo, Templater, TemplaterRequest,
};
