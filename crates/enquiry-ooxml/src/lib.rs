/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Office Open XML adapters for enquiry templates.
//!
//! [`XlsxWorkbook`] and [`DocxDocument`] load a template package, expose its
//! grids to the shared expansion engine, and write the result back with every
//! untouched part copied verbatim.
//!
//! ```no_run
//! use enquiry_ooxml::XlsxWorkbook;
//! use enquiry_template::{FooterStamp, QueryResultStore, ReportDocument};
//!
//! let mut workbook = XlsxWorkbook::load("report.xlsx".as_ref())?;
//! workbook.expand_blocks(&QueryResultStore::default())?;
//! workbook.add_footer(&FooterStamp::new("Справка сформирована", "01.02.2025 10:00:00"))?;
//! workbook.save("out.xlsx".as_ref())?;
//! # Ok::<(), enquiry_template::TemplateError>(())
//! ```

pub mod docx;
pub mod error;
pub mod package;
pub mod relationships;
pub mod xlsx;
pub mod xml;

pub use docx::DocxDocument;
pub use error::{OoxmlError, OoxmlResult};
pub use package::OoxmlPackage;
pub use xlsx::XlsxWorkbook;
