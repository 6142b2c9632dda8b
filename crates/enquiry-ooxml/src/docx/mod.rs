/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Word-processing templates.

pub mod document;
pub mod footer;
pub mod paragraph;
pub mod table;

pub use document::DocxDocument;
pub use table::{DocxCellStyle, DocxTable};
