/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Spreadsheet templates.

pub mod cell_ref;
pub mod header_footer;
pub mod shared_strings;
mod sheet;
pub mod workbook;
pub mod worksheet;

pub use header_footer::HeaderFooterText;
pub use workbook::XlsxWorkbook;
pub use worksheet::Worksheet;
