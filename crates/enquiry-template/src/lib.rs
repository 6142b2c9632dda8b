/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Placeholder scanning and row expansion for enquiry report templates.
//!
//! A template is a spreadsheet or text document containing `{{...}}`
//! placeholders. Filling it happens in two passes:
//!
//! 1. The single-placeholder pass ([`PlaceholderResolver`]) replaces form
//!    fields (`{{city}}`), single result cells (`{{5:0;inn}}`) and formatter
//!    chains (`{{ROUND;6;total}}`) with text.
//! 2. The expansion pass ([`scan`] then [`expand`]) turns every row holding
//!    block placeholders (`{{6;pokaz}}`) into one row per result row, copying
//!    the template row's styles and merge ranges and keeping every merge
//!    range below it in place.
//!
//! # Architecture
//!
//! The engine never touches a file format. It works against the
//! [`TemplateSheet`] grid interface, and formats plug in by implementing it
//! together with [`ReportDocument`]. [`MemorySheet`] is an in-memory grid.
//!
//! # Example
//!
//! ```ignore
//! use enquiry_template::{MemorySheet, QueryResultStore, expand_sheet};
//!
//! let mut sheet = MemorySheet::from_rows(&[&["No.", "Name"], &["{{6;n}}", "{{6;pokaz}}"]]);
//! let store: QueryResultStore = serde_json::from_str(r#"{"6": [{"n": 1, "pokaz": "A"}, {"n": 2, "pokaz": "B"}]}"#)?;
//!
//! expand_sheet(&mut sheet, &store)?;
//! assert_eq!(sheet.row_texts(3), vec!["2", "B"]);
//! ```

pub mod document;
pub mod error;
pub mod expander;
pub mod formatter;
pub mod layout;
pub mod memory;
pub mod render;
pub mod scanner;
pub mod sheet;
pub mod store;
pub mod substitute;
pub mod token;
pub mod value;

pub use document::{FooterStamp, ReportDocument};
pub use error::{TemplateError, TemplateResult};
pub use expander::{ExpansionSummary, expand, expand_sheet, merges_after_delete};
pub use layout::{CellSnapshot, MergeRange, RowLayout, capture_row_layout};
pub use memory::MemorySheet;
pub use render::{coerce_numeric, format_decimal, render_text, to_cell_value, unescape_line_breaks};
pub use scanner::{BlockRegion, RegionAction, ScanPlan, scan};
pub use sheet::{TemplateSheet, ValueStyle};
pub use store::{QueryId, QueryResultSet, QueryResultStore, Row};
pub use substitute::{PlaceholderResolver, substitute_sheet};
pub use token::{Placeholder, TokenKind};
pub use value::{CellValue, Scalar};
