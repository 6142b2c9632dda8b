/*
 * sheet.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The grid interface the scanner and expander run against.

use crate::error::TemplateResult;
use crate::layout::MergeRange;
use crate::value::CellValue;

/// How substituted block values should be written into cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueStyle {
    /// Numbers become numeric cells, text stays text.
    Native,
    /// Everything becomes display text; decimals use the report format.
    FormattedText,
}

/// A grid of template rows: a worksheet, or a table of a text document.
///
/// Rows and columns are 1-based. Row insertion and deletion shift the rows
/// below; merge ranges are never adjusted by the sheet itself, the expander
/// owns them.
pub trait TemplateSheet {
    /// Opaque cell formatting, copied verbatim from template cells.
    type Style: Clone;

    fn row_count(&self) -> u32;

    /// Number of cells in `row`, including trailing empty ones.
    fn column_count(&self, row: u32) -> u32;

    fn cell_value(&self, row: u32, column: u32) -> CellValue;

    fn set_cell_value(&mut self, row: u32, column: u32, value: CellValue) -> TemplateResult<()>;

    fn cell_style(&self, row: u32, column: u32) -> Self::Style;

    fn set_cell_style(&mut self, row: u32, column: u32, style: &Self::Style) -> TemplateResult<()>;

    /// Height in points, `None` for the default height.
    fn row_height(&self, row: u32) -> Option<f64>;

    fn set_row_height(&mut self, row: u32, height: Option<f64>) -> TemplateResult<()>;

    /// Insert `copies` copies of `row` directly below it.
    fn clone_row(&mut self, row: u32, copies: u32) -> TemplateResult<()>;

    fn delete_row(&mut self, row: u32) -> TemplateResult<()>;

    fn merge_ranges(&self) -> Vec<MergeRange>;

    fn set_merge_ranges(&mut self, ranges: Vec<MergeRange>);

    fn value_style(&self) -> ValueStyle;
}
