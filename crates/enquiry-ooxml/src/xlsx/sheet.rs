/*
 * sheet.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! A worksheet as a template grid.
//!
//! Styles are `cellXfs` indices. Copies stay within one workbook, so the
//! index alone carries the whole format.

use enquiry_template::{CellValue, MergeRange, TemplateResult, TemplateSheet, ValueStyle};

use super::worksheet::Worksheet;

impl TemplateSheet for Worksheet {
    type Style = u32;

    fn row_count(&self) -> u32 {
        Worksheet::row_count(self)
    }

    fn column_count(&self, _row: u32) -> u32 {
        Worksheet::column_count(self)
    }

    fn cell_value(&self, row: u32, column: u32) -> CellValue {
        self.value(row, column)
    }

    fn set_cell_value(&mut self, row: u32, column: u32, value: CellValue) -> TemplateResult<()> {
        self.set_value(row, column, value);
        Ok(())
    }

    fn cell_style(&self, row: u32, column: u32) -> u32 {
        self.style_index(row, column)
    }

    fn set_cell_style(&mut self, row: u32, column: u32, style: &u32) -> TemplateResult<()> {
        self.set_style_index(row, column, *style);
        Ok(())
    }

    fn row_height(&self, row: u32) -> Option<f64> {
        Worksheet::row_height(self, row)
    }

    fn set_row_height(&mut self, row: u32, height: Option<f64>) -> TemplateResult<()> {
        Worksheet::set_row_height(self, row, height);
        Ok(())
    }

    fn clone_row(&mut self, row: u32, copies: u32) -> TemplateResult<()> {
        Worksheet::clone_row(self, row, copies);
        Ok(())
    }

    fn delete_row(&mut self, row: u32) -> TemplateResult<()> {
        Worksheet::delete_row(self, row);
        Ok(())
    }

    fn merge_ranges(&self) -> Vec<MergeRange> {
        self.merges().to_vec()
    }

    fn set_merge_ranges(&mut self, ranges: Vec<MergeRange>) {
        self.set_merges(ranges);
    }

    fn value_style(&self) -> ValueStyle {
        ValueStyle::Native
    }
}
