/*
 * memory.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! An in-memory [`TemplateSheet`], for tests and for callers that build
//! grids programmatically.

use crate::error::{TemplateError, TemplateResult};
use crate::layout::MergeRange;
use crate::sheet::{TemplateSheet, ValueStyle};
use crate::value::CellValue;

#[derive(Debug, Clone, Default, PartialEq)]
struct MemoryCell {
    value: CellValue,
    style: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct MemoryRow {
    height: Option<f64>,
    cells: Vec<MemoryCell>,
}

/// A sheet held entirely in memory. Styles are plain strings.
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySheet {
    rows: Vec<MemoryRow>,
    merges: Vec<MergeRange>,
    value_style: ValueStyle,
}

impl Default for MemorySheet {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            merges: Vec::new(),
            value_style: ValueStyle::Native,
        }
    }
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sheet of text cells; empty strings become empty cells.
    pub fn from_rows(rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|cells| MemoryRow {
                height: None,
                cells: cells
                    .iter()
                    .map(|text| MemoryCell {
                        value: if text.is_empty() {
                            CellValue::Empty
                        } else {
                            CellValue::Text((*text).to_string())
                        },
                        style: String::new(),
                    })
                    .collect(),
            })
            .collect();
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn with_value_style(mut self, value_style: ValueStyle) -> Self {
        self.value_style = value_style;
        self
    }

    pub fn set_style(&mut self, row: u32, column: u32, style: &str) {
        if let Some(cell) = self.cell_mut(row, column) {
            cell.style = style.to_string();
        }
    }

    pub fn set_height(&mut self, row: u32, height: Option<f64>) {
        if let Some(r) = self.rows.get_mut(index(row)) {
            r.height = height;
        }
    }

    pub fn merge(&mut self, range: MergeRange) {
        self.merges.push(range);
    }

    /// Display text of a cell; empty for missing cells.
    pub fn text(&self, row: u32, column: u32) -> String {
        self.cell_value(row, column).to_string()
    }

    /// Display text of every cell in `row`.
    pub fn row_texts(&self, row: u32) -> Vec<String> {
        (1..=self.column_count(row))
            .map(|column| self.text(row, column))
            .collect()
    }

    pub fn style(&self, row: u32, column: u32) -> &str {
        self.cell(row, column).map_or("", |c| c.style.as_str())
    }

    fn cell(&self, row: u32, column: u32) -> Option<&MemoryCell> {
        self.rows.get(index(row))?.cells.get(index(column))
    }

    /// Grows the row to reach `column`.
    fn cell_mut(&mut self, row: u32, column: u32) -> Option<&mut MemoryCell> {
        let r = self.rows.get_mut(index(row))?;
        let column = index(column);
        if r.cells.len() <= column {
            r.cells.resize_with(column + 1, MemoryCell::default);
        }
        r.cells.get_mut(column)
    }

    fn check_row(&self, row: u32) -> TemplateResult<usize> {
        if row == 0 || index(row) >= self.rows.len() {
            return Err(TemplateError::RowOutOfRange { row });
        }
        Ok(index(row))
    }
}

fn index(one_based: u32) -> usize {
    (one_based as usize).saturating_sub(1)
}

impl TemplateSheet for MemorySheet {
    type Style = String;

    fn row_count(&self) -> u32 {
        self.rows.len() as u32
    }

    fn column_count(&self, row: u32) -> u32 {
        self.rows.get(index(row)).map_or(0, |r| r.cells.len() as u32)
    }

    fn cell_value(&self, row: u32, column: u32) -> CellValue {
        self.cell(row, column)
            .map(|c| c.value.clone())
            .unwrap_or_default()
    }

    fn set_cell_value(&mut self, row: u32, column: u32, value: CellValue) -> TemplateResult<()> {
        self.check_row(row)?;
        if let Some(cell) = self.cell_mut(row, column) {
            cell.value = value;
        }
        Ok(())
    }

    fn cell_style(&self, row: u32, column: u32) -> String {
        self.style(row, column).to_string()
    }

    fn set_cell_style(&mut self, row: u32, column: u32, style: &String) -> TemplateResult<()> {
        self.check_row(row)?;
        if let Some(cell) = self.cell_mut(row, column) {
            cell.style.clone_from(style);
        }
        Ok(())
    }

    fn row_height(&self, row: u32) -> Option<f64> {
        self.rows.get(index(row)).and_then(|r| r.height)
    }

    fn set_row_height(&mut self, row: u32, height: Option<f64>) -> TemplateResult<()> {
        let i = self.check_row(row)?;
        self.rows[i].height = height;
        Ok(())
    }

    fn clone_row(&mut self, row: u32, copies: u32) -> TemplateResult<()> {
        let i = self.check_row(row)?;
        let template = self.rows[i].clone();
        let copies = std::iter::repeat_n(template, copies as usize);
        self.rows.splice(i + 1..i + 1, copies);
        Ok(())
    }

    fn delete_row(&mut self, row: u32) -> TemplateResult<()> {
        let i = self.check_row(row)?;
        self.rows.remove(i);
        Ok(())
    }

    fn merge_ranges(&self) -> Vec<MergeRange> {
        self.merges.clone()
    }

    fn set_merge_ranges(&mut self, ranges: Vec<MergeRange>) {
        self.merges = ranges;
    }

    fn value_style(&self) -> ValueStyle {
        self.value_style
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_row_inserts_below() {
        let mut sheet = MemorySheet::from_rows(&[&["a"], &["b"], &["c"]]);
        sheet.clone_row(2, 2).unwrap();
        assert_eq!(sheet.row_count(), 5);
        assert_eq!(sheet.text(3, 1), "b");
        assert_eq!(sheet.text(4, 1), "b");
        assert_eq!(sheet.text(5, 1), "c");
    }

    #[test]
    fn test_delete_row_out_of_range() {
        let mut sheet = MemorySheet::from_rows(&[&["a"]]);
        assert!(matches!(
            sheet.delete_row(2),
            Err(TemplateError::RowOutOfRange { row: 2 })
        ));
        sheet.delete_row(1).unwrap();
        assert_eq!(sheet.row_count(), 0);
    }
}
