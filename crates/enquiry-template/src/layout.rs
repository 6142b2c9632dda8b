/*
 * layout.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Merge ranges and per-row layout snapshots.
//!
//! Layouts are captured from the template before any row is inserted or
//! deleted. They are the stamp every expanded row is printed from.

use std::fmt;

use crate::sheet::TemplateSheet;
use crate::value::CellValue;

/// A rectangle of cells displayed as one cell. Rows and columns are 1-based
/// and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MergeRange {
    pub min_row: u32,
    pub max_row: u32,
    pub min_col: u32,
    pub max_col: u32,
}

impl MergeRange {
    /// Build a range, or `None` when the bounds are inverted or zero.
    pub fn new(min_row: u32, max_row: u32, min_col: u32, max_col: u32) -> Option<Self> {
        if min_row == 0 || min_col == 0 || max_row < min_row || max_col < min_col {
            return None;
        }
        Some(Self {
            min_row,
            max_row,
            min_col,
            max_col,
        })
    }

    pub fn spans_row(&self, row: u32) -> bool {
        self.min_row <= row && row <= self.max_row
    }

    pub fn contains(&self, row: u32, column: u32) -> bool {
        self.spans_row(row) && self.min_col <= column && column <= self.max_col
    }

    /// The top-left cell holds the value; every other covered cell is interior.
    pub fn is_interior(&self, row: u32, column: u32) -> bool {
        self.contains(row, column) && (row, column) != (self.min_row, self.min_col)
    }

    pub fn is_single_cell(&self) -> bool {
        self.min_row == self.max_row && self.min_col == self.max_col
    }

    /// Number of rows covered, minus one.
    pub fn row_span(&self) -> u32 {
        self.max_row - self.min_row
    }

    /// Move the range vertically by `delta` rows.
    pub fn shift_rows(&mut self, delta: i64) {
        self.min_row = offset_row(self.min_row, delta);
        self.max_row = offset_row(self.max_row, delta);
    }

    /// The same shape with its top row at `row`.
    pub fn anchored_at(&self, row: u32) -> Self {
        Self {
            min_row: row,
            max_row: row + self.row_span(),
            ..*self
        }
    }
}

impl fmt::Display for MergeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "R{}C{}:R{}C{}",
            self.min_row, self.min_col, self.max_row, self.max_col
        )
    }
}

pub(crate) fn offset_row(row: u32, delta: i64) -> u32 {
    u32::try_from(i64::from(row) + delta).unwrap_or(1).max(1)
}

/// Style and content of one template cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellSnapshot<S> {
    pub column: u32,
    pub style: S,
    pub value: CellValue,
    /// Covered by a merge range without being its top-left cell.
    pub merged_interior: bool,
}

/// Everything needed to reprint one template row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout<S> {
    pub height: Option<f64>,
    pub cells: Vec<CellSnapshot<S>>,
    /// Merge ranges whose row span includes the captured row, in template
    /// coordinates.
    pub merges: Vec<MergeRange>,
}

impl<S> RowLayout<S> {
    /// Merges that start on `row`; these are stamped again on every copy.
    pub fn merges_anchored_at(&self, row: u32) -> impl Iterator<Item = &MergeRange> {
        self.merges.iter().filter(move |m| m.min_row == row)
    }
}

/// Snapshot `row` of `sheet`.
pub fn capture_row_layout<T: TemplateSheet>(sheet: &T, row: u32) -> RowLayout<T::Style> {
    let merges: Vec<MergeRange> = sheet
        .merge_ranges()
        .into_iter()
        .filter(|m| m.spans_row(row))
        .collect();

    let cells = (1..=sheet.column_count(row))
        .map(|column| CellSnapshot {
            column,
            style: sheet.cell_style(row, column),
            value: sheet.cell_value(row, column),
            merged_interior: merges.iter().any(|m| m.is_interior(row, column)),
        })
        .collect();

    RowLayout {
        height: sheet.row_height(row),
        cells,
        merges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySheet;

    #[test]
    fn test_merge_range_rejects_inverted_bounds() {
        assert!(MergeRange::new(3, 2, 1, 1).is_none());
        assert!(MergeRange::new(1, 1, 2, 1).is_none());
        assert!(MergeRange::new(0, 1, 1, 1).is_none());
        assert!(MergeRange::new(2, 2, 1, 3).is_some());
    }

    #[test]
    fn test_shift_and_anchor() {
        let mut range = MergeRange::new(4, 5, 1, 2).unwrap();
        range.shift_rows(-2);
        assert_eq!(range, MergeRange::new(2, 3, 1, 2).unwrap());
        assert_eq!(range.anchored_at(10), MergeRange::new(10, 11, 1, 2).unwrap());
    }

    #[test]
    fn test_interior_cells() {
        let range = MergeRange::new(2, 3, 1, 2).unwrap();
        assert!(!range.is_interior(2, 1));
        assert!(range.is_interior(2, 2));
        assert!(range.is_interior(3, 1));
        assert!(!range.is_interior(4, 1));
    }

    #[test]
    fn test_capture_row_layout() {
        let mut sheet = MemorySheet::from_rows(&[&["Title", ""], &["{{1;a}}", "{{1;b}}"]]);
        sheet.set_style(2, 2, "bold");
        sheet.set_height(2, Some(18.5));
        sheet.merge(MergeRange::new(1, 1, 1, 2).unwrap());

        let layout = capture_row_layout(&sheet, 2);
        assert_eq!(layout.height, Some(18.5));
        assert_eq!(layout.cells.len(), 2);
        assert_eq!(layout.cells[1].style, "bold");
        assert_eq!(layout.cells[0].value, CellValue::Text("{{1;a}}".to_string()));
        assert!(layout.merges.is_empty());

        let title = capture_row_layout(&sheet, 1);
        assert_eq!(title.merges.len(), 1);
        assert!(title.cells[1].merged_interior);
        assert!(!title.cells[0].merged_interior);
    }
}
