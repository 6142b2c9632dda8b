/*
 * scanner.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Block region discovery
 */

//! Block region discovery.
//!
//! The scanner walks the template top to bottom once, before anything is
//! mutated. Every row holding a block placeholder becomes a [`BlockRegion`]
//! whose fate depends on the data bound to its queries:
//!
//! - any query without rows: the row is deleted;
//! - one row: the template row is filled in place;
//! - `n` rows: the template row is cloned to `n` rows.
//!
//! Queries sharing a row are aligned: the region gets as many rows as the
//! largest of their result sets. A running offset converts template rows to
//! the rows they will occupy once every earlier region has been applied, so
//! the expander can work strictly top-down.

use std::collections::BTreeMap;

use tracing::debug;

use crate::layout::{RowLayout, capture_row_layout};
use crate::sheet::TemplateSheet;
use crate::store::{QueryId, QueryResultStore};
use crate::token;

/// What happens to the anchor row of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionAction {
    Delete,
    InPlace,
    Clone { count: u32 },
}

impl RegionAction {
    /// Rows the region occupies in the output.
    pub fn output_rows(&self) -> u32 {
        match self {
            RegionAction::Delete => 0,
            RegionAction::InPlace => 1,
            RegionAction::Clone { count } => *count,
        }
    }
}

/// One anchor row and everything needed to expand it.
#[derive(Debug, Clone)]
pub struct BlockRegion<S> {
    /// Row in the untouched template.
    pub template_row: u32,
    /// Row the region starts at once earlier regions are applied.
    pub output_row: u32,
    /// Block placeholders of the row, first appearance first, deduplicated.
    pub bindings: Vec<(QueryId, String)>,
    pub action: RegionAction,
    pub layout: RowLayout<S>,
}

impl<S> BlockRegion<S> {
    /// Distinct queries of the region in order of appearance.
    pub fn query_ids(&self) -> Vec<QueryId> {
        let mut ids: Vec<QueryId> = Vec::new();
        for (id, _) in &self.bindings {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        ids
    }
}

/// The outcome of a scan.
#[derive(Debug, Clone)]
pub struct ScanPlan<S> {
    pub regions: Vec<BlockRegion<S>>,
    /// Layouts of the rows lying between two block rows, keyed by output row.
    pub header_layouts: BTreeMap<u32, RowLayout<S>>,
}

impl<S> ScanPlan<S> {
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Scan `sheet` for block regions.
pub fn scan<T: TemplateSheet>(sheet: &T, store: &QueryResultStore) -> ScanPlan<T::Style> {
    let mut regions = Vec::new();
    let mut header_layouts = BTreeMap::new();
    let mut row_offset: i64 = 0;
    let mut last_block_row: Option<u32> = None;

    for row in 1..=sheet.row_count() {
        let bindings = row_bindings(sheet, row);
        if bindings.is_empty() {
            continue;
        }

        if let Some(last) = last_block_row.filter(|last| row - last > 1) {
            for header_row in last + 1..row {
                header_layouts
                    .entry(output_row(header_row, row_offset))
                    .or_insert_with(|| capture_row_layout(sheet, header_row));
            }
        }

        let action = decide(&bindings, store);
        let region = BlockRegion {
            template_row: row,
            output_row: output_row(row, row_offset),
            bindings,
            action,
            layout: capture_row_layout(sheet, row),
        };
        debug!(
            template_row = row,
            output_row = region.output_row,
            action = ?region.action,
            "block region"
        );

        row_offset += i64::from(action.output_rows()) - 1;
        last_block_row = Some(row);
        regions.push(region);
    }

    ScanPlan {
        regions,
        header_layouts,
    }
}

/// Block placeholders of every text cell of `row`.
fn row_bindings<T: TemplateSheet>(sheet: &T, row: u32) -> Vec<(QueryId, String)> {
    let mut bindings = Vec::new();
    for column in 1..=sheet.column_count(row) {
        let value = sheet.cell_value(row, column);
        let Some(text) = value.as_text() else {
            continue;
        };
        for binding in token::find_blocks(text) {
            if !bindings.contains(&binding) {
                bindings.push(binding);
            }
        }
    }
    bindings
}

fn decide(bindings: &[(QueryId, String)], store: &QueryResultStore) -> RegionAction {
    if bindings
        .iter()
        .any(|(query_id, _)| store.bound(*query_id).is_none())
    {
        return RegionAction::Delete;
    }
    let cardinality = bindings
        .iter()
        .map(|(query_id, _)| store.cardinality(*query_id))
        .max()
        .unwrap_or_default();
    match u32::try_from(cardinality).unwrap_or(u32::MAX) {
        0 => RegionAction::Delete,
        1 => RegionAction::InPlace,
        count => RegionAction::Clone { count },
    }
}

fn output_row(template_row: u32, row_offset: i64) -> u32 {
    crate::layout::offset_row(template_row, row_offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySheet;
    use crate::store::{QueryResultSet, Row};
    use crate::value::Scalar;

    fn set(len: usize) -> QueryResultSet {
        (0..len)
            .map(|i| {
                let mut row = Row::new();
                row.insert("a".to_string(), Scalar::Integer(i as i64));
                row
            })
            .collect()
    }

    #[test]
    fn test_actions_follow_cardinality() {
        let sheet = MemorySheet::from_rows(&[
            &["head"],
            &["{{1;a}}"],
            &["{{2;a}}"],
            &["{{3;a}}"],
            &["tail"],
        ]);
        let store: QueryResultStore = [(1, set(3)), (2, set(1)), (3, set(0))].into_iter().collect();

        let plan = scan(&sheet, &store);
        let actions: Vec<_> = plan.regions.iter().map(|r| (r.template_row, r.output_row, r.action)).collect();
        assert_eq!(
            actions,
            vec![
                (2, 2, RegionAction::Clone { count: 3 }),
                (3, 5, RegionAction::InPlace),
                (4, 6, RegionAction::Delete),
            ]
        );
    }

    #[test]
    fn test_colocated_queries_take_the_largest_set() {
        let sheet = MemorySheet::from_rows(&[&["{{1;a}}", "{{2;a}}", "static"]]);
        let store: QueryResultStore = [(1, set(3)), (2, set(1))].into_iter().collect();

        let plan = scan(&sheet, &store);
        assert_eq!(plan.regions.len(), 1);
        assert_eq!(plan.regions[0].action, RegionAction::Clone { count: 3 });
        assert_eq!(plan.regions[0].query_ids(), vec![1, 2]);
    }

    #[test]
    fn test_unbound_query_deletes_the_row() {
        let sheet = MemorySheet::from_rows(&[&["{{1;a}}", "{{9;a}}"]]);
        let store: QueryResultStore = [(1, set(3))].into_iter().collect();

        let plan = scan(&sheet, &store);
        assert_eq!(plan.regions[0].action, RegionAction::Delete);
    }

    #[test]
    fn test_header_rows_between_blocks_are_captured() {
        let sheet = MemorySheet::from_rows(&[
            &["title"],
            &["{{1;a}}"],
            &["header 1"],
            &["header 2"],
            &["{{2;a}}"],
        ]);
        let store: QueryResultStore = [(1, set(2)), (2, set(1))].into_iter().collect();

        let plan = scan(&sheet, &store);
        let header_rows: Vec<u32> = plan.header_layouts.keys().copied().collect();
        assert_eq!(header_rows, vec![4, 5]);
        assert_eq!(plan.regions[1].output_row, 6);
    }

    #[test]
    fn test_sheet_without_blocks_has_empty_plan() {
        let sheet = MemorySheet::from_rows(&[&["{{name}}", "{{1:0;a}}"]]);
        let plan = scan(&sheet, &QueryResultStore::new());
        assert!(plan.is_empty());
        assert!(plan.header_layouts.is_empty());
    }
}
