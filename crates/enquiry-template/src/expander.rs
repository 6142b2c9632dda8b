/*
 * expander.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Applies a [`ScanPlan`] to a sheet.
//!
//! Regions are processed top-down. Each one starts at the output row the
//! scanner computed for it, which is exactly where it sits once the regions
//! above have been applied. Merge ranges are kept in step with every row
//! insertion and deletion.

use tracing::debug;

use crate::error::TemplateResult;
use crate::layout::{MergeRange, RowLayout};
use crate::render::to_cell_value;
use crate::scanner::{BlockRegion, RegionAction, ScanPlan, scan};
use crate::sheet::TemplateSheet;
use crate::store::{QueryId, QueryResultStore};
use crate::token;
use crate::value::{CellValue, Scalar};

/// Counts of what an expansion did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpansionSummary {
    pub regions: usize,
    pub rows_inserted: u32,
    pub rows_deleted: u32,
}

impl ExpansionSummary {
    pub fn absorb(&mut self, other: ExpansionSummary) {
        self.regions += other.regions;
        self.rows_inserted += other.rows_inserted;
        self.rows_deleted += other.rows_deleted;
    }
}

/// Scan `sheet` and expand every block region in it.
pub fn expand_sheet<T: TemplateSheet>(
    sheet: &mut T,
    store: &QueryResultStore,
) -> TemplateResult<ExpansionSummary> {
    let plan = scan(sheet, store);
    expand(sheet, store, &plan)
}

/// Apply `plan` to `sheet`.
pub fn expand<T: TemplateSheet>(
    sheet: &mut T,
    store: &QueryResultStore,
    plan: &ScanPlan<T::Style>,
) -> TemplateResult<ExpansionSummary> {
    let mut summary = ExpansionSummary {
        regions: plan.regions.len(),
        ..ExpansionSummary::default()
    };

    for region in &plan.regions {
        let row = region.output_row;
        match region.action {
            RegionAction::Delete => {
                sheet.delete_row(row)?;
                let merges = merges_after_delete(sheet.merge_ranges(), row);
                sheet.set_merge_ranges(merges);
                summary.rows_deleted += 1;
            }
            RegionAction::InPlace => {
                fill_row(sheet, store, region, row, DataIndex::Last)?;
            }
            RegionAction::Clone { count } => {
                let copies = count - 1;
                sheet.clone_row(row, copies)?;
                let mut merges = sheet.merge_ranges();
                for merge in merges.iter_mut().filter(|m| m.min_row > row) {
                    merge.shift_rows(i64::from(copies));
                }
                sheet.set_merge_ranges(merges);

                for i in 0..count {
                    fill_row(sheet, store, region, row + i, DataIndex::At(i as usize))?;
                    stamp_merges(sheet, region, row + i);
                }
                summary.rows_inserted += copies;
            }
        }
        debug!(
            output_row = row,
            action = ?region.action,
            "expanded block region"
        );
    }

    for (row, layout) in &plan.header_layouts {
        restore_height(sheet, *row, layout)?;
    }

    Ok(summary)
}

#[derive(Debug, Clone, Copy)]
enum DataIndex {
    At(usize),
    Last,
}

/// Print the region's layout onto `target`, binding block cells to the
/// selected data row.
fn fill_row<T: TemplateSheet>(
    sheet: &mut T,
    store: &QueryResultStore,
    region: &BlockRegion<T::Style>,
    target: u32,
    index: DataIndex,
) -> TemplateResult<()> {
    let value_style = sheet.value_style();
    restore_height(sheet, target, &region.layout)?;

    for cell in &region.layout.cells {
        sheet.set_cell_style(target, cell.column, &cell.style)?;
        if cell.merged_interior {
            continue;
        }

        let binding = cell
            .value
            .as_text()
            .and_then(|text| token::find_blocks(text).into_iter().next());
        let value = match binding {
            Some((query_id, column)) => bound_value(store, query_id, &column, index)
                .map(|scalar| to_cell_value(scalar, value_style))
                .unwrap_or(CellValue::Empty),
            None => cell.value.clone(),
        };
        sheet.set_cell_value(target, cell.column, value)?;
    }
    Ok(())
}

fn bound_value<'a>(
    store: &'a QueryResultStore,
    query_id: QueryId,
    column: &str,
    index: DataIndex,
) -> Option<&'a Scalar> {
    let set = store.bound(query_id)?;
    let row = match index {
        DataIndex::At(i) => i,
        DataIndex::Last => set.len() - 1,
    };
    set.value(row, column)
}

fn restore_height<T: TemplateSheet, S>(
    sheet: &mut T,
    row: u32,
    layout: &RowLayout<S>,
) -> TemplateResult<()> {
    if row > sheet.row_count() {
        return Ok(());
    }
    sheet.set_row_height(row, layout.height)
}

/// Re-create the merges that start on the anchor row at `target`.
fn stamp_merges<T: TemplateSheet>(sheet: &mut T, region: &BlockRegion<T::Style>, target: u32) {
    let mut merges = sheet.merge_ranges();
    let mut changed = false;
    for merge in region.layout.merges_anchored_at(region.template_row) {
        let stamped = merge.anchored_at(target);
        if !merges.contains(&stamped) {
            merges.push(stamped);
            changed = true;
        }
    }
    if changed {
        sheet.set_merge_ranges(merges);
    }
}

/// Merge ranges after `row` was removed: ranges below move up one row,
/// ranges through it lose one row and vanish when a single row is left.
pub fn merges_after_delete(merges: Vec<MergeRange>, row: u32) -> Vec<MergeRange> {
    merges
        .into_iter()
        .filter_map(|mut merge| {
            if merge.min_row > row {
                merge.shift_rows(-1);
                Some(merge)
            } else if merge.spans_row(row) {
                if merge.max_row == merge.min_row {
                    return None;
                }
                merge.max_row -= 1;
                (merge.max_row > merge.min_row).then_some(merge)
            } else {
                Some(merge)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn range(min_row: u32, max_row: u32, min_col: u32, max_col: u32) -> MergeRange {
        MergeRange::new(min_row, max_row, min_col, max_col).unwrap()
    }

    #[test]
    fn test_merges_after_delete() {
        let merges = vec![
            range(1, 1, 1, 3),
            range(3, 3, 1, 2),
            range(2, 4, 4, 4),
            range(2, 3, 5, 6),
            range(5, 6, 1, 2),
        ];
        assert_eq!(
            merges_after_delete(merges, 3),
            vec![range(1, 1, 1, 3), range(2, 3, 4, 4), range(4, 5, 1, 2)]
        );
    }
}
