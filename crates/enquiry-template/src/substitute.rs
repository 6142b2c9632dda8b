/*
 * substitute.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The single-placeholder pass: fields, cells and formatters.
//!
//! Block placeholders are left untouched here; they belong to the expansion
//! pass that runs afterwards.

use std::collections::BTreeMap;

use crate::error::TemplateResult;
use crate::formatter;
use crate::render::render_text;
use crate::sheet::TemplateSheet;
use crate::store::QueryResultStore;
use crate::token::{self, Placeholder, TokenKind};
use crate::value::CellValue;

/// Resolves non-block placeholders and remembers which form fields it used.
#[derive(Debug)]
pub struct PlaceholderResolver<'a> {
    store: &'a QueryResultStore,
    fields: &'a BTreeMap<String, String>,
    observed: BTreeMap<String, String>,
}

impl<'a> PlaceholderResolver<'a> {
    pub fn new(store: &'a QueryResultStore, fields: &'a BTreeMap<String, String>) -> Self {
        Self {
            store,
            fields,
            observed: BTreeMap::new(),
        }
    }

    /// The replacement text for `placeholder`, or `None` for block
    /// placeholders, which stay in place.
    pub fn resolve(&mut self, placeholder: &Placeholder) -> Option<String> {
        match &placeholder.kind {
            TokenKind::Field { field_name } => {
                let value = self
                    .fields
                    .get(field_name)
                    .filter(|value| !value.is_empty());
                match value {
                    Some(value) => {
                        self.observed.insert(field_name.clone(), value.clone());
                        Some(value.clone())
                    }
                    None => Some(String::new()),
                }
            }
            TokenKind::Cell {
                query_id,
                row_index,
                column,
            } => Some(
                self.store
                    .get(*query_id)
                    .and_then(|set| set.value(*row_index, column))
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            ),
            TokenKind::Formatter {
                operations,
                query_id,
                column,
            } => Some(render_text(&formatter::evaluate(
                operations, *query_id, column, self.store,
            ))),
            TokenKind::Block { .. } => None,
        }
    }

    /// Replace every non-block placeholder in `text`.
    ///
    /// Returns `None` when nothing was replaced, so callers can leave the
    /// source untouched.
    pub fn substitute(&mut self, text: &str) -> Option<String> {
        let placeholders = token::find_all(text);
        if placeholders.iter().all(Placeholder::is_block) {
            return None;
        }

        let mut output = String::with_capacity(text.len());
        let mut cursor = 0;
        for placeholder in &placeholders {
            if let Some(replacement) = self.resolve(placeholder) {
                output.push_str(&text[cursor..placeholder.span.start]);
                output.push_str(&replacement);
                cursor = placeholder.span.end;
            }
        }
        output.push_str(&text[cursor..]);
        Some(output)
    }

    /// Form fields substituted with their values.
    pub fn into_observed(self) -> BTreeMap<String, String> {
        self.observed
    }
}

/// Run the single-placeholder pass over every text cell of `sheet`.
///
/// Returns the number of cells changed.
pub fn substitute_sheet<T: TemplateSheet>(
    sheet: &mut T,
    resolver: &mut PlaceholderResolver<'_>,
) -> TemplateResult<usize> {
    let mut changed = 0;
    for row in 1..=sheet.row_count() {
        for column in 1..=sheet.column_count(row) {
            let value = sheet.cell_value(row, column);
            let Some(text) = value.as_text() else {
                continue;
            };
            if let Some(updated) = resolver.substitute(text) {
                sheet.set_cell_value(row, column, CellValue::Text(updated))?;
                changed += 1;
            }
        }
    }
    Ok(changed)
}
