/*
 * store.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Query result sets, keyed by query identifier.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::Scalar;

/// Identifier of a query, as written in placeholders.
pub type QueryId = u32;

/// One result row: column name to value, in the column order of the source.
pub type Row = IndexMap<String, Scalar>;

/// The ordered rows returned by one query.
///
/// Row order is the order of the data source and is significant: cell
/// placeholders address rows by index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryResultSet {
    rows: Vec<Row>,
}

impl QueryResultSet {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// The value at `column` of row `index`, if both exist.
    pub fn value(&self, index: usize, column: &str) -> Option<&Scalar> {
        self.rows.get(index).and_then(|row| row.get(column))
    }
}

impl FromIterator<Row> for QueryResultSet {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

/// Every result set fetched for one report generation.
///
/// Filled once before scanning starts and read-only afterwards. A query that
/// failed to fetch is simply absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryResultStore {
    sets: BTreeMap<QueryId, QueryResultSet>,
}

impl QueryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, query_id: QueryId, set: QueryResultSet) {
        self.sets.insert(query_id, set);
    }

    pub fn get(&self, query_id: QueryId) -> Option<&QueryResultSet> {
        self.sets.get(&query_id)
    }

    /// The result set for `query_id`, unless it is missing or empty.
    pub fn bound(&self, query_id: QueryId) -> Option<&QueryResultSet> {
        self.sets.get(&query_id).filter(|set| !set.is_empty())
    }

    /// Number of rows bound to `query_id`; zero when missing.
    pub fn cardinality(&self, query_id: QueryId) -> usize {
        self.sets.get(&query_id).map_or(0, QueryResultSet::len)
    }

    pub fn query_ids(&self) -> impl Iterator<Item = QueryId> + '_ {
        self.sets.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

impl FromIterator<(QueryId, QueryResultSet)> for QueryResultStore {
    fn from_iter<I: IntoIterator<Item = (QueryId, QueryResultSet)>>(iter: I) -> Self {
        Self {
            sets: iter.into_iter().collect(),
        }
    }
}
