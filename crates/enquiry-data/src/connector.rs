/*
 * connector.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The seam between query execution and the databases that hold the views.

use std::sync::Arc;

use async_trait::async_trait;
use enquiry_template::{Row, Scalar};

use crate::catalog::DatabaseDescriptor;
use crate::error::FetchResult;

/// An `IN` test on one view column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnFilter {
    pub column: String,
    pub values: Vec<Scalar>,
}

impl ColumnFilter {
    /// Values are compared by their text, so `42` matches `"42"`.
    pub fn matches(&self, row: &Row) -> bool {
        let Some(value) = row.get(&self.column) else {
            return false;
        };
        let value = value.to_string();
        self.values.iter().any(|v| v.to_string() == value)
    }
}

/// Opens sessions to external databases.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, database: &DatabaseDescriptor) -> FetchResult<Arc<dyn ViewSession>>;
}

/// A connection to one database, shared by every query against it.
#[async_trait]
pub trait ViewSession: Send + Sync {
    /// Column names of `schema.view`.
    async fn columns(&self, schema: &str, view: &str) -> FetchResult<Vec<String>>;

    /// Rows of `schema.view` passing every filter.
    async fn select(&self, schema: &str, view: &str, filters: &[ColumnFilter])
    -> FetchResult<Vec<Row>>;
}
