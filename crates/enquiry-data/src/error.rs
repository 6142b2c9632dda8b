/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for the data collaborators.

use std::path::PathBuf;

use enquiry_template::QueryId;
use thiserror::Error;

/// Errors reading the enquiry catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Cannot read catalog {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Errors fetching the rows of one query.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The view returned no rows for the request's filters.
    #[error("No data for query {query_id}")]
    DataNotFound { query_id: QueryId },

    /// The query names a database the catalog does not describe.
    #[error("No connection details for database {database_id}")]
    DatabaseNotFound { database_id: u32 },

    #[error("View {schema}.{view} does not exist")]
    ViewNotFound { schema: String, view: String },

    /// The database could not be reached.
    #[error("Cannot connect to database {database}: {message}")]
    Connection { database: String, message: String },

    /// The data source is unreadable.
    #[error("Invalid data source {}: {message}", path.display())]
    Source { path: PathBuf, message: String },
}

impl FetchError {
    pub fn is_data_not_found(&self) -> bool {
        matches!(self, FetchError::DataNotFound { .. })
    }
}

/// Errors of the field value store.
#[derive(Debug, Error)]
pub enum FieldStoreError {
    #[error("Field value store unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to read field values from {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid field value file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to write field values to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type CatalogResult<T> = Result<T, CatalogError>;
pub type FetchResult<T> = Result<T, FetchError>;
pub type FieldStoreResult<T> = Result<T, FieldStoreError>;
