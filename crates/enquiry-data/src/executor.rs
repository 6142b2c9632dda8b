/*
 * executor.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * External query execution
 */

//! Runs the queries of a template against their databases.

use std::collections::BTreeMap;
use std::sync::Arc;

use enquiry_template::{QueryResultSet, QueryResultStore, Scalar};
use futures::future::join_all;
use tracing::{debug, warn};

use crate::cache::SessionFactoryCache;
use crate::catalog::{Catalog, DatabaseId, QueryDefinition, TemplateDefinition};
use crate::connector::{ColumnFilter, Connector, ViewSession};
use crate::error::{FetchError, FetchResult};

/// Request filters: column name to the values it may take.
pub type FilterParams = BTreeMap<String, Vec<Scalar>>;

pub const DEFAULT_VIEW_SCHEMA: &str = "cbias_spravki";

/// Fetches query rows, keeping one session per database for its lifetime.
pub struct QueryExecutor {
    catalog: Arc<Catalog>,
    connector: Arc<dyn Connector>,
    sessions: SessionFactoryCache<DatabaseId, dyn ViewSession>,
    schema: String,
}

impl QueryExecutor {
    pub fn new(catalog: Arc<Catalog>, connector: Arc<dyn Connector>) -> Self {
        Self {
            catalog,
            connector,
            sessions: SessionFactoryCache::new(),
            schema: DEFAULT_VIEW_SCHEMA.to_string(),
        }
    }

    /// Schema the query views live in.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Fetch every query of `template` concurrently.
    ///
    /// A query that fails or returns nothing is logged and left out of the
    /// store; its placeholders then render as missing data.
    pub async fn fetch_all(
        &self,
        template: &TemplateDefinition,
        filters: &FilterParams,
    ) -> QueryResultStore {
        let queries: Vec<&QueryDefinition> = template.queries().collect();
        let results = join_all(queries.iter().map(|q| self.execute(q, filters))).await;

        let mut store = QueryResultStore::new();
        for (query, result) in queries.into_iter().zip(results) {
            match result {
                Ok(rows) => {
                    debug!(query_id = query.id, rows = rows.len(), "Fetched query");
                    store.insert(query.id, rows);
                }
                Err(e) if e.is_data_not_found() => {
                    debug!(query_id = query.id, ?filters, "{e}");
                }
                Err(e) => {
                    warn!(query_id = query.id, error = %e, "Query failed");
                }
            }
        }
        store
    }

    /// Fetch the rows of one query.
    pub async fn execute(
        &self,
        query: &QueryDefinition,
        filters: &FilterParams,
    ) -> FetchResult<QueryResultSet> {
        let session = self.session(query.database_id).await?;
        let view = query.view_name();

        let columns = session.columns(&self.schema, &view).await?;
        let applied: Vec<ColumnFilter> = filters
            .iter()
            .filter(|(column, _)| columns.contains(column))
            .map(|(column, values)| ColumnFilter {
                column: column.clone(),
                values: values.clone(),
            })
            .collect();

        let rows = session.select(&self.schema, &view, &applied).await?;
        if rows.is_empty() {
            return Err(FetchError::DataNotFound { query_id: query.id });
        }
        Ok(QueryResultSet::new(rows))
    }

    async fn session(&self, database_id: DatabaseId) -> FetchResult<Arc<dyn ViewSession>> {
        self.sessions
            .get_or_try_create(database_id, || async {
                let database = self
                    .catalog
                    .database(database_id)
                    .ok_or(FetchError::DatabaseNotFound { database_id })?;
                debug!(database_id, "Creating session for database");
                self.connector.connect(database).await
            })
            .await
    }
}
