/*
 * fixture.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! A connector backed by JSON files, one per database.
//!
//! `<data_dir>/<database name>.json` maps qualified view names to their
//! rows:
//!
//! ```json
//! { "cbias_spravki.works": [ { "inn": "7701", "name": "Ремонт", "amount": 1500.25 } ] }
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use enquiry_template::Row;
use tracing::debug;

use crate::catalog::DatabaseDescriptor;
use crate::connector::{ColumnFilter, Connector, ViewSession};
use crate::error::{FetchError, FetchResult};

#[derive(Debug, Clone)]
pub struct FixtureConnector {
    data_dir: PathBuf,
}

impl FixtureConnector {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }
}

#[async_trait]
impl Connector for FixtureConnector {
    async fn connect(&self, database: &DatabaseDescriptor) -> FetchResult<Arc<dyn ViewSession>> {
        let path = self.data_dir.join(format!("{}.json", database.name));
        debug!(database = %database.name, path = %path.display(), "Opening fixture database");
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| FetchError::Connection {
                database: database.name.clone(),
                message: e.to_string(),
            })?;
        let views: BTreeMap<String, Vec<Row>> =
            serde_json::from_str(&content).map_err(|e| FetchError::Source {
                path: path.clone(),
                message: e.to_string(),
            })?;
        Ok(Arc::new(FixtureSession { views }))
    }
}

/// All views of one fixture database, held in memory.
#[derive(Debug, Clone, Default)]
pub struct FixtureSession {
    views: BTreeMap<String, Vec<Row>>,
}

impl FixtureSession {
    pub fn new(views: BTreeMap<String, Vec<Row>>) -> Self {
        Self { views }
    }

    fn view(&self, schema: &str, view: &str) -> FetchResult<&[Row]> {
        self.views
            .get(&format!("{schema}.{view}"))
            .map(Vec::as_slice)
            .ok_or_else(|| FetchError::ViewNotFound {
                schema: schema.to_string(),
                view: view.to_string(),
            })
    }
}

#[async_trait]
impl ViewSession for FixtureSession {
    async fn columns(&self, schema: &str, view: &str) -> FetchResult<Vec<String>> {
        let mut columns: Vec<String> = Vec::new();
        for row in self.view(schema, view)? {
            for name in row.keys() {
                if !columns.contains(name) {
                    columns.push(name.clone());
                }
            }
        }
        Ok(columns)
    }

    async fn select(
        &self,
        schema: &str,
        view: &str,
        filters: &[ColumnFilter],
    ) -> FetchResult<Vec<Row>> {
        Ok(self
            .view(schema, view)?
            .iter()
            .filter(|row| filters.iter().all(|f| f.matches(row)))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enquiry_template::Scalar;
    use pretty_assertions::assert_eq;

    fn session() -> FixtureSession {
        serde_json::from_str::<BTreeMap<String, Vec<Row>>>(
            r#"{"s.works": [
                {"inn": "7701", "name": "Ремонт"},
                {"inn": 7702, "name": "Покраска", "note": null}
            ]}"#,
        )
        .map(FixtureSession::new)
        .unwrap()
    }

    #[tokio::test]
    async fn test_columns_union_in_order() {
        let columns = session().columns("s", "works").await.unwrap();
        assert_eq!(columns, vec!["inn", "name", "note"]);
    }

    #[tokio::test]
    async fn test_select_compares_text() {
        let filter = ColumnFilter {
            column: "inn".to_string(),
            values: vec![Scalar::Integer(7701), Scalar::text("7702")],
        };
        let rows = session().select("s", "works", &[filter]).await.unwrap();
        assert_eq!(rows.len(), 2);

        let filter = ColumnFilter {
            column: "inn".to_string(),
            values: vec![Scalar::text("7702")],
        };
        let rows = session().select("s", "works", &[filter]).await.unwrap();
        assert_eq!(rows[0].get("name"), Some(&Scalar::text("Покраска")));
    }

    #[tokio::test]
    async fn test_missing_view() {
        let err = session().select("s", "absent", &[]).await.unwrap_err();
        assert!(matches!(err, FetchError::ViewNotFound { .. }));
    }

    #[tokio::test]
    async fn test_missing_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let connector = FixtureConnector::new(dir.path());
        let database = DatabaseDescriptor {
            id: 1,
            dbms: "postgresql".to_string(),
            host: String::new(),
            port: None,
            name: "absent".to_string(),
            username: String::new(),
            password: String::new(),
        };
        let err = connector.connect(&database).await.err().unwrap();
        assert!(matches!(err, FetchError::Connection { .. }));
    }
}
