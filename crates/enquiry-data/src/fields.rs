/*
 * fields.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Values users typed into an enquiry's form fields.
//!
//! Values are remembered so the form can offer them again. Deletion only
//! hides a value.
//!
//! [`InMemoryFieldValues`] forgets everything when the process ends;
//! [`JsonFieldValues`] keeps the records in a JSON file and rewrites it after
//! every change.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::catalog::EnquiryId;
use crate::error::{FieldStoreError, FieldStoreResult};

pub type FieldValueId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    pub id: FieldValueId,
    pub enquiry_id: EnquiryId,
    pub field_key: String,
    pub value: String,
    pub user_id: Option<u32>,
    pub created_at: DateTime<Local>,
    pub is_deleted: bool,
}

/// Persistence of form field values.
#[async_trait]
pub trait FieldValueStore: Send + Sync {
    /// Remember `value` for a field. Returns the new record, or `None` when
    /// the field already has this value.
    async fn record(
        &self,
        enquiry_id: EnquiryId,
        field_key: &str,
        value: &str,
        user_id: Option<u32>,
    ) -> FieldStoreResult<Option<FieldValue>>;

    /// Values of a field that are not deleted, oldest first.
    async fn values(&self, enquiry_id: EnquiryId, field_key: &str) -> FieldStoreResult<Vec<FieldValue>>;

    /// Hide a value. Returns `false` when it does not exist or belongs to
    /// another enquiry.
    async fn soft_delete(&self, enquiry_id: EnquiryId, id: FieldValueId) -> FieldStoreResult<bool>;
}

#[derive(Debug, Default)]
struct Records {
    next_id: FieldValueId,
    values: Vec<FieldValue>,
}

impl Records {
    fn from_values(values: Vec<FieldValue>) -> Self {
        let next_id = values.iter().map(|v| v.id).max().unwrap_or_default();
        Self { next_id, values }
    }

    fn record(
        &mut self,
        enquiry_id: EnquiryId,
        field_key: &str,
        value: &str,
        user_id: Option<u32>,
    ) -> Option<FieldValue> {
        let exists = self
            .values
            .iter()
            .any(|r| r.enquiry_id == enquiry_id && r.field_key == field_key && r.value == value);
        if exists {
            debug!(enquiry_id, field_key, "Field value already recorded");
            return None;
        }

        self.next_id += 1;
        let record = FieldValue {
            id: self.next_id,
            enquiry_id,
            field_key: field_key.to_string(),
            value: value.to_string(),
            user_id,
            created_at: Local::now(),
            is_deleted: false,
        };
        self.values.push(record.clone());
        debug!(enquiry_id, field_key, id = record.id, "Recorded field value");
        Some(record)
    }

    fn values(&self, enquiry_id: EnquiryId, field_key: &str) -> Vec<FieldValue> {
        self.values
            .iter()
            .filter(|r| r.enquiry_id == enquiry_id && r.field_key == field_key && !r.is_deleted)
            .cloned()
            .collect()
    }

    /// `Some(changed)` when the value may be deleted, `None` otherwise.
    fn soft_delete(&mut self, enquiry_id: EnquiryId, id: FieldValueId) -> Option<bool> {
        let Some(record) = self.values.iter_mut().find(|r| r.id == id) else {
            warn!(id, "Field value not found");
            return None;
        };
        if record.enquiry_id != enquiry_id {
            warn!(id, enquiry_id, "Field value belongs to another enquiry");
            return None;
        }
        let changed = !record.is_deleted;
        record.is_deleted = true;
        Some(changed)
    }
}

/// A [`FieldValueStore`] that lives as long as the process.
#[derive(Debug, Default)]
pub struct InMemoryFieldValues {
    records: Mutex<Records>,
}

impl InMemoryFieldValues {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FieldValueStore for InMemoryFieldValues {
    async fn record(
        &self,
        enquiry_id: EnquiryId,
        field_key: &str,
        value: &str,
        user_id: Option<u32>,
    ) -> FieldStoreResult<Option<FieldValue>> {
        Ok(self
            .records
            .lock()
            .await
            .record(enquiry_id, field_key, value, user_id))
    }

    async fn values(&self, enquiry_id: EnquiryId, field_key: &str) -> FieldStoreResult<Vec<FieldValue>> {
        Ok(self.records.lock().await.values(enquiry_id, field_key))
    }

    async fn soft_delete(&self, enquiry_id: EnquiryId, id: FieldValueId) -> FieldStoreResult<bool> {
        Ok(self.records.lock().await.soft_delete(enquiry_id, id).is_some())
    }
}

/// A [`FieldValueStore`] kept in a JSON file.
///
/// The file holds an array of [`FieldValue`] records, deleted ones included.
/// A missing file is an empty store; it is created on the first change.
#[derive(Debug)]
pub struct JsonFieldValues {
    path: PathBuf,
    records: Mutex<Records>,
}

impl JsonFieldValues {
    pub async fn open(path: impl Into<PathBuf>) -> FieldStoreResult<Self> {
        let path = path.into();
        let values = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| FieldStoreError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No field value file yet");
                Vec::new()
            }
            Err(source) => return Err(FieldStoreError::Read { path, source }),
        };
        Ok(Self {
            records: Mutex::new(Records::from_values(values)),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, records: &Records) -> FieldStoreResult<()> {
        let write_error = |source| FieldStoreError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
        }
        let bytes = serde_json::to_vec_pretty(&records.values).map_err(|e| write_error(e.into()))?;
        tokio::fs::write(&self.path, bytes).await.map_err(write_error)
    }
}

#[async_trait]
impl FieldValueStore for JsonFieldValues {
    async fn record(
        &self,
        enquiry_id: EnquiryId,
        field_key: &str,
        value: &str,
        user_id: Option<u32>,
    ) -> FieldStoreResult<Option<FieldValue>> {
        let mut records = self.records.lock().await;
        let record = records.record(enquiry_id, field_key, value, user_id);
        if record.is_some() {
            self.persist(&records).await?;
        }
        Ok(record)
    }

    async fn values(&self, enquiry_id: EnquiryId, field_key: &str) -> FieldStoreResult<Vec<FieldValue>> {
        Ok(self.records.lock().await.values(enquiry_id, field_key))
    }

    async fn soft_delete(&self, enquiry_id: EnquiryId, id: FieldValueId) -> FieldStoreResult<bool> {
        let mut records = self.records.lock().await;
        match records.soft_delete(enquiry_id, id) {
            Some(true) => {
                self.persist(&records).await?;
                Ok(true)
            }
            Some(false) => Ok(true),
            None => Ok(false),
        }
    }
}
