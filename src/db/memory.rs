use crate::db::{blob_path, BlobKind, BlobStore, ChecklistStore, StoreError};
use crate::domain::models::{ChecklistId, ChecklistSummary};
use crate::domain::record::Record;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-process stand-in for the Supabase backend.
#[derive(Default)]
pub struct MemoryStore {
    rows: RwLock<Vec<(ChecklistId, Record)>>,
    unavailable: AtomicBool,
    pub uploads: RwLock<Vec<(String, Vec<u8>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail as if the backend were down.
    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::SeqCst);
    }

    pub async fn raw(&self, id: ChecklistId) -> Option<Record> {
        self.rows
            .read()
            .await
            .iter()
            .find(|(row_id, _)| *row_id == id)
            .map(|(_, record)| record.clone())
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    fn guard(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChecklistStore for MemoryStore {
    async fn insert(&self, mut record: Record) -> Result<ChecklistId, StoreError> {
        self.guard()?;
        let mut rows = self.rows.write().await;
        let id = Uuid::new_v4();
        // strictly increasing creation times keep ordering deterministic
        let created_at = Utc::now() + Duration::milliseconds(rows.len() as i64);
        record.insert("id".to_string(), Value::String(id.to_string()));
        record.insert("created_at".to_string(), Value::String(created_at.to_rfc3339()));
        rows.push((id, record));
        Ok(id)
    }

    async fn update(&self, id: ChecklistId, record: Record) -> Result<(), StoreError> {
        self.guard()?;
        let mut rows = self.rows.write().await;
        let (_, row) = rows
            .iter_mut()
            .find(|(row_id, _)| *row_id == id)
            .ok_or(StoreError::NotFound(id))?;
        for (key, value) in record {
            row.insert(key, value);
        }
        Ok(())
    }

    async fn select(&self, id: ChecklistId) -> Result<Record, StoreError> {
        self.guard()?;
        self.raw(id).await.ok_or(StoreError::NotFound(id))
    }

    async fn select_summaries(&self, limit: usize) -> Result<Vec<ChecklistSummary>, StoreError> {
        self.guard()?;
        let rows = self.rows.read().await;
        rows.iter()
            .rev()
            .take(limit)
            .map(|(_, record)| {
                serde_json::from_value(Value::Object(record.clone()))
                    .map_err(|e| StoreError::Malformed(e.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn upload(
        &self,
        kind: BlobKind,
        bytes: Vec<u8>,
        original_name: &str,
    ) -> Result<String, StoreError> {
        self.guard()?;
        let path = blob_path(kind, original_name, chrono::Local::now());
        self.uploads.write().await.push((path.clone(), bytes));
        Ok(format!("memory://{path}"))
    }
}
