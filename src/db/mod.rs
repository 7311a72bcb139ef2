//! Persistence collaborators: the checklist record store and the blob store
//! for uploaded photos and documents.

#[cfg(test)]
pub mod memory;
pub mod supabase;

use crate::domain::models::{ChecklistId, ChecklistSummary};
use crate::domain::record::{Record, RecordError};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("checklist {0} not found")]
    NotFound(ChecklistId),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("unexpected store response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

impl From<RecordError> for StoreError {
    fn from(err: RecordError) -> Self {
        StoreError::Malformed(err.to_string())
    }
}

/// Key-based store of flat checklist records.
#[async_trait]
pub trait ChecklistStore: Send + Sync {
    /// Inserts a new record and returns the id assigned by the store.
    async fn insert(&self, record: Record) -> Result<ChecklistId, StoreError>;

    /// Overwrites the columns present in `record` on an existing row.
    async fn update(&self, id: ChecklistId, record: Record) -> Result<(), StoreError>;

    async fn select(&self, id: ChecklistId) -> Result<Record, StoreError>;

    /// Most recently created first.
    async fn select_summaries(&self, limit: usize) -> Result<Vec<ChecklistSummary>, StoreError>;
}

/// Path prefix of an uploaded file, one per entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlobKind {
    SitePhoto,
    EmployeeDocument,
    EquipmentPhoto,
    NonConformityPhoto,
}

impl BlobKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            BlobKind::SitePhoto => "luoghi_lavoro",
            BlobKind::EmployeeDocument => "dipendenti",
            BlobKind::EquipmentPhoto => "attrezzature",
            BlobKind::NonConformityPhoto => "non_conformita",
        }
    }

    pub fn accepts(&self, file_name: &str) -> bool {
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match self {
            BlobKind::EmployeeDocument => matches!(ext.as_str(), "pdf" | "jpg" | "jpeg" | "png"),
            _ => matches!(ext.as_str(), "jpg" | "jpeg" | "png"),
        }
    }
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores the bytes under the kind's prefix and returns a public URL.
    async fn upload(
        &self,
        kind: BlobKind,
        bytes: Vec<u8>,
        original_name: &str,
    ) -> Result<String, StoreError>;
}

/// `<prefix>/<YYYYmmdd_HHMMSS>_<name>`; the timestamp keeps repeated uploads
/// of the same file name apart.
pub fn blob_path(kind: BlobKind, original_name: &str, now: DateTime<Local>) -> String {
    let name: String = original_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let name = if name.is_empty() { "file".to_string() } else { name };
    format!("{}/{}_{}", kind.prefix(), now.format("%Y%m%d_%H%M%S"), name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_blob_path_is_timestamped_and_sanitised() {
        let now = Local.with_ymd_and_hms(2024, 5, 2, 9, 15, 30).unwrap();
        assert_eq!(
            blob_path(BlobKind::SitePhoto, "foto magazzino.jpg", now),
            "luoghi_lavoro/20240502_091530_foto_magazzino.jpg"
        );
        assert_eq!(
            blob_path(BlobKind::EmployeeDocument, "../../etc/passwd", now),
            "dipendenti/20240502_091530_.._.._etc_passwd"
        );
    }

    #[test]
    fn test_accepted_extensions() {
        assert!(BlobKind::EmployeeDocument.accepts("attestato.PDF"));
        assert!(!BlobKind::SitePhoto.accepts("attestato.pdf"));
        assert!(BlobKind::NonConformityPhoto.accepts("nc.png"));
        assert!(!BlobKind::EquipmentPhoto.accepts("senza_estensione"));
    }
}
