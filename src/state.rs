use crate::db::BlobStore;
use crate::services::lifecycle::ChecklistManager;
use crate::services::transcription::Transcriber;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One operator, one draft: every request edits the same manager.
pub struct AppState {
    pub manager: RwLock<ChecklistManager>,
    pub blobs: Arc<dyn BlobStore>,
    pub transcriber: Arc<dyn Transcriber>,
    pub language: String,
}

pub type SharedState = Arc<AppState>;
