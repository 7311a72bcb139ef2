use crate::db::StoreError;
use crate::domain::models::ChecklistId;
use crate::domain::record::RecordError;
use crate::services::transcription::TranscriptionError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Every failure a user action can end with. None of them is fatal: the
/// in-memory draft is left as it was before the action.
#[derive(Debug, Error)]
pub enum ChecklistError {
    #[error("{0}")]
    Validation(String),
    #[error("checklist {0} not found")]
    NotFound(ChecklistId),
    #[error("persistence unavailable: {0}")]
    Persistence(String),
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("transcription failed: {0}")]
    Transcription(#[from] TranscriptionError),
    #[error("{collection}: no item at position {index} (length {len})")]
    IndexOutOfRange {
        collection: &'static str,
        index: usize,
        len: usize,
    },
}

impl ChecklistError {
    pub fn validation(message: impl Into<String>) -> Self {
        ChecklistError::Validation(message.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ChecklistError::Validation(_) => "validation",
            ChecklistError::NotFound(_) => "not_found",
            ChecklistError::Persistence(_) => "persistence",
            ChecklistError::Upload(_) => "upload",
            ChecklistError::Transcription(_) => "transcription",
            ChecklistError::IndexOutOfRange { .. } => "index_out_of_range",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ChecklistError::Validation(_) | ChecklistError::IndexOutOfRange { .. } => {
                StatusCode::BAD_REQUEST
            }
            ChecklistError::NotFound(_) => StatusCode::NOT_FOUND,
            ChecklistError::Persistence(_)
            | ChecklistError::Upload(_)
            | ChecklistError::Transcription(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<StoreError> for ChecklistError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ChecklistError::NotFound(id),
            other => ChecklistError::Persistence(other.to_string()),
        }
    }
}

impl From<RecordError> for ChecklistError {
    fn from(err: RecordError) -> Self {
        ChecklistError::Persistence(err.to_string())
    }
}

impl From<JsonRejection> for ChecklistError {
    fn from(rejection: JsonRejection) -> Self {
        ChecklistError::Validation(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ChecklistError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
