use crate::db::BlobKind;
use crate::error::ChecklistError;
use crate::services::transcription::check_audio;
use crate::state::SharedState;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, State},
    routing::post,
    Json, Router,
};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

// photos and voice notes arrive base64-encoded inside JSON
const MAX_BODY_BYTES: usize = 40 * 1024 * 1024;

#[derive(Deserialize)]
pub struct UploadPayload {
    pub file_name: String,
    pub content_base64: String,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub url: String,
}

#[derive(Deserialize)]
pub struct TranscriptionPayload {
    pub file_name: String,
    pub audio_base64: String,
}

#[derive(Serialize)]
pub struct TranscriptionResponse {
    pub text: String,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/uploads/:kind", post(upload))
        .route("/transcriptions", post(transcribe))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

fn decode(encoded: &str) -> Result<Vec<u8>, ChecklistError> {
    general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| ChecklistError::validation(format!("invalid base64 content: {e}")))
}

async fn upload(
    State(state): State<SharedState>,
    Path(kind): Path<BlobKind>,
    payload: Result<Json<UploadPayload>, JsonRejection>,
) -> Result<Json<UploadResponse>, ChecklistError> {
    let Json(payload) = payload?;
    if !kind.accepts(&payload.file_name) {
        return Err(ChecklistError::validation(format!(
            "file type of '{}' is not accepted here",
            payload.file_name
        )));
    }
    let bytes = decode(&payload.content_base64)?;
    if bytes.is_empty() {
        return Err(ChecklistError::validation("file is empty"));
    }

    let url = state
        .blobs
        .upload(kind, bytes, &payload.file_name)
        .await
        .map_err(|e| {
            tracing::error!("Failed to upload {}: {}", payload.file_name, e);
            ChecklistError::Upload(e.to_string())
        })?;
    Ok(Json(UploadResponse { url }))
}

async fn transcribe(
    State(state): State<SharedState>,
    payload: Result<Json<TranscriptionPayload>, JsonRejection>,
) -> Result<Json<TranscriptionResponse>, ChecklistError> {
    let Json(payload) = payload?;
    let audio = decode(&payload.audio_base64)?;
    check_audio(&payload.file_name, &audio).map_err(ChecklistError::Validation)?;

    let text = state
        .transcriber
        .transcribe(audio, &payload.file_name, &state.language)
        .await
        .map_err(|e| {
            tracing::warn!("Transcription of {} failed: {}", payload.file_name, e);
            ChecklistError::from(e)
        })?;
    Ok(Json(TranscriptionResponse { text }))
}
