pub mod checklist;
pub mod media;

use crate::state::SharedState;
use axum::{routing::get, Router};

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/checklist", checklist::router(state.clone()))
        .merge(media::router(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::services::lifecycle::ChecklistManager;
    use crate::services::transcription::StaticTranscriber;
    use crate::state::AppState;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use base64::{engine::general_purpose, Engine as _};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tokio::sync::RwLock;
    use tower::ServiceExt as _;

    fn make_state(store: Arc<MemoryStore>, transcript: Option<&str>) -> SharedState {
        Arc::new(AppState {
            manager: RwLock::new(ChecklistManager::new(store.clone())),
            blobs: store,
            transcriber: Arc::new(StaticTranscriber(transcript.map(str::to_string))),
            language: "it".to_string(),
        })
    }

    async fn send_raw(
        state: &SharedState,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = routes(state.clone()).oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    async fn send(
        state: &SharedState,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, bytes) = send_raw(state, method, uri, body).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let state = make_state(Arc::new(MemoryStore::new()), None);
        let (status, body) = send_raw(&state, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");
    }

    #[tokio::test]
    async fn test_survey_then_completion_flow() {
        let store = Arc::new(MemoryStore::new());
        let state = make_state(store.clone(), None);

        let (status, draft) = send(
            &state,
            "POST",
            "/checklist/sites",
            Some(json!({ "nome": "Magazzino", "superficie_mq": 120 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(draft["luoghi_lavoro"][0]["nome"], "Magazzino");

        let (status, saved) = send(
            &state,
            "POST",
            "/checklist/survey",
            Some(json!({ "ragione_sociale": "Acme Srl", "n_dipendenti": 12 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["status"], "bozza");
        let id = saved["id"].as_str().unwrap().to_string();

        send(
            &state,
            "POST",
            "/checklist/services",
            Some(json!({
                "nome": "DVR",
                "dettaglio": { "categoria": "documento", "ore": 6.0 },
                "prezzo": 350.0
            })),
        )
        .await;
        let (status, done) = send(
            &state,
            "POST",
            "/checklist/completion",
            Some(json!({ "ciclo_lavorativo": "Ricevimento merci" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(done["status"], "completa");
        assert_eq!(done["id"], id.as_str());
        assert_eq!(done["luoghi_lavoro"][0]["superficie_mq"], 120);
        assert_eq!(store.len().await, 1);

        let (status, recent) = send(&state, "GET", "/checklist/recent?limit=5", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(recent[0]["ragione_sociale"], "Acme Srl");
        assert_eq!(recent[0]["status"], "completa");

        let (_, offer) = send(&state, "GET", "/checklist/offer", None).await;
        assert_eq!(offer["totale_offerta"], 350.0);
        assert_eq!(offer["groups"][0]["titolo"], "Documenti");

        send(&state, "POST", "/checklist/new", None).await;
        let (status, loaded) = send(&state, "POST", &format!("/checklist/load/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(loaded["ciclo_lavorativo"], "Ricevimento merci");
    }

    #[tokio::test]
    async fn test_error_responses() {
        let store = Arc::new(MemoryStore::new());
        let state = make_state(store.clone(), None);

        let (status, body) = send(&state, "POST", "/checklist/survey", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation");

        let (status, body) = send(
            &state,
            "POST",
            "/checklist/survey",
            Some(json!({ "ragione_sociale": "Acme Srl", "n_dipendenti": -1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation");
        assert!(body["message"].as_str().unwrap().contains("n_dipendenti"));

        let (status, body) = send(&state, "POST", "/checklist/completion", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation");

        let (status, body) = send(
            &state,
            "POST",
            "/uploads/site-photo",
            Some(json!({ "file_name": "magazzino.png" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation");
        assert_eq!(store.uploads.read().await.len(), 0);

        let (status, body) = send(&state, "DELETE", "/checklist/employees/3", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "index_out_of_range");

        let (status, body) = send(
            &state,
            "POST",
            &format!("/checklist/load/{}", uuid::Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");

        store.set_unavailable(true);
        let (status, body) = send(
            &state,
            "POST",
            "/checklist/survey",
            Some(json!({ "ragione_sociale": "Acme Srl" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "persistence");
        let (_, draft) = send(&state, "GET", "/checklist", None).await;
        assert!(draft.get("id").is_none());
        assert_eq!(draft["ragione_sociale"], "");
    }

    #[tokio::test]
    async fn test_hazards_by_label() {
        let state = make_state(Arc::new(MemoryStore::new()), None);

        let (status, _) = send(&state, "POST", "/checklist/hazards/Rumore", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, draft) = send(
            &state,
            "PUT",
            "/checklist/hazards/Rumore/note",
            Some(json!({ "note": "livello 85dB" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(draft["rischi_selezionati"]["Rumore"]["note"], "livello 85dB");
        assert_eq!(draft["rischi_selezionati"]["Rumore"]["presente"], true);

        let (status, _) = send(
            &state,
            "PUT",
            "/checklist/hazards/Incendio%20ed%20esplosione/note",
            Some(json!({ "note": "deposito carta" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&state, "POST", "/checklist/hazards/Meteoriti", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, draft) = send(&state, "DELETE", "/checklist/hazards/Rumore", None).await;
        assert!(draft["rischi_selezionati"].get("Rumore").is_none());
    }

    #[tokio::test]
    async fn test_report_and_dvr() {
        let state = make_state(Arc::new(MemoryStore::new()), None);

        let (status, text) = send_raw(&state, "GET", "/checklist/report/text", None).await;
        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(text).unwrap();
        assert!(text.contains("Nessun luogo di lavoro inserito"));
        assert!(text.contains("Nessun servizio in offerta"));

        let (status, _) = send(&state, "POST", "/checklist/dvr", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        send(
            &state,
            "POST",
            "/checklist/survey",
            Some(json!({ "ragione_sociale": "Acme Srl" })),
        )
        .await;
        let (status, body) = send(&state, "POST", "/checklist/dvr", None).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(body["status"], "not_yet_available");
        assert_eq!(body["preview"]["ragione_sociale"], "Acme Srl");

        let (_, report) = send(&state, "GET", "/checklist/report", None).await;
        assert_eq!(report["company"]["stato"], "Bozza");
    }

    #[tokio::test]
    async fn test_uploads() {
        let store = Arc::new(MemoryStore::new());
        let state = make_state(store.clone(), None);
        let content = general_purpose::STANDARD.encode(b"\x89PNG fake");

        let (status, body) = send(
            &state,
            "POST",
            "/uploads/site-photo",
            Some(json!({ "file_name": "magazzino.png", "content_base64": content })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let url = body["url"].as_str().unwrap();
        assert!(url.starts_with("memory://luoghi_lavoro/"));
        assert!(url.ends_with("_magazzino.png"));
        assert_eq!(store.uploads.read().await.len(), 1);

        let (status, _) = send(
            &state,
            "POST",
            "/uploads/site-photo",
            Some(json!({ "file_name": "contratto.pdf", "content_base64": content })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        store.set_unavailable(true);
        let (status, body) = send(
            &state,
            "POST",
            "/uploads/employee-document",
            Some(json!({ "file_name": "contratto.pdf", "content_base64": content })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "upload");
    }

    #[tokio::test]
    async fn test_transcriptions() {
        let audio = general_purpose::STANDARD.encode(b"ID3 fake audio");
        let payload = json!({ "file_name": "nota.mp3", "audio_base64": audio });

        let state = make_state(Arc::new(MemoryStore::new()), Some("Presenza di muffa"));
        let (status, body) = send(&state, "POST", "/transcriptions", Some(payload.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "Presenza di muffa");

        let (status, _) = send(
            &state,
            "POST",
            "/transcriptions",
            Some(json!({ "file_name": "nota.ogg", "audio_base64": audio })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let failing = make_state(Arc::new(MemoryStore::new()), None);
        let (status, body) = send(&failing, "POST", "/transcriptions", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "transcription");
    }
}
