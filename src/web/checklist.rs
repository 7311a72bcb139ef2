use crate::domain::hazards::Hazard;
use crate::domain::models::{Checklist, ChecklistSummary};
use crate::error::ChecklistError;
use crate::services::dvr::{generate_dvr, DvrOutcome};
use crate::services::lifecycle::{Collection, CompletionForm, Stage, SurveyForm, RECENT_LIMIT};
use crate::services::report::{self, OfferReport, Report};
use crate::state::SharedState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

type ChecklistResult<T> = Result<Json<T>, ChecklistError>;

#[derive(Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct HazardNotePayload {
    pub note: String,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(current))
        .route("/new", post(start_new))
        .route("/recent", get(recent))
        .route("/load/:id", post(load))
        .route("/survey", post(save_survey))
        .route("/completion", post(save_completion))
        .route("/offer", get(offer))
        .route("/report", get(report_json))
        .route("/report/text", get(report_text))
        .route("/dvr", post(dvr))
        .route("/hazards/:label", post(select_hazard).delete(deselect_hazard))
        .route("/hazards/:label/note", put(set_hazard_note))
        .route("/:collection", post(add_item))
        .route("/:collection/:index", delete(remove_item))
        .with_state(state)
}

async fn current(State(state): State<SharedState>) -> Json<Checklist> {
    Json(state.manager.read().await.draft().clone())
}

async fn start_new(State(state): State<SharedState>) -> Json<Checklist> {
    Json(state.manager.write().await.start_new().clone())
}

async fn recent(
    State(state): State<SharedState>,
    Query(query): Query<RecentQuery>,
) -> Json<Vec<ChecklistSummary>> {
    let limit = query.limit.unwrap_or(RECENT_LIMIT);
    Json(state.manager.read().await.list_recent(limit).await)
}

async fn load(State(state): State<SharedState>, Path(id): Path<Uuid>) -> ChecklistResult<Checklist> {
    let mut manager = state.manager.write().await;
    Ok(Json(manager.load(id).await?.clone()))
}

async fn save_survey(
    State(state): State<SharedState>,
    form: Result<Json<SurveyForm>, JsonRejection>,
) -> ChecklistResult<Checklist> {
    let Json(form) = form?;
    let mut manager = state.manager.write().await;
    Ok(Json(manager.save_stage(Stage::Survey(form)).await?.clone()))
}

async fn save_completion(
    State(state): State<SharedState>,
    form: Result<Json<CompletionForm>, JsonRejection>,
) -> ChecklistResult<Checklist> {
    let Json(form) = form?;
    let mut manager = state.manager.write().await;
    Ok(Json(manager.save_stage(Stage::Completion(form)).await?.clone()))
}

fn item<T: DeserializeOwned>(collection: Collection, body: Value) -> Result<T, ChecklistError> {
    serde_json::from_value(body).map_err(|e| {
        ChecklistError::validation(format!("invalid {} entry: {}", collection.label(), e))
    })
}

async fn add_item(
    State(state): State<SharedState>,
    Path(collection): Path<Collection>,
    body: Result<Json<Value>, JsonRejection>,
) -> ChecklistResult<Checklist> {
    let Json(body) = body?;
    let mut manager = state.manager.write().await;
    let draft = match collection {
        Collection::Sites => manager.add_site(item(collection, body)?)?,
        Collection::Employees => manager.add_employee(item(collection, body)?)?,
        Collection::Equipment => manager.add_equipment(item(collection, body)?)?,
        Collection::NonConformities => manager.add_non_conformity(item(collection, body)?)?,
        Collection::Services => manager.add_service(item(collection, body)?)?,
        Collection::JobRoles => manager.add_job_role(item(collection, body)?)?,
        Collection::ImprovementActions => {
            manager.add_improvement_action(item(collection, body)?)?
        }
    };
    Ok(Json(draft.clone()))
}

async fn remove_item(
    State(state): State<SharedState>,
    Path((collection, index)): Path<(Collection, usize)>,
) -> ChecklistResult<Checklist> {
    let mut manager = state.manager.write().await;
    Ok(Json(manager.remove(collection, index)?.clone()))
}

fn hazard(label: &str) -> Result<Hazard, ChecklistError> {
    label
        .parse::<Hazard>()
        .map_err(|e| ChecklistError::validation(e.to_string()))
}

async fn select_hazard(
    State(state): State<SharedState>,
    Path(label): Path<String>,
) -> ChecklistResult<Checklist> {
    let hazard = hazard(&label)?;
    Ok(Json(state.manager.write().await.select_hazard(hazard).clone()))
}

async fn set_hazard_note(
    State(state): State<SharedState>,
    Path(label): Path<String>,
    payload: Result<Json<HazardNotePayload>, JsonRejection>,
) -> ChecklistResult<Checklist> {
    let Json(payload) = payload?;
    let hazard = hazard(&label)?;
    let mut manager = state.manager.write().await;
    Ok(Json(manager.set_hazard_note(hazard, payload.note)?.clone()))
}

async fn deselect_hazard(
    State(state): State<SharedState>,
    Path(label): Path<String>,
) -> ChecklistResult<Checklist> {
    let hazard = hazard(&label)?;
    Ok(Json(state.manager.write().await.deselect_hazard(hazard).clone()))
}

async fn offer(State(state): State<SharedState>) -> Json<OfferReport> {
    Json(report::render(state.manager.read().await.draft()).offer)
}

async fn report_json(State(state): State<SharedState>) -> Json<Report> {
    Json(report::render(state.manager.read().await.draft()))
}

async fn report_text(State(state): State<SharedState>) -> String {
    report::render(state.manager.read().await.draft()).to_string()
}

async fn dvr(
    State(state): State<SharedState>,
) -> Result<(StatusCode, Json<DvrOutcome>), ChecklistError> {
    let manager = state.manager.read().await;
    if manager.id().is_none() {
        return Err(ChecklistError::validation(
            "save the checklist before generating the DVR",
        ));
    }
    Ok((StatusCode::NOT_IMPLEMENTED, Json(generate_dvr(manager.draft()))))
}
