use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use selector_core::{
    IngestResponse, Intent, Payload, TranslateRequest, TreeError, ValidationResponse,
};

use super::AppState;
use crate::client::{ClientError, RequestKind};
use crate::sessions::SessionView;

type ApiResult<T> = Result<T, (StatusCode, String)>;

// ============================================================
// Error Handling
// ============================================================

fn session_not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Session not found".to_string())
}

fn no_tree_loaded() -> (StatusCode, String) {
    (StatusCode::CONFLICT, "No feature model loaded".to_string())
}

fn tree_error(e: TreeError) -> (StatusCode, String) {
    tracing::warn!("Malformed tree: {}", e);
    (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
}

/// Map a backend failure to a status the caller can act on. Nothing here is
/// retried; the session is left as it was.
fn client_error(e: ClientError) -> (StatusCode, String) {
    match e {
        ClientError::Malformed(e) => tree_error(e),
        ClientError::Superseded(_) => {
            tracing::debug!("{}", e);
            (StatusCode::CONFLICT, e.to_string())
        }
        ClientError::Timeout => {
            tracing::warn!("Backend request timed out");
            (StatusCode::GATEWAY_TIMEOUT, e.to_string())
        }
        ClientError::Http(_) | ClientError::Server(_) => {
            tracing::warn!("Backend request failed: {}", e);
            (StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Sessions
// ============================================================

pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionView>) {
    (StatusCode::CREATED, Json(state.sessions.create()))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionView>> {
    state.sessions.view(id).map(Json).ok_or_else(session_not_found)
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.sessions.remove(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found())
    }
}

// ============================================================
// Feature Model Intake
// ============================================================

/// Install an already ingested tree. A malformed tree leaves the session empty.
pub async fn install_tree(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(response): Json<IngestResponse>,
) -> ApiResult<Json<SessionView>> {
    state
        .sessions
        .with_session(id, |entry| -> ApiResult<Json<SessionView>> {
            entry
                .session
                .load(&response)
                .map(|_| ())
                .map_err(tree_error)?;
            Ok(Json(SessionView::from(&*entry)))
        })
        .ok_or_else(session_not_found)?
}

/// Forward a raw feature-model document to the ingestion backend.
pub async fn upload_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    document: String,
) -> ApiResult<Json<SessionView>> {
    let slot = state
        .sessions
        .with_session(id, |entry| entry.requests.ingest.clone())
        .ok_or_else(session_not_found)?;

    let backend = state.backend.clone();
    let response = slot
        .run(RequestKind::Ingest, async move { backend.ingest(document).await })
        .await
        .map_err(client_error)?;

    install_tree(State(state), Path(id), Json(response)).await
}

// ============================================================
// Interaction
// ============================================================

#[derive(Debug, Deserialize)]
pub struct ToggleInput {
    pub id: String,
    /// Desired checkbox state.
    pub checked: bool,
}

pub async fn toggle_feature(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ToggleInput>,
) -> ApiResult<Json<SessionView>> {
    state
        .sessions
        .with_session(id, |entry| {
            entry
                .session
                .update(&input.id, Intent::from_checked(input.checked));
            Json(SessionView::from(&*entry))
        })
        .ok_or_else(session_not_found)
}

#[derive(Debug, Deserialize)]
pub struct ExpandInput {
    pub id: String,
}

pub async fn toggle_expand(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ExpandInput>,
) -> ApiResult<Json<SessionView>> {
    state
        .sessions
        .with_session(id, |entry| {
            entry.session.toggle_expand(&input.id);
            Json(SessionView::from(&*entry))
        })
        .ok_or_else(session_not_found)
}

#[derive(Debug, Deserialize)]
pub struct PolicyInput {
    pub enforce_xor: bool,
}

pub async fn set_policy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<PolicyInput>,
) -> ApiResult<Json<SessionView>> {
    state
        .sessions
        .with_session(id, |entry| {
            entry.session.set_enforce_xor(input.enforce_xor);
            Json(SessionView::from(&*entry))
        })
        .ok_or_else(session_not_found)
}

// ============================================================
// Outputs and Collaborators
// ============================================================

pub async fn get_payload(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Payload>> {
    state
        .sessions
        .with_session(id, |entry| entry.session.payload())
        .ok_or_else(session_not_found)?
        .map(Json)
        .ok_or_else(no_tree_loaded)
}

#[derive(Debug, Deserialize)]
pub struct RenderQuery {
    /// Draw every branch regardless of expansion state.
    pub all: Option<bool>,
}

pub async fn render_tree(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<RenderQuery>,
) -> ApiResult<String> {
    let expand_all = query.all.unwrap_or(false);
    state
        .sessions
        .with_session(id, |entry| entry.session.render(expand_all))
        .ok_or_else(session_not_found)?
        .ok_or_else(no_tree_loaded)
}

pub async fn validate_selection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ValidationResponse>> {
    let (request, slot) = state
        .sessions
        .with_session(id, |entry| {
            entry
                .session
                .validation_request()
                .map(|request| (request, entry.requests.validate.clone()))
        })
        .ok_or_else(session_not_found)?
        .ok_or_else(no_tree_loaded)?;

    let backend = state.backend.clone();
    let verdict = slot
        .run(RequestKind::Validate, async move {
            backend.validate(&request).await
        })
        .await
        .map_err(client_error)?;

    tracing::info!(session = %id, valid = verdict.is_valid, "Validated selection");
    Ok(Json(verdict))
}

pub async fn translate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<TranslateRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let slot = state
        .sessions
        .with_session(id, |entry| entry.requests.translate.clone())
        .ok_or_else(session_not_found)?;

    let backend = state.backend.clone();
    let translation = slot
        .run(RequestKind::Translate, async move {
            backend.translate(input.prompt).await
        })
        .await
        .map_err(client_error)?;

    Ok(Json(serde_json::json!({ "logic": translation.into_logic() })))
}
