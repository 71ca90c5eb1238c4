//! Axum route handlers for the Screening API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::screening::models::{ChatTurn, CompletionStatus};
use crate::screening::registry::SessionHandle;
use crate::screening::session::{Progress, SessionSummary};
use crate::screening::stage::Stage;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub reply: String,
    pub stage: Stage,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub reply: String,
    pub stage: Stage,
    pub ended: bool,
    pub completion_status: Option<CompletionStatus>,
    pub progress: Option<Progress>,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub stage: Stage,
    pub ended: bool,
    pub completion_status: Option<CompletionStatus>,
    pub progress: Option<Progress>,
    pub history: Vec<ChatTurn>,
    pub summary: Option<SessionSummary>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
///
/// Starts a conversation. The greeting is returned immediately; no input needed.
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<CreateSessionResponse>) {
    let (session, reply) = state.screener.start_session();
    let stage = session.stage;
    let session_id = state.sessions.insert(session).await;

    (
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id,
            reply,
            stage,
        }),
    )
}

/// POST /api/v1/sessions/:id/messages
///
/// Processes one candidate message. Holds only this session's lock for the turn.
pub async fn handle_post_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if request.message.trim().is_empty() {
        return Err(AppError::Validation("message cannot be empty".to_string()));
    }

    let handle = find_session(&state, id).await?;
    let mut session = handle.lock().await;

    let reply = state
        .screener
        .handle_message(&mut session, &request.message)
        .await;

    Ok(Json(MessageResponse {
        reply,
        stage: session.stage,
        ended: session.ended,
        completion_status: session.completion_status,
        progress: session.progress(state.screener.questions_per_tech()),
    }))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find_session(&state, id).await?;
    let session = handle.lock().await;

    Ok(Json(SessionView {
        session_id: session.id,
        stage: session.stage,
        ended: session.ended,
        completion_status: session.completion_status,
        progress: session.progress(state.screener.questions_per_tech()),
        history: session.history(),
        summary: session.summary(),
    }))
}

/// DELETE /api/v1/sessions/:id
///
/// Abandons the session. Nothing is persisted for it unless it was already finalized.
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("session {id}")))
    }
}

async fn find_session(state: &AppState, id: Uuid) -> Result<SessionHandle, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("session {id}")))
}
