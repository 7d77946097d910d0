//! Session CRUD HTTP handlers.
//!
//! Endpoints:
//! - GET    /api/v1/chat/history/{session_id} - Message history (safe to probe)
//! - GET    /api/v1/chat/sessions             - List sessions, newest-updated first
//! - PUT    /api/v1/chat/rename/{session_id}  - Set the stored title
//! - DELETE /api/v1/chat/{session_id}         - Delete a session and its log

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use relaychat_core::chat::store::SessionStore;
use relaychat_types::chat::{ChatMessage, Role, SessionSummary};
use relaychat_types::error::RepositoryError;

use crate::http::error::AppError;
use crate::http::identity::Identity;
use crate::state::AppState;

/// One history entry in the wire shape of the history endpoint.
#[derive(Debug, Serialize)]
pub struct MessageView {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl From<ChatMessage> for MessageView {
    fn from(m: ChatMessage) -> Self {
        Self {
            role: m.role,
            content: m.content,
            timestamp: m.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub messages: Vec<MessageView>,
}

/// Request body for the rename endpoint.
#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub title: String,
}

/// GET /api/v1/chat/history/{session_id} - Message history for a session.
///
/// Returns an empty list (never a 404) for unknown sessions, so clients can
/// probe a fresh session id before the first turn.
pub async fn get_history(
    State(state): State<AppState>,
    Identity(owner): Identity,
    Path(session_id): Path<String>,
) -> Result<Json<HistoryResponse>, AppError> {
    let messages = match state.store.messages(&session_id, &owner).await {
        Ok(messages) => messages,
        Err(RepositoryError::NotFound) => Vec::new(),
        Err(e) => return Err(e.into()),
    };

    Ok(Json(HistoryResponse {
        messages: messages.into_iter().map(MessageView::from).collect(),
    }))
}

/// GET /api/v1/chat/sessions - List sessions, most recently updated first.
pub async fn list_sessions(
    State(state): State<AppState>,
    Identity(owner): Identity,
) -> Result<Json<Vec<SessionSummary>>, AppError> {
    let summaries = state
        .store
        .list(&owner, state.config.sessions.list_limit)
        .await?;
    Ok(Json(summaries))
}

/// PUT /api/v1/chat/rename/{session_id} - Set the stored session title.
pub async fn rename_session(
    State(state): State<AppState>,
    Identity(owner): Identity,
    Path(session_id): Path<String>,
    Json(body): Json<RenameRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.rename(&session_id, &owner, body.title).await?;
    Ok(Json(serde_json::json!({ "renamed": true })))
}

/// DELETE /api/v1/chat/{session_id} - Delete a session and its messages.
pub async fn delete_session(
    State(state): State<AppState>,
    Identity(owner): Identity,
    Path(session_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.delete(&session_id, &owner).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
