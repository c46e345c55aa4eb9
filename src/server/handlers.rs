//! Route handlers.

use super::error::{ApiError, ApiJson};
use super::AppState;
use crate::error::SiftError;
use crate::relay::relay;
use crate::session::{Message, SessionSummary};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, Sse},
        Html, IntoResponse, Response,
    },
    Json,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

const FRONTEND_NOT_FOUND: &str =
    "<h1>Frontend not found</h1><p>Please create an index.html file</p>";

// === Request/Response Types ===

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// User's message; must be non-empty.
    pub message: String,
    /// Session to continue; a new one is created when absent or unknown.
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Serialize)]
struct SessionListResponse {
    sessions: Vec<SessionSummary>,
}

#[derive(Serialize)]
struct SessionResponse {
    session_id: String,
    history: Vec<Message>,
}

#[derive(Serialize)]
struct DeleteResponse {
    message: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    active_sessions: usize,
    groq_api_configured: bool,
    version: &'static str,
}

// === Handlers ===

pub async fn chat(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ChatRequest>,
) -> Result<Response, ApiError> {
    if req.message.is_empty() {
        return Err(ApiError::unprocessable("message must not be empty"));
    }

    if !state.agents.credentials_configured() {
        return Err(ApiError::internal(format!(
            "{} missing",
            state.settings.agent.api_key_env
        )));
    }

    let session_id = state.sessions.resolve_or_create(req.session_id.as_deref());
    info!("[{}] POST /chat ({} chars)", session_id, req.message.len());

    let agent = state
        .agents
        .build(&state.sessions, &session_id)
        .map_err(|e| {
            error!("[{}] Agent creation error: {}", session_id, e);
            match e {
                SiftError::Config(_) | SiftError::AgentConstruction(_) => e,
                other => SiftError::AgentConstruction(other.to_string()),
            }
        })?;

    let events = relay(
        agent,
        state.sessions.clone(),
        session_id,
        req.message,
        Duration::from_millis(state.settings.server.throttle_ms),
    )
    .map(|event| Event::default().json_data(event));

    Ok(Sse::new(events).into_response())
}

pub async fn root(State(state): State<Arc<AppState>>) -> Response {
    match tokio::fs::read_to_string(state.settings.index_path()).await {
        Ok(page) => Html(page).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, Html(FRONTEND_NOT_FOUND)).into_response(),
    }
}

pub async fn list_sessions(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(SessionListResponse {
        sessions: state.sessions.list(),
    })
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let history = state.sessions.get(&session_id)?;
    Ok(Json(SessionResponse {
        session_id,
        history,
    }))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.sessions.delete(&session_id)?;
    info!("[{}] Session deleted", session_id);
    Ok(Json(DeleteResponse {
        message: format!("Session {} deleted successfully", session_id),
    }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        active_sessions: state.sessions.len(),
        groq_api_configured: state.agents.credentials_configured(),
        version: env!("CARGO_PKG_VERSION"),
    })
}
