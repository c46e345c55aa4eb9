//! HTTP API: streaming chat plus session inspection.
//!
//! Routes:
//! - `POST /chat` streams a reply as Server-Sent Events
//! - `GET /` serves the static frontend page
//! - `GET /sessions`, `GET /session/{id}`, `DELETE /session/{id}`
//! - `GET /health`

mod error;
mod handlers;

pub use error::{ApiError, ErrorBody};
pub use handlers::ChatRequest;

use crate::agent::{AgentFactory, GroqAgentFactory};
use crate::config::Settings;
use crate::session::SessionStore;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared application state.
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub agents: Arc<dyn AgentFactory>,
    pub settings: Settings,
}

impl AppState {
    /// State backed by the Groq agent factory and an empty session store.
    pub fn new(settings: Settings) -> Self {
        let agents = Arc::new(GroqAgentFactory::new(settings.clone()));
        Self::with_factory(settings, agents)
    }

    /// State with a custom agent factory.
    pub fn with_factory(settings: Settings, agents: Arc<dyn AgentFactory>) -> Self {
        Self {
            sessions: Arc::new(SessionStore::new()),
            agents,
            settings,
        }
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/chat", post(handlers::chat))
        .route("/sessions", get(handlers::list_sessions))
        .route(
            "/session/{session_id}",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl+C.
pub async fn serve(state: Arc<AppState>, host: &str, port: u16) -> anyhow::Result<()> {
    if state.agents.credentials_configured() {
        info!("{} found.", state.settings.agent.api_key_env);
    } else {
        warn!(
            "{} not set; /chat will answer 500 until it is exported.",
            state.settings.agent.api_key_env
        );
    }

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
