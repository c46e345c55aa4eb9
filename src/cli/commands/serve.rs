//! Serve command: run the HTTP chat API.

use crate::cli::Output;
use crate::config::Settings;
use crate::server::{self, AppState};
use std::sync::Arc;

/// Run the HTTP chat server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    Output::header("Sift API Server");
    println!();
    Output::kv("Model", &settings.agent.model);
    Output::kv("Address", &format!("http://{}:{}", host, port));
    if settings.agent.api_key().is_none() {
        Output::warning(&format!(
            "{} is not set. Chat requests will fail until it is exported.",
            settings.agent.api_key_env
        ));
    }
    println!();
    println!("Endpoints:");
    Output::kv("Chat (SSE)", "POST   /chat");
    Output::kv("Frontend", "GET    /");
    Output::kv("Sessions", "GET    /sessions");
    Output::kv("Session", "GET    /session/{id}");
    Output::kv("Delete", "DELETE /session/{id}");
    Output::kv("Health", "GET    /health");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    let state = Arc::new(AppState::new(settings));
    server::serve(state, &host, port).await
}
