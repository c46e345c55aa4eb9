//! Error types for Sift.

use thiserror::Error;

/// Library-level error type for Sift operations.
#[derive(Error, Debug)]
pub enum SiftError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Agent creation failed: {0}")]
    AgentConstruction(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Streaming error: {0}")]
    Stream(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("LLM API error: {0}")]
    Llm(String),

    #[error("Tool failed: {0}")]
    Tool(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Sift operations.
pub type Result<T> = std::result::Result<T, SiftError>;
