//! Sift - streaming research assistant
//!
//! An HTTP chat facade over a tool-using language model agent. Each chat
//! turn is answered by an agent that can search the web and read articles,
//! and the reply is streamed back to the client as Server-Sent Events.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management and prompt templates
//! - `session` - In-memory conversation store
//! - `llm` - OpenAI-compatible client construction
//! - `agent` - Agent factory, streaming tool loop and web tools
//! - `relay` - Converts an agent stream into chat events
//! - `server` - HTTP routes
//! - `client` - Client for the streaming chat API
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sift::config::Settings;
//! use sift::server::{self, AppState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let (host, port) = (settings.server.host.clone(), settings.server.port);
//!     server::serve(Arc::new(AppState::new(settings)), &host, port).await
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod llm;
pub mod relay;
pub mod server;
pub mod session;

pub use error::{Result, SiftError};
