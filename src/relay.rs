//! Streaming relay: runs one agent turn and re-emits its output as chat
//! events while keeping the session transcript up to date.
//!
//! Event order is fixed: one `start`, any number of `token`, then exactly
//! one of `done` or `error`. The assistant reply is stored only when the
//! turn completes cleanly; a failed or abandoned turn leaves just the user
//! message behind.

use crate::agent::ChatAgent;
use crate::session::{Role, SessionStore};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// One event of a streamed chat response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Start { session_id: String },
    Token { content: String },
    Error { error: String },
    Done { session_id: String },
}

impl StreamEvent {
    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done { .. } | StreamEvent::Error { .. })
    }
}

/// Relay one turn of `agent` for `message` in `session_id`.
///
/// The user message is appended before the first event is produced. After
/// each event the relay pauses for `throttle` (zero disables the pause).
/// The stream is lazy: dropping it cancels the agent call in flight.
pub fn relay(
    agent: Box<dyn ChatAgent>,
    sessions: Arc<SessionStore>,
    session_id: String,
    message: String,
    throttle: Duration,
) -> impl Stream<Item = StreamEvent> + Send {
    async_stream::stream! {
        sessions.append(&session_id, Role::User, message.clone());

        yield StreamEvent::Start { session_id: session_id.clone() };
        pause(throttle).await;

        let mut chunks = agent.run_stream(&message);
        let mut full_response = String::new();
        let mut failure = None;

        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(chunk) => {
                    if let Some(text) = chunk.text() {
                        full_response.push_str(text);
                        yield StreamEvent::Token { content: text.to_string() };
                        pause(throttle).await;
                    } else {
                        debug!("[{}] Skipping chunk without text: {:?}", session_id, chunk);
                    }
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        match failure {
            Some(e) => {
                error!("[{}] Stream error: {}", session_id, e);
                yield StreamEvent::Error { error: e.to_string() };
            }
            None => {
                if !full_response.is_empty() {
                    sessions.append(&session_id, Role::Assistant, full_response);
                }
                info!("[{}] Turn completed", session_id);
                yield StreamEvent::Done { session_id };
            }
        }
    }
}

async fn pause(throttle: Duration) {
    if !throttle.is_zero() {
        tokio::time::sleep(throttle).await;
    }
}
