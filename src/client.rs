//! HTTP client for a running Sift server.
//!
//! Decodes the `data: <json>` frames of `POST /chat` as they arrive.
//! Frames that fail to decode are skipped without error.

use crate::error::{Result, SiftError};
use crate::relay::StreamEvent;
use crate::session::Message;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

/// Decode one line of an SSE body.
///
/// Returns `None` for blank lines, comments, non-data fields and payloads
/// that are not a valid event.
pub fn parse_frame(line: &str) -> Option<StreamEvent> {
    let line = line.trim_end_matches('\r');
    let payload = line.strip_prefix("data:")?;
    let payload = payload.strip_prefix(' ').unwrap_or(payload);
    match serde_json::from_str(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            debug!("Dropping malformed frame {:?}: {}", payload, e);
            None
        }
    }
}

/// Splits a byte stream into lines, buffering partial lines across chunks.
#[derive(Default)]
struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(String::from_utf8_lossy(&line[..line.len() - 1]).into_owned());
        }
        lines
    }

    fn finish(self) -> Option<String> {
        (!self.pending.is_empty()).then(|| String::from_utf8_lossy(&self.pending).into_owned())
    }
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Deserialize)]
pub struct Health {
    pub status: String,
    pub active_sessions: usize,
    pub groq_api_configured: bool,
}

/// Response of `GET /session/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionHistory {
    pub session_id: String,
    pub history: Vec<Message>,
}

/// Outcome of one streamed chat turn.
#[derive(Debug, Clone, Default)]
pub struct ChatOutcome {
    /// Session id announced by the `start` event.
    pub session_id: Option<String>,
    /// Concatenated token content.
    pub response: String,
    /// Error reported in-band, if the turn failed.
    pub error: Option<String>,
}

/// Client for the chat API.
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
}

impl ChatClient {
    /// Create a client for `base_url` (e.g. `http://127.0.0.1:8000`).
    ///
    /// `timeout` bounds connecting and each wait for more data, not the
    /// whole response, so a long answer that keeps streaming is never cut off.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Probe `GET /health`.
    pub async fn health(&self) -> Result<Health> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Fetch the transcript of a session.
    pub async fn session(&self, session_id: &str) -> Result<SessionHistory> {
        let response = self
            .http
            .get(format!("{}/session/{}", self.base_url, session_id))
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(SiftError::SessionNotFound(session_id.to_string()));
        }
        Ok(response.error_for_status()?.json().await?)
    }

    /// Send a message and feed each decoded event to `on_event` as it arrives.
    ///
    /// Once the stream has started, a broken connection is reported in
    /// `ChatOutcome::error` so the session id from `start` is not lost.
    pub async fn chat<F>(&self, message: &str, session_id: Option<&str>, mut on_event: F) -> Result<ChatOutcome>
    where
        F: FnMut(&StreamEvent),
    {
        let response = self
            .http
            .post(format!("{}/chat", self.base_url))
            .json(&json!({ "message": message, "session_id": session_id }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SiftError::Stream(format!("HTTP {}: {}", status, body)));
        }

        let mut outcome = ChatOutcome::default();
        let mut lines = LineBuffer::default();
        let mut body = response.bytes_stream();

        while let Some(bytes) = body.next().await {
            let bytes = match bytes {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Chat stream interrupted: {}", e);
                    outcome.error = Some(format!("Connection lost: {}", e));
                    return Ok(outcome);
                }
            };
            for line in lines.push(&bytes) {
                if let Some(event) = parse_frame(&line) {
                    apply(&mut outcome, &event);
                    on_event(&event);
                }
            }
        }
        if let Some(event) = lines.finish().as_deref().and_then(parse_frame) {
            apply(&mut outcome, &event);
            on_event(&event);
        }

        Ok(outcome)
    }
}

fn apply(outcome: &mut ChatOutcome, event: &StreamEvent) {
    match event {
        StreamEvent::Start { session_id } => outcome.session_id = Some(session_id.clone()),
        StreamEvent::Token { content } => outcome.response.push_str(content),
        StreamEvent::Error { error } => outcome.error = Some(error.clone()),
        StreamEvent::Done { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame() {
        assert_eq!(
            parse_frame(r#"data: {"type":"token","content":"hi"}"#),
            Some(StreamEvent::Token { content: "hi".into() })
        );
        assert_eq!(
            parse_frame("data:{\"type\":\"done\",\"session_id\":\"s\"}\r"),
            Some(StreamEvent::Done { session_id: "s".into() })
        );
    }

    #[test]
    fn test_parse_frame_drops_noise() {
        assert_eq!(parse_frame(""), None);
        assert_eq!(parse_frame(": keep-alive"), None);
        assert_eq!(parse_frame("event: message"), None);
        assert_eq!(parse_frame("data: {not json"), None);
        assert_eq!(parse_frame(r#"data: {"type":"unknown"}"#), None);
    }

    #[test]
    fn test_line_buffer_splits_across_chunks() {
        let mut buffer = LineBuffer::default();
        assert!(buffer.push(b"data: {\"type\":\"tok").is_empty());
        let lines = buffer.push(b"en\",\"content\":\"a\"}\n\ndata: x");
        assert_eq!(lines, vec![r#"data: {"type":"token","content":"a"}"#.to_string(), String::new()]);
        assert_eq!(buffer.finish().as_deref(), Some("data: x"));
    }

    async fn spawn_server(app: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn frame(event: &StreamEvent) -> String {
        format!("data: {}\n\n", serde_json::to_string(event).unwrap())
    }

    #[tokio::test]
    async fn test_slow_stream_outlives_timeout() {
        let app = axum::Router::new().route(
            "/chat",
            axum::routing::post(|| async {
                let events = async_stream::stream! {
                    yield Ok::<_, std::io::Error>(frame(&StreamEvent::Start { session_id: "slow".into() }));
                    for word in ["a", "b", "c", "d", "e"] {
                        tokio::time::sleep(Duration::from_millis(300)).await;
                        yield Ok(frame(&StreamEvent::Token { content: word.into() }));
                    }
                    yield Ok(frame(&StreamEvent::Done { session_id: "slow".into() }));
                };
                axum::body::Body::from_stream(events)
            }),
        );
        let url = spawn_server(app).await;

        let client = ChatClient::new(&url, Duration::from_secs(1)).unwrap();
        let mut seen = 0;
        let outcome = client.chat("hi", None, |_| seen += 1).await.unwrap();

        assert_eq!(seen, 7);
        assert_eq!(outcome.session_id.as_deref(), Some("slow"));
        assert_eq!(outcome.response, "abcde");
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn test_broken_stream_keeps_session_id() {
        let app = axum::Router::new().route(
            "/chat",
            axum::routing::post(|| async {
                let events = async_stream::stream! {
                    yield Ok(frame(&StreamEvent::Start { session_id: "kept".into() }));
                    yield Ok(frame(&StreamEvent::Token { content: "par".into() }));
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    yield Err(std::io::Error::new(std::io::ErrorKind::Other, "upstream gone"));
                };
                axum::body::Body::from_stream(events)
            }),
        );
        let url = spawn_server(app).await;

        let client = ChatClient::new(&url, Duration::from_secs(5)).unwrap();
        let outcome = client.chat("hi", None, |_| {}).await.unwrap();

        assert_eq!(outcome.session_id.as_deref(), Some("kept"));
        assert_eq!(outcome.response, "par");
        assert!(outcome.error.unwrap().starts_with("Connection lost"));
    }

    #[test]
    fn test_apply_collects_outcome() {
        let mut outcome = ChatOutcome::default();
        for event in [
            StreamEvent::Start { session_id: "s".into() },
            StreamEvent::Token { content: "a".into() },
            StreamEvent::Token { content: "b".into() },
            StreamEvent::Error { error: "boom".into() },
        ] {
            apply(&mut outcome, &event);
        }
        assert_eq!(outcome.session_id.as_deref(), Some("s"));
        assert_eq!(outcome.response, "ab");
        assert_eq!(outcome.error.as_deref(), Some("boom"));
    }
}
