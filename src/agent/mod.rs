//! Research agent with streaming output and tool calling.
//!
//! An agent is built per request by an [`AgentFactory`], seeded with the
//! recent history of one session, and driven through [`ChatAgent::run_stream`],
//! which yields output increments as they are produced.

mod calc;
mod factory;
mod runner;
mod tools;
mod web;

pub use factory::{conversation_context, GroqAgentFactory};
pub use runner::Agent;
pub use tools::{parse_tool_call, tool_definitions, ToolCall, ToolContext};

use crate::error::Result;
use crate::session::SessionStore;
use futures::Stream;
use std::pin::Pin;

/// One increment of agent output.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentChunk {
    /// A bare text fragment.
    Text(String),
    /// A structured chunk exposing a content field.
    Content { content: Option<String> },
    /// The model decided to call a tool.
    ToolCall { name: String },
    /// A tool finished and its output went back to the model.
    ToolResult { name: String },
}

impl AgentChunk {
    /// Text carried by this chunk, if any.
    ///
    /// Plain text and content-bearing chunks are treated alike; tool events
    /// and empty content yield `None`.
    pub fn text(&self) -> Option<&str> {
        let text = match self {
            AgentChunk::Text(text) => text.as_str(),
            AgentChunk::Content { content } => content.as_deref()?,
            AgentChunk::ToolCall { .. } | AgentChunk::ToolResult { .. } => return None,
        };
        (!text.is_empty()).then_some(text)
    }
}

/// Stream of agent output for one turn.
pub type AgentStream = Pin<Box<dyn Stream<Item = Result<AgentChunk>> + Send>>;

/// A configured agent ready to answer one message.
pub trait ChatAgent: Send + Sync {
    /// Start answering `message`. Nothing happens until the stream is polled;
    /// dropping the stream abandons the turn.
    fn run_stream(&self, message: &str) -> AgentStream;
}

/// Builds agents seeded with a session's recent history.
pub trait AgentFactory: Send + Sync {
    /// Whether the credential needed to reach the model is present.
    fn credentials_configured(&self) -> bool;

    /// Build an agent for `session_id`.
    ///
    /// Fails with `SiftError::Config` when the credential is missing and
    /// `SiftError::AgentConstruction` for any other setup failure.
    fn build(&self, sessions: &SessionStore, session_id: &str) -> Result<Box<dyn ChatAgent>>;
}
