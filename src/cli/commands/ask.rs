//! Ask command: one question, streamed straight to the terminal.

use crate::agent::{AgentChunk, ChatAgent, GroqAgentFactory};
use crate::cli::preflight;
use crate::cli::Output;
use crate::config::Settings;
use crate::error::Result;
use futures::StreamExt;
use tracing::debug;

/// Run the ask command without going through the HTTP server.
pub async fn run_ask(
    message: &str,
    model: Option<String>,
    extra_tools: bool,
    mut settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check_api_key(&settings.agent) {
        Output::error(&format!("{}", e));
        Output::info("Run 'sift doctor' for detailed diagnostics.");
        return Err(e);
    }

    if let Some(model) = model {
        settings.agent.model = model;
    }
    settings.agent.extra_tools |= extra_tools;

    let agent = GroqAgentFactory::new(settings).build_agent(&[])?;
    let mut stream = agent.run_stream(message);

    let spinner = Output::spinner("Thinking...");
    let mut spinning = true;
    let mut answered = false;

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                spinner.finish_and_clear();
                if answered {
                    println!();
                }
                Output::error(&format!("{}", e));
                return Err(e);
            }
        };

        match &chunk {
            AgentChunk::ToolCall { name } => {
                debug!("Tool call: {}", name);
                match tool_activity(spinning, name) {
                    Activity::Spinner(msg) => spinner.set_message(msg),
                    Activity::Marker => Output::tool_marker(name),
                }
            }
            AgentChunk::ToolResult { .. } => {
                if spinning {
                    spinner.set_message("Thinking...");
                }
            }
            _ => {
                if let Some(text) = chunk.text() {
                    if spinning {
                        spinner.finish_and_clear();
                        spinning = false;
                    }
                    Output::fragment(text);
                    answered = true;
                }
            }
        }
    }

    spinner.finish_and_clear();
    if answered {
        println!();
    } else {
        Output::warning("The model returned an empty answer.");
    }

    Ok(())
}

/// How tool activity is shown for the current answer state.
#[derive(Debug, PartialEq)]
enum Activity {
    Spinner(String),
    Marker,
}

/// Before any text the spinner is live; after it the spinner is gone and
/// tool calls are shown inline.
fn tool_activity(spinning: bool, name: &str) -> Activity {
    if spinning {
        Activity::Spinner(format!("Running {}...", name))
    } else {
        Activity::Marker
    }
}
