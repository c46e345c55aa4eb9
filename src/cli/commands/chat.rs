//! Interactive chat against a running server.

use crate::cli::Output;
use crate::client::ChatClient;
use crate::error::Result;
use crate::relay::StreamEvent;
use console::style;
use std::io::{self, BufRead, Write};
use std::time::Duration;

/// Run the interactive chat command.
pub async fn run_chat(url: &str, session: Option<String>, timeout_secs: u64) -> Result<()> {
    let client = ChatClient::new(url, Duration::from_secs(timeout_secs))?;

    match client.health().await {
        Ok(health) => {
            if !health.groq_api_configured {
                Output::warning("The server has no API key configured; answers will fail.");
            }
        }
        Err(e) => {
            Output::error(&format!("Cannot reach {}: {}", url, e));
            Output::info("Start the server with 'sift serve'.");
            return Err(e);
        }
    }

    let mut session_id = session;

    println!("\n{}", style("Sift Chat").bold().cyan());
    println!(
        "{}\n",
        style("Type your questions, or 'exit' to quit. Use 'history' to show the transcript, 'new' to start over.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("new") {
            session_id = None;
            Output::info("Started a new session.");
            continue;
        }

        if input.eq_ignore_ascii_case("history") {
            show_history(&client, session_id.as_deref()).await;
            continue;
        }

        print!("{} ", style("Sift:").cyan().bold());
        stdout.flush()?;

        let outcome = client
            .chat(input, session_id.as_deref(), |event| {
                if let StreamEvent::Token { content } = event {
                    Output::fragment(content);
                }
            })
            .await;

        println!();
        match outcome {
            Ok(outcome) => {
                if let Some(id) = outcome.session_id {
                    session_id = Some(id);
                }
                if let Some(error) = outcome.error {
                    Output::error(&error);
                }
            }
            Err(e) => Output::error(&format!("{}", e)),
        }
        println!();
    }

    Ok(())
}

async fn show_history(client: &ChatClient, session_id: Option<&str>) {
    let Some(session_id) = session_id else {
        Output::info("No messages yet.");
        return;
    };

    match client.session(session_id).await {
        Ok(history) => {
            Output::header(&format!("Session {}", history.session_id));
            for message in &history.history {
                Output::transcript_entry(
                    &message.role.to_string(),
                    &message.timestamp.format("%H:%M:%S").to_string(),
                    &message.content,
                );
            }
            println!();
        }
        Err(e) => Output::error(&format!("{}", e)),
    }
}
