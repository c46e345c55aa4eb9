//! CLI module for Sift.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Sift - streaming research assistant
///
/// Serves a chat API that answers with a web-searching agent and streams
/// the reply as Server-Sent Events.
#[derive(Parser, Debug)]
#[command(name = "sift")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP chat server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask the agent a single question and stream the answer
    Ask {
        /// The question to ask
        message: String,

        /// Model to use instead of agent.model
        #[arg(short, long)]
        model: Option<String>,

        /// Enable the extra toolset (weather, calculator, url summary, time)
        #[arg(long)]
        extra_tools: bool,
    },

    /// Chat interactively with a running server
    Chat {
        /// Base URL of the server
        #[arg(long, env = "SIFT_URL", default_value = "http://127.0.0.1:8000")]
        url: String,

        /// Continue an existing session
        #[arg(short, long)]
        session: Option<String>,

        /// Seconds to wait for a connection or for more streamed data
        #[arg(long, default_value = "60")]
        timeout: u64,
    },

    /// Check API key and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
