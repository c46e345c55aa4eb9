//! Sift CLI entry point.

use anyhow::Result;
use clap::Parser;
use sift::cli::{commands, Cli, Commands};
use sift::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.as_ref().map(std::path::PathBuf::from);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("sift={},tower_http={}", log_level, log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Execute command
    match &cli.command {
        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Ask {
            message,
            model,
            extra_tools,
        } => {
            commands::run_ask(message, model.clone(), *extra_tools, settings).await?;
        }

        Commands::Chat {
            url,
            session,
            timeout,
        } => {
            commands::run_chat(url, session.clone(), *timeout).await?;
        }

        Commands::Doctor => {
            let path = config_path.unwrap_or_else(Settings::default_config_path);
            commands::run_doctor(&settings, &path)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, cli.config.as_deref(), settings)?;
        }
    }

    Ok(())
}
