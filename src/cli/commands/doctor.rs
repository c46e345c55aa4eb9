//! Doctor command - verify configuration and connectivity.

use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Sift Doctor");
    println!();
    println!("Checking configuration...\n");

    let checks = vec![
        check_api_key(settings),
        check_config_file(config_path),
        check_api_base(&settings.agent.api_base),
        check_frontend(settings),
        CheckResult::ok("Model", &settings.agent.model),
    ];

    for check in &checks {
        check.print();
    }
    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!("{} error(s), {} warning(s)", errors, warnings));
        anyhow::bail!("Configuration is incomplete");
    } else if warnings > 0 {
        Output::warning(&format!("All required checks passed with {} warning(s)", warnings));
    } else {
        Output::success("All checks passed!");
    }

    Ok(())
}

fn check_api_key(settings: &Settings) -> CheckResult {
    let env = &settings.agent.api_key_env;
    match settings.agent.api_key() {
        Some(key) => CheckResult::ok(env, &format!("Set ({} chars)", key.len())),
        None => CheckResult::error(
            env,
            "Not set",
            &format!("export {}='gsk_...'", env),
        ),
    }
}

fn check_config_file(path: &Path) -> CheckResult {
    if path.exists() {
        CheckResult::ok("Config file", &path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "Not found, using defaults",
            &format!("Create {} to override settings", path.display()),
        )
    }
}

fn check_api_base(api_base: &str) -> CheckResult {
    match url::Url::parse(api_base) {
        Ok(url) if url.scheme() == "https" => CheckResult::ok("API base", api_base),
        Ok(_) => CheckResult::warning(
            "API base",
            &format!("{} is not https", api_base),
            "Requests will carry the API key in plain text",
        ),
        Err(e) => CheckResult::error(
            "API base",
            &format!("Invalid URL: {}", e),
            "Set agent.api_base to a full URL",
        ),
    }
}

fn check_frontend(settings: &Settings) -> CheckResult {
    let path = settings.index_path();
    if path.exists() {
        CheckResult::ok("Frontend", &path.display().to_string())
    } else {
        CheckResult::warning(
            "Frontend",
            &format!("{} not found", path.display()),
            "GET / will answer 404; set server.index_path",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_api_base() {
        assert_eq!(check_api_base("https://api.groq.com/openai/v1").status, CheckStatus::Ok);
        assert_eq!(check_api_base("http://localhost:8080/v1").status, CheckStatus::Warning);
        assert_eq!(check_api_base("not a url").status, CheckStatus::Error);
    }

    #[test]
    fn test_check_config_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let check = check_config_file(&dir.path().join("config.toml"));
        assert_eq!(check.status, CheckStatus::Warning);
    }
}
