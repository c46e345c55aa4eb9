//! Configuration settings for Sift.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub agent: AgentSettings,
    pub tools: ToolSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Static page served at `GET /`.
    pub index_path: String,
    /// Pause after each emitted SSE event, in milliseconds (0 disables).
    pub throttle_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            index_path: "index.html".to_string(),
            throttle_ms: 10,
        }
    }
}

/// Agent and model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Display name used in the system prompt.
    pub name: String,
    /// Role line used in the system prompt.
    pub role: String,
    /// Hosted model identifier.
    pub model: String,
    /// Sampling temperature. Pinned to 0 for reproducible answers.
    pub temperature: f32,
    /// Base URL of the OpenAI-compatible API.
    pub api_base: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Number of prior messages injected as conversation context.
    pub history_window: usize,
    /// Maximum model calls per turn (tool loop bound).
    pub max_iterations: usize,
    /// Idle limit for API responses, in seconds. Streams may run longer
    /// as long as data keeps arriving.
    pub request_timeout_secs: u64,
    /// Ask the model to format answers as markdown.
    pub markdown: bool,
    /// Enable the extra toolset (weather, calculator, url summary, time).
    pub extra_tools: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            name: "Research Assistant".to_string(),
            role: "Expert research assistant".to_string(),
            model: "openai/gpt-oss-120b".to_string(),
            temperature: 0.0,
            api_base: "https://api.groq.com/openai/v1".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            history_window: 6,
            max_iterations: 10,
            request_timeout_secs: 300,
            markdown: true,
            extra_tools: false,
        }
    }
}

impl AgentSettings {
    /// Read the API key from the configured environment variable.
    ///
    /// Empty values count as missing.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// Settings for the web tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// User agent sent with search and fetch requests.
    pub user_agent: String,
    /// Default number of search results.
    pub search_max_results: usize,
    /// Timeout for page fetches, in seconds.
    pub fetch_timeout_secs: u64,
    /// Maximum article text handed back to the model.
    pub article_max_chars: usize,
    /// Default preview length for `summarize_url`.
    pub summary_max_chars: usize,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (compatible; SiftBot/1.0)".to_string(),
            search_max_results: 5,
            fetch_timeout_secs: 10,
            article_max_chars: 8000,
            summary_max_chars: 200,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sift")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded path of the static index page.
    pub fn index_path(&self) -> PathBuf {
        Self::expand_path(&self.server.index_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.agent.history_window, 6);
        assert_eq!(settings.agent.temperature, 0.0);
        assert_eq!(settings.agent.api_key_env, "GROQ_API_KEY");
        assert_eq!(settings.server.port, 8000);
        assert!(!settings.agent.extra_tools);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.agent.model, "openai/gpt-oss-120b");
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9100\n\n[agent]\nextra_tools = true").unwrap();

        let settings = Settings::load_from(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert!(settings.agent.extra_tools);
        assert_eq!(settings.agent.history_window, 6);
    }

    #[test]
    fn test_api_key_blank_is_missing() {
        let agent = AgentSettings {
            api_key_env: "SIFT_TEST_BLANK_KEY".to_string(),
            ..AgentSettings::default()
        };
        std::env::set_var("SIFT_TEST_BLANK_KEY", "  ");
        assert!(agent.api_key().is_none());
        std::env::set_var("SIFT_TEST_BLANK_KEY", "gsk_test");
        assert_eq!(agent.api_key().as_deref(), Some("gsk_test"));
    }
}
