//! Pre-flight checks before talking to the model.

use crate::config::AgentSettings;
use crate::error::{Result, SiftError};

/// Check that the API key named in the settings is present.
pub fn check_api_key(settings: &AgentSettings) -> Result<()> {
    if settings.api_key().is_some() {
        return Ok(());
    }
    Err(SiftError::Config(format!(
        "{} not set. Set it with: export {}='gsk_...'",
        settings.api_key_env, settings.api_key_env
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(env: &str) -> AgentSettings {
        AgentSettings {
            api_key_env: env.to_string(),
            ..AgentSettings::default()
        }
    }

    #[test]
    fn test_missing_key() {
        std::env::remove_var("SIFT_PREFLIGHT_UNSET_KEY");
        let err = check_api_key(&settings("SIFT_PREFLIGHT_UNSET_KEY")).unwrap_err();
        assert!(err.to_string().contains("SIFT_PREFLIGHT_UNSET_KEY not set"));
    }

    #[test]
    fn test_agrees_with_settings_on_blank_key() {
        let agent = settings("SIFT_PREFLIGHT_BLANK_KEY");
        std::env::set_var("SIFT_PREFLIGHT_BLANK_KEY", "   ");
        assert!(agent.api_key().is_none());
        assert!(check_api_key(&agent).is_err());

        std::env::set_var("SIFT_PREFLIGHT_BLANK_KEY", "gsk_live");
        assert!(check_api_key(&agent).is_ok());
    }
}
