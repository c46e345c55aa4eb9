//! Per-request agent construction.

use super::runner::Agent;
use super::tools::ToolContext;
use super::{AgentFactory, ChatAgent};
use crate::config::{Instructions, Settings};
use crate::error::{Result, SiftError};
use crate::llm::create_client;
use crate::session::{Message, SessionStore};
use tracing::debug;

/// Render recent history as an instruction block.
///
/// Returns `None` for an empty history so no empty block is appended.
pub fn conversation_context(history: &[Message]) -> Option<String> {
    if history.is_empty() {
        return None;
    }

    let mut context = String::from("\n\nPrevious conversation:\n");
    for msg in history {
        context.push_str(&format!("{}: {}\n", msg.role, msg.content));
    }
    Some(context)
}

/// Builds research agents against the Groq API.
pub struct GroqAgentFactory {
    settings: Settings,
    instructions: Instructions,
}

impl GroqAgentFactory {
    /// Create a factory with the default instruction set.
    pub fn new(settings: Settings) -> Self {
        Self::with_instructions(settings, Instructions::default())
    }

    /// Create a factory with custom instructions.
    pub fn with_instructions(settings: Settings, instructions: Instructions) -> Self {
        Self {
            settings,
            instructions,
        }
    }

    /// Instruction list for a session: base rules, extra-tool rules when
    /// enabled, then the conversation context block.
    pub fn rules(&self, history: &[Message]) -> Vec<String> {
        let mut rules = self.instructions.base.clone();
        if self.settings.agent.extra_tools {
            rules.extend(self.instructions.extra_tools.iter().cloned());
        }
        if let Some(context) = conversation_context(history) {
            rules.push(context);
        }
        rules
    }

    /// Build a concrete agent seeded with `history`.
    pub fn build_agent(&self, history: &[Message]) -> Result<Agent> {
        let agent_settings = &self.settings.agent;
        let api_key = agent_settings.api_key().ok_or_else(|| {
            SiftError::Config(format!("{} missing", agent_settings.api_key_env))
        })?;

        let system_prompt = self.instructions.system_prompt(
            &agent_settings.name,
            &agent_settings.role,
            &self.rules(history),
            agent_settings.markdown,
        );

        let client = create_client(agent_settings, &api_key)?;
        let tools = ToolContext::new(&self.settings.tools, agent_settings.extra_tools)
            .map_err(|e| SiftError::AgentConstruction(e.to_string()))?;

        Ok(Agent::new(client, &agent_settings.model, system_prompt, tools)
            .with_temperature(agent_settings.temperature)
            .with_max_iterations(agent_settings.max_iterations))
    }
}

impl AgentFactory for GroqAgentFactory {
    fn credentials_configured(&self) -> bool {
        self.settings.agent.api_key().is_some()
    }

    fn build(&self, sessions: &SessionStore, session_id: &str) -> Result<Box<dyn ChatAgent>> {
        let history = sessions.recent(session_id, self.settings.agent.history_window);
        debug!(
            "Building agent for session {} with {} context message(s)",
            session_id,
            history.len()
        );
        Ok(Box::new(self.build_agent(&history)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;

    fn settings_with_key(env: &str, value: Option<&str>) -> Settings {
        let mut settings = Settings::default();
        settings.agent.api_key_env = env.to_string();
        match value {
            Some(v) => std::env::set_var(env, v),
            None => std::env::remove_var(env),
        }
        settings
    }

    #[test]
    fn test_conversation_context() {
        assert!(conversation_context(&[]).is_none());

        let store = SessionStore::new();
        store.append("s", Role::User, "What is Rust?");
        store.append("s", Role::Assistant, "A language.");
        let context = conversation_context(&store.get("s").unwrap()).unwrap();
        assert_eq!(
            context,
            "\n\nPrevious conversation:\nuser: What is Rust?\nassistant: A language.\n"
        );
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let factory = GroqAgentFactory::new(settings_with_key("SIFT_TEST_ABSENT_KEY", None));
        assert!(!factory.credentials_configured());

        let store = SessionStore::new();
        let err = factory.build(&store, "s").err().unwrap();
        assert!(matches!(err, SiftError::Config(ref m) if m == "SIFT_TEST_ABSENT_KEY missing"));
    }

    #[test]
    fn test_build_uses_last_six_messages() {
        let factory = GroqAgentFactory::new(settings_with_key("SIFT_TEST_FACTORY_KEY", Some("gsk_test")));
        assert!(factory.credentials_configured());

        let store = SessionStore::new();
        for i in 0..8 {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            store.append("s", role, format!("turn {}", i));
        }

        let history = store.recent("s", 6);
        let agent = factory.build_agent(&history).unwrap();
        let prompt = agent.system_prompt();

        assert!(prompt.starts_with("You are Research Assistant, Expert research assistant."));
        assert!(prompt.contains("- You are a helpful assistant."));
        assert!(prompt.contains("Previous conversation:"));
        assert!(!prompt.contains("turn 1\n"));
        assert!(prompt.contains("user: turn 2\n"));
        assert!(prompt.contains("assistant: turn 7\n"));
        assert!(!prompt.contains("get_weather"));

        assert!(factory.build(&store, "s").is_ok());
    }

    #[test]
    fn test_extra_tool_rules() {
        let mut settings = Settings::default();
        settings.agent.extra_tools = true;
        let factory = GroqAgentFactory::new(settings);
        let rules = factory.rules(&[]);
        assert!(rules.iter().any(|r| r.contains("get_weather")));
        assert!(!rules.iter().any(|r| r.contains("Previous conversation")));
    }
}
