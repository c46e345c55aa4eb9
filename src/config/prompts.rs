//! Instruction templates for the research agent.
//!
//! The system prompt is assembled from a description line, an instruction
//! list and an optional formatting hint. Conversation context is appended
//! to the instruction list per request by the agent factory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Instruction lists used to configure the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Instructions {
    /// Description line; `{{name}}` and `{{role}}` are substituted.
    pub description: String,
    /// Base behavioral rules, always present.
    pub base: Vec<String>,
    /// Rules added when the extra toolset is enabled.
    pub extra_tools: Vec<String>,
    /// Formatting hint added when markdown output is on.
    pub markdown: String,
}

impl Default for Instructions {
    fn default() -> Self {
        Self {
            description: "You are {{name}}, {{role}}.".to_string(),
            base: vec![
                "You are a helpful assistant.".to_string(),
                "When asked about current information, use DuckDuckGo search.".to_string(),
                "Always use the search tool for questions about news, weather, or current events."
                    .to_string(),
                "Do no Add special symbols and emojis".to_string(),
            ],
            extra_tools: vec![
                "When asked about weather, use the get_weather tool.".to_string(),
                "When asked to calculate or compute something, use the calculate_expression tool."
                    .to_string(),
                "When asked to fetch or summarize a webpage, use the summarize_url tool."
                    .to_string(),
                "When asked about the time, use the get_time_info tool.".to_string(),
                "For article analysis, use the read_article tool.".to_string(),
                "Always include the tool's result in your final answer.".to_string(),
                "Be specific and cite your sources when using search tools.".to_string(),
            ],
            markdown: "Use markdown to format your answers.".to_string(),
        }
    }
}

impl Instructions {
    /// Render a template, replacing `{{key}}` placeholders.
    pub fn render(template: &str, vars: &HashMap<&str, &str>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Assemble the full system prompt.
    ///
    /// `rules` is the ordered instruction list (base rules, optional extra
    /// rules, optional conversation context block).
    pub fn system_prompt(&self, name: &str, role: &str, rules: &[String], markdown: bool) -> String {
        let vars = HashMap::from([("name", name), ("role", role)]);
        let mut prompt = Self::render(&self.description, &vars);

        if !rules.is_empty() {
            prompt.push_str("\n\n<instructions>\n");
            for rule in rules {
                prompt.push_str("- ");
                prompt.push_str(rule);
                prompt.push('\n');
            }
            prompt.push_str("</instructions>");
        }

        if markdown && !self.markdown.is_empty() {
            prompt.push_str("\n\n<additional_information>\n- ");
            prompt.push_str(&self.markdown);
            prompt.push_str("\n</additional_information>");
        }

        prompt
    }
}
