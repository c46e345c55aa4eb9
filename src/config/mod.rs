//! Configuration module for Sift.
//!
//! Handles loading application settings and the agent instruction templates.

mod prompts;
mod settings;

pub use prompts::Instructions;
pub use settings::{AgentSettings, GeneralSettings, ServerSettings, Settings, ToolSettings};
