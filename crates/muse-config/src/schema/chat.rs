//! Chat and code-assistant lane settings.

use muse_common::ModelVariant;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "You are a helpful, knowledgeable assistant. Answer clearly and concisely.";

pub const DEFAULT_CODE_SYSTEM_INSTRUCTION: &str =
    "You are an expert software engineer. Produce complete, working code with \
     short explanations. Use fenced code blocks with a language tag.";

/// Conversation lane configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub default_model: ModelVariant,
    pub default_system_instruction: String,
    pub code_system_instruction: String,
    /// Keep fragments received before a stream failure instead of
    /// replacing them with the failure notice.
    pub preserve_partial_on_failure: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_model: ModelVariant::Flash,
            default_system_instruction: DEFAULT_SYSTEM_INSTRUCTION.into(),
            code_system_instruction: DEFAULT_CODE_SYSTEM_INSTRUCTION.into(),
            preserve_partial_on_failure: false,
        }
    }
}
