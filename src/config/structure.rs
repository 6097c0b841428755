use serde::{Deserialize, Serialize};

use crate::chat::context::{DEFAULT_SYSTEM_PROMPT, MAX_MESSAGES_PER_CHAT};

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct RelayConfigTOML {
    #[serde(default)]
    pub config: RelayConfigInner,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct RelayConfigInner {
    pub log_level: Option<String>,
    pub llm: LLMConfig,
    pub chat: ChatConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LLMConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f64,
    pub timeout_secs: Option<u64>,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gpt-3.5-turbo".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 1.0,
            timeout_secs: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    /// Most recent messages fed into a prompt window.
    pub max_messages: usize,
    pub system_prompt: String,
    /// Serialize turns that share a conversation id.
    pub serialize_turns: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_messages: MAX_MESSAGES_PER_CHAT,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            serialize_turns: true,
        }
    }
}
