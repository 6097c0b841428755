use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageRole {
    #[serde(rename = "system")]
    System,

    #[serde(rename = "user")]
    User,

    #[serde(rename = "assistant")]
    Assistant,
}

impl Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        serde_plain::to_string(self)
            .map_err(|_| std::fmt::Error)?
            .fmt(f)
    }
}

impl FromStr for MessageRole {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        serde_plain::from_str(value).map_err(|e| anyhow::anyhow!("{}", e))
    }
}

/// A role/content pair, the only shape the completion service ever sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// A message on its way into the store. Identity and timestamp are the store's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub conversation_id: String,
    pub role: MessageRole,
    pub content: String,
}

impl NewMessage {
    pub fn new(conversation_id: impl Into<String>, message: ChatMessage) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            role: message.role,
            content: message.content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedMessage {
    pub id: Uuid,
    pub conversation_id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<PersistedMessage> for ChatMessage {
    fn from(message: PersistedMessage) -> Self {
        Self {
            role: message.role,
            content: message.content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_use_wire_names() {
        assert_eq!(MessageRole::System.to_string(), "system");
        assert_eq!(MessageRole::User.to_string(), "user");
        assert_eq!(MessageRole::Assistant.to_string(), "assistant");

        assert_eq!(
            "assistant".parse::<MessageRole>().unwrap(),
            MessageRole::Assistant
        );
        assert!("tool".parse::<MessageRole>().is_err());
    }

    #[test]
    fn chat_message_serializes_as_role_content_pair() {
        let json = serde_json::to_value(ChatMessage::user("Hi")).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "user", "content": "Hi" }));
    }

    #[test]
    fn persisted_message_drops_store_fields() {
        let persisted = PersistedMessage {
            id: Uuid::new_v4(),
            conversation_id: "abc".to_string(),
            role: MessageRole::Assistant,
            content: "Hello!".to_string(),
            created_at: Utc::now(),
        };

        assert_eq!(ChatMessage::from(persisted), ChatMessage::assistant("Hello!"));
    }
}
