use crate::chat::store::{ConversationStore, StoreError};

use super::message::{ChatMessage, PersistedMessage};

pub const MAX_MESSAGES_PER_CHAT: usize = 40;
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// The exact message sequence sent to the completion service for one turn.
///
/// Always starts with the system message, followed by at most `max_messages` conversation
/// messages, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextWindow {
    pub messages: Vec<ChatMessage>,
}

impl ContextWindow {
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The conversation part of the window, without the system message.
    #[cfg(test)]
    pub fn history(&self) -> &[ChatMessage] {
        self.messages.get(1..).unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct WindowBuilder {
    system_prompt: String,
    max_messages: usize,
}

impl Default for WindowBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT, MAX_MESSAGES_PER_CHAT)
    }
}

impl WindowBuilder {
    pub fn new(system_prompt: impl Into<String>, max_messages: usize) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            max_messages,
        }
    }

    pub async fn build(
        &self,
        store: &dyn ConversationStore,
        conversation_id: &str,
    ) -> Result<ContextWindow, StoreError> {
        let recent = store
            .recent_messages(conversation_id, self.max_messages)
            .await?;

        Ok(self.assemble(recent))
    }

    /// Turns a conversation tail, in whatever order the store produced it, into a window.
    pub fn assemble(&self, mut recent: Vec<PersistedMessage>) -> ContextWindow {
        // stable, so equal timestamps keep the store's relative order
        recent.sort_by_key(|message| message.created_at);

        let overflow = recent.len().saturating_sub(self.max_messages);
        if overflow > 0 {
            log::debug!("dropping {overflow} messages beyond the window cap");
        }

        let mut messages = Vec::with_capacity(recent.len() - overflow + 1);
        messages.push(ChatMessage::system(self.system_prompt.clone()));
        messages.extend(recent.into_iter().skip(overflow).map(ChatMessage::from));

        ContextWindow { messages }
    }
}
