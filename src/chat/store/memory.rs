use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::chat::context::{NewMessage, PersistedMessage};

use super::{ConversationStore, StoreError};

#[derive(Default)]
struct Log {
    conversations: IndexMap<String, Vec<PersistedMessage>>,
    last_created_at: Option<DateTime<Utc>>,
}

impl Log {
    // wall clock can repeat or step back, creation order must not
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let created_at = match self.last_created_at {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };

        self.last_created_at = Some(created_at);
        created_at
    }
}

/// Process-local conversation log. Everything is lost when the process exits.
#[derive(Default)]
pub struct MemoryStore {
    log: RwLock<Log>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages stored under `conversation_id`.
    #[cfg(test)]
    pub async fn len(&self, conversation_id: &str) -> usize {
        self.log
            .read()
            .await
            .conversations
            .get(conversation_id)
            .map_or(0, |messages| messages.len())
    }

    /// Every message of the conversation, oldest first.
    #[cfg(test)]
    pub async fn history(&self, conversation_id: &str) -> Vec<PersistedMessage> {
        self.log
            .read()
            .await
            .conversations
            .get(conversation_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn append(&self, message: NewMessage) -> Result<PersistedMessage, StoreError> {
        let mut log = self.log.write().await;
        let created_at = log.next_timestamp();

        let NewMessage {
            conversation_id,
            role,
            content,
        } = message;

        let persisted = PersistedMessage {
            id: Uuid::new_v4(),
            conversation_id: conversation_id.clone(),
            role,
            content,
            created_at,
        };

        log.conversations
            .entry(conversation_id)
            .or_default()
            .push(persisted.clone());

        Ok(persisted)
    }

    async fn recent_messages(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<PersistedMessage>, StoreError> {
        let log = self.log.read().await;

        Ok(log
            .conversations
            .get(conversation_id)
            .map(|messages| messages.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
