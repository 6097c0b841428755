use async_trait::async_trait;

use super::context::{NewMessage, PersistedMessage};

mod memory;

pub use memory::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store rejected the write: {0}")]
    Rejected(String),
}

/// An append-only log of messages keyed by conversation identifier.
///
/// Implementations never update or delete what they hand back from [`append`], and every
/// failed write surfaces as a [`StoreError`].
///
/// [`append`]: ConversationStore::append
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Durably writes `message`, assigning its identity and creation timestamp.
    async fn append(&self, message: NewMessage) -> Result<PersistedMessage, StoreError>;

    /// Up to `limit` messages of the conversation, newest first.
    async fn recent_messages(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<PersistedMessage>, StoreError>;
}
