use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per conversation id, so turns on the same conversation run one at a time
/// while different conversations proceed concurrently.
#[derive(Default)]
pub struct ConversationLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

/// Held for the duration of a turn. Dropping it lets the next turn on the conversation in.
pub struct ConversationGuard {
    _guard: OwnedMutexGuard<()>,
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, conversation_id: &str) -> ConversationGuard {
        let lock = {
            let mut locks = self.locks.lock().await;
            // entries only the map still references have no holder and no waiter
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(conversation_id.to_string())
                .or_default()
                .clone()
        };

        ConversationGuard {
            _guard: lock.lock_owned().await,
        }
    }

    /// Conversations currently locked or waited on.
    #[cfg(test)]
    pub async fn active(&self) -> usize {
        self.locks
            .lock()
            .await
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }
}
