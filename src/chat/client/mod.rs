use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::context::ChatMessage;

mod classify;
mod error;
mod openai;
#[cfg(test)]
pub mod testing;

pub use classify::{ClassifiedError, classify};
pub use error::{CompletionError, ErrorBody, ErrorPayload, NetworkCode};
pub use openai::OpenAIClient;

/// Sampling options for a single completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub temperature: f64,
    pub candidate_count: u32,
    pub stream: bool,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            candidate_count: 1,
            stream: false,
        }
    }
}

/// One request/response round trip to a chat-completion service. No retries happen here.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<ChatMessage, CompletionError>;
}
