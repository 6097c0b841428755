use std::{collections::VecDeque, sync::Mutex};

use async_trait::async_trait;

use crate::chat::context::ChatMessage;

use super::{CompletionClient, CompletionError, CompletionOptions};

/// A recorded call to [`ScriptedClient::complete`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub options: CompletionOptions,
}

/// Completion client that replays queued results and records every window it was sent.
#[derive(Default)]
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Result<ChatMessage, CompletionError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replying(reply: &str) -> Self {
        let client = Self::new();
        client.push_reply(reply);
        client
    }

    pub fn failing(error: CompletionError) -> Self {
        let client = Self::new();
        client.push_error(error);
        client
    }

    pub fn push_reply(&self, reply: &str) -> &Self {
        self.push_message(ChatMessage::assistant(reply))
    }

    /// Queues a reply exactly as given, whatever its role.
    pub fn push_message(&self, message: ChatMessage) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(message));
        self
    }

    pub fn push_error(&self, error: CompletionError) -> &Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<ChatMessage, CompletionError> {
        self.calls.lock().unwrap().push(RecordedCall {
            model: model.to_string(),
            messages: messages.to_vec(),
            options: options.clone(),
        });

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(CompletionError::Setup {
                    message: "scripted client ran out of responses".to_string(),
                })
            })
    }
}
