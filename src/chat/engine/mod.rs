use std::sync::Arc;

use uuid::Uuid;

use crate::config::RelayConfig;

use super::{
    client::{ClassifiedError, CompletionClient, CompletionOptions, classify},
    context::{ChatMessage, NewMessage, WindowBuilder},
    store::{ConversationStore, StoreError},
};

mod guard;

pub use guard::{ConversationGuard, ConversationLocks};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRequest {
    pub question: String,
    pub cid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    pub reply: String,
    pub cid: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Completion(#[from] ClassifiedError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl TurnError {
    /// HTTP-style status the caller sees alongside the error message.
    pub fn status(&self) -> u16 {
        match self {
            TurnError::InvalidRequest(_) => 400,
            TurnError::Completion(_) | TurnError::Store(_) => 500,
        }
    }
}

/// Runs one chat turn end to end: persist the question, build the window, ask the model,
/// persist the answer.
pub struct ChatEngine {
    store: Arc<dyn ConversationStore>,
    client: Arc<dyn CompletionClient>,
    window: WindowBuilder,
    locks: Option<ConversationLocks>,
    model: String,
    options: CompletionOptions,
}

impl ChatEngine {
    pub fn new(
        config: &RelayConfig,
        store: Arc<dyn ConversationStore>,
        client: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            store,
            client,
            window: WindowBuilder::new(config.chat.system_prompt.clone(), config.chat.max_messages),
            locks: config.chat.serialize_turns.then(ConversationLocks::new),
            model: config.llm.model.clone(),
            options: CompletionOptions {
                temperature: config.llm.temperature,
                candidate_count: 1,
                stream: false,
            },
        }
    }

    pub async fn turn(&self, request: TurnRequest) -> Result<TurnReply, TurnError> {
        let TurnRequest { question, cid } = request;

        if question.trim().is_empty() {
            return Err(TurnError::InvalidRequest(
                "question must not be empty".to_string(),
            ));
        }

        let cid = match cid.filter(|cid| !cid.is_empty()) {
            Some(cid) => cid,
            None => {
                let cid = Uuid::new_v4().to_string();
                log::debug!("starting conversation {cid}");
                cid
            }
        };

        let _guard = match &self.locks {
            Some(locks) => Some(locks.lock(&cid).await),
            None => None,
        };

        // the question is kept even if the model call fails below
        self.store
            .append(NewMessage::new(&cid, ChatMessage::user(question)))
            .await
            .inspect_err(|why| log::error!("[{cid}] could not persist question: {why}"))?;

        let window = self
            .window
            .build(self.store.as_ref(), &cid)
            .await
            .inspect_err(|why| log::error!("[{cid}] could not load history: {why}"))?;

        log::debug!("[{cid}] prompting {} with {} messages", self.model, window.len());

        let reply = match self
            .client
            .complete(&self.model, &window.messages, &self.options)
            .await
        {
            Ok(reply) => reply,
            Err(why) => {
                log::error!("[{cid}] completion failed:\n{why:?}");
                return Err(classify(&why).into());
            }
        };

        self.store
            .append(NewMessage::new(&cid, ChatMessage::assistant(reply.content.clone())))
            .await
            .inspect_err(|why| log::error!("[{cid}] could not persist reply: {why}"))?;

        log::info!("[{cid}] turn completed");

        Ok(TurnReply {
            reply: reply.content,
            cid,
        })
    }
}
