use std::{error::Error as StdError, io, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{chat::context::ChatMessage, config::structure::LLMConfig};

use super::{
    CompletionClient, CompletionOptions,
    error::{CompletionError, ErrorPayload, NetworkCode},
};

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    n: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for the OpenAI chat completions endpoint, or anything that speaks its wire format.
pub struct OpenAIClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    pub fn new(config: &LLMConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self::with_http_client(builder.build()?, config))
    }

    /// Uses a preconfigured `reqwest` client; `config.timeout_secs` is ignored here.
    pub fn with_http_client(http: reqwest::Client, config: &LLMConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionClient for OpenAIClient {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<ChatMessage, CompletionError> {
        if options.stream {
            return Err(CompletionError::Setup {
                message: "streamed completions are not supported".to_string(),
            });
        }

        let request = CompletionRequest {
            model,
            messages,
            temperature: options.temperature,
            n: options.candidate_count,
            stream: false,
        };

        log::debug!(
            "requesting completion from {} with {} messages",
            self.endpoint(),
            messages.len()
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| CompletionError::NoResponse {
                message: describe(&e),
            })?;

        if !status.is_success() {
            return Err(CompletionError::Http {
                status: status.as_u16(),
                status_text: status
                    .canonical_reason()
                    .unwrap_or("Unknown Status")
                    .to_string(),
                payload: serde_json::from_slice::<ErrorPayload>(&body).ok(),
            });
        }

        let completion: CompletionResponse =
            serde_json::from_slice(&body).map_err(|e| CompletionError::Setup {
                message: format!("invalid completion response: {e}"),
            })?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::Setup {
                message: "completion response contained no choices".to_string(),
            })?;

        Ok(ChatMessage::assistant(
            choice.message.content.unwrap_or_default(),
        ))
    }
}

fn transport_error(error: reqwest::Error) -> CompletionError {
    let message = describe(&error);

    if error.is_builder() {
        CompletionError::Setup { message }
    } else if error.is_timeout() {
        CompletionError::NoResponse { message }
    } else if error.is_connect() {
        CompletionError::Network {
            code: network_code(&error),
            message,
        }
    } else {
        CompletionError::NoResponse { message }
    }
}

/// Renders an error together with its whole source chain, reqwest keeps the useful part there.
fn describe(error: &(dyn StdError + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}

fn network_code(error: &reqwest::Error) -> NetworkCode {
    let mut fallback = None;
    let mut source: Option<&(dyn StdError + 'static)> = Some(error);

    while let Some(cause) = source {
        let text = cause.to_string().to_lowercase();
        if text.contains("dns error") || text.contains("failed to lookup address") {
            return NetworkCode::DnsFailure;
        }

        if let Some(io_error) = cause.downcast_ref::<io::Error>() {
            match io_error.kind() {
                io::ErrorKind::ConnectionRefused => return NetworkCode::ConnectionRefused,
                io::ErrorKind::ConnectionReset => {
                    fallback.get_or_insert(NetworkCode::Other("ECONNRESET".to_string()));
                }
                io::ErrorKind::TimedOut => {
                    fallback.get_or_insert(NetworkCode::Other("ETIMEDOUT".to_string()));
                }
                kind => {
                    fallback.get_or_insert(NetworkCode::Other(format!("{kind:?}")));
                }
            }
        } else if text.contains("connection refused") {
            return NetworkCode::ConnectionRefused;
        }

        source = cause.source();
    }

    fallback.unwrap_or_else(|| NetworkCode::Other("ECONNECT".to_string()))
}
