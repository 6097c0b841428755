use super::error::{CompletionError, NetworkCode};

/// The user-facing category of a failed completion call. `Display` is the message shown to the
/// caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifiedError {
    #[error(
        "Unauthorized: Invalid OpenAI API key, please check the OPENAI_KEY setting in your environment or config.toml."
    )]
    InvalidCredential,

    #[error("{0}")]
    UpstreamApplication(String),

    #[error("Request failed with status code {status}: {status_text}")]
    UpstreamHttp { status: u16, status_text: String },

    #[error("No response received from the server")]
    NoResponse,

    #[error("Network error: {0}")]
    NetworkUnreachable(String),

    #[error("Request setup error: {0}")]
    RequestSetup(String),
}

/// Maps a completion failure onto exactly one category. Arms are tried top to bottom, so a 401
/// wins over an error payload, and a payload wins over the bare status line.
pub fn classify(error: &CompletionError) -> ClassifiedError {
    match error {
        CompletionError::Http { status: 401, .. } => ClassifiedError::InvalidCredential,
        CompletionError::Http {
            payload: Some(payload),
            ..
        } if payload.message().is_some() => {
            ClassifiedError::UpstreamApplication(payload.message().unwrap_or_default().to_string())
        }
        CompletionError::Http {
            status,
            status_text,
            ..
        } => ClassifiedError::UpstreamHttp {
            status: *status,
            status_text: status_text.clone(),
        },
        CompletionError::NoResponse { .. } => ClassifiedError::NoResponse,
        CompletionError::Network {
            code: NetworkCode::DnsFailure | NetworkCode::ConnectionRefused,
            message,
        } => ClassifiedError::NetworkUnreachable(message.clone()),
        CompletionError::Network { message, .. } | CompletionError::Setup { message } => {
            ClassifiedError::RequestSetup(message.clone())
        }
    }
}
