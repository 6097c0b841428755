use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Low-level reason a connection could not be established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkCode {
    /// `ENOTFOUND`
    DnsFailure,
    /// `ECONNREFUSED`
    ConnectionRefused,
    Other(String),
}

impl Display for NetworkCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkCode::DnsFailure => f.write_str("ENOTFOUND"),
            NetworkCode::ConnectionRefused => f.write_str("ECONNREFUSED"),
            NetworkCode::Other(code) => f.write_str(code),
        }
    }
}

/// Error body of an OpenAI-style API, `{"error": {"message": ..}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}

impl ErrorPayload {
    /// The nested error message, if there is a non-empty one.
    pub fn message(&self) -> Option<&str> {
        self.error
            .as_ref()
            .and_then(|body| body.message.as_deref())
            .filter(|message| !message.is_empty())
    }
}

/// Everything that can go wrong in a completion call, tagged by how far the request got.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompletionError {
    /// The service answered with a non-success status.
    #[error("completion service responded with {status} {status_text}")]
    Http {
        status: u16,
        status_text: String,
        payload: Option<ErrorPayload>,
    },

    /// The request went out but no (complete) response came back.
    #[error("no response from completion service: {message}")]
    NoResponse { message: String },

    /// A connection could not be established.
    #[error("could not reach completion service ({code}): {message}")]
    Network { code: NetworkCode, message: String },

    /// The request could not be built or sent, or the reply could not be understood.
    #[error("completion request failed: {message}")]
    Setup { message: String },
}
