use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::chat::engine::{ChatEngine, TurnError, TurnReply, TurnRequest};

/// Parameters of one relay call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatResponse {
    Reply { reply: String, cid: String },
    Failure { error: String },
}

/// A response body together with the status the caller should see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayResponse {
    pub status: u16,
    #[serde(flatten)]
    pub body: ChatResponse,
}

impl From<TurnReply> for RelayResponse {
    fn from(TurnReply { reply, cid }: TurnReply) -> Self {
        Self {
            status: 200,
            body: ChatResponse::Reply { reply, cid },
        }
    }
}

impl From<TurnError> for RelayResponse {
    fn from(error: TurnError) -> Self {
        Self {
            status: error.status(),
            body: ChatResponse::Failure {
                error: error.to_string(),
            },
        }
    }
}

pub struct Relay {
    engine: ChatEngine,
}

impl Relay {
    pub fn new(engine: ChatEngine) -> Self {
        Self { engine }
    }

    pub async fn handle(&self, request: ChatRequest) -> RelayResponse {
        log::info!("received request: {request:?}");

        let ChatRequest { question, cid } = request;

        match self.engine.turn(TurnRequest { question, cid }).await {
            Ok(reply) => reply.into(),
            Err(why) => {
                log::warn!("turn failed with status {}: {why}", why.status());
                why.into()
            }
        }
    }

    /// Handles one JSON-encoded request. Undecodable bytes are answered like malformed JSON.
    pub async fn handle_line(&self, line: &[u8]) -> RelayResponse {
        match serde_json::from_slice::<ChatRequest>(line) {
            Ok(request) => self.handle(request).await,
            Err(why) => {
                log::warn!("rejecting malformed request: {why}");
                TurnError::InvalidRequest(why.to_string()).into()
            }
        }
    }

    /// Serves newline-delimited JSON until `reader` hits EOF: one request per line in, one
    /// response per line out.
    pub async fn run<R, W>(&self, mut reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = Vec::new();

        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line).await? == 0 {
                break;
            }

            let request = line.trim_ascii();
            if request.is_empty() {
                continue;
            }

            let response = self.handle_line(request).await;

            let mut encoded = serde_json::to_vec(&response)?;
            encoded.push(b'\n');
            writer.write_all(&encoded).await?;
            writer.flush().await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{Value, json};

    use super::*;
    use crate::{
        chat::{
            client::{CompletionError, ErrorBody, ErrorPayload, testing::ScriptedClient},
            store::MemoryStore,
        },
        config::RelayConfig,
    };

    fn relay(client: ScriptedClient) -> (Relay, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let engine = ChatEngine::new(&RelayConfig::default(), store.clone(), Arc::new(client));
        (Relay::new(engine), store)
    }

    #[test]
    fn responses_serialize_flat() {
        let ok = RelayResponse {
            status: 200,
            body: ChatResponse::Reply {
                reply: "Hello!".to_string(),
                cid: "abc".to_string(),
            },
        };
        let failed = RelayResponse {
            status: 500,
            body: ChatResponse::Failure {
                error: "No response received from the server".to_string(),
            },
        };

        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({ "status": 200, "reply": "Hello!", "cid": "abc" })
        );
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({ "status": 500, "error": "No response received from the server" })
        );
    }

    #[test]
    fn requests_accept_an_optional_cid() {
        let bare: ChatRequest = serde_json::from_str(r#"{"question": "Hi"}"#).unwrap();
        let continued: ChatRequest =
            serde_json::from_str(r#"{"question": "continue", "cid": "abc"}"#).unwrap();

        assert_eq!(bare.cid, None);
        assert_eq!(continued.cid.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn successful_turn_returns_reply_and_cid() {
        let (relay, store) = relay(ScriptedClient::replying("Hello!"));

        let response = relay.handle_line(br#"{"question": "Hi"}"#).await;

        assert_eq!(response.status, 200);
        match response.body {
            ChatResponse::Reply { reply, cid } => {
                assert_eq!(reply, "Hello!");
                assert_eq!(store.len(&cid).await, 2);
            }
            other => panic!("expected a reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn upstream_failure_is_a_500_with_an_error_string() {
        let (relay, store) = relay(ScriptedClient::failing(CompletionError::Http {
            status: 429,
            status_text: "Too Many Requests".to_string(),
            payload: Some(ErrorPayload {
                error: Some(ErrorBody {
                    message: Some("You exceeded your current quota".to_string()),
                    ..Default::default()
                }),
            }),
        }));

        let response = relay
            .handle(ChatRequest {
                question: "Hi".to_string(),
                cid: Some("abc".to_string()),
            })
            .await;

        assert_eq!(
            response,
            RelayResponse {
                status: 500,
                body: ChatResponse::Failure {
                    error: "You exceeded your current quota".to_string()
                },
            }
        );
        assert_eq!(store.len("abc").await, 1);
    }

    #[tokio::test]
    async fn malformed_requests_are_400s() {
        let (relay, _) = relay(ScriptedClient::new());

        for line in [r#"{"cid": "abc"}"#, "not json", r#"{"question": 42}"#] {
            let response = relay.handle_line(line.as_bytes()).await;

            assert_eq!(response.status, 400, "{line}");
            match response.body {
                ChatResponse::Failure { error } => {
                    assert!(error.starts_with("Invalid request: "), "{error}")
                }
                other => panic!("expected a failure, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn run_answers_each_line_in_order() {
        let client = ScriptedClient::new();
        client.push_reply("Hello!").push_error(CompletionError::NoResponse {
            message: "timed out".to_string(),
        });
        let (relay, _) = relay(client);

        let input = b"{\"question\": \"Hi\", \"cid\": \"abc\"}\n\n{\"question\": \"again\", \"cid\": \"abc\"}\n";
        let mut output = Vec::new();

        relay.run(&input[..], &mut output).await.unwrap();

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(
            responses,
            vec![
                json!({ "status": 200, "reply": "Hello!", "cid": "abc" }),
                json!({ "status": 500, "error": "No response received from the server" }),
            ]
        );
    }

    #[tokio::test]
    async fn undecodable_line_is_answered_and_the_stream_continues() {
        let (relay, store) = relay(ScriptedClient::replying("Hello!"));

        let input = b"{\"question\": \"\xff\xfe\"}\n{\"question\": \"Hi\", \"cid\": \"abc\"}\n";
        let mut output = Vec::new();

        relay.run(&input[..], &mut output).await.unwrap();

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["status"], 400);
        assert!(
            responses[0]["error"]
                .as_str()
                .unwrap()
                .starts_with("Invalid request: ")
        );
        assert_eq!(
            responses[1],
            json!({ "status": 200, "reply": "Hello!", "cid": "abc" })
        );
        assert_eq!(store.len("abc").await, 2);
    }

    #[tokio::test]
    async fn last_line_without_newline_is_still_answered() {
        let (relay, _) = relay(ScriptedClient::replying("Hello!"));
        let mut output = Vec::new();

        relay
            .run(&b"{\"question\": \"Hi\", \"cid\": \"abc\"}"[..], &mut output)
            .await
            .unwrap();

        let response: Value = serde_json::from_slice(output.trim_ascii()).unwrap();
        assert_eq!(response["status"], 200);
    }
}
