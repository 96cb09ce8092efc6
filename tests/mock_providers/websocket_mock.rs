//! WebSocket Mock Server for the OpenAI Realtime API
//!
//! Accepts one connection, records the handshake and every client frame, and
//! answers the handful of client events the gateway sends:
//! - `session.update` → `session.updated`
//! - `response.create` → `response.created`, one audio delta, `response.done`

use std::net::SocketAddr;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{
    accept_hdr_async,
    tungstenite::{
        Message,
        handshake::server::{ErrorResponse, Request, Response},
    },
};

pub const MOCK_SESSION_ID: &str = "sess_mock";
pub const MOCK_RESPONSE_ID: &str = "resp_mock";
pub const MOCK_AUDIO_DELTA: &str = "bW9jay1hdWRpbw==";

/// What the mock saw from the client.
#[derive(Debug, Clone, PartialEq)]
pub enum ReceivedFrame {
    Event(Value),
    Close,
}

/// Handshake details captured on accept.
#[derive(Debug, Clone)]
pub struct Handshake {
    pub uri: String,
    pub authorization: Option<String>,
    pub openai_beta: Option<String>,
}

pub struct MockRealtimeServer {
    pub addr: SocketAddr,
    pub handshake: oneshot::Receiver<Handshake>,
    pub received: mpsc::UnboundedReceiver<ReceivedFrame>,
}

impl MockRealtimeServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().expect("mock server address");
        let (handshake_tx, handshake_rx) = oneshot::channel();
        let (received_tx, received_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let callback = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
                let header = |name: &str| {
                    request
                        .headers()
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string)
                };
                let _ = handshake_tx.send(Handshake {
                    uri: request.uri().to_string(),
                    authorization: header("authorization"),
                    openai_beta: header("openai-beta"),
                });
                Ok(response)
            };
            let Ok(ws) = accept_hdr_async(stream, callback).await else {
                return;
            };
            let (mut write, mut read) = ws.split();

            let created = json!({
                "type": "session.created",
                "event_id": "evt_1",
                "session": { "id": MOCK_SESSION_ID, "object": "realtime.session" }
            });
            if write.send(Message::Text(created.to_string().into())).await.is_err() {
                return;
            }

            while let Some(Ok(msg)) = read.next().await {
                match msg {
                    Message::Text(text) => {
                        let Ok(event) = serde_json::from_str::<Value>(text.as_str()) else {
                            continue;
                        };
                        let replies = replies_for(&event);
                        let _ = received_tx.send(ReceivedFrame::Event(event));
                        for reply in replies {
                            if write.send(Message::Text(reply.to_string().into())).await.is_err() {
                                return;
                            }
                        }
                    }
                    Message::Close(_) => {
                        let _ = received_tx.send(ReceivedFrame::Close);
                        break;
                    }
                    _ => {}
                }
            }
        });

        Self {
            addr,
            handshake: handshake_rx,
            received: received_rx,
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}/v1/realtime", self.addr)
    }
}

fn replies_for(event: &Value) -> Vec<Value> {
    match event["type"].as_str() {
        Some("session.update") => vec![json!({ "type": "session.updated", "session": {} })],
        Some("response.create") => vec![
            json!({
                "type": "response.created",
                "response": { "id": MOCK_RESPONSE_ID, "status": "in_progress" }
            }),
            json!({
                "type": "response.audio.delta",
                "response_id": MOCK_RESPONSE_ID,
                "item_id": "item_1",
                "output_index": 0,
                "content_index": 0,
                "delta": MOCK_AUDIO_DELTA
            }),
            json!({
                "type": "response.done",
                "response": { "id": MOCK_RESPONSE_ID, "status": "completed" }
            }),
        ],
        _ => Vec::new(),
    }
}
