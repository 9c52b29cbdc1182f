use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use crate::error::{RelayError, Result};

/// Relay payload types. The server never looks past the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayKind {
    Offer,
    Answer,
    Candidate,
    Chat,
}

impl RelayKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "offer" => Some(Self::Offer),
            "answer" => Some(Self::Answer),
            "candidate" => Some(Self::Candidate),
            "chat" => Some(Self::Chat),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offer => "offer",
            Self::Answer => "answer",
            Self::Candidate => "candidate",
            Self::Chat => "chat",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEnvelope {
    /// `{cmd:"join", room}`. The room is kept raw; key normalization happens
    /// at admission time.
    Join { room: Option<String> },
    /// A relay envelope together with the exact text it arrived as.
    Relay { kind: RelayKind, text: String },
    Unknown,
}

impl ClientEnvelope {
    pub fn parse(text: &str) -> Self {
        let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(text) else {
            return Self::Unknown;
        };

        if fields.get("cmd").and_then(Value::as_str) == Some("join") {
            let room = fields.get("room").and_then(Value::as_str).map(str::to_owned);
            return Self::Join { room };
        }

        match fields
            .get("type")
            .and_then(Value::as_str)
            .and_then(RelayKind::from_tag)
        {
            Some(kind) => Self::Relay {
                kind,
                text: text.to_owned(),
            },
            None => Self::Unknown,
        }
    }
}

/// Status envelopes originated by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEnvelope {
    Peers { count: usize },
    NewPeer,
    RoomFull { max: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Envelope(Value),
    Closed { code: Option<u16>, reason: String },
}

pub struct SignalingClient {
    tx: mpsc::Sender<Message>,
    rx: mpsc::Receiver<Incoming>,
}

impl SignalingClient {
    pub async fn connect(url: &str) -> Result<Self> {
        let (ws_stream, _) = connect_async(url).await?;
        let (mut write, mut read) = ws_stream.split();

        let (incoming_tx, rx) = mpsc::channel(100);
        let (tx, mut outgoing_rx) = mpsc::channel::<Message>(100);

        // Handle outgoing messages
        tokio::spawn(async move {
            while let Some(msg) = outgoing_rx.recv().await {
                let closing = matches!(msg, Message::Close(_));
                if write.send(msg).await.is_err() || closing {
                    break;
                }
            }
        });

        // Handle incoming messages
        tokio::spawn(async move {
            let closed = loop {
                let incoming = match read.next().await {
                    Some(Ok(Message::Text(text))) => match serde_json::from_str::<Value>(&text) {
                        Ok(value) => Incoming::Envelope(value),
                        Err(err) => {
                            debug!(%err, "dropping non-JSON frame from relay");
                            continue;
                        }
                    },
                    Some(Ok(Message::Close(frame))) => {
                        break match frame {
                            Some(frame) => Incoming::Closed {
                                code: Some(u16::from(frame.code)),
                                reason: frame.reason.into_owned(),
                            },
                            None => Incoming::Closed {
                                code: None,
                                reason: String::new(),
                            },
                        };
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => {
                        break Incoming::Closed {
                            code: None,
                            reason: err.to_string(),
                        }
                    }
                    None => {
                        break Incoming::Closed {
                            code: None,
                            reason: String::new(),
                        }
                    }
                };
                if incoming_tx.send(incoming).await.is_err() {
                    return;
                }
            };
            let _ = incoming_tx.send(closed).await;
        });

        Ok(Self { tx, rx })
    }

    pub async fn join(&self, room: &str) -> Result<()> {
        self.send(&json!({ "cmd": "join", "room": room })).await
    }

    pub async fn send<T: Serialize>(&self, envelope: &T) -> Result<()> {
        let text = serde_json::to_string(envelope)?;
        self.send_text(text).await
    }

    pub async fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.tx
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| RelayError::Signaling(format!("Failed to send message: {}", e)))
    }

    /// Next envelope or close notification. `None` once the connection is
    /// gone and everything has been drained.
    pub async fn receive(&mut self) -> Option<Incoming> {
        self.rx.recv().await
    }

    pub async fn close(&self) -> Result<()> {
        self.tx
            .send(Message::Close(None))
            .await
            .map_err(|e| RelayError::Signaling(format!("Failed to close connection: {}", e)))
    }
}
