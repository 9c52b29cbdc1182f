use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::borrow::Cow;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::room::{Frame, Outbound, PeerId};
use crate::session::{Flow, RelayState};

pub fn router(state: Arc<RelayState>, path: &str) -> Router {
    Router::new()
        .route(path, any(signaling_gate))
        .fallback(not_found)
        .with_state(state)
}

async fn signaling_gate(
    State(state): State<Arc<RelayState>>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    match upgrade {
        Ok(ws) => ws.on_upgrade(move |socket| serve_socket(socket, state)),
        Err(rejection) => {
            debug!(%rejection, "refusing non-upgrade request on signaling path");
            (
                StatusCode::UPGRADE_REQUIRED,
                [(header::UPGRADE, "websocket")],
                "Upgrade Required",
            )
                .into_response()
        }
    }
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn serve_socket(socket: WebSocket, state: Arc<RelayState>) {
    let (sink, mut stream) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();
    let mut session = state.open_session(tx);
    let peer = session.id();
    info!(peer, "signaling connection opened");

    let writer = tokio::spawn(write_outbound(peer, sink, rx));

    while let Some(frame) = stream.next().await {
        let (text, kind) = match frame {
            Ok(Message::Text(text)) => (text, Frame::Text),
            Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                Ok(text) => (text, Frame::Binary),
                Err(_) => {
                    debug!(peer, "ignoring non-UTF-8 binary frame");
                    continue;
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(err) => {
                debug!(peer, %err, "receive failed");
                break;
            }
        };

        if session.handle_frame(&text, kind).await == Flow::Close {
            break;
        }
    }

    session.close().await;
    // Dropping the session releases its queue sender; the writer drains what
    // is left and exits.
    drop(session);
    if let Err(err) = writer.await {
        warn!(peer, %err, "writer task failed");
    }
    info!(peer, "signaling connection closed");
}

async fn write_outbound(
    peer: PeerId,
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Outbound>,
) {
    while let Some(outbound) = rx.recv().await {
        let message = match outbound {
            Outbound::Status(envelope) => match serde_json::to_string(&envelope) {
                Ok(text) => Message::Text(text),
                Err(err) => {
                    warn!(peer, %err, "failed to encode status envelope");
                    continue;
                }
            },
            Outbound::Relay { payload, frame } => match frame {
                Frame::Text => Message::Text(payload.to_string()),
                Frame::Binary => Message::Binary(payload.as_bytes().to_vec()),
            },
            Outbound::Close { code, reason } => {
                let frame = CloseFrame {
                    code,
                    reason: Cow::Borrowed(reason),
                };
                if let Err(err) = sink.send(Message::Close(Some(frame))).await {
                    debug!(peer, %err, "close frame not delivered");
                }
                return;
            }
        };

        if let Err(err) = sink.send(message).await {
            debug!(peer, %err, "send failed, stopping writer");
            return;
        }
    }
    let _ = sink.close().await;
}
