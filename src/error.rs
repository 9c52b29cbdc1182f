use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::room::PeerId;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("peer {0} is no longer reachable")]
    PeerGone(PeerId),
    #[error("Signaling error: {0}")]
    Signaling(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;
