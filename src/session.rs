use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::config::Config;
use crate::connection::{Action, ConnectionState};
use crate::metrics::RelayMetrics;
use crate::room::{
    Frame, JoinOutcome, Outbound, PeerHandle, PeerId, RoomKeyPolicy, RoomRegistry,
};
use crate::signaling::{ClientEnvelope, RelayKind};

/// Shared by every connection handler; injected into the router.
pub struct RelayState {
    pub registry: RoomRegistry,
    pub keys: RoomKeyPolicy,
    pub metrics: RelayMetrics,
    next_peer: AtomicU64,
}

impl RelayState {
    pub fn new(config: &Config) -> Self {
        Self {
            registry: RoomRegistry::new(config.capacity()),
            keys: RoomKeyPolicy::new(&config.default_room, config.max_room_key_len),
            metrics: RelayMetrics::new(),
            next_peer: AtomicU64::new(1),
        }
    }

    pub fn open_session(self: &Arc<Self>, tx: mpsc::UnboundedSender<Outbound>) -> PeerSession {
        let id = self.next_peer.fetch_add(1, Ordering::Relaxed);
        self.metrics.record_connection();
        PeerSession {
            handle: PeerHandle::new(id, tx),
            state: ConnectionState::Connecting,
            relay: Arc::clone(self),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The session was rejected and its close frame is queued.
    Close,
}

pub struct PeerSession {
    handle: PeerHandle,
    state: ConnectionState,
    relay: Arc<RelayState>,
}

impl PeerSession {
    pub fn id(&self) -> PeerId {
        self.handle.id()
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub async fn handle_text(&mut self, text: &str) -> Flow {
        self.handle_frame(text, Frame::Text).await
    }

    /// `frame` is the type the payload arrived as; relays keep it.
    pub async fn handle_frame(&mut self, text: &str, frame: Frame) -> Flow {
        let envelope = ClientEnvelope::parse(text);
        match self.state.on_envelope(&envelope) {
            Action::Join(requested) => self.join(requested).await,
            Action::Relay(kind, text) => {
                self.relay(kind, text, frame).await;
                Flow::Continue
            }
            Action::Ignore(reason) => {
                debug!(peer = self.id(), ?reason, state = %self.state, "ignoring envelope");
                Flow::Continue
            }
        }
    }

    async fn join(&mut self, requested: Option<&str>) -> Flow {
        let Some(room) = self.relay.keys.normalize(requested) else {
            debug!(peer = self.id(), requested, "ignoring join with invalid room key");
            return Flow::Continue;
        };
        match self.relay.registry.join(&room, &self.handle).await {
            JoinOutcome::Admitted { count } => {
                self.relay.metrics.record_join();
                info!(peer = self.id(), room = %room, count, "peer joined room");
                self.state = ConnectionState::Joined(room);
                Flow::Continue
            }
            JoinOutcome::Full { max } => {
                self.relay.metrics.record_rejection();
                info!(peer = self.id(), room = %room, max, "room full, rejecting peer");
                self.state = ConnectionState::Closed;
                Flow::Close
            }
        }
    }

    async fn relay(&self, kind: RelayKind, text: &str, frame: Frame) {
        let Some(room) = self.state.room() else {
            return;
        };
        let payload: Arc<str> = Arc::from(text);
        let members = self.relay.registry.members(room).await;

        for peer in members.iter().filter(|peer| peer.id() != self.id()) {
            let outbound = Outbound::Relay {
                payload: Arc::clone(&payload),
                frame,
            };
            match peer.send(outbound) {
                Ok(()) => {
                    self.relay.metrics.record_relayed();
                    trace!(from = self.id(), to = peer.id(), room, kind = kind.as_str(), "relayed envelope");
                }
                Err(err) => {
                    self.relay.metrics.record_relay_failure();
                    warn!(from = self.id(), to = peer.id(), room, kind = kind.as_str(), %err, "relay failed");
                }
            }
        }
    }

    /// Leaves the joined room, if any. Safe to call repeatedly.
    pub async fn close(&mut self) {
        let previous = std::mem::replace(&mut self.state, ConnectionState::Closed);
        if let ConnectionState::Joined(room) = previous {
            if self.relay.registry.remove_member(&room, self.id()).await {
                info!(peer = self.id(), room = %room, "peer left room");
            }
        }
    }
}
