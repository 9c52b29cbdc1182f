use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::{RelayError, Result};
use crate::signaling::ServerEnvelope;

pub type PeerId = u64;

/// WebSocket frame type a relayed payload arrived as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    Text,
    Binary,
}

/// Frames queued for a connection's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Status(ServerEnvelope),
    Relay { payload: Arc<str>, frame: Frame },
    Close { code: u16, reason: &'static str },
}

/// Send/close capability for one connection. Cloning it does not keep the
/// socket open; the writer task ends once every handle is gone.
#[derive(Debug, Clone)]
pub struct PeerHandle {
    id: PeerId,
    tx: mpsc::UnboundedSender<Outbound>,
}

impl PeerHandle {
    pub fn new(id: PeerId, tx: mpsc::UnboundedSender<Outbound>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    pub fn send(&self, outbound: Outbound) -> Result<()> {
        self.tx
            .send(outbound)
            .map_err(|_| RelayError::PeerGone(self.id))
    }

    pub fn close(&self, code: u16, reason: &'static str) -> Result<()> {
        self.send(Outbound::Close { code, reason })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    Bounded(usize),
    Unbounded,
}

impl Capacity {
    /// `0` selects the uncapped broadcast room.
    pub fn from_max_peers(max_peers: usize) -> Self {
        match max_peers {
            0 => Self::Unbounded,
            max => Self::Bounded(max),
        }
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capacity::Bounded(max) => write!(f, "{}", max),
            Capacity::Unbounded => write!(f, "unbounded"),
        }
    }
}

#[derive(Debug, Default)]
pub struct Room {
    peers: Vec<PeerHandle>,
}

impl Room {
    pub fn new() -> Self {
        Self::default()
    }

    /// Members in join order.
    pub fn peers(&self) -> &[PeerHandle] {
        &self.peers
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn add_peer(&mut self, peer: PeerHandle) {
        self.peers.push(peer);
    }

    pub fn remove_peer(&mut self, peer_id: PeerId) -> bool {
        let before = self.peers.len();
        self.peers.retain(|peer| peer.id != peer_id);
        self.peers.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(id: PeerId) -> (PeerHandle, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (PeerHandle::new(id, tx), rx)
    }

    #[test]
    fn room_keeps_join_order_and_removes_by_id() {
        let (a, _a_rx) = handle(1);
        let (b, _b_rx) = handle(2);
        let mut room = Room::new();
        room.add_peer(a);
        room.add_peer(b);

        let ids: Vec<_> = room.peers().iter().map(PeerHandle::id).collect();
        assert_eq!(ids, vec![1, 2]);

        assert!(room.remove_peer(1));
        assert!(!room.remove_peer(1));
        assert_eq!(room.len(), 1);
        assert!(room.remove_peer(2));
        assert!(room.is_empty());
    }

    #[test]
    fn send_to_dropped_peer_reports_peer_gone() {
        let (peer, rx) = handle(9);
        drop(rx);
        assert!(matches!(
            peer.send(Outbound::Status(ServerEnvelope::NewPeer)),
            Err(RelayError::PeerGone(9))
        ));
    }

    #[test]
    fn zero_max_peers_means_unbounded() {
        assert_eq!(Capacity::from_max_peers(0), Capacity::Unbounded);
        assert_eq!(Capacity::from_max_peers(2), Capacity::Bounded(2));
        assert_eq!(Capacity::Bounded(2).to_string(), "2");
    }
}
