use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use crate::room::RoomRegistry;
use crate::session::RelayState;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub connections: u64,
    pub joins: u64,
    pub rejections: u64,
    pub relayed: u64,
    pub relay_failures: u64,
    pub rooms: usize,
    pub peers: usize,
}

/// Lifetime counters for the relay.
#[derive(Debug, Default)]
pub struct RelayMetrics {
    connections: AtomicU64,
    joins: AtomicU64,
    rejections: AtomicU64,
    relayed: AtomicU64,
    relay_failures: AtomicU64,
}

impl RelayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_connection(&self) {
        self.connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_join(&self) {
        self.joins.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejection(&self) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_relayed(&self) {
        self.relayed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_relay_failure(&self) {
        self.relay_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub async fn snapshot(&self, registry: &RoomRegistry) -> RelayStats {
        let (rooms, peers) = registry.totals().await;
        RelayStats {
            connections: self.connections.load(Ordering::Relaxed),
            joins: self.joins.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
            relayed: self.relayed.load(Ordering::Relaxed),
            relay_failures: self.relay_failures.load(Ordering::Relaxed),
            rooms,
            peers,
        }
    }
}

pub fn spawn_reporter(state: Arc<RelayState>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let stats = state.metrics.snapshot(&state.registry).await;
            info!(
                rooms = stats.rooms,
                peers = stats.peers,
                connections = stats.connections,
                joins = stats.joins,
                rejections = stats.rejections,
                relayed = stats.relayed,
                relay_failures = stats.relay_failures,
                "relay stats"
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::{Capacity, PeerHandle};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn snapshot_combines_counters_and_registry() {
        let registry = RoomRegistry::new(Capacity::Bounded(2));
        let (tx, _rx) = mpsc::unbounded_channel();
        registry.join("r", &PeerHandle::new(1, tx)).await;

        let metrics = RelayMetrics::new();
        metrics.record_connection();
        metrics.record_join();
        metrics.record_relayed();
        metrics.record_relayed();

        let stats = metrics.snapshot(&registry).await;
        assert_eq!(stats.connections, 1);
        assert_eq!(stats.joins, 1);
        assert_eq!(stats.relayed, 2);
        assert_eq!(stats.rooms, 1);
        assert_eq!(stats.peers, 1);
    }

    #[tokio::test]
    async fn snapshot_follows_departures() {
        let registry = RoomRegistry::new(Capacity::Unbounded);
        let mut receivers = Vec::new();
        for (id, room) in [(1, "a"), (2, "a"), (3, "b")] {
            let (tx, rx) = mpsc::unbounded_channel();
            registry.join(room, &PeerHandle::new(id, tx)).await;
            receivers.push(rx);
        }

        let metrics = RelayMetrics::new();
        metrics.record_rejection();
        metrics.record_relay_failure();

        let stats = metrics.snapshot(&registry).await;
        assert_eq!((stats.rooms, stats.peers), (2, 3));

        registry.remove_member("a", 1).await;
        registry.remove_member("b", 3).await;
        let stats = metrics.snapshot(&registry).await;
        assert_eq!((stats.rooms, stats.peers), (1, 1));
        assert_eq!(stats.rejections, 1);
        assert_eq!(stats.relay_failures, 1);
    }
}
