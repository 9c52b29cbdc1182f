use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

use super::state::{Capacity, Outbound, PeerHandle, PeerId, Room};
use crate::signaling::ServerEnvelope;

pub const NORMAL_CLOSURE: u16 = 1000;
pub const ROOM_FULL_REASON: &str = "room full";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// `count` includes the joiner.
    Admitted { count: usize },
    Full { max: usize },
}

#[derive(Debug, Default)]
struct Rooms(HashMap<String, Room>);

impl Rooms {
    fn get(&self, key: &str) -> Option<&Room> {
        self.0.get(key)
    }

    fn get_or_create(&mut self, key: &str) -> &mut Room {
        self.0.entry(key.to_string()).or_insert_with(|| {
            debug!(room = key, "creating room");
            Room::new()
        })
    }

    fn remove_member(&mut self, key: &str, peer_id: PeerId) -> bool {
        let Some(room) = self.0.get_mut(key) else {
            return false;
        };
        let removed = room.remove_peer(peer_id);
        if room.is_empty() {
            debug!(room = key, "last member left, deleting room");
            self.0.remove(key);
        }
        removed
    }
}

/// All rooms behind one lock. Sends made while holding it are queue pushes,
/// never socket I/O.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: Mutex<Rooms>,
    capacity: Capacity,
}

impl RoomRegistry {
    pub fn new(capacity: Capacity) -> Self {
        Self {
            rooms: Mutex::new(Rooms::default()),
            capacity,
        }
    }

    /// Admits `joiner` into `key`, or rejects it when the room is at capacity.
    ///
    /// On admission the joiner gets `peers` with the post-join count and each
    /// existing member gets one `new_peer`. On rejection the joiner gets
    /// `room_full` followed by a normal-closure close, and no room is created
    /// or modified.
    pub async fn join(&self, key: &str, joiner: &PeerHandle) -> JoinOutcome {
        let mut rooms = self.rooms.lock().await;

        let peers_before = rooms.get(key).map_or(0, Room::len);
        if let Capacity::Bounded(max) = self.capacity {
            if peers_before >= max {
                if let Err(err) = joiner.send(Outbound::Status(ServerEnvelope::RoomFull { max })) {
                    debug!(room = key, %err, "rejected peer already gone");
                }
                if let Err(err) = joiner.close(NORMAL_CLOSURE, ROOM_FULL_REASON) {
                    debug!(room = key, %err, "rejected peer already gone");
                }
                return JoinOutcome::Full { max };
            }
        }

        let room = rooms.get_or_create(key);
        let count = room.len() + 1;
        if let Err(err) = joiner.send(Outbound::Status(ServerEnvelope::Peers { count })) {
            debug!(room = key, %err, "joining peer already gone");
        }
        for peer in room.peers() {
            if let Err(err) = peer.send(Outbound::Status(ServerEnvelope::NewPeer)) {
                debug!(room = key, peer = peer.id(), %err, "new_peer notification dropped");
            }
        }
        room.add_peer(joiner.clone());

        JoinOutcome::Admitted { count }
    }

    /// Removes a member and deletes its room once empty. Unknown rooms and
    /// peers are a no-op; returns whether anything was removed.
    pub async fn remove_member(&self, key: &str, peer_id: PeerId) -> bool {
        self.rooms.lock().await.remove_member(key, peer_id)
    }

    /// Snapshot of a room's members in join order.
    pub async fn members(&self, key: &str) -> Vec<PeerHandle> {
        self.rooms
            .lock()
            .await
            .get(key)
            .map(|room| room.peers().to_vec())
            .unwrap_or_default()
    }

    pub async fn member_count(&self, key: &str) -> usize {
        self.rooms.lock().await.get(key).map_or(0, Room::len)
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.0.len()
    }

    /// `(rooms, peers)` read under a single lock.
    pub async fn totals(&self) -> (usize, usize) {
        let rooms = self.rooms.lock().await;
        let peers = rooms.0.values().map(Room::len).sum();
        (rooms.0.len(), peers)
    }
}
