mod key;
mod registry;
mod state;

pub use key::{RoomKeyPolicy, DEFAULT_MAX_ROOM_KEY_LEN, DEFAULT_ROOM};
pub use registry::{JoinOutcome, RoomRegistry, NORMAL_CLOSURE, ROOM_FULL_REASON};
pub use state::{Capacity, Frame, Outbound, PeerHandle, PeerId, Room};
