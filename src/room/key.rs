/// Fallback room for joins that name no room.
pub const DEFAULT_ROOM: &str = "default";
pub const DEFAULT_MAX_ROOM_KEY_LEN: usize = 128;

/// Turns the raw `room` field of a join into a registry key.
///
/// Keys are trimmed and a blank key maps to the default room. Keys longer than
/// `max_len` characters or containing control characters are refused rather
/// than rewritten, so two distinct keys never land in the same room.
#[derive(Debug, Clone)]
pub struct RoomKeyPolicy {
    default_room: String,
    max_len: usize,
}

impl RoomKeyPolicy {
    pub fn new(default_room: &str, max_len: usize) -> Self {
        let default_room = match default_room.trim() {
            "" => DEFAULT_ROOM,
            trimmed => trimmed,
        };
        Self {
            default_room: default_room.to_string(),
            max_len: max_len.max(1),
        }
    }

    pub fn default_room(&self) -> &str {
        &self.default_room
    }

    /// `None` when the key cannot name a room.
    pub fn normalize(&self, raw: Option<&str>) -> Option<String> {
        let key = raw.unwrap_or_default().trim();
        if key.is_empty() {
            return Some(self.default_room.clone());
        }
        if key.chars().any(char::is_control) || key.chars().count() > self.max_len {
            return None;
        }
        Some(key.to_string())
    }
}

impl Default for RoomKeyPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ROOM, DEFAULT_MAX_ROOM_KEY_LEN)
    }
}
