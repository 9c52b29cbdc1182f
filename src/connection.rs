use std::fmt;

use crate::signaling::{ClientEnvelope, RelayKind};

/// Per-connection lifecycle: `Connecting -> Joined(room) -> Closed`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Joined(String),
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Joined(room) => write!(f, "Joined({})", room),
            ConnectionState::Closed => write!(f, "Closed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    Unrecognized,
    AlreadyJoined,
    NotJoined,
    Closed,
}

/// What a session should do with one inbound envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    Join(Option<&'a str>),
    Relay(RelayKind, &'a str),
    Ignore(Ignored),
}

impl ConnectionState {
    pub fn on_envelope<'a>(&self, envelope: &'a ClientEnvelope) -> Action<'a> {
        match (self, envelope) {
            (ConnectionState::Closed, _) => Action::Ignore(Ignored::Closed),
            (_, ClientEnvelope::Unknown) => Action::Ignore(Ignored::Unrecognized),
            (ConnectionState::Connecting, ClientEnvelope::Join { room }) => {
                Action::Join(room.as_deref())
            }
            (ConnectionState::Connecting, ClientEnvelope::Relay { .. }) => {
                Action::Ignore(Ignored::NotJoined)
            }
            (ConnectionState::Joined(_), ClientEnvelope::Join { .. }) => {
                Action::Ignore(Ignored::AlreadyJoined)
            }
            (ConnectionState::Joined(_), ClientEnvelope::Relay { kind, text }) => {
                Action::Relay(*kind, text)
            }
        }
    }

    pub fn room(&self) -> Option<&str> {
        match self {
            ConnectionState::Joined(room) => Some(room),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join(room: &str) -> ClientEnvelope {
        ClientEnvelope::Join {
            room: Some(room.to_string()),
        }
    }

    fn offer() -> ClientEnvelope {
        ClientEnvelope::Relay {
            kind: RelayKind::Offer,
            text: r#"{"type":"offer"}"#.to_string(),
        }
    }

    #[test]
    fn connecting_accepts_join_only() {
        let state = ConnectionState::Connecting;
        assert_eq!(state.on_envelope(&join("r")), Action::Join(Some("r")));
        assert_eq!(
            state.on_envelope(&offer()),
            Action::Ignore(Ignored::NotJoined)
        );
        assert_eq!(
            state.on_envelope(&ClientEnvelope::Unknown),
            Action::Ignore(Ignored::Unrecognized)
        );
    }

    #[test]
    fn joined_relays_and_refuses_reassignment() {
        let state = ConnectionState::Joined("r".to_string());
        assert_eq!(
            state.on_envelope(&offer()),
            Action::Relay(RelayKind::Offer, r#"{"type":"offer"}"#)
        );
        assert_eq!(
            state.on_envelope(&join("other")),
            Action::Ignore(Ignored::AlreadyJoined)
        );
        assert_eq!(state.room(), Some("r"));
        assert_eq!(state.to_string(), "Joined(r)");
    }

    #[test]
    fn closed_ignores_everything() {
        let state = ConnectionState::Closed;
        for envelope in [join("r"), offer(), ClientEnvelope::Unknown] {
            assert_eq!(state.on_envelope(&envelope), Action::Ignore(Ignored::Closed));
        }
        assert_eq!(state.room(), None);
    }
}
