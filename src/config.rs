use clap::Parser;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::room::{Capacity, DEFAULT_MAX_ROOM_KEY_LEN, DEFAULT_ROOM};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_PATH: &str = "/ws";
pub const DEFAULT_MAX_PEERS: usize = 2;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "signal-relay",
    about = "WebSocket signaling relay that pairs peers by room",
    version
)]
pub struct Config {
    #[arg(
        long,
        env = "SIGNAL_RELAY_BIND",
        default_value = "127.0.0.1:8080",
        help = "Address to listen on"
    )]
    pub bind: SocketAddr,

    #[arg(
        long,
        env = "SIGNAL_RELAY_PATH",
        default_value = DEFAULT_PATH,
        help = "HTTP path that accepts WebSocket upgrades"
    )]
    pub path: String,

    #[arg(
        long,
        env = "SIGNAL_RELAY_MAX_PEERS",
        default_value_t = DEFAULT_MAX_PEERS,
        help = "Members allowed per room (0 = unlimited)"
    )]
    pub max_peers: usize,

    #[arg(
        long,
        env = "SIGNAL_RELAY_DEFAULT_ROOM",
        default_value = DEFAULT_ROOM,
        help = "Room used when a join names none"
    )]
    pub default_room: String,

    #[arg(
        long,
        env = "SIGNAL_RELAY_MAX_ROOM_KEY_LEN",
        default_value_t = DEFAULT_MAX_ROOM_KEY_LEN,
        help = "Joins naming a longer room key are ignored"
    )]
    pub max_room_key_len: usize,

    #[arg(
        long,
        env = "SIGNAL_RELAY_STATS_INTERVAL",
        default_value_t = 0,
        help = "Seconds between relay stats reports (0 = off)"
    )]
    pub stats_interval_secs: u64,

    #[arg(
        long,
        env = "SIGNAL_RELAY_LOG",
        default_value = "info",
        help = "Log filter used when RUST_LOG is unset"
    )]
    pub log_level: String,
}

impl Config {
    pub fn capacity(&self) -> Capacity {
        Capacity::from_max_peers(self.max_peers)
    }

    /// The configured path with a guaranteed leading slash.
    pub fn signaling_path(&self) -> String {
        match self.path.trim() {
            "" => DEFAULT_PATH.to_string(),
            path if path.starts_with('/') => path.to_string(),
            path => format!("/{}", path),
        }
    }

    pub fn stats_interval(&self) -> Option<Duration> {
        (self.stats_interval_secs > 0).then(|| Duration::from_secs(self.stats_interval_secs))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            path: DEFAULT_PATH.to_string(),
            max_peers: DEFAULT_MAX_PEERS,
            default_room: DEFAULT_ROOM.to_string(),
            max_room_key_len: DEFAULT_MAX_ROOM_KEY_LEN,
            stats_interval_secs: 0,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_match_default_impl() {
        let parsed = Config::parse_from(["signal-relay"]);
        let default = Config::default();
        // Env vars take precedence over the built-in defaults.
        if std::env::var_os("SIGNAL_RELAY_BIND").is_none() {
            assert_eq!(parsed.bind, default.bind);
        }
        if std::env::var_os("SIGNAL_RELAY_MAX_PEERS").is_none() {
            assert_eq!(parsed.max_peers, default.max_peers);
        }
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::parse_from([
            "signal-relay",
            "--bind",
            "0.0.0.0:9000",
            "--path",
            "signal",
            "--max-peers",
            "0",
            "--stats-interval-secs",
            "30",
        ]);
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.signaling_path(), "/signal");
        assert_eq!(config.capacity(), Capacity::Unbounded);
        assert_eq!(config.stats_interval(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn stats_disabled_by_default() {
        assert_eq!(Config::default().stats_interval(), None);
        assert_eq!(Config::default().capacity(), Capacity::Bounded(2));
    }
}
