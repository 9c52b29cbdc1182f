//! WebSocket signaling relay that pairs peers by room.

pub mod config;
pub mod connection;
pub mod error;
pub mod metrics;
pub mod room;
pub mod server;
pub mod session;
pub mod signaling;

pub use config::Config;
pub use error::{RelayError, Result};
pub use server::router;
pub use session::RelayState;
pub use signaling::{ClientEnvelope, Incoming, ServerEnvelope, SignalingClient};
