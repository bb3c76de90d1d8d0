//! Live connection lifecycle.

pub mod handle;
pub mod handshake;
pub mod heartbeat;
pub mod registry;

pub use handle::{ConnectionHandle, OutboundEvent};
pub use handshake::{AuthenticatedUser, SessionHandshake};
pub use heartbeat::HeartbeatMonitor;
pub use registry::ConnectionRegistry;
