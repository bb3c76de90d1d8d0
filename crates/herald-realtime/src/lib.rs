//! # herald-realtime
//!
//! Live notification engine for Herald:
//!
//! - `connection`: per-user registry of live connections, the bearer
//!   handshake, and the heartbeat sweep
//! - `message`: inbound frame decoding and command dispatch
//! - `notification`: publishing, the shared inbox operations, and
//!   delivery preferences
//! - `server`: [`RealtimeEngine`], which wires everything together

pub mod connection;
pub mod message;
pub mod notification;
pub mod server;

pub use connection::handle::{ConnectionHandle, OutboundEvent};
pub use connection::registry::ConnectionRegistry;
pub use notification::publisher::{NotificationEvent, NotificationPublisher};
pub use server::RealtimeEngine;
