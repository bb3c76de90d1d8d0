//! # herald-client
//!
//! Client side of the Herald live protocol. [`ClientConnectionManager`] owns
//! the socket, keeps it alive with pings, reconnects with exponential backoff
//! and folds server frames into a [`LocalNotificationState`] that callers can
//! observe.

pub mod backoff;
pub mod error;
pub mod local;
pub mod manager;
pub mod state;

pub use backoff::ReconnectPolicy;
pub use error::ClientError;
pub use local::LocalNotificationState;
pub use manager::{ClientConfig, ClientConnectionManager};
pub use state::ConnectionState;
