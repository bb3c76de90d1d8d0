//! Client error types.

use thiserror::Error;

/// Errors returned by [`ClientConnectionManager`](crate::ClientConnectionManager) commands.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    /// There is no open connection to send on.
    #[error("Not connected")]
    NotConnected,
}
