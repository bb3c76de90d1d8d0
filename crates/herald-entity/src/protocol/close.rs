//! Reasons a live connection is closed and the close codes sent for them.

use serde::{Deserialize, Serialize};

/// RFC 6455 normal closure.
pub const CLOSE_NORMAL: u16 = 1000;
/// RFC 6455 going away.
pub const CLOSE_GOING_AWAY: u16 = 1001;
/// RFC 6455 policy violation.
pub const CLOSE_POLICY_VIOLATION: u16 = 1008;
/// RFC 6455 internal error.
pub const CLOSE_INTERNAL_ERROR: u16 = 1011;

/// Close reason text for a superseded connection.
pub const SUPERSEDED_REASON: &str = "superseded by new connection";
/// Close reason text for a failed handshake.
pub const AUTHENTICATION_REQUIRED_REASON: &str = "authentication required";

/// Why a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// The credential was missing, invalid, expired, or named a deleted user.
    AuthenticationRequired,
    /// The same user opened a newer connection.
    Superseded,
    /// The connection missed a full heartbeat cycle.
    HeartbeatTimeout,
    /// The server is shutting down.
    Shutdown,
    /// The server hit an unrecoverable error on this connection.
    InternalError,
    /// The peer closed or the transport failed.
    PeerClosed,
}

impl CloseReason {
    /// Close code and reason to send, or `None` to drop the socket without a close frame.
    pub fn close_frame(&self) -> Option<(u16, &'static str)> {
        match self {
            Self::AuthenticationRequired => {
                Some((CLOSE_POLICY_VIOLATION, AUTHENTICATION_REQUIRED_REASON))
            }
            Self::Superseded => Some((CLOSE_NORMAL, SUPERSEDED_REASON)),
            Self::Shutdown => Some((CLOSE_GOING_AWAY, "server shutting down")),
            Self::InternalError => Some((CLOSE_INTERNAL_ERROR, "internal error")),
            Self::HeartbeatTimeout | Self::PeerClosed => None,
        }
    }

    /// Classify a close frame received from the server.
    pub fn from_close_frame(code: u16, reason: &str) -> Self {
        match code {
            CLOSE_POLICY_VIOLATION => Self::AuthenticationRequired,
            CLOSE_NORMAL if reason == SUPERSEDED_REASON => Self::Superseded,
            CLOSE_GOING_AWAY => Self::Shutdown,
            CLOSE_INTERNAL_ERROR => Self::InternalError,
            _ => Self::PeerClosed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_distinguish_reasons() {
        assert_eq!(
            CloseReason::AuthenticationRequired.close_frame().map(|f| f.0),
            Some(1008)
        );
        assert_eq!(CloseReason::Superseded.close_frame().map(|f| f.0), Some(1000));
        assert_eq!(CloseReason::InternalError.close_frame().map(|f| f.0), Some(1011));
        assert!(CloseReason::HeartbeatTimeout.close_frame().is_none());
    }

    #[test]
    fn test_close_frame_round_trip() {
        for reason in [
            CloseReason::AuthenticationRequired,
            CloseReason::Superseded,
            CloseReason::Shutdown,
            CloseReason::InternalError,
        ] {
            let (code, text) = reason.close_frame().unwrap();
            assert_eq!(CloseReason::from_close_frame(code, text), reason);
        }
        assert_eq!(
            CloseReason::from_close_frame(1000, "bye"),
            CloseReason::PeerClosed
        );
    }
}
