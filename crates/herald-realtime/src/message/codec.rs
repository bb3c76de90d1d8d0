//! JSON frame codec.

use thiserror::Error;

use herald_core::error::AppError;
use herald_entity::protocol::{ClientFrame, ServerFrame};

/// Maximum accepted inbound frame size in bytes.
pub const MAX_FRAME_BYTES: usize = 64 * 1024;

/// Why an inbound frame could not be turned into a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Not a JSON object, missing `type`, oversized, or a known type with a bad payload.
    #[error("malformed frame: {0}")]
    Malformed(String),
    /// Well-formed, but `type` names no command.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
}

impl FrameError {
    /// Wire error code sent back for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "INVALID_MESSAGE",
            Self::UnknownCommand(_) => "UNKNOWN_COMMAND",
        }
    }
}

/// Decode one inbound text frame.
pub fn decode_frame(raw: &str) -> Result<ClientFrame, FrameError> {
    if raw.len() > MAX_FRAME_BYTES {
        return Err(FrameError::Malformed(format!(
            "frame exceeds maximum size of {MAX_FRAME_BYTES} bytes"
        )));
    }
    if raw.trim().is_empty() {
        return Err(FrameError::Malformed("empty frame".to_string()));
    }

    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| FrameError::Malformed(e.to_string()))?;
    let frame_type = value
        .as_object()
        .ok_or_else(|| FrameError::Malformed("frame is not a JSON object".to_string()))?
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or_else(|| FrameError::Malformed("missing 'type' field".to_string()))?;

    if !ClientFrame::is_known_type(frame_type) {
        return Err(FrameError::UnknownCommand(frame_type.to_string()));
    }

    serde_json::from_value(value).map_err(|e| FrameError::Malformed(e.to_string()))
}

/// Serialize an outbound frame.
pub fn encode_frame(frame: &ServerFrame) -> Result<String, AppError> {
    Ok(serde_json::to_string(frame)?)
}

#[cfg(test)]
mod tests {
    use herald_core::types::id::NotificationId;

    use super::*;

    #[test]
    fn test_decodes_known_command() {
        let id = NotificationId::new();
        let raw = format!(r#"{{"type":"mark_opened","notificationId":"{id}"}}"#);
        assert_eq!(
            decode_frame(&raw),
            Ok(ClientFrame::MarkOpened { notification_id: id })
        );
        assert_eq!(decode_frame(r#"{"type":"ping"}"#), Ok(ClientFrame::Ping));
    }

    #[test]
    fn test_unknown_type_is_distinguished_from_malformed() {
        assert_eq!(
            decode_frame(r#"{"type":"subscribe","channel":"x"}"#),
            Err(FrameError::UnknownCommand("subscribe".to_string()))
        );
    }

    #[test]
    fn test_malformed_inputs() {
        for raw in [
            "",
            "   ",
            "not json",
            "[1,2]",
            r#"{"no_type":true}"#,
            r#"{"type":7}"#,
            r#"{"type":"mark_viewed","notificationIds":"oops"}"#,
        ] {
            assert!(
                matches!(decode_frame(raw), Err(FrameError::Malformed(_))),
                "expected malformed for {raw:?}"
            );
        }
    }

    #[test]
    fn test_oversized_frame_is_malformed() {
        let raw = format!(r#"{{"type":"ping","pad":"{}"}}"#, "x".repeat(MAX_FRAME_BYTES));
        let err = decode_frame(&raw).unwrap_err();
        assert_eq!(err.code(), "INVALID_MESSAGE");
    }

    #[test]
    fn test_encode_uses_type_tag() {
        let text = encode_frame(&ServerFrame::UnreadCount { count: 2 }).unwrap();
        assert_eq!(text, r#"{"type":"unread_count","count":2}"#);
    }
}
