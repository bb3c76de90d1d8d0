//! Inbound and outbound frame definitions.
//!
//! Every frame is a single JSON object whose `type` field selects the variant.

use serde::{Deserialize, Serialize};

use herald_core::types::id::NotificationId;

use crate::notification::NotificationPayload;
use crate::preference::PreferenceSummary;

/// Frames sent by the client to the server.
///
/// None of these carry a user id; the server scopes every command to the
/// authenticated connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Application-level liveness probe.
    Ping,
    /// Mark notifications as seen.
    MarkViewed {
        /// Notifications to mark.
        #[serde(rename = "notificationIds")]
        notification_ids: Vec<NotificationId>,
    },
    /// Mark one notification as opened.
    MarkOpened {
        /// Notification to mark.
        #[serde(rename = "notificationId")]
        notification_id: NotificationId,
    },
    /// Request the current delivery preferences.
    GetPreferences,
    /// Replace delivery preferences.
    UpdatePreferences {
        /// New switches.
        preferences: PreferenceSummary,
    },
    /// Request the most recent notifications.
    GetNotifications,
}

impl ClientFrame {
    /// Every `type` value the server understands.
    pub const KNOWN_TYPES: [&'static str; 6] = [
        "ping",
        "mark_viewed",
        "mark_opened",
        "get_preferences",
        "update_preferences",
        "get_notifications",
    ];

    /// Whether `frame_type` names a known command.
    pub fn is_known_type(frame_type: &str) -> bool {
        Self::KNOWN_TYPES.contains(&frame_type)
    }
}

/// Frames sent by the server to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Reply to a client `ping`.
    Pong,
    /// Fresh unread badge value.
    UnreadCount {
        /// Unviewed notifications for the user.
        count: i64,
    },
    /// A notification was just created for the user.
    NewNotification {
        /// Enriched notification.
        notification: NotificationPayload,
    },
    /// Reply to `get_notifications`.
    NotificationsList {
        /// Newest first.
        notifications: Vec<NotificationPayload>,
    },
    /// Reply to `get_preferences` and `update_preferences`.
    NotificationPreferences {
        /// Current switches.
        preferences: PreferenceSummary,
    },
    /// A frame could not be understood.
    Error {
        /// Machine-readable code.
        code: String,
        /// Human-readable description.
        message: String,
    },
}

impl ServerFrame {
    /// Build an error frame.
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_frames_use_wire_field_names() {
        let id = NotificationId::new();
        let frame: ClientFrame = serde_json::from_value(json!({
            "type": "mark_viewed",
            "notificationIds": [id],
        }))
        .unwrap();
        assert_eq!(
            frame,
            ClientFrame::MarkViewed {
                notification_ids: vec![id]
            }
        );

        let frame: ClientFrame = serde_json::from_value(json!({
            "type": "update_preferences",
            "preferences": {"email_notifications": false, "push_notifications": true},
        }))
        .unwrap();
        assert!(matches!(frame, ClientFrame::UpdatePreferences { preferences } if !preferences.email_notifications));
    }

    #[test]
    fn test_server_frames_serialize_with_type_tag() {
        let value = serde_json::to_value(ServerFrame::UnreadCount { count: 3 }).unwrap();
        assert_eq!(value, json!({"type": "unread_count", "count": 3}));

        let value = serde_json::to_value(ServerFrame::Pong).unwrap();
        assert_eq!(value, json!({"type": "pong"}));
    }

    #[test]
    fn test_known_types_match_variants() {
        for frame_type in ClientFrame::KNOWN_TYPES {
            assert!(ClientFrame::is_known_type(frame_type));
        }
        assert!(!ClientFrame::is_known_type("subscribe"));
    }
}
