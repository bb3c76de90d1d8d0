//! Routes decoded client commands to inbox and preference operations.

use std::sync::Arc;

use tracing::{debug, warn};

use herald_core::result::AppResult;
use herald_core::types::id::UserId;
use herald_entity::protocol::{ClientFrame, ServerFrame};

use crate::notification::inbox::NotificationInbox;
use crate::notification::preferences::PreferenceService;

use super::codec::{FrameError, decode_frame};

/// Handles inbound frames for authenticated connections.
///
/// The acting user always comes from the connection, never from a payload.
#[derive(Debug, Clone)]
pub struct MessageDispatcher {
    inbox: Arc<NotificationInbox>,
    preferences: Arc<PreferenceService>,
}

impl MessageDispatcher {
    /// Creates a new dispatcher.
    pub fn new(inbox: Arc<NotificationInbox>, preferences: Arc<PreferenceService>) -> Self {
        Self { inbox, preferences }
    }

    /// Decode and handle one text frame, returning the frames to send back.
    ///
    /// Malformed frames get an `error` reply. Unknown commands and store
    /// failures are logged and produce no reply.
    pub async fn handle_text(&self, user_id: UserId, raw: &str) -> Vec<ServerFrame> {
        let frame = match decode_frame(raw) {
            Ok(frame) => frame,
            Err(e @ FrameError::Malformed(_)) => {
                warn!(user_id = %user_id, error = %e, "Malformed frame");
                return vec![ServerFrame::error(e.code(), e.to_string())];
            }
            Err(e @ FrameError::UnknownCommand(_)) => {
                debug!(user_id = %user_id, error = %e, "Ignoring unknown command");
                return Vec::new();
            }
        };

        match self.dispatch(user_id, frame).await {
            Ok(replies) => replies,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Command failed");
                Vec::new()
            }
        }
    }

    /// Execute one decoded command.
    pub async fn dispatch(&self, user_id: UserId, frame: ClientFrame) -> AppResult<Vec<ServerFrame>> {
        match frame {
            ClientFrame::Ping => Ok(vec![ServerFrame::Pong]),
            ClientFrame::MarkViewed { notification_ids } => {
                let count = self.inbox.mark_viewed(user_id, &notification_ids).await?;
                Ok(vec![ServerFrame::UnreadCount { count }])
            }
            ClientFrame::MarkOpened { notification_id } => {
                if !self.inbox.mark_opened(user_id, notification_id).await? {
                    debug!(
                        user_id = %user_id,
                        notification_id = %notification_id,
                        "mark_opened matched nothing"
                    );
                }
                Ok(Vec::new())
            }
            ClientFrame::GetPreferences => {
                let preferences = self.preferences.get(user_id).await?;
                Ok(vec![ServerFrame::NotificationPreferences { preferences }])
            }
            ClientFrame::UpdatePreferences { preferences } => {
                let preferences = self.preferences.replace(user_id, preferences).await?;
                Ok(vec![ServerFrame::NotificationPreferences { preferences }])
            }
            ClientFrame::GetNotifications => {
                let notifications = self.inbox.recent(user_id).await?;
                Ok(vec![ServerFrame::NotificationsList { notifications }])
            }
        }
    }
}
