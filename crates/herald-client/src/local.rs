//! Client-side mirror of the user's notifications.

use herald_core::types::id::NotificationId;
use herald_entity::notification::NotificationPayload;
use herald_entity::preference::PreferenceSummary;
use herald_entity::protocol::ServerFrame;

/// What the client currently believes about the user's notifications.
///
/// The server is authoritative; a `notifications_list` or `unread_count`
/// frame always overwrites local guesses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalNotificationState {
    /// Unread badge value.
    pub unread_count: i64,
    /// Newest first.
    pub notifications: Vec<NotificationPayload>,
    /// Last preferences the server reported.
    pub preferences: Option<PreferenceSummary>,
    /// Last `error` frame from the server.
    pub last_error: Option<String>,
}

impl LocalNotificationState {
    /// Fold one server frame into the state.
    pub fn apply(&mut self, frame: ServerFrame) {
        match frame {
            ServerFrame::Pong => {}
            ServerFrame::UnreadCount { count } => self.unread_count = count,
            ServerFrame::NewNotification { notification } => {
                let id = notification.notification.id;
                self.notifications.retain(|n| n.notification.id != id);
                self.notifications.insert(0, notification);
            }
            ServerFrame::NotificationsList { notifications } => {
                self.notifications = notifications;
            }
            ServerFrame::NotificationPreferences { preferences } => {
                self.preferences = Some(preferences);
            }
            ServerFrame::Error { code, message } => {
                self.last_error = Some(format!("{code}: {message}"));
            }
        }
    }

    /// Mark notifications viewed ahead of the server's confirmation.
    ///
    /// Returns how many unread notifications changed.
    pub fn mark_viewed(&mut self, ids: &[NotificationId]) -> usize {
        let mut changed = 0;
        for payload in &mut self.notifications {
            let n = &mut payload.notification;
            if !n.viewed && ids.contains(&n.id) {
                n.viewed = true;
                changed += 1;
            }
        }
        self.unread_count = (self.unread_count - changed as i64).max(0);
        changed
    }

    /// Mark one notification opened locally.
    pub fn mark_opened(&mut self, id: NotificationId) {
        if let Some(payload) = self
            .notifications
            .iter_mut()
            .find(|p| p.notification.id == id)
        {
            payload.notification.opened = true;
        }
    }
}
