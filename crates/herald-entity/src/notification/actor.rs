//! Actor references attached to notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use herald_core::types::id::{NotificationId, UserId};

use crate::content::UserSummary;

/// A (notification, acting user) pair recording who caused the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationActor {
    /// Owning notification.
    pub notification_id: NotificationId,
    /// User whose action triggered it.
    pub actor_id: UserId,
    /// When the reference was recorded.
    pub created_at: DateTime<Utc>,
}

/// Actor details embedded in pushed payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSummary {
    /// Actor user id.
    pub id: UserId,
    /// Actor login name.
    pub username: String,
    /// Actor display name.
    pub display_name: Option<String>,
}

impl From<UserSummary> for ActorSummary {
    fn from(user: UserSummary) -> Self {
        Self {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
        }
    }
}
