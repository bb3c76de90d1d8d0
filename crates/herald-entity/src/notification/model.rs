//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use herald_core::types::id::{NotificationId, PostId, UserId};

use super::kind::{NotificationTarget, NotificationType, TargetType};

/// One event directed at one recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: NotificationId,
    /// The recipient user.
    pub user_id: UserId,
    /// What happened.
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    /// Kind of content the notification is about.
    pub target_type: TargetType,
    /// Id of the post or comment the notification is about.
    pub target_id: Uuid,
    /// Post to navigate to; resolved through the comment for comment targets.
    pub post_id: Option<PostId>,
    /// Reaction count reached, for vote milestones.
    pub milestone: Option<i32>,
    /// Whether the recipient has seen it in their notification surface.
    pub viewed: bool,
    /// Whether the recipient navigated to it.
    pub opened: bool,
    /// Short excerpt of the target content.
    pub preview: Option<String>,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
    /// When the notification was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    /// Check if the notification still counts toward the unread badge.
    pub fn is_unread(&self) -> bool {
        !self.viewed
    }
}

/// Data required to insert a notification row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    /// The recipient user.
    pub user_id: UserId,
    /// What happened.
    pub notification_type: NotificationType,
    /// Content the notification is about.
    pub target: NotificationTarget,
    /// Resolved owning post.
    pub post_id: PostId,
    /// Reaction count reached, for vote milestones.
    pub milestone: Option<i32>,
    /// Short excerpt of the target content.
    pub preview: Option<String>,
}
