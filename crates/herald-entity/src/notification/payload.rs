//! Client-facing notification payload.

use serde::{Deserialize, Serialize};

use super::actor::ActorSummary;
use super::model::Notification;

/// A notification enriched with everything a client needs to render it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// The stored notification.
    #[serde(flatten)]
    pub notification: Notification,
    /// Who triggered it.
    pub actors: Vec<ActorSummary>,
    /// Title of the post to navigate to, if it still exists.
    pub post_title: Option<String>,
}

impl NotificationPayload {
    /// Wrap a bare notification without enrichment.
    pub fn bare(notification: Notification) -> Self {
        Self {
            notification,
            actors: Vec::new(),
            post_title: None,
        }
    }
}
