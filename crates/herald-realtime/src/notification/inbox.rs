//! Inbox operations shared by live commands and the REST fallback.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use herald_core::result::AppResult;
use herald_core::types::id::{NotificationId, UserId};
use herald_core::types::pagination::{PageRequest, PageResponse};
use herald_database::{ContentLookup, NotificationStore};
use herald_entity::notification::{ActorSummary, Notification, NotificationPayload};
use herald_entity::protocol::ServerFrame;

use crate::connection::registry::ConnectionRegistry;

/// Reads and state changes on a user's notifications.
///
/// Every operation is scoped to the caller's user id.
#[derive(Clone)]
pub struct NotificationInbox {
    notifications: Arc<dyn NotificationStore>,
    content: Arc<dyn ContentLookup>,
    registry: Arc<ConnectionRegistry>,
    list_limit: i64,
}

impl std::fmt::Debug for NotificationInbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationInbox")
            .field("list_limit", &self.list_limit)
            .finish()
    }
}

impl NotificationInbox {
    /// Creates a new inbox.
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        content: Arc<dyn ContentLookup>,
        registry: Arc<ConnectionRegistry>,
        list_limit: i64,
    ) -> Self {
        Self {
            notifications,
            content,
            registry,
            list_limit,
        }
    }

    /// The most recent notifications, newest first.
    pub async fn recent(&self, user_id: UserId) -> AppResult<Vec<NotificationPayload>> {
        let rows = self
            .notifications
            .recent_for_user(user_id, self.list_limit)
            .await?;
        self.enrich(rows).await
    }

    /// One page of notifications, newest first.
    pub async fn page(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<NotificationPayload>> {
        let mut rows = self.notifications.page_for_user(user_id, page).await?;
        let items = self.enrich(std::mem::take(&mut rows.items)).await?;
        Ok(rows.with_items(items))
    }

    /// Marks the caller's listed notifications viewed. Returns the new unread count.
    pub async fn mark_viewed(&self, user_id: UserId, ids: &[NotificationId]) -> AppResult<i64> {
        let changed = self.notifications.mark_viewed(user_id, ids).await?;
        debug!(user_id = %user_id, requested = ids.len(), changed, "Marked notifications viewed");
        self.unread_count(user_id).await
    }

    /// Marks everything viewed and pushes the new count to any live connection.
    pub async fn mark_all_viewed(&self, user_id: UserId) -> AppResult<i64> {
        let changed = self.notifications.mark_all_viewed(user_id).await?;
        let count = self.unread_count(user_id).await?;
        debug!(user_id = %user_id, changed, "Marked all notifications viewed");
        self.registry
            .send_to(user_id, &ServerFrame::UnreadCount { count });
        Ok(count)
    }

    /// Marks one notification opened. False if the caller does not own it.
    pub async fn mark_opened(&self, user_id: UserId, id: NotificationId) -> AppResult<bool> {
        self.notifications.mark_opened(user_id, id).await
    }

    /// Count of notifications not yet viewed.
    pub async fn unread_count(&self, user_id: UserId) -> AppResult<i64> {
        self.notifications.count_unread(user_id).await
    }

    /// Attach actor details and post titles.
    ///
    /// Lookups that come back empty leave the field out rather than failing.
    pub async fn enrich(&self, rows: Vec<Notification>) -> AppResult<Vec<NotificationPayload>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<NotificationId> = rows.iter().map(|n| n.id).collect();
        let actor_rows = self.notifications.actors_for(&ids).await?;

        let mut users: HashMap<UserId, Option<ActorSummary>> = HashMap::new();
        for actor_id in actor_rows.iter().map(|a| a.actor_id).collect::<HashSet<_>>() {
            let summary = self.content.get_user(actor_id).await?.map(ActorSummary::from);
            users.insert(actor_id, summary);
        }

        let mut titles = HashMap::new();
        for post_id in rows.iter().filter_map(|n| n.post_id).collect::<HashSet<_>>() {
            let title = self.content.get_post(post_id).await?.map(|p| p.title);
            titles.insert(post_id, title);
        }

        Ok(rows
            .into_iter()
            .map(|notification| {
                let actors = actor_rows
                    .iter()
                    .filter(|a| a.notification_id == notification.id)
                    .filter_map(|a| users.get(&a.actor_id).cloned().flatten())
                    .collect();
                let post_title = notification
                    .post_id
                    .and_then(|p| titles.get(&p).cloned().flatten());
                NotificationPayload {
                    notification,
                    actors,
                    post_title,
                }
            })
            .collect())
    }
}
