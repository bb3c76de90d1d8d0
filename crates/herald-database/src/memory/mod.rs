//! In-process store for single-node deployments and tests.
//!
//! Selected with a `memory://` database URL. State lives behind a single
//! Tokio mutex, so every trait method is atomic with respect to the others.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use herald_core::result::AppResult;
use herald_core::types::id::{CommentId, NotificationId, PostId, PreferenceId, UserId};
use herald_core::types::pagination::{PageRequest, PageResponse};
use herald_entity::content::{CommentRef, PostRef, UserSummary};
use herald_entity::notification::{NewNotification, Notification, NotificationActor};
use herald_entity::preference::{DeliveryPreference, NewDeliveryPreference};

use crate::store::{ContentLookup, NotificationStore, PreferenceStore};

#[derive(Debug, Default)]
struct InnerState {
    users: HashMap<UserId, UserSummary>,
    posts: HashMap<PostId, PostRef>,
    comments: HashMap<CommentId, CommentRef>,
    /// Insertion order; the newest notification is last.
    notifications: Vec<Notification>,
    actors: Vec<NotificationActor>,
    preferences: HashMap<UserId, Vec<DeliveryPreference>>,
}

impl InnerState {
    fn newest_first(&self, user_id: UserId) -> impl Iterator<Item = &Notification> {
        self.notifications
            .iter()
            .rev()
            .filter(move |n| n.user_id == user_id)
    }
}

/// In-memory implementation of every store trait.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<InnerState>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user the handshake and enrichment can resolve.
    pub async fn insert_user(&self, username: &str, display_name: Option<&str>) -> UserId {
        let id = UserId::new();
        let user = UserSummary {
            id,
            username: username.to_string(),
            display_name: display_name.map(str::to_string),
        };
        self.state.lock().await.users.insert(id, user);
        id
    }

    /// Register a post.
    pub async fn insert_post(&self, title: &str, content: &str) -> PostId {
        let id = PostId::new();
        let post = PostRef {
            id,
            title: title.to_string(),
            content: content.to_string(),
        };
        self.state.lock().await.posts.insert(id, post);
        id
    }

    /// Register a comment under an existing post.
    pub async fn insert_comment(&self, post_id: PostId, content: &str) -> CommentId {
        let id = CommentId::new();
        let comment = CommentRef {
            id,
            post_id,
            content: content.to_string(),
        };
        self.state.lock().await.comments.insert(id, comment);
        id
    }

    /// Delete a comment, as the host would on moderation.
    pub async fn remove_comment(&self, id: CommentId) -> bool {
        self.state.lock().await.comments.remove(&id).is_some()
    }

    /// Number of notification rows across all users.
    pub async fn notification_count(&self) -> usize {
        self.state.lock().await.notifications.len()
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_with_actor(
        &self,
        new: &NewNotification,
        actor_id: UserId,
    ) -> AppResult<Notification> {
        let now = Utc::now();
        let notification = Notification {
            id: NotificationId::new(),
            user_id: new.user_id,
            notification_type: new.notification_type,
            target_type: new.target.target_type(),
            target_id: new.target.target_id(),
            post_id: Some(new.post_id),
            milestone: new.milestone,
            viewed: false,
            opened: false,
            preview: new.preview.clone(),
            created_at: now,
            updated_at: now,
        };

        let mut state = self.state.lock().await;
        state.notifications.push(notification.clone());
        state.actors.push(NotificationActor {
            notification_id: notification.id,
            actor_id,
            created_at: now,
        });
        debug!(notification_id = %notification.id, user_id = %new.user_id, "Stored notification in memory");
        Ok(notification)
    }

    async fn actors_for(&self, ids: &[NotificationId]) -> AppResult<Vec<NotificationActor>> {
        let state = self.state.lock().await;
        Ok(state
            .actors
            .iter()
            .filter(|a| ids.contains(&a.notification_id))
            .cloned()
            .collect())
    }

    async fn recent_for_user(&self, user_id: UserId, limit: i64) -> AppResult<Vec<Notification>> {
        let state = self.state.lock().await;
        Ok(state
            .newest_first(user_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn page_for_user(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let state = self.state.lock().await;
        let total = state.newest_first(user_id).count() as u64;
        let items = state
            .newest_first(user_id)
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect();
        Ok(PageResponse::new(items, page.page, page.page_size, total))
    }

    async fn mark_viewed(&self, user_id: UserId, ids: &[NotificationId]) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let mut changed = 0;
        for n in state
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.viewed && ids.contains(&n.id))
        {
            n.viewed = true;
            n.updated_at = now;
            changed += 1;
        }
        Ok(changed)
    }

    async fn mark_all_viewed(&self, user_id: UserId) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let mut changed = 0;
        for n in state
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.viewed)
        {
            n.viewed = true;
            n.updated_at = now;
            changed += 1;
        }
        Ok(changed)
    }

    async fn mark_opened(&self, user_id: UserId, id: NotificationId) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        match state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
        {
            Some(n) => {
                n.opened = true;
                n.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count_unread(&self, user_id: UserId) -> AppResult<i64> {
        let state = self.state.lock().await;
        Ok(state.newest_first(user_id).filter(|n| !n.viewed).count() as i64)
    }
}

#[async_trait]
impl PreferenceStore for MemoryStore {
    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<DeliveryPreference>> {
        let state = self.state.lock().await;
        Ok(state.preferences.get(&user_id).cloned().unwrap_or_default())
    }

    async fn replace_for_user(
        &self,
        user_id: UserId,
        rows: &[NewDeliveryPreference],
    ) -> AppResult<Vec<DeliveryPreference>> {
        let stored: Vec<DeliveryPreference> = rows
            .iter()
            .map(|row| DeliveryPreference {
                id: PreferenceId::new(),
                user_id,
                notification_type: row.notification_type.clone(),
                enabled: row.enabled,
                channels: row.channels.clone(),
            })
            .collect();
        self.state
            .lock()
            .await
            .preferences
            .insert(user_id, stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl ContentLookup for MemoryStore {
    async fn get_user(&self, id: UserId) -> AppResult<Option<UserSummary>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn get_comment(&self, id: CommentId) -> AppResult<Option<CommentRef>> {
        Ok(self.state.lock().await.comments.get(&id).cloned())
    }

    async fn get_post(&self, id: PostId) -> AppResult<Option<PostRef>> {
        Ok(self.state.lock().await.posts.get(&id).cloned())
    }
}
