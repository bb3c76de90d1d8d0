//! Store traits the real-time engine depends on.
//!
//! Each trait has a PostgreSQL implementation in [`crate::repositories`]
//! and an in-process implementation in [`crate::memory`].

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use herald_core::result::AppResult;
use herald_core::types::id::{CommentId, NotificationId, PostId, UserId};
use herald_core::types::pagination::{PageRequest, PageResponse};
use herald_entity::content::{CommentRef, PostRef, UserSummary};
use herald_entity::notification::{NewNotification, Notification, NotificationActor};
use herald_entity::preference::{DeliveryPreference, NewDeliveryPreference};

use crate::memory::MemoryStore;
use crate::repositories::{ContentRepository, NotificationRepository, PreferenceRepository};

/// Durable notification rows and their actor references.
///
/// Every method that touches existing rows takes the owning user id and
/// only matches rows whose recipient is that user.
#[async_trait]
pub trait NotificationStore: Send + Sync + 'static {
    /// Insert a notification row together with its single actor reference.
    /// Either both rows are written or neither is.
    async fn insert_with_actor(
        &self,
        new: &NewNotification,
        actor_id: UserId,
    ) -> AppResult<Notification>;

    /// Actor references for a batch of notifications.
    async fn actors_for(&self, ids: &[NotificationId]) -> AppResult<Vec<NotificationActor>>;

    /// Most recent notifications for a user, newest first.
    async fn recent_for_user(&self, user_id: UserId, limit: i64) -> AppResult<Vec<Notification>>;

    /// One page of a user's notifications, newest first.
    async fn page_for_user(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>>;

    /// Set `viewed` on the given ids that belong to `user_id`. Returns rows changed.
    async fn mark_viewed(&self, user_id: UserId, ids: &[NotificationId]) -> AppResult<u64>;

    /// Set `viewed` on every notification of `user_id`. Returns rows changed.
    async fn mark_all_viewed(&self, user_id: UserId) -> AppResult<u64>;

    /// Set `opened` on one notification if it belongs to `user_id`.
    async fn mark_opened(&self, user_id: UserId, id: NotificationId) -> AppResult<bool>;

    /// Count notifications of `user_id` that have not been viewed.
    async fn count_unread(&self, user_id: UserId) -> AppResult<i64>;
}

/// Per-user delivery preference rows.
#[async_trait]
pub trait PreferenceStore: Send + Sync + 'static {
    /// All rows for a user.
    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<DeliveryPreference>>;

    /// Atomically delete every row for the user and insert `rows`.
    async fn replace_for_user(
        &self,
        user_id: UserId,
        rows: &[NewDeliveryPreference],
    ) -> AppResult<Vec<DeliveryPreference>>;
}

/// Lookups into records owned by the host application.
#[async_trait]
pub trait ContentLookup: Send + Sync + 'static {
    /// Find a user.
    async fn get_user(&self, id: UserId) -> AppResult<Option<UserSummary>>;

    /// Find a comment.
    async fn get_comment(&self, id: CommentId) -> AppResult<Option<CommentRef>>;

    /// Find a post.
    async fn get_post(&self, id: PostId) -> AppResult<Option<PostRef>>;
}

/// The set of stores handed to the real-time engine.
#[derive(Clone)]
pub struct Stores {
    /// Notification rows.
    pub notifications: Arc<dyn NotificationStore>,
    /// Preference rows.
    pub preferences: Arc<dyn PreferenceStore>,
    /// Host application content.
    pub content: Arc<dyn ContentLookup>,
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish()
    }
}

impl Stores {
    /// Stores backed by PostgreSQL.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            notifications: Arc::new(NotificationRepository::new(pool.clone())),
            preferences: Arc::new(PreferenceRepository::new(pool.clone())),
            content: Arc::new(ContentRepository::new(pool)),
        }
    }

    /// Stores backed by a single in-memory store.
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            notifications: store.clone(),
            preferences: store.clone(),
            content: store,
        }
    }
}
