//! Notification repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use herald_core::error::{AppError, ErrorKind};
use herald_core::result::AppResult;
use herald_core::types::id::{NotificationId, PostId, UserId};
use herald_core::types::pagination::{PageRequest, PageResponse};
use herald_entity::notification::{NewNotification, Notification, NotificationActor};

use crate::store::NotificationStore;

const NOTIFICATION_COLUMNS: &str = "id, user_id, notification_type, target_type, target_id, \
     post_id, milestone, viewed, opened, preview, created_at, updated_at";

/// Raw `notifications` row.
#[derive(Debug, FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    notification_type: String,
    target_type: String,
    target_id: Uuid,
    post_id: Option<Uuid>,
    milestone: Option<i32>,
    viewed: bool,
    opened: bool,
    preview: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = AppError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let notification_type = row.notification_type.parse().map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Corrupt notification row", e)
        })?;
        let target_type = row.target_type.parse().map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Corrupt notification row", e)
        })?;

        Ok(Notification {
            id: NotificationId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            notification_type,
            target_type,
            target_id: row.target_id,
            post_id: row.post_id.map(PostId::from_uuid),
            milestone: row.milestone,
            viewed: row.viewed,
            opened: row.opened,
            preview: row.preview,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Raw `notification_actors` row.
#[derive(Debug, FromRow)]
struct ActorRow {
    notification_id: Uuid,
    actor_id: Uuid,
    created_at: DateTime<Utc>,
}

impl From<ActorRow> for NotificationActor {
    fn from(row: ActorRow) -> Self {
        Self {
            notification_id: NotificationId::from_uuid(row.notification_id),
            actor_id: UserId::from_uuid(row.actor_id),
            created_at: row.created_at,
        }
    }
}

fn convert_all(rows: Vec<NotificationRow>) -> AppResult<Vec<Notification>> {
    rows.into_iter().map(Notification::try_from).collect()
}

fn raw_ids(ids: &[NotificationId]) -> Vec<Uuid> {
    ids.iter().map(|id| id.into_uuid()).collect()
}

/// Repository for notification rows in PostgreSQL.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn insert_with_actor(
        &self,
        new: &NewNotification,
        actor_id: UserId,
    ) -> AppResult<Notification> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            "INSERT INTO notifications \
             (id, user_id, notification_type, target_type, target_id, post_id, milestone, preview) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(NotificationId::new().into_uuid())
        .bind(new.user_id.into_uuid())
        .bind(new.notification_type.as_str())
        .bind(new.target.target_type().as_str())
        .bind(new.target.target_id())
        .bind(new.post_id.into_uuid())
        .bind(new.milestone)
        .bind(new.preview.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create notification", e))?;

        sqlx::query("INSERT INTO notification_actors (notification_id, actor_id) VALUES ($1, $2)")
            .bind(row.id)
            .bind(actor_id.into_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to attach actor", e))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit notification", e)
        })?;

        Notification::try_from(row)
    }

    async fn actors_for(&self, ids: &[NotificationId]) -> AppResult<Vec<NotificationActor>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, ActorRow>(
            "SELECT notification_id, actor_id, created_at FROM notification_actors \
             WHERE notification_id = ANY($1) ORDER BY created_at ASC",
        )
        .bind(raw_ids(ids))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load actors", e))?;

        Ok(rows.into_iter().map(NotificationActor::from).collect())
    }

    async fn recent_for_user(&self, user_id: UserId, limit: i64) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        ))
        .bind(user_id.into_uuid())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list notifications", e))?;

        convert_all(rows)
    }

    async fn page_for_user(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
            .bind(user_id.into_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count notifications", e)
            })?;

        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id.into_uuid())
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list notifications", e))?;

        Ok(PageResponse::new(
            convert_all(rows)?,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    async fn mark_viewed(&self, user_id: UserId, ids: &[NotificationId]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "UPDATE notifications SET viewed = TRUE, updated_at = NOW() \
             WHERE user_id = $1 AND id = ANY($2) AND viewed = FALSE",
        )
        .bind(user_id.into_uuid())
        .bind(raw_ids(ids))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark viewed", e))?;

        Ok(result.rows_affected())
    }

    async fn mark_all_viewed(&self, user_id: UserId) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET viewed = TRUE, updated_at = NOW() \
             WHERE user_id = $1 AND viewed = FALSE",
        )
        .bind(user_id.into_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark all viewed", e))?;

        Ok(result.rows_affected())
    }

    async fn mark_opened(&self, user_id: UserId, id: NotificationId) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET opened = TRUE, updated_at = NOW() \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(id.into_uuid())
        .bind(user_id.into_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark opened", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_unread(&self, user_id: UserId) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND viewed = FALSE",
        )
        .bind(user_id.into_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count unread", e))
    }
}
