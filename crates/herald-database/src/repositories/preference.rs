//! Delivery preference repository implementation.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use herald_core::error::{AppError, ErrorKind};
use herald_core::result::AppResult;
use herald_core::types::id::{PreferenceId, UserId};
use herald_entity::preference::{DeliveryChannel, DeliveryPreference, NewDeliveryPreference};

use crate::store::PreferenceStore;

/// Raw `notification_preferences` row.
#[derive(Debug, FromRow)]
struct PreferenceRow {
    id: Uuid,
    user_id: Uuid,
    notification_type: String,
    enabled: bool,
    channels: Vec<String>,
}

impl TryFrom<PreferenceRow> for DeliveryPreference {
    type Error = AppError;

    fn try_from(row: PreferenceRow) -> Result<Self, Self::Error> {
        let channels = row
            .channels
            .iter()
            .map(|c| c.parse::<DeliveryChannel>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Corrupt preference row", e))?;

        Ok(DeliveryPreference {
            id: PreferenceId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            notification_type: row.notification_type,
            enabled: row.enabled,
            channels,
        })
    }
}

/// Repository for delivery preference rows in PostgreSQL.
#[derive(Debug, Clone)]
pub struct PreferenceRepository {
    pool: PgPool,
}

impl PreferenceRepository {
    /// Create a new preference repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferenceStore for PreferenceRepository {
    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<DeliveryPreference>> {
        let rows = sqlx::query_as::<_, PreferenceRow>(
            "SELECT id, user_id, notification_type, enabled, channels \
             FROM notification_preferences WHERE user_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(user_id.into_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to get preferences", e))?;

        rows.into_iter().map(DeliveryPreference::try_from).collect()
    }

    async fn replace_for_user(
        &self,
        user_id: UserId,
        rows: &[NewDeliveryPreference],
    ) -> AppResult<Vec<DeliveryPreference>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        sqlx::query("DELETE FROM notification_preferences WHERE user_id = $1")
            .bind(user_id.into_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to clear preferences", e)
            })?;

        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            let channels: Vec<String> = row.channels.iter().map(|c| c.to_string()).collect();
            let inserted = sqlx::query_as::<_, PreferenceRow>(
                "INSERT INTO notification_preferences \
                 (id, user_id, notification_type, enabled, channels) VALUES ($1, $2, $3, $4, $5) \
                 RETURNING id, user_id, notification_type, enabled, channels",
            )
            .bind(PreferenceId::new().into_uuid())
            .bind(user_id.into_uuid())
            .bind(&row.notification_type)
            .bind(row.enabled)
            .bind(&channels)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to insert preference", e)
            })?;
            stored.push(DeliveryPreference::try_from(inserted)?);
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit preferences", e)
        })?;

        Ok(stored)
    }
}
