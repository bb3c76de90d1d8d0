//! Read-only lookups into the host application's users, posts, and comments.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use herald_core::error::{AppError, ErrorKind};
use herald_core::result::AppResult;
use herald_core::types::id::{CommentId, PostId, UserId};
use herald_entity::content::{CommentRef, PostRef, UserSummary};

use crate::store::ContentLookup;

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    display_name: Option<String>,
}

#[derive(Debug, FromRow)]
struct CommentRow {
    id: Uuid,
    post_id: Uuid,
    content: String,
}

#[derive(Debug, FromRow)]
struct PostRow {
    id: Uuid,
    title: String,
    content: String,
}

/// Repository for host-owned content in PostgreSQL.
#[derive(Debug, Clone)]
pub struct ContentRepository {
    pool: PgPool,
}

impl ContentRepository {
    /// Create a new content repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentLookup for ContentRepository {
    async fn get_user(&self, id: UserId) -> AppResult<Option<UserSummary>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, display_name FROM users WHERE id = $1",
        )
        .bind(id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))?;

        Ok(row.map(|r| UserSummary {
            id: UserId::from_uuid(r.id),
            username: r.username,
            display_name: r.display_name,
        }))
    }

    async fn get_comment(&self, id: CommentId) -> AppResult<Option<CommentRef>> {
        let row = sqlx::query_as::<_, CommentRow>(
            "SELECT id, post_id, content FROM comments WHERE id = $1",
        )
        .bind(id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find comment", e))?;

        Ok(row.map(|r| CommentRef {
            id: CommentId::from_uuid(r.id),
            post_id: PostId::from_uuid(r.post_id),
            content: r.content,
        }))
    }

    async fn get_post(&self, id: PostId) -> AppResult<Option<PostRef>> {
        let row = sqlx::query_as::<_, PostRow>("SELECT id, title, content FROM posts WHERE id = $1")
            .bind(id.into_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find post", e))?;

        Ok(row.map(|r| PostRef {
            id: PostId::from_uuid(r.id),
            title: r.title,
            content: r.content,
        }))
    }
}
