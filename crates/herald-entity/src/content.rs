//! Read-only views of records owned by the host application.

use serde::{Deserialize, Serialize};

use herald_core::types::id::{CommentId, PostId, UserId};

/// A user as needed for rendering actor names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// User identifier.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Human-readable display name.
    pub display_name: Option<String>,
}

/// A comment as needed to resolve its post and build a preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRef {
    /// Comment identifier.
    pub id: CommentId,
    /// Post the comment belongs to.
    pub post_id: PostId,
    /// Comment body.
    pub content: String,
}

/// A post as needed to build a preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRef {
    /// Post identifier.
    pub id: PostId,
    /// Post title.
    pub title: String,
    /// Post body.
    pub content: String,
}
