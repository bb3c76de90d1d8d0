//! Closed enumerations for notification and target kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use herald_core::types::id::{CommentId, PostId};

/// A stored string did not match any known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    /// Which enumeration was being parsed.
    pub kind: &'static str,
    /// The offending value.
    pub value: String,
}

/// What happened to trigger a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// Someone commented on the recipient's post.
    Comment,
    /// Someone replied to the recipient's comment.
    Reply,
    /// Someone mentioned the recipient.
    Mention,
    /// The recipient's content crossed a reaction milestone.
    VoteMilestone,
}

impl NotificationType {
    /// Return the stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::Reply => "reply",
            Self::Mention => "mention",
            Self::VoteMilestone => "vote_milestone",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "comment" => Ok(Self::Comment),
            "reply" => Ok(Self::Reply),
            "mention" => Ok(Self::Mention),
            "vote_milestone" => Ok(Self::VoteMilestone),
            other => Err(UnknownVariant {
                kind: "notification type",
                value: other.to_string(),
            }),
        }
    }
}

/// Kind of content a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    /// A post.
    Post,
    /// A comment.
    Comment,
}

impl TargetType {
    /// Return the stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Comment => "comment",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(Self::Post),
            "comment" => Ok(Self::Comment),
            other => Err(UnknownVariant {
                kind: "target type",
                value: other.to_string(),
            }),
        }
    }
}

/// The content entity a notification points at, with its typed id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationTarget {
    /// A post.
    Post(PostId),
    /// A comment.
    Comment(CommentId),
}

impl NotificationTarget {
    /// The target kind.
    pub fn target_type(&self) -> TargetType {
        match self {
            Self::Post(_) => TargetType::Post,
            Self::Comment(_) => TargetType::Comment,
        }
    }

    /// The raw target id as stored.
    pub fn target_id(&self) -> Uuid {
        match self {
            Self::Post(id) => id.into_uuid(),
            Self::Comment(id) => id.into_uuid(),
        }
    }
}
