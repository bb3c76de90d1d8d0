//! Notification publisher: durable write, then best-effort live push.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use herald_core::error::AppError;
use herald_core::result::AppResult;
use herald_core::types::id::{CommentId, PostId, UserId};
use herald_database::{ContentLookup, NotificationStore};
use herald_entity::notification::{
    NewNotification, Notification, NotificationTarget, NotificationType,
};
use herald_entity::protocol::ServerFrame;

use crate::connection::registry::ConnectionRegistry;

use super::inbox::NotificationInbox;
use super::preview::truncate_preview;

/// Vote counts at which the post author is notified.
const VOTE_MILESTONE_STEP: i64 = 10;

/// True when `count` is an exact positive multiple of the milestone step.
pub fn is_vote_milestone(count: i64) -> bool {
    count > 0 && count % VOTE_MILESTONE_STEP == 0
}

/// Everything needed to create one notification.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishRequest {
    /// Who receives it.
    pub recipient: UserId,
    /// What happened.
    pub notification_type: NotificationType,
    /// What it points at.
    pub target: NotificationTarget,
    /// Who caused it.
    pub actor: UserId,
    /// Vote count for milestone notifications.
    pub milestone: Option<i32>,
}

/// Application events that may produce a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    /// A comment was left on a post.
    CommentCreated {
        post_author: UserId,
        commenter: UserId,
        comment_id: CommentId,
    },
    /// A comment was answered.
    ReplyCreated {
        parent_author: UserId,
        replier: UserId,
        reply_id: CommentId,
    },
    /// A user was mentioned in a post or comment.
    Mentioned {
        mentioned: UserId,
        author: UserId,
        target: NotificationTarget,
    },
    /// A post's vote count changed to `vote_count`.
    VoteCountChanged {
        post_author: UserId,
        voter: UserId,
        post_id: PostId,
        vote_count: i64,
    },
}

/// Creates notifications and pushes them to connected recipients.
#[derive(Clone)]
pub struct NotificationPublisher {
    notifications: Arc<dyn NotificationStore>,
    content: Arc<dyn ContentLookup>,
    registry: Arc<ConnectionRegistry>,
    inbox: Arc<NotificationInbox>,
    preview_max_chars: usize,
}

impl std::fmt::Debug for NotificationPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationPublisher")
            .field("preview_max_chars", &self.preview_max_chars)
            .finish()
    }
}

impl NotificationPublisher {
    /// Creates a new publisher.
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        content: Arc<dyn ContentLookup>,
        registry: Arc<ConnectionRegistry>,
        inbox: Arc<NotificationInbox>,
        preview_max_chars: usize,
    ) -> Self {
        Self {
            notifications,
            content,
            registry,
            inbox,
            preview_max_chars,
        }
    }

    /// Publish one notification.
    ///
    /// The row and its actor reference are written together. If the
    /// recipient is connected they then receive `new_notification` followed
    /// by a fresh `unread_count`; a failed push is logged and does not undo
    /// or fail the write. A target whose comment or post no longer exists
    /// fails with an inconsistency error before anything is written.
    pub async fn publish(&self, request: PublishRequest) -> AppResult<Notification> {
        let (post_id, preview) = self.resolve_target(&request.target).await?;

        let notification = self
            .notifications
            .insert_with_actor(
                &NewNotification {
                    user_id: request.recipient,
                    notification_type: request.notification_type,
                    target: request.target,
                    post_id,
                    milestone: request.milestone,
                    preview,
                },
                request.actor,
            )
            .await?;

        info!(
            notification_id = %notification.id,
            user_id = %request.recipient,
            notification_type = %request.notification_type,
            "Notification created"
        );

        if !self.registry.is_connected(request.recipient) {
            debug!(user_id = %request.recipient, "Recipient offline, stored only");
        } else if let Err(e) = self.push_live(&notification).await {
            warn!(
                notification_id = %notification.id,
                user_id = %request.recipient,
                error = %e,
                "Live push failed, notification kept"
            );
        }

        Ok(notification)
    }

    async fn resolve_target(
        &self,
        target: &NotificationTarget,
    ) -> AppResult<(PostId, Option<String>)> {
        match target {
            NotificationTarget::Comment(comment_id) => {
                let comment = self.content.get_comment(*comment_id).await?.ok_or_else(|| {
                    AppError::inconsistency(format!("Comment {comment_id} no longer exists"))
                })?;
                let preview = truncate_preview(&comment.content, self.preview_max_chars);
                Ok((comment.post_id, Some(preview)))
            }
            NotificationTarget::Post(post_id) => {
                let post = self.content.get_post(*post_id).await?.ok_or_else(|| {
                    AppError::inconsistency(format!("Post {post_id} no longer exists"))
                })?;
                let preview = truncate_preview(&post.title, self.preview_max_chars);
                Ok((*post_id, Some(preview)))
            }
        }
    }

    async fn push_live(&self, notification: &Notification) -> AppResult<()> {
        let payload = self
            .inbox
            .enrich(vec![notification.clone()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::internal("Enrichment dropped the notification"))?;
        self.registry.send_to(
            notification.user_id,
            &ServerFrame::NewNotification {
                notification: payload,
            },
        );

        let count = self.inbox.unread_count(notification.user_id).await?;
        self.registry
            .send_to(notification.user_id, &ServerFrame::UnreadCount { count });
        Ok(())
    }

    /// Notify a post author about a new comment.
    pub async fn comment_created(
        &self,
        post_author: UserId,
        commenter: UserId,
        comment_id: CommentId,
    ) -> AppResult<Option<Notification>> {
        if post_author == commenter {
            return Ok(None);
        }
        self.publish(PublishRequest {
            recipient: post_author,
            notification_type: NotificationType::Comment,
            target: NotificationTarget::Comment(comment_id),
            actor: commenter,
            milestone: None,
        })
        .await
        .map(Some)
    }

    /// Notify a comment author about a reply.
    pub async fn reply_created(
        &self,
        parent_author: UserId,
        replier: UserId,
        reply_id: CommentId,
    ) -> AppResult<Option<Notification>> {
        if parent_author == replier {
            return Ok(None);
        }
        self.publish(PublishRequest {
            recipient: parent_author,
            notification_type: NotificationType::Reply,
            target: NotificationTarget::Comment(reply_id),
            actor: replier,
            milestone: None,
        })
        .await
        .map(Some)
    }

    /// Notify a mentioned user.
    pub async fn mentioned(
        &self,
        mentioned: UserId,
        author: UserId,
        target: NotificationTarget,
    ) -> AppResult<Option<Notification>> {
        if mentioned == author {
            return Ok(None);
        }
        self.publish(PublishRequest {
            recipient: mentioned,
            notification_type: NotificationType::Mention,
            target,
            actor: author,
            milestone: None,
        })
        .await
        .map(Some)
    }

    /// Notify a post author when the vote count lands on a milestone.
    pub async fn vote_count_changed(
        &self,
        post_author: UserId,
        voter: UserId,
        post_id: PostId,
        vote_count: i64,
    ) -> AppResult<Option<Notification>> {
        if post_author == voter || !is_vote_milestone(vote_count) {
            return Ok(None);
        }
        let milestone = i32::try_from(vote_count)
            .map_err(|_| AppError::validation(format!("Vote count {vote_count} out of range")))?;
        self.publish(PublishRequest {
            recipient: post_author,
            notification_type: NotificationType::VoteMilestone,
            target: NotificationTarget::Post(post_id),
            actor: voter,
            milestone: Some(milestone),
        })
        .await
        .map(Some)
    }

    /// Route an application event to the matching wrapper.
    pub async fn handle_event(&self, event: NotificationEvent) -> AppResult<Option<Notification>> {
        match event {
            NotificationEvent::CommentCreated {
                post_author,
                commenter,
                comment_id,
            } => self.comment_created(post_author, commenter, comment_id).await,
            NotificationEvent::ReplyCreated {
                parent_author,
                replier,
                reply_id,
            } => self.reply_created(parent_author, replier, reply_id).await,
            NotificationEvent::Mentioned {
                mentioned,
                author,
                target,
            } => self.mentioned(mentioned, author, target).await,
            NotificationEvent::VoteCountChanged {
                post_author,
                voter,
                post_id,
                vote_count,
            } => {
                self.vote_count_changed(post_author, voter, post_id, vote_count)
                    .await
            }
        }
    }

    /// Publish in the background. Failures are logged and never reach the caller.
    pub fn dispatch_best_effort(self: &Arc<Self>, event: NotificationEvent) -> JoinHandle<()> {
        let publisher = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = publisher.handle_event(event.clone()).await {
                warn!(error = %e, ?event, "Notification publish failed");
            }
        })
    }
}
