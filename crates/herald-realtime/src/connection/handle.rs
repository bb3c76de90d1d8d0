//! Individual live connection handle.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::warn;

use herald_core::types::id::{ConnectionId, UserId};
use herald_entity::protocol::{CloseReason, ServerFrame};

/// Work item for a connection's writer task.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    /// A JSON frame to serialize and send as text.
    Frame(ServerFrame),
    /// A transport-level ping.
    Ping,
}

/// A handle to a single live connection.
///
/// The transport is owned by the connection task; everything else talks to
/// it through the bounded outbound queue and the cancellation token.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// User who owns this connection
    pub user_id: UserId,
    /// Username (cached for logging)
    pub username: String,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    /// Sender for outbound events
    sender: mpsc::Sender<OutboundEvent>,
    /// Cleared by every heartbeat sweep, set again by a transport pong
    alive: AtomicBool,
    /// Fires when the connection must shut down
    cancel: CancellationToken,
    /// First reason the connection was closed for
    close_reason: OnceLock<CloseReason>,
}

impl ConnectionHandle {
    /// Create a new connection handle
    pub fn new(user_id: UserId, username: String, sender: mpsc::Sender<OutboundEvent>) -> Self {
        Self {
            id: ConnectionId::new(),
            user_id,
            username,
            connected_at: Utc::now(),
            sender,
            alive: AtomicBool::new(true),
            cancel: CancellationToken::new(),
            close_reason: OnceLock::new(),
        }
    }

    /// Queue a frame without waiting. Returns false if it was dropped.
    pub fn send(&self, frame: ServerFrame) -> bool {
        self.enqueue(OutboundEvent::Frame(frame))
    }

    /// Queue a transport ping without waiting.
    pub fn ping(&self) -> bool {
        self.enqueue(OutboundEvent::Ping)
    }

    fn enqueue(&self, event: OutboundEvent) -> bool {
        if self.is_closed() {
            return false;
        }
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(conn_id = %self.id, user_id = %self.user_id, "Outbound queue full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Record a transport pong.
    pub fn mark_alive(&self) {
        self.alive.store(true, Ordering::SeqCst);
    }

    /// Clear the alive flag, returning its previous value.
    pub fn take_alive(&self) -> bool {
        self.alive.swap(false, Ordering::SeqCst)
    }

    /// Ask the connection task to close. The first reason wins.
    ///
    /// Returns false if the connection was already closing.
    pub fn close(&self, reason: CloseReason) -> bool {
        let first = self.close_reason.set(reason).is_ok();
        self.cancel.cancel();
        first
    }

    /// Why the connection was closed, if it has been.
    pub fn close_reason(&self) -> Option<CloseReason> {
        self.close_reason.get().copied()
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_queues_frames_in_order() {
        let (tx, mut rx) = mpsc::channel(4);
        let handle = ConnectionHandle::new(UserId::new(), "alice".to_string(), tx);

        assert!(handle.send(ServerFrame::Pong));
        assert!(handle.ping());
        assert_eq!(rx.recv().await, Some(OutboundEvent::Frame(ServerFrame::Pong)));
        assert_eq!(rx.recv().await, Some(OutboundEvent::Ping));
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(UserId::new(), "alice".to_string(), tx);

        assert!(handle.send(ServerFrame::Pong));
        assert!(!handle.send(ServerFrame::Pong));
    }

    #[tokio::test]
    async fn test_first_close_reason_wins() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(UserId::new(), "alice".to_string(), tx);

        assert!(handle.close(CloseReason::Superseded));
        assert!(!handle.close(CloseReason::Shutdown));
        assert_eq!(handle.close_reason(), Some(CloseReason::Superseded));
        handle.cancelled().await;
        assert!(!handle.send(ServerFrame::Pong));
    }

    #[test]
    fn test_alive_flag_flips() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(UserId::new(), "alice".to_string(), tx);

        assert!(handle.take_alive());
        assert!(!handle.take_alive());
        handle.mark_alive();
        assert!(handle.take_alive());
    }
}
