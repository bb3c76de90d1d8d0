//! Connection registry: live connections indexed by user.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use herald_core::types::id::{ConnectionId, UserId};
use herald_entity::protocol::{CloseReason, ServerFrame};

use super::handle::ConnectionHandle;

/// Thread-safe map of user id to that user's live connections.
///
/// A key is present only while its connection set is non-empty. Nothing in
/// here awaits, so no shard lock is ever held across store I/O.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    by_user: DashMap<UserId, Vec<Arc<ConnectionHandle>>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection, closing every earlier connection of the same
    /// user as superseded. Returns how many were superseded.
    pub fn register(&self, handle: Arc<ConnectionHandle>) -> usize {
        let user_id = handle.user_id;
        let conn_id = handle.id;

        let previous = {
            let mut entry = self.by_user.entry(user_id).or_default();
            for old in entry.iter() {
                old.close(CloseReason::Superseded);
            }
            std::mem::replace(entry.value_mut(), vec![handle])
        };

        if !previous.is_empty() {
            info!(
                user_id = %user_id,
                conn_id = %conn_id,
                superseded = previous.len(),
                "Superseded earlier connections"
            );
        }
        previous.len()
    }

    /// Removes one connection. Drops the user's key when the set empties.
    pub fn unregister(&self, user_id: UserId, conn_id: ConnectionId) -> bool {
        let removed = match self.by_user.get_mut(&user_id) {
            Some(mut set) => {
                let before = set.len();
                set.retain(|c| c.id != conn_id);
                set.len() < before
            }
            None => false,
        };
        self.by_user.remove_if(&user_id, |_, set| set.is_empty());

        if removed {
            debug!(user_id = %user_id, conn_id = %conn_id, "Connection unregistered");
        }
        removed
    }

    /// Whether the user has at least one live connection.
    pub fn is_connected(&self, user_id: UserId) -> bool {
        self.by_user
            .get(&user_id)
            .is_some_and(|set| !set.is_empty())
    }

    /// Best-effort push to every connection of a user.
    ///
    /// Returns the number of connections the frame was queued on; zero when
    /// the user is not connected.
    pub fn send_to(&self, user_id: UserId, frame: &ServerFrame) -> usize {
        let targets = self.connections_for(user_id);
        targets.iter().filter(|c| c.send(frame.clone())).count()
    }

    /// Snapshot of one user's connections.
    pub fn connections_for(&self, user_id: UserId) -> Vec<Arc<ConnectionHandle>> {
        self.by_user
            .get(&user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Snapshot of every live connection.
    pub fn all_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.by_user
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect()
    }

    /// Total number of live connections.
    pub fn connection_count(&self) -> usize {
        self.by_user.iter().map(|entry| entry.value().len()).sum()
    }

    /// Number of distinct connected users.
    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }

    /// Closes and removes every connection.
    pub fn close_all(&self, reason: CloseReason) -> usize {
        let all = self.all_connections();
        for conn in &all {
            conn.close(reason);
            self.unregister(conn.user_id, conn.id);
        }
        info!(count = all.len(), ?reason, "All connections closed");
        all.len()
    }
}
