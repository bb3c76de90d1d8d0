//! Real-time engine: owns the registry and wires every service to it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use herald_auth::JwtDecoder;
use herald_core::config::{AuthConfig, RealtimeConfig};
use herald_database::Stores;
use herald_entity::protocol::CloseReason;

use crate::connection::handle::{ConnectionHandle, OutboundEvent};
use crate::connection::handshake::{AuthenticatedUser, SessionHandshake};
use crate::connection::heartbeat::HeartbeatMonitor;
use crate::connection::registry::ConnectionRegistry;
use crate::message::dispatcher::MessageDispatcher;
use crate::notification::inbox::NotificationInbox;
use crate::notification::preferences::PreferenceService;
use crate::notification::publisher::NotificationPublisher;

/// The live notification engine.
#[derive(Debug)]
pub struct RealtimeEngine {
    registry: Arc<ConnectionRegistry>,
    handshake: SessionHandshake,
    dispatcher: MessageDispatcher,
    inbox: Arc<NotificationInbox>,
    preferences: Arc<PreferenceService>,
    publisher: Arc<NotificationPublisher>,
    heartbeat_interval: Duration,
    channel_buffer_size: usize,
    shutdown: CancellationToken,
}

impl RealtimeEngine {
    /// Builds the engine over the given stores.
    pub fn new(realtime: &RealtimeConfig, auth: &AuthConfig, stores: Stores) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let inbox = Arc::new(NotificationInbox::new(
            stores.notifications.clone(),
            stores.content.clone(),
            registry.clone(),
            realtime.notification_list_limit,
        ));
        let preferences = Arc::new(PreferenceService::new(stores.preferences.clone()));
        let publisher = Arc::new(NotificationPublisher::new(
            stores.notifications.clone(),
            stores.content.clone(),
            registry.clone(),
            inbox.clone(),
            realtime.preview_max_chars,
        ));

        Self {
            handshake: SessionHandshake::new(JwtDecoder::new(auth), stores.content),
            dispatcher: MessageDispatcher::new(inbox.clone(), preferences.clone()),
            registry,
            inbox,
            preferences,
            publisher,
            heartbeat_interval: realtime.heartbeat_interval(),
            channel_buffer_size: realtime.channel_buffer_size.max(1),
            shutdown: CancellationToken::new(),
        }
    }

    /// Spawns the heartbeat sweep. It stops on [`shutdown`](Self::shutdown).
    pub fn start_heartbeat(&self) -> JoinHandle<()> {
        let monitor = HeartbeatMonitor::new(self.registry.clone(), self.heartbeat_interval);
        tokio::spawn(monitor.run(self.shutdown.child_token()))
    }

    /// Registers a new connection for an authenticated user, superseding any
    /// earlier one. The receiver feeds the connection's writer task.
    pub fn connect(
        &self,
        user: &AuthenticatedUser,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<OutboundEvent>) {
        let (tx, rx) = mpsc::channel(self.channel_buffer_size);
        let handle = Arc::new(ConnectionHandle::new(
            user.user_id,
            user.username.clone(),
            tx,
        ));
        self.registry.register(handle.clone());

        info!(
            conn_id = %handle.id,
            user_id = %user.user_id,
            username = %user.username,
            "Live connection registered"
        );
        (handle, rx)
    }

    /// Removes a connection once its task has finished.
    pub fn disconnect(&self, handle: &ConnectionHandle) {
        if self.registry.unregister(handle.user_id, handle.id) {
            info!(
                conn_id = %handle.id,
                user_id = %handle.user_id,
                reason = ?handle.close_reason().unwrap_or(CloseReason::PeerClosed),
                "Live connection closed"
            );
        }
    }

    /// Stops the heartbeat and closes every live connection as going away.
    pub fn shutdown(&self) -> usize {
        self.shutdown.cancel();
        self.registry.close_all(CloseReason::Shutdown)
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn handshake(&self) -> &SessionHandshake {
        &self.handshake
    }

    pub fn dispatcher(&self) -> &MessageDispatcher {
        &self.dispatcher
    }

    pub fn inbox(&self) -> &Arc<NotificationInbox> {
        &self.inbox
    }

    pub fn preferences(&self) -> &Arc<PreferenceService> {
        &self.preferences
    }

    /// The publisher application code calls into.
    pub fn publisher(&self) -> &Arc<NotificationPublisher> {
        &self.publisher
    }
}

#[cfg(test)]
mod tests {
    use herald_core::types::id::UserId;
    use herald_database::MemoryStore;

    use super::*;

    fn engine() -> RealtimeEngine {
        let store = Arc::new(MemoryStore::new());
        RealtimeEngine::new(
            &RealtimeConfig::default(),
            &AuthConfig::default(),
            Stores::memory(store),
        )
    }

    fn user(name: &str) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: UserId::new(),
            username: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_second_connect_supersedes_first() {
        let engine = engine();
        let alice = user("alice");
        let (first, _rx1) = engine.connect(&alice);
        let (second, _rx2) = engine.connect(&alice);

        assert_eq!(first.close_reason(), Some(CloseReason::Superseded));
        assert_eq!(engine.registry().connection_count(), 1);

        // The superseded task finishing must not remove the new connection.
        engine.disconnect(&first);
        assert!(engine.registry().is_connected(alice.user_id));
        engine.disconnect(&second);
        assert!(!engine.registry().is_connected(alice.user_id));
    }

    #[tokio::test]
    async fn test_shutdown_closes_everything() {
        let engine = engine();
        let heartbeat = engine.start_heartbeat();
        let (a, _rx1) = engine.connect(&user("alice"));
        let (b, _rx2) = engine.connect(&user("bob"));

        assert_eq!(engine.shutdown(), 2);
        assert_eq!(a.close_reason(), Some(CloseReason::Shutdown));
        assert_eq!(b.close_reason(), Some(CloseReason::Shutdown));
        heartbeat.await.unwrap();
    }
}
