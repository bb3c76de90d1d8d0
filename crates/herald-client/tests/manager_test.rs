use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;

use herald_api::{AppState, build_app};
use herald_auth::JwtEncoder;
use herald_client::{ClientConfig, ClientConnectionManager, ConnectionState};
use herald_core::config::AppConfig;
use herald_core::types::id::UserId;
use herald_database::{MemoryStore, Stores};

const WAIT: Duration = Duration::from_secs(5);

struct Server {
    addr: SocketAddr,
    state: AppState,
    store: Arc<MemoryStore>,
    encoder: JwtEncoder,
}

impl Server {
    async fn start() -> Self {
        let config = AppConfig::from_toml(
            "[database]\nurl = \"memory://\"\n[auth]\njwt_secret = \"client-test-secret\"",
        )
        .expect("config");
        let store = Arc::new(MemoryStore::new());
        let encoder = JwtEncoder::new(&config.auth);
        let state = AppState::new(config, Stores::memory(store.clone()));

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let app = build_app(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server");
        });

        Self {
            addr,
            state,
            store,
            encoder,
        }
    }

    async fn user(&self, name: &str) -> (UserId, String) {
        let id = self.store.insert_user(name, None).await;
        let token = self
            .encoder
            .generate_access_token(id, name)
            .expect("token")
            .0;
        (id, token)
    }

    fn client(&self) -> ClientConnectionManager {
        ClientConnectionManager::new(ClientConfig::new(format!("ws://{}/ws", self.addr)))
    }
}

async fn wait_for_state(client: &ClientConnectionManager, wanted: ConnectionState) {
    let mut rx: watch::Receiver<ConnectionState> = client.watch_state();
    tokio::time::timeout(WAIT, rx.wait_for(|s| *s == wanted))
        .await
        .expect("timed out waiting for state")
        .expect("state channel closed");
}

/// Connected and the server has answered the opening `get_preferences`.
async fn wait_ready(client: &ClientConnectionManager) {
    let mut rx = client.watch_local();
    tokio::time::timeout(WAIT, rx.wait_for(|l| l.preferences.is_some()))
        .await
        .expect("timed out waiting for preferences")
        .expect("local channel closed");
}

#[tokio::test]
async fn test_open_requests_preferences_and_folds_pushes() {
    let server = Server::start().await;
    let (alice, token) = server.user("alice").await;
    let (bob, _) = server.user("bob").await;
    let post = server.store.insert_post("Post", "Body").await;
    let comment = server.store.insert_comment(post, "hello").await;

    let client = server.client();
    client.connect(token).await;
    wait_for_state(&client, ConnectionState::Connected).await;
    wait_ready(&client).await;

    server
        .state
        .realtime
        .publisher()
        .comment_created(alice, bob, comment)
        .await
        .expect("publish");

    let mut rx = client.watch_local();
    let local = tokio::time::timeout(
        WAIT,
        rx.wait_for(|l| l.unread_count == 1 && l.notifications.len() == 1),
    )
    .await
    .expect("timed out waiting for push")
    .expect("local channel closed")
    .clone();
    let id = local.notifications[0].notification.id;

    client.mark_viewed(vec![id]).await.expect("send");
    assert_eq!(client.local().unread_count, 0);
    assert!(client.local().notifications[0].notification.viewed);

    tokio::time::timeout(WAIT, async {
        while server.state.realtime.inbox().unread_count(alice).await.expect("count") != 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("server never saw mark_viewed");
}

#[tokio::test]
async fn test_disconnect_does_not_reconnect() {
    let server = Server::start().await;
    let (_, token) = server.user("alice").await;
    let client = server.client();

    client.connect(token).await;
    wait_ready(&client).await;
    client.disconnect().await;

    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert!(!client.is_session_active().await);
    assert!(!client.on_visibility_restored().await);
    assert_eq!(client.reconnect_attempts(), 0);
}

#[tokio::test]
async fn test_page_unload_then_visible_reconnects() {
    let server = Server::start().await;
    let (alice, token) = server.user("alice").await;
    let client = server.client();

    client.connect(token).await;
    wait_ready(&client).await;
    client.on_page_unload().await;
    assert_eq!(client.state(), ConnectionState::Disconnected);

    assert!(client.on_visibility_restored().await);
    wait_for_state(&client, ConnectionState::Connected).await;
    assert!(!client.on_visibility_restored().await);

    tokio::time::timeout(WAIT, async {
        while !server.state.realtime.registry().is_connected(alice) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("server never registered the reconnect");
}

#[tokio::test]
async fn test_superseded_client_stays_down() {
    let server = Server::start().await;
    let (_, token) = server.user("alice").await;

    let first = server.client();
    first.connect(token.clone()).await;
    wait_ready(&first).await;

    let second = server.client();
    second.connect(token).await;
    wait_ready(&second).await;

    tokio::time::timeout(WAIT, first.wait_closed())
        .await
        .expect("superseded session kept running");
    assert_eq!(first.state(), ConnectionState::Disconnected);
    assert_eq!(first.reconnect_attempts(), 0);
    assert_eq!(second.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_bad_credential_is_not_retried() {
    let server = Server::start().await;
    let client = server.client();

    client.connect("not-a-token").await;
    tokio::time::timeout(WAIT, client.wait_closed())
        .await
        .expect("rejected session kept running");
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert_eq!(client.reconnect_attempts(), 0);
}

#[tokio::test]
async fn test_send_without_connection_fails() {
    let client = ClientConnectionManager::new(ClientConfig::new("ws://127.0.0.1:9/ws"));
    assert_eq!(
        client.fetch_notifications().await,
        Err(herald_client::ClientError::NotConnected)
    );
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_server_gives_up_after_five_attempts() {
    // Reserve a port, then free it so nothing is listening.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr")
    };
    let client = ClientConnectionManager::new(ClientConfig::new(format!("ws://{addr}/ws")));

    let started = tokio::time::Instant::now();
    client.connect("token").await;
    client.wait_closed().await;

    assert_eq!(client.reconnect_attempts(), 5);
    assert_eq!(client.state(), ConnectionState::Disconnected);
    // 1 + 2 + 4 + 8 + 16 seconds of backoff, and no sixth wait.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(31), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(32), "{elapsed:?}");
}
