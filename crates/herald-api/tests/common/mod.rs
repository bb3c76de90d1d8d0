#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use herald_api::{AppState, build_app};
use herald_auth::JwtEncoder;
use herald_core::config::AppConfig;
use herald_core::types::id::UserId;
use herald_database::{MemoryStore, Stores};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    encoder: JwtEncoder,
}

impl TestApp {
    pub fn new() -> Self {
        let config = AppConfig::from_toml(
            r#"
            [database]
            url = "memory://"

            [auth]
            jwt_secret = "integration-test-secret"
            "#,
        )
        .expect("test config");
        let store = Arc::new(MemoryStore::new());
        let encoder = JwtEncoder::new(&config.auth);
        let state = AppState::new(config, Stores::memory(store.clone()));
        Self {
            state,
            store,
            encoder,
        }
    }

    pub fn token_for(&self, user: UserId, username: &str) -> String {
        self.encoder
            .generate_access_token(user, username)
            .expect("token")
            .0
    }

    /// Registers a user and returns it with a valid token.
    pub async fn user(&self, username: &str) -> (UserId, String) {
        let id = self.store.insert_user(username, None).await;
        (id, self.token_for(id, username))
    }

    pub fn router(&self) -> axum::Router {
        build_app(self.state.clone())
    }

    /// Serves the app on an ephemeral local port.
    pub async fn spawn(&self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let app = self.router();
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server");
        });
        addr
    }
}

pub async fn connect(addr: SocketAddr, token: &str) -> Client {
    let (ws, _) = connect_async(format!("ws://{addr}/ws?token={token}"))
        .await
        .expect("upgrade");
    ws
}

/// Connects and waits until the server has registered the connection.
pub async fn connect_ready(addr: SocketAddr, token: &str) -> Client {
    let mut ws = connect(addr, token).await;
    send_json(&mut ws, serde_json::json!({"type": "ping"})).await;
    assert_eq!(next_json(&mut ws).await["type"], "pong");
    ws
}

pub async fn send_json(ws: &mut Client, value: Value) {
    ws.send(Message::text(value.to_string())).await.expect("send");
}

/// Next text frame as JSON, skipping transport pings and pongs.
pub async fn next_json(ws: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(WAIT, ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("websocket error");
        match msg {
            Message::Text(text) => return serde_json::from_str(text.as_str()).expect("json"),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected message {other:?}"),
        }
    }
}

/// Waits for the server's close frame and returns its code and reason.
pub async fn next_close(ws: &mut Client) -> Option<(u16, String)> {
    loop {
        let next = tokio::time::timeout(WAIT, ws.next())
            .await
            .expect("timed out waiting for close");
        match next {
            Some(Ok(Message::Close(frame))) => {
                return frame.map(|f| (u16::from(f.code), f.reason.as_str().to_string()));
            }
            Some(Ok(_)) => continue,
            Some(Err(_)) | None => return None,
        }
    }
}
