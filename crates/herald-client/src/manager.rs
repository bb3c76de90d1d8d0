//! Client connection manager.
//!
//! A background task owns the socket. The manager talks to it over a command
//! channel and publishes connection state and local notification state
//! through `watch` channels.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use herald_core::types::id::NotificationId;
use herald_entity::preference::PreferenceSummary;
use herald_entity::protocol::{ClientFrame, CloseReason, ServerFrame};

use crate::backoff::ReconnectPolicy;
use crate::error::ClientError;
use crate::local::LocalNotificationState;
use crate::state::ConnectionState;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Sink = SplitSink<Socket, Message>;

const COMMAND_BUFFER: usize = 64;

/// Client connection settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket endpoint, e.g. `ws://localhost:8080/ws`. The credential is
    /// appended as the `token` query parameter.
    pub url: String,
    /// How often to send an application `ping`.
    pub ping_interval: Duration,
    /// Close the socket if no pong arrived within this window.
    pub pong_timeout: Duration,
    /// Reconnect schedule after an unexpected close.
    pub reconnect: ReconnectPolicy,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ping_interval: Duration::from_secs(25),
            pong_timeout: Duration::from_secs(30),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

enum Command {
    Send(ClientFrame),
    Close,
}

/// How a connected session ended.
enum SessionEnd {
    /// The client asked to close.
    Clean,
    /// The server refused this client; reconnecting would not help.
    Rejected(CloseReason),
    /// Anything else.
    Dropped,
}

struct Shared {
    config: ClientConfig,
    state: watch::Sender<ConnectionState>,
    local: watch::Sender<LocalNotificationState>,
    attempts: AtomicU32,
}

struct Session {
    commands: mpsc::Sender<Command>,
    task: JoinHandle<()>,
}

/// Owns the live connection for one signed-in user.
pub struct ClientConnectionManager {
    shared: Arc<Shared>,
    credential: Mutex<Option<String>>,
    session: Mutex<Option<Session>>,
}

impl fmt::Debug for ClientConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConnectionManager")
            .field("url", &self.shared.config.url)
            .field("state", &*self.shared.state.borrow())
            .finish()
    }
}

impl ClientConnectionManager {
    pub fn new(config: ClientConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let (local, _) = watch::channel(LocalNotificationState::default());
        Self {
            shared: Arc::new(Shared {
                config,
                state,
                local,
                attempts: AtomicU32::new(0),
            }),
            credential: Mutex::new(None),
            session: Mutex::new(None),
        }
    }

    /// Connect with `credential`, cleanly replacing any current session.
    pub async fn connect(&self, credential: impl Into<String>) {
        let credential = credential.into();
        *self.credential.lock().await = Some(credential.clone());
        self.stop_session().await;
        self.start_session(credential).await;
    }

    /// Close cleanly and forget the credential. No reconnect follows.
    pub async fn disconnect(&self) {
        *self.credential.lock().await = None;
        self.stop_session().await;
    }

    /// Close cleanly before the page goes away. The credential is kept.
    pub async fn on_page_unload(&self) {
        self.stop_session().await;
    }

    /// Reconnect if a credential is cached and no session is running.
    ///
    /// Returns whether a new connection was started.
    pub async fn on_visibility_restored(&self) -> bool {
        if self.is_session_active().await {
            return false;
        }
        let credential = self.credential.lock().await.clone();
        match credential {
            Some(credential) => {
                debug!("Page visible again, reconnecting");
                self.start_session(credential).await;
                true
            }
            None => false,
        }
    }

    /// Whether a session task is still running (connected or retrying).
    pub async fn is_session_active(&self) -> bool {
        self.session
            .lock()
            .await
            .as_ref()
            .is_some_and(|s| !s.task.is_finished())
    }

    /// Wait until the current session task finishes on its own.
    pub async fn wait_closed(&self) {
        let session = self.session.lock().await.take();
        if let Some(Session { commands, task }) = session {
            if let Err(e) = task.await {
                warn!(error = %e, "Client session task failed");
            }
            drop(commands);
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// Snapshot of the local notification state.
    pub fn local(&self) -> LocalNotificationState {
        self.shared.local.borrow().clone()
    }

    pub fn watch_local(&self) -> watch::Receiver<LocalNotificationState> {
        self.shared.local.subscribe()
    }

    /// Reconnect attempts since the last successful open.
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.attempts.load(Ordering::SeqCst)
    }

    /// Send a raw command frame.
    pub async fn send(&self, frame: ClientFrame) -> Result<(), ClientError> {
        if self.state() != ConnectionState::Connected {
            return Err(ClientError::NotConnected);
        }
        let session = self.session.lock().await;
        let commands = session.as_ref().ok_or(ClientError::NotConnected)?;
        commands
            .commands
            .send(Command::Send(frame))
            .await
            .map_err(|_| ClientError::NotConnected)
    }

    /// Mark notifications viewed locally, then tell the server.
    pub async fn mark_viewed(&self, ids: Vec<NotificationId>) -> Result<(), ClientError> {
        self.shared.local.send_modify(|local| {
            local.mark_viewed(&ids);
        });
        self.send(ClientFrame::MarkViewed {
            notification_ids: ids,
        })
        .await
    }

    pub async fn mark_opened(&self, id: NotificationId) -> Result<(), ClientError> {
        self.shared.local.send_modify(|local| local.mark_opened(id));
        self.send(ClientFrame::MarkOpened {
            notification_id: id,
        })
        .await
    }

    pub async fn fetch_notifications(&self) -> Result<(), ClientError> {
        self.send(ClientFrame::GetNotifications).await
    }

    pub async fn fetch_preferences(&self) -> Result<(), ClientError> {
        self.send(ClientFrame::GetPreferences).await
    }

    pub async fn update_preferences(&self, preferences: PreferenceSummary) -> Result<(), ClientError> {
        self.send(ClientFrame::UpdatePreferences { preferences }).await
    }

    async fn start_session(&self, credential: String) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        self.shared.state.send_replace(ConnectionState::Connecting);
        let task = tokio::spawn(run_session(self.shared.clone(), credential, rx));
        *self.session.lock().await = Some(Session { commands: tx, task });
    }

    async fn stop_session(&self) {
        let session = self.session.lock().await.take();
        if let Some(Session { commands, task }) = session {
            // The task may already be gone; a failed send is fine.
            let _ = commands.send(Command::Close).await;
            if let Err(e) = task.await {
                warn!(error = %e, "Client session task failed");
            }
        }
        self.shared.state.send_replace(ConnectionState::Disconnected);
    }
}

/// Connect, drive the socket, and reconnect with backoff until told to stop,
/// rejected, or out of attempts.
async fn run_session(
    shared: Arc<Shared>,
    credential: String,
    mut commands: mpsc::Receiver<Command>,
) {
    let url = format!("{}?token={}", shared.config.url, credential);
    shared.attempts.store(0, Ordering::SeqCst);

    loop {
        shared.state.send_replace(ConnectionState::Connecting);
        match connect_async(url.as_str()).await {
            Ok((socket, _)) => {
                shared.attempts.store(0, Ordering::SeqCst);
                shared.state.send_replace(ConnectionState::Connected);
                info!(url = %shared.config.url, "Notification connection open");

                match drive(&shared, socket, &mut commands).await {
                    SessionEnd::Clean => break,
                    SessionEnd::Rejected(reason) => {
                        warn!(reason = ?reason, "Server ended the session, not reconnecting");
                        break;
                    }
                    SessionEnd::Dropped => {}
                }
            }
            Err(WsError::Http(response)) if response.status() == 401 => {
                warn!("Server rejected the credential");
                break;
            }
            Err(e) => warn!(error = %e, "Notification connection failed"),
        }
        shared.state.send_replace(ConnectionState::Disconnected);

        let attempt = shared.attempts.load(Ordering::SeqCst);
        let Some(delay) = shared.config.reconnect.delay_for(attempt) else {
            warn!(attempts = attempt, "Giving up on reconnecting");
            break;
        };
        shared.attempts.store(attempt + 1, Ordering::SeqCst);
        info!(
            attempt = attempt + 1,
            delay_ms = delay.as_millis() as u64,
            "Reconnecting"
        );
        if !wait_backoff(delay, &mut commands).await {
            break;
        }
    }

    shared.state.send_replace(ConnectionState::Disconnected);
}

/// Sleep out a backoff delay. Returns `false` if a close was requested meanwhile.
async fn wait_backoff(delay: Duration, commands: &mut mpsc::Receiver<Command>) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            cmd = commands.recv() => match cmd {
                Some(Command::Send(frame)) => {
                    debug!(frame = ?frame, "Dropping frame while disconnected");
                }
                Some(Command::Close) | None => return false,
            },
        }
    }
}

async fn drive(
    shared: &Shared,
    socket: Socket,
    commands: &mut mpsc::Receiver<Command>,
) -> SessionEnd {
    let config = &shared.config;
    let (mut sink, mut stream) = socket.split();

    let opened = Instant::now();
    let mut last_pong = opened;
    let mut ping = tokio::time::interval_at(opened + config.ping_interval, config.ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut watchdog = tokio::time::interval_at(opened + config.pong_timeout, config.pong_timeout);
    watchdog.set_missed_tick_behavior(MissedTickBehavior::Delay);

    if !send_frame(&mut sink, &ClientFrame::GetPreferences).await {
        return SessionEnd::Dropped;
    }

    loop {
        tokio::select! {
            cmd = commands.recv() => match cmd {
                Some(Command::Send(frame)) => {
                    if !send_frame(&mut sink, &frame).await {
                        return SessionEnd::Dropped;
                    }
                }
                Some(Command::Close) | None => {
                    let frame = CloseFrame {
                        code: CloseCode::Normal,
                        reason: "client closing".into(),
                    };
                    if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                        debug!(error = %e, "Close frame not delivered");
                    }
                    return SessionEnd::Clean;
                }
            },
            _ = ping.tick() => {
                if !send_frame(&mut sink, &ClientFrame::Ping).await {
                    return SessionEnd::Dropped;
                }
            }
            _ = watchdog.tick() => {
                if last_pong.elapsed() > config.pong_timeout {
                    warn!("No pong from server, closing connection");
                    let _ = sink.close().await;
                    return SessionEnd::Dropped;
                }
            }
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ServerFrame>(text.as_str()) {
                        Ok(ServerFrame::Pong) => last_pong = Instant::now(),
                        Ok(frame) => {
                            if let ServerFrame::Error { code, message } = &frame {
                                warn!(code = %code, message = %message, "Server reported an error");
                            }
                            shared.local.send_modify(|local| local.apply(frame));
                        }
                        Err(e) => warn!(error = %e, "Unreadable server frame"),
                    }
                }
                Some(Ok(Message::Pong(_))) => last_pong = Instant::now(),
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| CloseReason::from_close_frame(u16::from(f.code), f.reason.as_str()))
                        .unwrap_or(CloseReason::PeerClosed);
                    info!(reason = ?reason, "Server closed the connection");
                    return match reason {
                        CloseReason::AuthenticationRequired | CloseReason::Superseded => {
                            SessionEnd::Rejected(reason)
                        }
                        _ => SessionEnd::Dropped,
                    };
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "Connection error");
                    return SessionEnd::Dropped;
                }
                None => return SessionEnd::Dropped,
            },
        }
    }
}

/// Returns `false` if the socket is no longer writable.
async fn send_frame(sink: &mut Sink, frame: &ClientFrame) -> bool {
    let text = match serde_json::to_string(frame) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Failed to encode frame");
            return true;
        }
    };
    match sink.send(Message::text(text)).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Failed to send frame");
            false
        }
    }
}
