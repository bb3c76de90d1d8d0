//! WebSocket upgrade and the per-connection read/write loops.

use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use bytes::Bytes;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use herald_core::error::AppError;
use herald_entity::protocol::CloseReason;
use herald_realtime::connection::AuthenticatedUser;
use herald_realtime::message::encode_frame;
use herald_realtime::{ConnectionHandle, OutboundEvent, RealtimeEngine};

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for the upgrade request.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    /// Bearer credential.
    pub token: Option<String>,
}

/// GET /ws?token={jwt}
///
/// A missing credential is refused before the upgrade. Anything else is
/// verified after it, so a bad credential is reported with a close code the
/// client can act on.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let token = query
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::authentication("Missing credential"))?;

    let engine = state.realtime.clone();
    Ok(ws.on_upgrade(move |socket| async move {
        let authenticated = engine.handshake().authenticate(&token).await;
        match authenticated {
            Ok(user) => run_connection(engine, user, socket).await,
            Err(e) => {
                let reason = if e.is_authentication() {
                    CloseReason::AuthenticationRequired
                } else {
                    error!(error = %e, "Handshake failed");
                    CloseReason::InternalError
                };
                debug!(error = %e, ?reason, "Rejecting live connection");
                close_socket(socket, reason).await;
            }
        }
    }))
}

/// Sends the close frame for `reason`, if it has one, and drops the socket.
async fn close_socket(mut socket: WebSocket, reason: CloseReason) {
    if let Some(frame) = close_frame(reason) {
        let _ = socket.send(frame).await;
    }
}

fn close_frame(reason: CloseReason) -> Option<Message> {
    reason.close_frame().map(|(code, text)| {
        Message::Close(Some(CloseFrame {
            code,
            reason: text.into(),
        }))
    })
}

/// Drives one authenticated connection until it closes for any reason.
async fn run_connection(engine: Arc<RealtimeEngine>, user: AuthenticatedUser, socket: WebSocket) {
    let (handle, outbound_rx) = engine.connect(&user);
    let (sink, mut stream) = socket.split();
    let writer = tokio::spawn(write_loop(handle.clone(), outbound_rx, sink));

    loop {
        tokio::select! {
            _ = handle.cancelled() => break,
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let replies = engine
                        .dispatcher()
                        .handle_text(handle.user_id, text.as_str())
                        .await;
                    for frame in replies {
                        handle.send(frame);
                    }
                }
                Some(Ok(Message::Pong(_))) => handle.mark_alive(),
                Some(Ok(Message::Close(frame))) => {
                    debug!(conn_id = %handle.id, ?frame, "Peer closed connection");
                    handle.close(CloseReason::PeerClosed);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(conn_id = %handle.id, error = %e, "WebSocket error");
                    handle.close(CloseReason::PeerClosed);
                    break;
                }
                None => {
                    handle.close(CloseReason::PeerClosed);
                    break;
                }
            }
        }
    }

    engine.disconnect(&handle);
    if let Err(e) = writer.await {
        error!(conn_id = %handle.id, error = %e, "Writer task failed");
    }
    info!(conn_id = %handle.id, user_id = %handle.user_id, "Connection task finished");
}

/// Forwards queued events to the socket in FIFO order, then finishes the
/// close handshake the way the close reason asks for.
async fn write_loop(
    handle: Arc<ConnectionHandle>,
    mut outbound_rx: mpsc::Receiver<OutboundEvent>,
    mut sink: SplitSink<WebSocket, Message>,
) {
    loop {
        tokio::select! {
            biased;
            _ = handle.cancelled() => break,
            event = outbound_rx.recv() => {
                let Some(event) = event else { break };
                let message = match event {
                    OutboundEvent::Frame(frame) => match encode_frame(&frame) {
                        Ok(text) => Message::Text(text.into()),
                        Err(e) => {
                            error!(conn_id = %handle.id, error = %e, "Failed to encode frame");
                            continue;
                        }
                    },
                    OutboundEvent::Ping => Message::Ping(Bytes::new()),
                };
                if sink.send(message).await.is_err() {
                    handle.close(CloseReason::PeerClosed);
                    break;
                }
            }
        }
    }

    match handle.close_reason() {
        // Terminate without a close handshake.
        Some(CloseReason::HeartbeatTimeout) => {}
        Some(reason) => match close_frame(reason) {
            Some(frame) => {
                let _ = sink.send(frame).await;
            }
            None => {
                let _ = sink.close().await;
            }
        },
        None => {}
    }
}
