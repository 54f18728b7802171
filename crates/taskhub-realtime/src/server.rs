//! WebSocket listener and per-socket session loops.
//!
//! A socket joins no room and receives no broadcast until its first
//! message authenticates it. The handshake must complete within
//! [`HANDSHAKE_TIMEOUT`] or the socket is closed.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use taskhub_core::config::RealtimeConfig;
use taskhub_core::error::{AppError, ErrorKind};
use taskhub_core::result::AppResult;

use crate::connection::authenticator::WsAuthenticator;
use crate::connection::manager::ConnectionManager;
use crate::message::types::{ClientMessage, ServerMessage};

/// How long a socket may stay connected without authenticating.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// WebSocket server for the real-time engine.
pub struct RealtimeServer {
    manager: Arc<ConnectionManager>,
    authenticator: WsAuthenticator,
    config: RealtimeConfig,
}

impl RealtimeServer {
    /// Creates a new server over the given manager and authenticator.
    pub fn new(
        config: RealtimeConfig,
        manager: Arc<ConnectionManager>,
        authenticator: WsAuthenticator,
    ) -> Self {
        Self {
            manager,
            authenticator,
            config,
        }
    }

    /// Accepts connections until the shutdown signal fires, then closes
    /// every registered connection.
    pub async fn serve(&self, mut shutdown: broadcast::Receiver<()>) -> AppResult<()> {
        let listener = TcpListener::bind(&self.config.bind_addr).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Failed to bind WebSocket listener on {}", self.config.bind_addr),
                e,
            )
        })?;
        info!(addr = %self.config.bind_addr, "WebSocket listener started");

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            debug!(peer = %peer, "Incoming connection");
                            let manager = Arc::clone(&self.manager);
                            let authenticator = self.authenticator.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_socket(stream, manager, authenticator).await {
                                    debug!(peer = %peer, error = %e, "Connection ended with error");
                                }
                            });
                        }
                        Err(e) => warn!(error = %e, "Failed to accept connection"),
                    }
                }
            }
        }

        info!("WebSocket listener stopping");
        self.manager.close_all();
        Ok(())
    }
}

/// Runs one socket from TCP accept to close.
async fn handle_socket(
    stream: TcpStream,
    manager: Arc<ConnectionManager>,
    authenticator: WsAuthenticator,
) -> AppResult<()> {
    let mut ws = tokio_tungstenite::accept_async(stream)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "WebSocket handshake failed", e)
        })?;

    let identity = match tokio::time::timeout(HANDSHAKE_TIMEOUT, authenticate(&mut ws, &authenticator))
        .await
    {
        Ok(Some(identity)) => identity,
        Ok(None) => return Ok(()),
        Err(_) => {
            debug!("Handshake timed out");
            let _ = ws.close(None).await;
            return Ok(());
        }
    };

    let (handle, mut outbound) = manager.register(identity);

    // Acknowledge with the current unread count so the client can render
    // its badge before any sync request.
    let unread_count = manager.unread_count(identity.user_id).await.unwrap_or(0);
    let ack = ServerMessage::Authenticated {
        user_id: identity.user_id.into_uuid(),
        tenant_id: identity.tenant_id.into_uuid(),
        unread_count,
    };
    if let Ok(frame) = serde_json::to_string(&ack) {
        let _ = ws.send(Message::text(frame)).await;
    }

    loop {
        tokio::select! {
            // Eviction or shutdown: flush frames queued before the close
            // (the eviction notice among them), then drop the socket.
            _ = handle.wait_closed() => {
                while let Ok(frame) = outbound.try_recv() {
                    if ws.send(Message::text(frame)).await.is_err() {
                        break;
                    }
                }
                break;
            }
            frame = outbound.recv() => {
                match frame {
                    Some(frame) => {
                        if ws.send(Message::text(frame)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = ws.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        manager.handle_message(&handle.id, text.as_str()).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(conn_id = %handle.id, error = %e, "Socket read error");
                        break;
                    }
                }
            }
        }
    }

    manager.unregister(&handle.id);
    let _ = ws.close(None).await;
    Ok(())
}

/// Drives the first-message handshake. A rejected token gets an
/// `auth_error` reply and the socket stays open for another attempt
/// until the handshake deadline. Returns `None` when the socket closed.
async fn authenticate(
    ws: &mut WebSocketStream<TcpStream>,
    authenticator: &WsAuthenticator,
) -> Option<crate::connection::authenticator::AuthenticatedConnection> {
    while let Some(incoming) = ws.next().await {
        let text = match incoming {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => continue,
        };

        let token = match serde_json::from_str::<ClientMessage>(text.as_str()) {
            Ok(ClientMessage::Authenticate { token }) => token,
            _ => {
                send_auth_error(ws, "Expected an authenticate message").await;
                continue;
            }
        };

        match authenticator.authenticate(&token) {
            Ok(identity) => return Some(identity),
            Err(e) => {
                debug!(error = %e, "Authentication rejected");
                send_auth_error(ws, &e.message).await;
            }
        }
    }
    None
}

async fn send_auth_error(ws: &mut WebSocketStream<TcpStream>, message: &str) {
    let frame = ServerMessage::AuthError {
        message: message.to_string(),
    };
    if let Ok(frame) = serde_json::to_string(&frame) {
        let _ = ws.send(Message::text(frame)).await;
    }
}
