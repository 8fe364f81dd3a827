//! Per-connection handler: attach to the hub, then shuttle frames between
//! the socket and the hub until either side goes away.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use slidesync_common::{ClientMessage, ConnectionId, ProtocolError, ServerMessage};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::hub::HubHandle;

/// Limits applied to every connection.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    /// Close the connection when nothing arrives from the client for this long.
    pub idle_timeout: Duration,
    /// Length of the queue between the hub and this connection.
    pub outbound_buffer: usize,
}

/// Why a connection loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    ClientClosed,
    Idle,
    HubGone,
    SendFailed,
    TransportError,
}

/// Handle a single WebSocket connection.
pub async fn handle_connection(
    ws: WebSocketStream<TcpStream>,
    addr: SocketAddr,
    hub: HubHandle,
    settings: ConnectionSettings,
) {
    let connection = ConnectionId::new();
    let (mut sink, mut stream) = ws.split();

    let (tx, mut rx) = mpsc::channel::<ServerMessage>(settings.outbound_buffer.max(1));
    if hub.attach(connection, tx).await.is_err() {
        tracing::debug!(peer = %addr, "Hub stopped before connection could attach");
        let _ = sink.close().await;
        return;
    }

    tracing::info!(peer = %addr, conn = %connection, "Client connected");

    let mut deadline = Instant::now() + settings.idle_timeout;
    let exit = loop {
        tokio::select! {
            // Hub → this client's WebSocket
            outbound = rx.recv() => {
                let Some(msg) = outbound else {
                    break Exit::HubGone;
                };
                let text = match msg.encode() {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(conn = %connection, error = %e, "Failed to encode outbound message");
                        continue;
                    }
                };
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break Exit::SendFailed;
                }
            }

            // This client's WebSocket → hub
            frame = stream.next() => {
                deadline = Instant::now() + settings.idle_timeout;
                match frame {
                    Some(Ok(Message::Text(text))) => match ClientMessage::decode(&text) {
                        Ok(message) => {
                            if hub.submit(connection, message).await.is_err() {
                                break Exit::HubGone;
                            }
                        }
                        Err(e) => {
                            tracing::debug!(conn = %connection, error = %e, "Ignoring malformed frame");
                        }
                    },
                    Some(Ok(Message::Binary(data))) => {
                        let e = ProtocolError::Binary(data.len());
                        tracing::debug!(conn = %connection, error = %e, "Ignoring frame");
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sink.send(Message::Pong(data)).await.is_err() {
                            break Exit::SendFailed;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break Exit::ClientClosed,
                    Some(Err(e)) => {
                        tracing::debug!(conn = %connection, error = %e, "WS error");
                        break Exit::TransportError;
                    }
                    Some(Ok(_)) => {}
                }
            }

            _ = sleep_until(deadline) => break Exit::Idle,
        }
    };

    tracing::info!(peer = %addr, conn = %connection, reason = ?exit, "Client disconnected");

    hub.detach(connection).await;
    let _ = sink.close().await;
}
