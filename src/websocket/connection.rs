use crate::protocol::ServerMessage;
use crate::server::GameServer;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Drive one WebSocket connection: allocate a player id, register the
/// outbound queue, then pump frames in both directions until either
/// side closes. Cleanup runs exactly once, after both pumps stop.
pub(super) async fn handle_socket(socket: WebSocket, server: Arc<GameServer>, addr: SocketAddr) {
    let (mut sender, mut receiver) = socket.split();
    let queue_capacity = server.config().server.outbound_queue_capacity.max(1);
    let (tx, mut rx) = mpsc::channel::<Arc<ServerMessage>>(queue_capacity);

    let player_id = server.transport().allocate_player_id();
    server.transport().register(player_id, tx);
    tracing::info!(%player_id, client_addr = %addr, "WebSocket connection established");

    server.dispatcher().handle_connect(player_id).await;

    // Outgoing: drain this client's queue onto the socket.
    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let json = match serde_json::to_string(message.as_ref()) {
                Ok(json) => json,
                Err(err) => {
                    tracing::error!(%player_id, error = %err, "Failed to serialize outbound message");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Incoming: forward text frames to the dispatcher.
    let receive_server = Arc::clone(&server);
    let receive_task = tokio::spawn(async move {
        let max_message_size = receive_server.config().server.max_message_size;
        while let Some(frame) = receiver.next().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(err) => {
                    tracing::warn!(%player_id, "WebSocket error: {}", err);
                    break;
                }
            };

            match frame {
                Message::Text(text) => {
                    if text.len() > max_message_size {
                        tracing::warn!(
                            %player_id,
                            size = text.len(),
                            max = max_message_size,
                            "Message exceeds size limit"
                        );
                        continue;
                    }
                    receive_server
                        .dispatcher()
                        .handle_message(player_id, &text)
                        .await;
                }
                Message::Close(_) => {
                    tracing::info!(%player_id, "WebSocket connection closed");
                    break;
                }
                _ => {
                    // Ping/pong control frames are answered by the
                    // protocol layer; binary payloads are ignored.
                }
            }
        }
    });

    // Wait for either pump to stop, then tear the connection down.
    tokio::select! {
        _ = send_task => {
            tracing::debug!(%player_id, "Send task completed");
        }
        _ = receive_task => {
            tracing::debug!(%player_id, "Receive task completed");
        }
    }

    // Unregistering drops the outbound sender, which ends the send task
    // if it is still draining.
    server.transport().unregister(player_id);
    server.dispatcher().handle_disconnect(player_id).await;
}
