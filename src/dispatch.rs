use std::sync::Arc;

use tracing::{info, warn};

use crate::chat::ChatService;
use crate::matchmaking::MatchmakingEngine;
use crate::metrics::ServerMetrics;
use crate::protocol::{ClientMessage, PlayerId, ServerMessage};
use crate::registry::PlayerRegistry;
use crate::simulation::Simulation;
use crate::transport::Transport;

/// Routes network events to the registry, matchmaking engine, chat, and
/// simulation. Owns no state of its own.
pub struct ConnectionDispatcher {
    registry: Arc<PlayerRegistry>,
    engine: Arc<MatchmakingEngine>,
    chat: Arc<ChatService>,
    simulation: Arc<dyn Simulation>,
    transport: Arc<dyn Transport>,
    metrics: Arc<ServerMetrics>,
    max_players_limit: usize,
}

impl ConnectionDispatcher {
    pub fn new(
        registry: Arc<PlayerRegistry>,
        engine: Arc<MatchmakingEngine>,
        chat: Arc<ChatService>,
        simulation: Arc<dyn Simulation>,
        transport: Arc<dyn Transport>,
        metrics: Arc<ServerMetrics>,
        max_players_limit: usize,
    ) -> Self {
        Self {
            registry,
            engine,
            chat,
            simulation,
            transport,
            metrics,
            max_players_limit,
        }
    }

    /// Register the player, then acknowledge with the assigned id and
    /// the current simulation time.
    pub async fn handle_connect(&self, player_id: PlayerId) {
        self.registry.add(player_id);
        self.metrics.increment_connections();
        info!(%player_id, "player connected");

        let ack = Arc::new(ServerMessage::Connected {
            player_id,
            server_time: self.simulation.current_time(),
        });
        if let Err(err) = self.transport.send(player_id, ack).await {
            warn!(%player_id, %err, "failed to send connect acknowledgement");
        }
    }

    /// Tear down a connection. Collaborators clean up first, while the
    /// registry still lists the player; registry removal comes last so
    /// their membership checks keep seeing the player.
    pub async fn handle_disconnect(&self, player_id: PlayerId) {
        self.simulation.remove_player(player_id).await;
        self.engine.cancel(player_id);
        self.chat.remove_player(player_id);
        self.registry.remove(player_id);
        self.metrics.decrement_active_connections();
        info!(%player_id, "player disconnected");
    }

    /// Parse one inbound text frame and dispatch it to exactly one
    /// handler. Malformed or unrecognized frames are dropped with a
    /// diagnostic; the connection and all state stay untouched.
    pub async fn handle_message(&self, player_id: PlayerId, raw: &str) {
        self.metrics.increment_messages_received();

        let envelope: serde_json::Value = match serde_json::from_str(raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                self.metrics.increment_malformed_messages();
                warn!(%player_id, %err, "dropping malformed message");
                return;
            }
        };

        let message: ClientMessage = match serde_json::from_value(envelope) {
            Ok(message) => message,
            Err(err) => {
                self.metrics.increment_unknown_message_types();
                warn!(%player_id, %err, "dropping unrecognized message");
                return;
            }
        };

        match message {
            ClientMessage::MatchmakingRequest {
                game_mode,
                min_players,
                max_players,
            } => {
                // A request that can never be satisfied would sit at the
                // head of its partition and block it forever.
                if min_players == 0
                    || max_players < min_players
                    || max_players > self.max_players_limit
                {
                    self.metrics.increment_requests_rejected();
                    warn!(
                        %player_id,
                        min_players,
                        max_players,
                        limit = self.max_players_limit,
                        "rejecting matchmaking request with unsatisfiable bounds"
                    );
                    return;
                }
                self.engine
                    .enqueue(player_id, game_mode, min_players, max_players);
            }
            ClientMessage::ChatMessage { channel, message } => {
                if let Err(err) = self.chat.handle_message(player_id, &channel, &message).await {
                    warn!(%player_id, %err, "chat message rejected");
                }
            }
            ClientMessage::GameAction { payload } => {
                self.simulation.handle_action(player_id, payload).await;
            }
            ClientMessage::Ping => {
                let pong = Arc::new(ServerMessage::Pong {
                    server_time: self.simulation.current_time(),
                });
                if let Err(err) = self.transport.send(player_id, pong).await {
                    warn!(%player_id, %err, "failed to send pong");
                }
            }
        }
    }
}
