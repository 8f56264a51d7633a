use serde::{Deserialize, Serialize};

use super::types::{
    MatchId, PlayerId, DEFAULT_GAME_MODE, DEFAULT_MAX_PLAYERS, DEFAULT_MIN_PLAYERS,
};

/// Message types sent from client to server.
///
/// The wire format is a flat JSON object: the `type` field selects the
/// variant and the remaining camelCase fields sit beside it, e.g.
/// `{"type": "matchmaking_request", "gameMode": "duel", "minPlayers": 2}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join the matchmaking queue under a game mode and player-count bounds
    #[serde(rename_all = "camelCase")]
    MatchmakingRequest {
        #[serde(default = "default_game_mode")]
        game_mode: String,
        #[serde(default = "default_min_players")]
        min_players: usize,
        #[serde(default = "default_max_players")]
        max_players: usize,
    },
    /// Send a chat line to a channel ("global" or a match id)
    ChatMessage { channel: String, message: String },
    /// Opaque gameplay input, forwarded to the simulation unparsed
    GameAction {
        #[serde(flatten)]
        payload: serde_json::Value,
    },
    /// Latency probe; answered immediately with `Pong`
    Ping,
}

fn default_game_mode() -> String {
    DEFAULT_GAME_MODE.to_string()
}

fn default_min_players() -> usize {
    DEFAULT_MIN_PLAYERS
}

fn default_max_players() -> usize {
    DEFAULT_MAX_PLAYERS
}

/// Message types sent from server to client, same envelope shape as
/// [`ClientMessage`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection acknowledgement carrying the assigned player id
    #[serde(rename_all = "camelCase")]
    Connected { player_id: PlayerId, server_time: u64 },
    /// Reply to `Ping`
    #[serde(rename_all = "camelCase")]
    Pong { server_time: u64 },
    /// A matchmaking pass placed this client into a match
    #[serde(rename_all = "camelCase")]
    MatchFound {
        match_id: MatchId,
        game_mode: String,
        players: Vec<PlayerId>,
    },
    /// Chat line broadcast to a channel
    #[serde(rename_all = "camelCase")]
    ChatMessage {
        player_id: PlayerId,
        username: String,
        channel: String,
        message: String,
        timestamp: u64,
    },
}
