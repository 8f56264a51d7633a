//! Server behavior configuration types.

use super::defaults::{
    default_chat_history_capacity, default_cors_allowed_origins, default_max_chat_message_length,
    default_max_message_size, default_max_players_limit, default_outbound_queue_capacity,
    default_tick_rate,
};
use serde::{Deserialize, Serialize};

/// Connection handling configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Maximum inbound text frame size (bytes); larger frames are dropped
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    /// Capacity of each client's outbound message queue; messages to a
    /// full queue are dropped rather than blocking the sender
    #[serde(default = "default_outbound_queue_capacity")]
    pub outbound_queue_capacity: usize,
    /// Comma-separated list of allowed CORS origins, or "*" for permissive
    #[serde(default = "default_cors_allowed_origins")]
    pub cors_allowed_origins: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_message_size: default_max_message_size(),
            outbound_queue_capacity: default_outbound_queue_capacity(),
            cors_allowed_origins: default_cors_allowed_origins(),
        }
    }
}

/// Fixed-tick loop configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SchedulerConfig {
    /// Target iterations per second for the simulation loop
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_rate: default_tick_rate(),
        }
    }
}

/// Matchmaking request limits.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MatchmakingConfig {
    /// Upper bound on the maxPlayers a request may declare; requests
    /// above it are rejected at dispatch
    #[serde(default = "default_max_players_limit")]
    pub max_players_limit: usize,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        Self {
            max_players_limit: default_max_players_limit(),
        }
    }
}

/// Chat behavior configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChatConfig {
    /// Maximum chat message length in characters
    #[serde(default = "default_max_chat_message_length")]
    pub max_message_length: usize,
    /// Retained messages per channel; oldest evicted beyond this
    #[serde(default = "default_chat_history_capacity")]
    pub history_capacity: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_length: default_max_chat_message_length(),
            history_capacity: default_chat_history_capacity(),
        }
    }
}
