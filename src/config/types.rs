//! Root configuration types.

use super::defaults::default_port;
use super::logging::LoggingConfig;
use super::server::{ChatConfig, MatchmakingConfig, SchedulerConfig, ServerConfig};
use serde::{Deserialize, Serialize};

/// Root configuration struct for the session server.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub matchmaking: MatchmakingConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            server: ServerConfig::default(),
            scheduler: SchedulerConfig::default(),
            matchmaking: MatchmakingConfig::default(),
            chat: ChatConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
