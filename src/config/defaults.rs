//! Default value functions for configuration fields.
//!
//! This module contains all the default value functions used by serde's `#[serde(default = ...)]`
//! attributes throughout the configuration system. Functions are organized by category for
//! easier maintenance.

use super::logging::LogFormat;

// =============================================================================
// Port & Root Config
// =============================================================================

pub const fn default_port() -> u16 {
    7777
}

// =============================================================================
// Server Defaults
// =============================================================================

pub const fn default_max_message_size() -> usize {
    65536 // 64KB
}

pub const fn default_outbound_queue_capacity() -> usize {
    256
}

pub fn default_cors_allowed_origins() -> String {
    "http://localhost:3000,http://localhost:5173".to_string()
}

// =============================================================================
// Scheduler Defaults
// =============================================================================

pub const fn default_tick_rate() -> u32 {
    120
}

// =============================================================================
// Matchmaking Defaults
// =============================================================================

pub const fn default_max_players_limit() -> usize {
    100
}

// =============================================================================
// Chat Defaults
// =============================================================================

pub const fn default_max_chat_message_length() -> usize {
    512
}

pub const fn default_chat_history_capacity() -> usize {
    1000
}

// =============================================================================
// Logging Defaults
// =============================================================================

pub fn default_log_dir() -> String {
    "logs".to_string()
}

pub fn default_log_filename() -> String {
    "server.log".to_string()
}

pub fn default_rotation() -> String {
    "daily".to_string()
}

pub const fn default_enable_file_logging() -> bool {
    true
}

pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
