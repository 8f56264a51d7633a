//! Configuration module for the session server.
//!
//! This module provides configuration management with support for:
//! - JSON configuration files
//! - Environment variable overrides
//! - Sensible defaults
//!
//! # Module Structure
//!
//! - [`crate::config::types`]: Root `Config` struct
//! - [`server`]: Behavior sections (connections, scheduler, matchmaking, chat)
//! - [`logging`]: Logging configuration
//! - [`crate::config::loader`]: Configuration loading functions
//! - [`crate::config::validation`]: Configuration validation functions
//! - [`crate::config::defaults`]: Default value functions

// Submodules
pub mod defaults;
pub mod loader;
pub mod logging;
pub mod server;
pub mod types;
pub mod validation;

// Re-exports for convenience
pub use loader::{load, CONFIG_PATH_ENV, ENV_OVERRIDE_PREFIX};

pub use logging::{LogFormat, LogLevel, LoggingConfig};

pub use server::{ChatConfig, MatchmakingConfig, SchedulerConfig, ServerConfig};

pub use types::Config;

pub use validation::validate;
