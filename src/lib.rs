#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::too_many_arguments,
    clippy::too_many_lines,
    clippy::similar_names
)]

//! # Matchbay Server
//!
//! A real-time multiplayer session server: fixed-tick simulation loop,
//! greedy FIFO matchmaking, and channel chat over WebSockets.
//!
//! All state is in-memory. Just run the binary and connect via WebSocket.

/// Channel chat with bounded per-channel history
pub mod chat;

/// Server configuration and environment variables
pub mod config;

/// Network event routing to the subsystems
pub mod dispatch;

/// Structured logging configuration
pub mod logging;

/// Matchmaking queue, pass algorithm, and match table
pub mod matchmaking;

/// Metrics collection and reporting
pub mod metrics;

/// WebSocket message protocol definitions
pub mod protocol;

/// Connected player records
pub mod registry;

/// Fixed-tick simulation loop
pub mod scheduler;

/// Main server orchestration
pub mod server;

/// Game state advanced by the scheduler
pub mod simulation;

/// Outbound message delivery and broadcast groups
pub mod transport;

/// WebSocket connection handling
pub mod websocket;
