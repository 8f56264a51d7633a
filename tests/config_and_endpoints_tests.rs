//! Configuration loading and HTTP endpoint integration tests.
//!
//! Covers:
//! - Config loading from a JSON file (`MATCHBAY_CONFIG_PATH` / explicit path)
//! - Environment variable overrides (`MATCHBAY__*`)
//! - Health endpoint (`/health`)
//! - Metrics endpoint (`/metrics`)


use matchbay_server::config::{self, Config, LogLevel, CONFIG_PATH_ENV};
use matchbay_server::websocket::create_router;
use serial_test::serial;
use std::io::Write;
use test_helpers::create_test_server;

// ===========================================================================
// Config loading tests
// ===========================================================================

/// Removes every `MATCHBAY`-prefixed variable so one test's overrides
/// cannot leak into another.
fn clear_matchbay_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("MATCHBAY") {
            std::env::remove_var(key);
        }
    }
}

/// Sets variables on construction and removes them on drop, panics
/// included.
struct EnvVarGuard {
    keys: Vec<&'static str>,
}

impl EnvVarGuard {
    fn set(pairs: &[(&'static str, &str)]) -> Self {
        for (key, value) in pairs {
            std::env::set_var(key, value);
        }
        Self {
            keys: pairs.iter().map(|(key, _)| *key).collect(),
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        for key in &self.keys {
            std::env::remove_var(key);
        }
    }
}

fn write_config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn test_config_default_values() {
    let config = Config::default();

    assert_eq!(config.port, 7777);
    assert_eq!(config.server.max_message_size, 65536);
    assert_eq!(config.server.outbound_queue_capacity, 256);
    assert_eq!(config.scheduler.tick_rate, 120);
    assert_eq!(config.matchmaking.max_players_limit, 100);
    assert_eq!(config.chat.max_message_length, 512);
    assert_eq!(config.chat.history_capacity, 1000);
    assert_eq!(config.logging.dir, "logs");
}

#[test]
fn test_config_roundtrip_serialization() {
    let config = Config::default();
    let json = serde_json::to_string_pretty(&config).expect("serialization should succeed");
    let deserialized: Config = serde_json::from_str(&json).expect("deserialization should succeed");

    assert_eq!(config.port, deserialized.port);
    assert_eq!(config.scheduler.tick_rate, deserialized.scheduler.tick_rate);
    assert_eq!(
        config.server.max_message_size,
        deserialized.server.max_message_size
    );
    assert_eq!(
        config.chat.history_capacity,
        deserialized.chat.history_capacity
    );
}

#[test]
fn test_config_from_json_string() {
    let json = r#"{
        "port": 9999,
        "scheduler": {
            "tick_rate": 60
        },
        "matchmaking": {
            "max_players_limit": 16
        }
    }"#;

    let config: Config = serde_json::from_str(json).expect("parse should succeed");

    assert_eq!(config.port, 9999);
    assert_eq!(config.scheduler.tick_rate, 60);
    assert_eq!(config.matchmaking.max_players_limit, 16);
    // Non-specified fields should remain at defaults
    assert_eq!(config.server.max_message_size, 65536);
}

#[test]
fn test_config_partial_json_uses_defaults_for_missing_fields() {
    let json = r#"{ "port": 4000 }"#;
    let config: Config = serde_json::from_str(json).expect("parse should succeed");

    assert_eq!(config.port, 4000);
    assert_eq!(config.scheduler.tick_rate, 120);
    assert_eq!(config.chat.max_message_length, 512);
    assert_eq!(config.logging.dir, "logs");
}

#[test]
#[serial]
fn test_load_without_file_or_env_returns_defaults() {
    clear_matchbay_env();

    let config = config::load(None).expect("load should succeed");

    assert_eq!(config.port, 7777);
    assert_eq!(config.scheduler.tick_rate, 120);
}

#[test]
#[serial]
fn test_load_reads_explicit_config_file() {
    clear_matchbay_env();
    let file = write_config_file(
        r#"{
            "port": 4100,
            "scheduler": { "tick_rate": 60 },
            "chat": { "max_message_length": 128 }
        }"#,
    );

    let config = config::load(Some(file.path())).expect("load should succeed");

    assert_eq!(config.port, 4100);
    assert_eq!(config.scheduler.tick_rate, 60);
    assert_eq!(config.chat.max_message_length, 128);
    // Untouched sections keep their defaults
    assert_eq!(config.chat.history_capacity, 1000);
    assert_eq!(config.matchmaking.max_players_limit, 100);
}

#[test]
#[serial]
fn test_load_resolves_file_from_env_path() {
    clear_matchbay_env();
    let file = write_config_file(r#"{ "port": 4200 }"#);
    let path = file.path().to_str().expect("utf-8 path").to_string();
    let _guard = EnvVarGuard::set(&[(CONFIG_PATH_ENV, &path)]);

    let config = config::load(None).expect("load should succeed");

    assert_eq!(config.port, 4200);
}

#[test]
#[serial]
fn test_env_overrides_beat_config_file() {
    clear_matchbay_env();
    let file = write_config_file(r#"{ "port": 4100, "scheduler": { "tick_rate": 60 } }"#);
    let _guard = EnvVarGuard::set(&[
        ("MATCHBAY__PORT", "5100"),
        ("MATCHBAY__SCHEDULER__TICK_RATE", "90"),
        ("MATCHBAY__LOGGING__LEVEL", "debug"),
    ]);

    let config = config::load(Some(file.path())).expect("load should succeed");

    assert_eq!(config.port, 5100);
    assert_eq!(config.scheduler.tick_rate, 90);
    assert_eq!(config.logging.level, Some(LogLevel::Debug));
}

#[test]
#[serial]
fn test_load_rejects_missing_explicit_file() {
    clear_matchbay_env();

    let result = config::load(Some(std::path::Path::new(
        "/nonexistent/matchbay/config.json",
    )));

    assert!(result.is_err(), "a named but absent file is an error");
}

#[test]
#[serial]
fn test_load_rejects_malformed_config_file() {
    clear_matchbay_env();
    let file = write_config_file("{ this is not json");

    let result = config::load(Some(file.path()));

    assert!(result.is_err());
}

#[test]
fn test_validate_flags_zero_tick_rate() {
    let config: Config =
        serde_json::from_str(r#"{ "scheduler": { "tick_rate": 0 } }"#).expect("parse");

    let error = config::validate(&config).expect_err("zero tick rate must fail");
    assert!(error.to_string().contains("scheduler.tick_rate"));
}

// ===========================================================================
// Health endpoint tests
// ===========================================================================

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let server = create_test_server();
    let app = create_router("*").with_state(server);

    let test_server = axum_test::TestServer::new(app).expect("test server should start");
    let response = test_server.get("/health").await;

    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["activeConnections"], 0);
    assert!(json["instanceId"].is_string());
}

// ===========================================================================
// Metrics endpoint tests
// ===========================================================================

#[tokio::test]
async fn test_metrics_endpoint_reports_gauges_and_counters() {
    let server = create_test_server();
    server.registry().add(1);
    server.engine().enqueue(1, "duel", 2, 2);

    let app = create_router("*").with_state(server);
    let test_server = axum_test::TestServer::new(app).expect("test server should start");

    let response = test_server.get("/metrics").await;
    response.assert_status_ok();

    let json: serde_json::Value = response.json();
    assert!(json["instanceId"].is_string());
    assert_eq!(json["gauges"]["connectedClients"], 0);
    assert_eq!(json["gauges"]["registeredPlayers"], 1);
    assert_eq!(json["gauges"]["queuedRequests"], 1);
    assert_eq!(json["gauges"]["activeMatches"], 0);
    assert_eq!(json["counters"]["matchmaking"]["requests_enqueued"], 1);
    assert_eq!(json["counters"]["messages"]["received"], 0);
}

// ===========================================================================
// Router structure tests
// ===========================================================================

#[tokio::test]
async fn test_websocket_route_exists() {
    let server = create_test_server();
    let app = create_router("*").with_state(server);

    let test_server = axum_test::TestServer::new(app).expect("test server should start");

    // GET /ws without an upgrade handshake is rejected, but NOT with 404
    let response = test_server.get("/ws").await;
    assert_ne!(
        response.status_code(),
        axum::http::StatusCode::NOT_FOUND,
        "/ws route should exist"
    );
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let server = create_test_server();
    let app = create_router("*").with_state(server);

    let test_server = axum_test::TestServer::new(app).expect("test server should start");
    let response = test_server.get("/nonexistent").await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

// ===========================================================================
// CORS configuration tests
// ===========================================================================

#[tokio::test]
async fn test_permissive_cors_with_wildcard() {
    let server = create_test_server();
    let app = create_router("*").with_state(server);

    let test_server = axum_test::TestServer::new(app).expect("test server should start");
    let response = test_server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_specific_cors_origins() {
    let server = create_test_server();
    let app = create_router("http://localhost:3000,http://example.com").with_state(server);

    let test_server = axum_test::TestServer::new(app).expect("test server should start");
    let response = test_server.get("/health").await;
    response.assert_status_ok();
}
