use crate::server::GameServer;
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use std::sync::Arc;

use super::handler::websocket_handler;

/// Create the Axum router with WebSocket support
pub fn create_router(cors_origins: &str) -> axum::Router<Arc<GameServer>> {
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    // Parse CORS origins
    let cors = if cors_origins == "*" {
        CorsLayer::permissive()
    } else {
        let origins: Vec<_> = cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
            .collect();

        if origins.is_empty() {
            tracing::warn!("No valid CORS origins configured, using permissive CORS");
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    axum::Router::new()
        .route("/ws", get(websocket_handler))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Health check endpoint
async fn health_check(State(server): State<Arc<GameServer>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "instanceId": server.instance_id(),
        "uptimeMs": server.clock().now_ms(),
        "activeConnections": server.transport().client_count(),
    }))
}

/// Metrics endpoint: monotonic counters plus point-in-time gauges
async fn metrics_handler(State(server): State<Arc<GameServer>>) -> Json<serde_json::Value> {
    let snapshot = server.metrics().snapshot();

    Json(serde_json::json!({
        "instanceId": server.instance_id(),
        "uptimeMs": server.clock().now_ms(),
        "gauges": {
            "connectedClients": server.transport().client_count(),
            "registeredPlayers": server.registry().count(),
            "queuedRequests": server.engine().queue_len(),
            "activeMatches": server.engine().match_count(),
            "simulationTicks": server.simulation().tick_count(),
        },
        "counters": snapshot,
    }))
}
