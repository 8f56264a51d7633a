#![cfg_attr(not(test), deny(clippy::panic))]

use clap::Parser;
use matchbay_server::config;
use matchbay_server::logging;
use matchbay_server::server::GameServer;
use matchbay_server::websocket;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Matchbay -- real-time multiplayer session server with fixed-tick
/// matchmaking
#[derive(Parser, Debug)]
#[command(name = "matchbay-server")]
#[command(about = "A real-time multiplayer session server: fixed-tick simulation, matchmaking, chat")]
#[command(version)]
struct Cli {
    /// Path to a JSON configuration file. Falls back to the
    /// MATCHBAY_CONFIG_PATH environment variable, then built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines and pre-deployment checks.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration to stdout (as JSON) and exit.
    /// Useful for debugging configuration loading from multiple sources.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load(cli.config.as_deref())?;

    // Handle --print-config: output the loaded configuration as JSON
    if cli.print_config {
        let json = serde_json::to_string_pretty(&cfg)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    let validation_result = config::validate(&cfg);

    // Handle --validate-config: exit after validation
    if cli.validate_config {
        match validation_result {
            Ok(()) => {
                println!("Configuration validation passed");
                println!();
                println!("Configuration summary:");
                println!("  Port: {}", cfg.port);
                println!("  Tick rate: {} Hz", cfg.scheduler.tick_rate);
                println!("  Max message size: {} bytes", cfg.server.max_message_size);
                println!(
                    "  Outbound queue capacity: {}",
                    cfg.server.outbound_queue_capacity
                );
                println!("  Max players limit: {}", cfg.matchmaking.max_players_limit);
                println!("  Chat history capacity: {}", cfg.chat.history_capacity);
                return Ok(());
            }
            Err(e) => {
                eprintln!("Configuration validation failed:\n{e}");
                std::process::exit(1);
            }
        }
    }

    // In normal operation, propagate validation errors
    validation_result?;

    // Initialize logging from config.
    logging::init_with_config(&cfg.logging);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let cors_origins = cfg.server.cors_allowed_origins.clone();

    let server = GameServer::new(cfg);
    let scheduler = server.start_scheduler();

    let router = websocket::create_router(&cors_origins).with_state(Arc::clone(&server));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        %addr,
        instance_id = %server.instance_id(),
        cors_origins = %cors_origins,
        "Matchbay server started - WebSocket protocol: /ws, Metrics: /metrics"
    );

    tokio::select! {
        result = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        ) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    // The in-flight tick finishes before the handle resolves.
    scheduler.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}
