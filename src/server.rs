use crate::chat::ChatService;
use crate::config::Config;
use crate::dispatch::ConnectionDispatcher;
use crate::matchmaking::MatchmakingEngine;
use crate::metrics::ServerMetrics;
use crate::registry::PlayerRegistry;
use crate::scheduler::{SchedulerHandle, SimulationScheduler};
use crate::simulation::{GameSimulation, ServerClock, Simulation};
use crate::transport::{Transport, WsTransport};
use std::sync::Arc;
use uuid::Uuid;

/// Top-level assembly of the session server. Owns every subsystem and
/// wires them together; request handling flows through the dispatcher.
pub struct GameServer {
    /// Server configuration
    config: Config,
    /// Instance identifier
    instance_id: Uuid,
    /// Milliseconds-since-startup clock shared by all subsystems
    clock: Arc<ServerClock>,
    /// Server metrics
    metrics: Arc<ServerMetrics>,
    /// Connected player records
    registry: Arc<PlayerRegistry>,
    /// Outbound message delivery and broadcast groups
    transport: Arc<WsTransport>,
    /// Matchmaking queue and active match bookkeeping
    engine: Arc<MatchmakingEngine>,
    /// Channel chat with bounded history
    chat: Arc<ChatService>,
    /// Fixed-tick game state
    simulation: Arc<GameSimulation>,
    /// Network event fan-out to the subsystems above
    dispatcher: ConnectionDispatcher,
}

impl GameServer {
    pub fn new(config: Config) -> Arc<Self> {
        let instance_id = Uuid::new_v4();
        let clock = Arc::new(ServerClock::new());
        let metrics = Arc::new(ServerMetrics::new());
        let registry = Arc::new(PlayerRegistry::new());
        let transport = Arc::new(WsTransport::new(Arc::clone(&metrics)));

        let engine = Arc::new(MatchmakingEngine::new(
            Arc::clone(&registry),
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::clone(&clock),
            Arc::clone(&metrics),
        ));
        let chat = Arc::new(ChatService::new(
            Arc::clone(&registry),
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::clone(&clock),
            Arc::clone(&metrics),
            config.chat.max_message_length,
            config.chat.history_capacity,
        ));
        let simulation = Arc::new(GameSimulation::new(Arc::clone(&clock)));
        let dispatcher = ConnectionDispatcher::new(
            Arc::clone(&registry),
            Arc::clone(&engine),
            Arc::clone(&chat),
            Arc::clone(&simulation) as Arc<dyn Simulation>,
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::clone(&metrics),
            config.matchmaking.max_players_limit,
        );

        tracing::info!(%instance_id, "Game server assembled");

        Arc::new(Self {
            config,
            instance_id,
            clock,
            metrics,
            registry,
            transport,
            engine,
            chat,
            simulation,
            dispatcher,
        })
    }

    /// Spawn the fixed-tick loop that advances the simulation and runs
    /// a matchmaking pass each iteration. The handle stops it again.
    pub fn start_scheduler(&self) -> SchedulerHandle {
        let scheduler = SimulationScheduler::new(
            Arc::clone(&self.simulation) as Arc<dyn Simulation>,
            Arc::clone(&self.engine),
            self.config.scheduler.tick_rate,
        );
        scheduler.start()
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Get server configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn clock(&self) -> &ServerClock {
        &self.clock
    }

    /// Get server metrics
    pub fn metrics(&self) -> &ServerMetrics {
        &self.metrics
    }

    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    pub fn transport(&self) -> &WsTransport {
        &self.transport
    }

    pub fn engine(&self) -> &MatchmakingEngine {
        &self.engine
    }

    pub fn chat(&self) -> &ChatService {
        &self.chat
    }

    pub fn simulation(&self) -> &GameSimulation {
        &self.simulation
    }

    pub fn dispatcher(&self) -> &ConnectionDispatcher {
        &self.dispatcher
    }
}
