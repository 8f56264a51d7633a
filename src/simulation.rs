use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::protocol::PlayerId;

/// Monotonic server time: milliseconds elapsed since startup.
#[derive(Debug, Clone)]
pub struct ServerClock {
    started_at: Instant,
}

impl ServerClock {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        u64::try_from(self.started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for ServerClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Game-state collaborator driven by the scheduler. The server core only
/// needs these four operations; richer rule sets implement the same
/// trait.
#[async_trait::async_trait]
pub trait Simulation: Send + Sync {
    /// Advance game state by one fixed step.
    async fn tick(&self);

    /// Current simulation time in milliseconds.
    fn current_time(&self) -> u64;

    /// Discard a disconnected player's state.
    async fn remove_player(&self, player_id: PlayerId);

    /// Apply an opaque gameplay action.
    async fn handle_action(&self, player_id: PlayerId, payload: serde_json::Value);
}

#[derive(Debug, Default)]
struct SimulationState {
    tick_count: u64,
    last_actions: HashMap<PlayerId, serde_json::Value>,
}

/// In-memory simulation: counts ticks and keeps each player's most
/// recent action so gameplay systems can poll it.
pub struct GameSimulation {
    clock: Arc<ServerClock>,
    state: Mutex<SimulationState>,
}

impl GameSimulation {
    pub fn new(clock: Arc<ServerClock>) -> Self {
        Self {
            clock,
            state: Mutex::new(SimulationState::default()),
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.state.lock().tick_count
    }

    pub fn last_action(&self, player_id: PlayerId) -> Option<serde_json::Value> {
        self.state.lock().last_actions.get(&player_id).cloned()
    }
}

#[async_trait::async_trait]
impl Simulation for GameSimulation {
    async fn tick(&self) {
        let mut state = self.state.lock();
        state.tick_count += 1;
        trace!(tick = state.tick_count, "simulation step");
    }

    fn current_time(&self) -> u64 {
        self.clock.now_ms()
    }

    async fn remove_player(&self, player_id: PlayerId) {
        if self.state.lock().last_actions.remove(&player_id).is_some() {
            debug!(%player_id, "simulation state discarded");
        }
    }

    async fn handle_action(&self, player_id: PlayerId, payload: serde_json::Value) {
        debug!(%player_id, "game action recorded");
        self.state.lock().last_actions.insert(player_id, payload);
    }
}
