use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;

use crate::protocol::{MatchId, PlayerId};

/// A connected player's directory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    pub in_match: bool,
    pub current_match: Option<MatchId>,
    /// Timestamp of the last ping, in server-time milliseconds.
    pub last_ping_ms: u64,
    /// Most recent measured round-trip latency, in milliseconds.
    pub latency_ms: u64,
}

impl Player {
    fn fresh(id: PlayerId) -> Self {
        Self {
            id,
            username: format!("Player{id}"),
            in_match: false,
            current_match: None,
            last_ping_ms: 0,
            latency_ms: 0,
        }
    }
}

/// Thread-safe directory of connected players and their match-membership
/// state.
///
/// One exclusive lock guards the whole directory. Every operation is O(1)
/// (except the [`all_ids`](Self::all_ids) snapshot), linearizable, and
/// performs no I/O while holding the lock. Mutating operations on absent
/// ids are no-ops; none of them creates a record as a side effect.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: Mutex<HashMap<PlayerId, Player>>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fresh record for `id`, overwriting any existing one.
    /// Re-adding resets the record to its initial state.
    pub fn add(&self, id: PlayerId) {
        self.players.lock().insert(id, Player::fresh(id));
        debug!(%id, "player registered");
    }

    /// Delete `id` if present.
    pub fn remove(&self, id: PlayerId) {
        if self.players.lock().remove(&id).is_some() {
            debug!(%id, "player removed");
        }
    }

    pub fn exists(&self, id: PlayerId) -> bool {
        self.players.lock().contains_key(&id)
    }

    pub fn get(&self, id: PlayerId) -> Option<Player> {
        self.players.lock().get(&id).cloned()
    }

    pub fn set_username(&self, id: PlayerId, username: impl Into<String>) {
        if let Some(player) = self.players.lock().get_mut(&id) {
            player.username = username.into();
        }
    }

    pub fn set_match_state(&self, id: PlayerId, in_match: bool, match_id: Option<MatchId>) {
        if let Some(player) = self.players.lock().get_mut(&id) {
            player.in_match = in_match;
            player.current_match = match_id;
        }
    }

    pub fn set_latency(&self, id: PlayerId, latency_ms: u64) {
        if let Some(player) = self.players.lock().get_mut(&id) {
            player.latency_ms = latency_ms;
        }
    }

    pub fn set_last_ping(&self, id: PlayerId, timestamp_ms: u64) {
        if let Some(player) = self.players.lock().get_mut(&id) {
            player.last_ping_ms = timestamp_ms;
        }
    }

    pub fn count(&self) -> usize {
        self.players.lock().len()
    }

    /// Point-in-time snapshot of every registered id. Always a copy,
    /// never a live view.
    pub fn all_ids(&self) -> Vec<PlayerId> {
        self.players.lock().keys().copied().collect()
    }
}
