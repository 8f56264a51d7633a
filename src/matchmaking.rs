use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;
use tracing::{debug, info, warn};

use crate::metrics::ServerMetrics;
use crate::protocol::{MatchId, PlayerId, ServerMessage};
use crate::registry::PlayerRegistry;
use crate::simulation::ServerClock;
use crate::transport::Transport;

/// A player's declared intent to join a match under a game mode and
/// player-count bounds. A player may hold several queued requests at
/// once; the engine never deduplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedRequest {
    pub player_id: PlayerId,
    pub game_mode: String,
    pub min_players: usize,
    pub max_players: usize,
    pub enqueued_at_ms: u64,
}

/// A finalized group of players assigned to play together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub id: MatchId,
    /// Members in the order their requests were collected.
    pub players: SmallVec<[PlayerId; 4]>,
    pub game_mode: String,
    pub created_at_ms: u64,
    pub active: bool,
}

#[derive(Debug, Default)]
struct MatchTable {
    matches: HashMap<MatchId, Match>,
    player_to_match: HashMap<PlayerId, MatchId>,
}

/// Matchmaking queue and match lifecycle.
///
/// Two independent locks guard the engine: one over the request FIFO,
/// one over the match table and its player index. Every call path
/// acquires and releases the queue lock before touching the match lock,
/// never holds both at once, and never awaits while holding either.
/// Outbound notifications are sent after all lock work is done.
pub struct MatchmakingEngine {
    queue: Mutex<VecDeque<QueuedRequest>>,
    table: Mutex<MatchTable>,
    registry: Arc<PlayerRegistry>,
    transport: Arc<dyn Transport>,
    clock: Arc<ServerClock>,
    metrics: Arc<ServerMetrics>,
}

impl MatchmakingEngine {
    pub fn new(
        registry: Arc<PlayerRegistry>,
        transport: Arc<dyn Transport>,
        clock: Arc<ServerClock>,
        metrics: Arc<ServerMetrics>,
    ) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            table: Mutex::new(MatchTable::default()),
            registry,
            transport,
            clock,
            metrics,
        }
    }

    /// Append a request to the tail of the shared FIFO. All game modes
    /// share one queue; partitioning happens during [`process`](Self::process).
    pub fn enqueue(
        &self,
        player_id: PlayerId,
        game_mode: impl Into<String>,
        min_players: usize,
        max_players: usize,
    ) {
        let game_mode = game_mode.into();
        let request = QueuedRequest {
            player_id,
            game_mode: game_mode.clone(),
            min_players,
            max_players,
            enqueued_at_ms: self.clock.now_ms(),
        };

        let queue_len = {
            let mut queue = self.queue.lock();
            queue.push_back(request);
            queue.len()
        };

        self.metrics.increment_requests_enqueued();
        info!(
            %player_id,
            %game_mode,
            min_players,
            max_players,
            queue_len,
            "matchmaking request queued"
        );
    }

    /// Withdraw a player entirely: every queued request, then any match
    /// membership. The two phases each take one lock and never overlap,
    /// so a concurrent pass may observe the player out of the queue but
    /// still in a match for the duration of this call. Unknown ids are
    /// a no-op.
    pub fn cancel(&self, player_id: PlayerId) {
        // Phase 1: rebuild the FIFO without this player's requests.
        let removed = {
            let mut queue = self.queue.lock();
            let before = queue.len();
            queue.retain(|request| request.player_id != player_id);
            before - queue.len()
        };
        if removed > 0 {
            self.metrics.add_requests_cancelled(removed as u64);
            debug!(%player_id, removed, "queued requests withdrawn");
        }

        // Phase 2: drop the player from its match, dissolving the match
        // when the member list empties.
        let mut left_match = false;
        let mut dissolved: Option<MatchId> = None;
        {
            let mut table = self.table.lock();
            if let Some(match_id) = table.player_to_match.remove(&player_id) {
                left_match = true;
                if let Some(record) = table.matches.get_mut(&match_id) {
                    record.players.retain(|member| *member != player_id);
                    if record.players.is_empty() {
                        table.matches.remove(&match_id);
                        dissolved = Some(match_id);
                    } else {
                        debug!(%player_id, %match_id, "player left match");
                    }
                }
            }
        }

        if let Some(match_id) = dissolved {
            self.metrics.increment_matches_ended();
            info!(%match_id, "match dissolved, last member left");
        }
        if left_match {
            self.registry.set_match_state(player_id, false, None);
        }
    }

    /// One matchmaking pass: snapshot the queue, drop entries whose
    /// player is no longer registered, partition by game mode, and
    /// greedily form matches oldest-first.
    ///
    /// The oldest request of each partition dictates the bounds of the
    /// group it heads: up to `max_players` requests are collected from
    /// the front, and the group is finalized only when it reaches
    /// `min_players`. Anything short of that stops the partition until
    /// the next pass. Stale entries stay in the authoritative queue;
    /// only `cancel` purges them.
    pub async fn process(&self) {
        let snapshot: Vec<QueuedRequest> = {
            let queue = self.queue.lock();
            if queue.len() < 2 {
                return;
            }
            queue.iter().cloned().collect()
        };

        let eligible: Vec<QueuedRequest> = snapshot
            .into_iter()
            .filter(|request| self.registry.exists(request.player_id))
            .collect();

        let mut partitions: HashMap<String, Vec<QueuedRequest>> = HashMap::new();
        for request in eligible {
            partitions
                .entry(request.game_mode.clone())
                .or_default()
                .push(request);
        }

        let mut formed: Vec<(Vec<PlayerId>, String)> = Vec::new();
        for (game_mode, mut partition) in partitions {
            loop {
                let Some(oldest) = partition.first() else { break };
                let group_size = oldest.max_players.min(partition.len());
                if group_size == 0 || group_size < oldest.min_players {
                    // Not enough queued players for the oldest request's
                    // bounds; the whole partition waits for the next pass.
                    break;
                }

                let group: Vec<PlayerId> = partition
                    .iter()
                    .take(group_size)
                    .map(|request| request.player_id)
                    .collect();
                let members: HashSet<PlayerId> = group.iter().copied().collect();
                partition.retain(|request| !members.contains(&request.player_id));
                formed.push((group, game_mode.clone()));
            }
        }

        if formed.is_empty() {
            return;
        }

        // Purge every matched player's requests in one critical section,
        // then create the matches with the queue lock released.
        let matched: HashSet<PlayerId> = formed
            .iter()
            .flat_map(|(group, _)| group.iter().copied())
            .collect();
        {
            let mut queue = self.queue.lock();
            queue.retain(|request| !matched.contains(&request.player_id));
        }

        for (players, game_mode) in formed {
            self.create_match(players, &game_mode).await;
        }
    }

    /// Build the match record, index its members, then notify them and
    /// wire up the broadcast group. The id is regenerated while it
    /// collides with an existing table key, so a live match is never
    /// overwritten.
    async fn create_match(&self, players: Vec<PlayerId>, game_mode: &str) {
        let created_at_ms = self.clock.now_ms();
        let match_id = {
            let mut table = self.table.lock();
            let mut id = MatchId::generate();
            while table.matches.contains_key(&id) {
                self.metrics.increment_match_id_retries();
                id = MatchId::generate();
            }

            for member in &players {
                table.player_to_match.insert(*member, id.clone());
            }
            table.matches.insert(
                id.clone(),
                Match {
                    id: id.clone(),
                    players: SmallVec::from_vec(players.clone()),
                    game_mode: game_mode.to_string(),
                    created_at_ms,
                    active: true,
                },
            );
            id
        };

        self.metrics.increment_matches_created();
        info!(%match_id, game_mode, players = ?players, "match created");

        for member in &players {
            self.registry
                .set_match_state(*member, true, Some(match_id.clone()));
        }

        let notification = Arc::new(ServerMessage::MatchFound {
            match_id: match_id.clone(),
            game_mode: game_mode.to_string(),
            players: players.clone(),
        });

        // Group assignment completes for every member before the first
        // notification goes out, so a member that reacts to match-found
        // by chatting on the match channel already reaches the others.
        // Sends happen with no engine lock held.
        for member in &players {
            if let Err(err) = self
                .transport
                .assign_to_group(*member, match_id.as_str())
                .await
            {
                warn!(player_id = %member, %err, "failed to assign broadcast group");
            }
        }
        for member in &players {
            if let Err(err) = self
                .transport
                .send(*member, Arc::clone(&notification))
                .await
            {
                warn!(player_id = %member, %err, "failed to deliver match notification");
            }
        }
    }

    pub fn find(&self, match_id: &MatchId) -> Option<Match> {
        self.table.lock().matches.get(match_id).cloned()
    }

    pub fn find_by_player(&self, player_id: PlayerId) -> Option<Match> {
        let table = self.table.lock();
        let match_id = table.player_to_match.get(&player_id)?;
        table.matches.get(match_id).cloned()
    }

    /// Terminate a match: clear every member's index entry and registry
    /// flag, delete the record. Unknown ids are a no-op. Members are not
    /// notified.
    pub fn end(&self, match_id: &MatchId) {
        let members = {
            let mut table = self.table.lock();
            let Some(record) = table.matches.remove(match_id) else {
                return;
            };
            for member in &record.players {
                table.player_to_match.remove(member);
            }
            record.players
        };

        for member in &members {
            self.registry.set_match_state(*member, false, None);
        }
        self.metrics.increment_matches_ended();
        info!(%match_id, "match ended");
    }

    pub fn queue_len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn match_count(&self) -> usize {
        self.table.lock().matches.len()
    }
}
