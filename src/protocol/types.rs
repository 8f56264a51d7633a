use rand::RngExt;
use serde::{Deserialize, Serialize};

/// Game mode key used when a matchmaking request does not name one.
pub const DEFAULT_GAME_MODE: &str = "default";
/// Player-count bounds applied to matchmaking requests that omit them.
pub const DEFAULT_MIN_PLAYERS: usize = 2;
pub const DEFAULT_MAX_PLAYERS: usize = 4;
/// Length of a generated match id, in hex characters.
pub const MATCH_ID_LENGTH: usize = 16;

/// Unique identifier for players, assigned by the transport on connect.
pub type PlayerId = u64;

/// Opaque match identifier: an unguessable token of
/// [`MATCH_ID_LENGTH`] lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    /// Generate a fresh random id. Uniqueness against existing matches
    /// is the caller's responsibility.
    pub fn generate() -> Self {
        const HEX_CHARS: &[u8] = b"0123456789abcdef";
        let mut rng = rand::rng();
        let token: String = (0..MATCH_ID_LENGTH)
            .map(|_| {
                let idx = rng.random_range(0..HEX_CHARS.len());
                // SAFETY: `idx` is produced by `random_range(0..len)`, so it is
                // always within [0, len).
                #[allow(clippy::indexing_slicing)]
                let ch = HEX_CHARS[idx] as char;
                ch
            })
            .collect();
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for MatchId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for MatchId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
