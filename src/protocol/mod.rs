// Protocol module: wire message types and identifiers

pub mod messages;
pub mod types;

pub use messages::{ClientMessage, ServerMessage};
pub use types::{
    MatchId, PlayerId, DEFAULT_GAME_MODE, DEFAULT_MAX_PLAYERS, DEFAULT_MIN_PLAYERS,
    MATCH_ID_LENGTH,
};
