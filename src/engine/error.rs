//! Validation failures raised at the boundary of every engine operation.

use thiserror::Error;

use crate::engine::models::PlayerId;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{game} needs {min}-{max} players, got {actual}")]
    PlayerCount {
        game: String,
        min: u32,
        max: u32,
        actual: usize,
    },

    #[error("player id {0} appears more than once")]
    DuplicatePlayer(PlayerId),

    #[error("every player needs a name")]
    EmptyName,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown player: {0}")]
    UnknownPlayer(PlayerId),

    #[error("all players must have a {field} value (missing for {player_id})")]
    MissingEntry {
        player_id: PlayerId,
        field: &'static str,
    },

    #[error("{field} for {player_id} must be between 0 and {max}, got {value}")]
    OutOfRange {
        player_id: PlayerId,
        field: &'static str,
        value: u32,
        max: u32,
    },

    #[error("round points must add up to {expected}, got {actual}")]
    RoundTotalMismatch { expected: u32, actual: u32 },

    #[error("the game is over")]
    GameOver,

    #[error("{operation} is only allowed during the {expected} phase (currently {actual})")]
    WrongPhase {
        operation: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("round {0} has not been played")]
    RoundNotFound(u32),

    #[error("round {0} is already being edited")]
    EditInProgress(u32),

    #[error("no round is being edited")]
    NoEditOpen,

    #[error("{player_id} cannot be chosen: {reason}")]
    InvalidTarget {
        player_id: PlayerId,
        reason: &'static str,
    },

    #[error("role counts must equal player count ({expected}), got {actual}")]
    RoleCountMismatch { expected: usize, actual: usize },

    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("inconsistent snapshot: {0}")]
    InconsistentSnapshot(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
