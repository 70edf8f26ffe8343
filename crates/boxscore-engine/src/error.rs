// Error kinds surfaced by the engine.
//
// Validation, roster-constraint and infeasible-constraint errors are returned
// to the caller immediately. Insufficient data is never raised: it travels as
// a low-confidence annotation on the affected baseline.

use serde::Serialize;
use thiserror::Error;

use crate::position::Position;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Malformed or missing required input. Never silently coerced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("record {index} is missing required field `{field}`")]
    MissingField { index: usize, field: String },

    #[error("player {player_id}: field `{field}` is not numeric ({value})")]
    NotNumeric {
        player_id: String,
        field: String,
        value: String,
    },

    #[error("player {player_id}: `{field}` must be non-negative, got {value}")]
    NegativeValue {
        player_id: String,
        field: String,
        value: f64,
    },

    #[error("player {player_id}: unrecognized position tag `{tag}`")]
    UnknownPosition { player_id: String, tag: String },

    #[error("player {player_id}: invalid time window `{value}`")]
    InvalidWindow { player_id: String, value: String },

    #[error("player {player_id}: window {found} differs from the pool's window {expected}")]
    MixedWindows {
        player_id: String,
        expected: String,
        found: String,
    },

    #[error("duplicate player id {player_id}")]
    DuplicatePlayer { player_id: String },

    #[error("team {team_id}: player {player_id} has no rating in this valuation")]
    UnknownPlayer { team_id: String, player_id: String },

    #[error("unknown team {team_id}")]
    UnknownTeam { team_id: String },

    #[error("start candidate {player_id} on {date}: {message}")]
    InvalidCandidate {
        player_id: String,
        date: String,
        message: String,
    },

    #[error("team {team_id}: banked total for `{category}` {message}")]
    BankedTotal {
        team_id: String,
        category: String,
        message: String,
    },

    #[error("invalid configuration `{field}`: {message}")]
    Config { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Roster constraints
// ---------------------------------------------------------------------------

/// The active lineup cannot be assigned to the declared slots.
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "team {team_id}: {} active player(s) cannot be placed in a lineup slot: {}",
    unplaced.len(),
    unplaced.join(", ")
)]
pub struct RosterConstraintError {
    pub team_id: String,
    /// Player ids left without a slot by a maximum assignment.
    pub unplaced: Vec<String>,
}

// ---------------------------------------------------------------------------
// Insufficient data (annotation, not raised)
// ---------------------------------------------------------------------------

/// A position pool had too few eligible players for a meaningful baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("{category} at {position}: {eligible} eligible player(s), {required} needed")]
pub struct InsufficientDataError {
    pub position: Position,
    pub category: String,
    pub eligible: usize,
    pub required: usize,
}

// ---------------------------------------------------------------------------
// Optimizer constraints
// ---------------------------------------------------------------------------

/// The optimizer's hard constraints are malformed and cannot be satisfied
/// even by an empty selection.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("constraint `{constraint}` is infeasible: {message}")]
pub struct ConstraintInfeasibleError {
    pub constraint: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Umbrella
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    RosterConstraint(#[from] RosterConstraintError),

    #[error(transparent)]
    ConstraintInfeasible(#[from] ConstraintInfeasibleError),
}
