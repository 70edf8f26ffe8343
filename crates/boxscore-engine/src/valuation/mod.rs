// Valuation engine: pool stats, z-scores, replacement baselines, ratings.

pub mod rating;
pub mod replacement;
pub mod scarcity;
pub mod zscore;

pub use rating::{value_players, PlayerRating, Valuation};
pub use replacement::{Confidence, ReplacementBaseline, ReplacementBaselines};
pub use scarcity::{compute_scarcity, ScarcityEntry, ScarcityUrgency};
pub use zscore::CategoryScore;
