// Fantasy baseball analytics engine: stat normalization, category valuation,
// team totals, matchup projection and start optimization.
//
// Pure and synchronous. All configuration is passed explicitly; no I/O.

pub mod config;
pub mod engine;
pub mod error;
pub mod matchup;
pub mod position;
pub mod snapshot;
pub mod stats;
pub mod streaming;
pub mod team;
pub mod valuation;

pub use config::EngineConfig;
pub use engine::{run, EngineReport, RunContext};
pub use error::EngineError;
pub use snapshot::LeagueSnapshot;
