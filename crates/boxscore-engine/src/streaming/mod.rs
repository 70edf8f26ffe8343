// Start/streaming: candidate construction, the constrained optimizer and
// hitter streaming.

pub mod candidates;
pub mod hitters;
pub mod optimizer;

pub use candidates::{build_start_candidates, StartCandidate};
pub use hitters::{find_hitter_streams, HitterOpportunity, HitterStreamDay};
pub use optimizer::{optimize_starts, OptimizerResult, Rejection, RejectionReason};
