// Matchups: category projection over a scoring period and schedule context.

pub mod positions;
pub mod projection;
pub mod schedule;

pub use positions::{compare_lineups, LineupComparison, PositionMatchup, SlotSide};
pub use projection::{
    compare_totals, project_matchup, project_remaining, projected_totals, Banked,
    CategoryProjection, CategoryWinner, MatchupProjection, MatchupResult,
};
pub use schedule::{
    rate_game, rate_matchup, GameVolume, MatchupQuality, MatchupTier, ProTeamRating,
    ProbableStart, RemainingSchedule, ScheduleContext, ScheduledGame, ScoringPeriod,
};
