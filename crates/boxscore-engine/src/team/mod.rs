// Fantasy teams: rosters, lineup validation, category totals and strength.

pub mod aggregate;
pub mod recommend;
pub mod roster;
pub mod strength;

pub use aggregate::{build_team_snapshot, CategoryTotal, CategoryTotals, RosterMember, TeamSnapshot};
pub use recommend::{recommend_free_agents, CategoryHelp, FreeAgentPick, TeamRecommendations};
pub use roster::{free_agents, RosterEntry, RosterStatus, TeamRoster};
pub use strength::{league_strength, StrengthTier, TeamStrength};
