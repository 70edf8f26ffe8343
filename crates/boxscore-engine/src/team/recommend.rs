// Free-agent help for a team's weak categories.

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

use crate::config::EngineConfig;
use crate::position::Position;
use crate::team::roster::{free_agents, TeamRoster};
use crate::team::strength::{StrengthTier, TeamStrength};
use crate::valuation::Valuation;

/// Free agents suggested per weak category.
pub const PICKS_PER_CATEGORY: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreeAgentPick {
    pub player_id: String,
    pub name: String,
    pub pro_team: Option<String>,
    pub positions: BTreeSet<Position>,
    /// The player's value in the category as scored.
    pub value: f64,
    /// Oriented: positive helps the category.
    pub zscore: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryHelp {
    pub category: String,
    pub tier: StrengthTier,
    pub picks: Vec<FreeAgentPick>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamRecommendations {
    pub team_id: String,
    /// Weak categories in configured order.
    pub categories: Vec<CategoryHelp>,
}

/// Rank free agents for each of `strength`'s weak categories.
///
/// Only players of the category's stat group with a score in it are
/// considered. Players are ranked by oriented z-score, so lower-is-better
/// categories favor the smallest values; ties go to the smaller player id.
/// Small-sample rates use their shrunk value.
pub fn recommend_free_agents(
    strength: &TeamStrength,
    valuation: &Valuation,
    rosters: &[TeamRoster],
    config: &EngineConfig,
) -> TeamRecommendations {
    let available = free_agents(valuation, rosters);
    let categories: Vec<CategoryHelp> = strength
        .weaknesses
        .iter()
        .filter_map(|name| {
            let cat = config.category(name)?;
            let tier = strength.categories.get(name)?.tier;
            let mut scored: Vec<(&str, f64, f64)> = available
                .iter()
                .filter(|r| r.line.group == cat.group)
                .filter_map(|r| {
                    r.categories
                        .get(name)
                        .map(|s| (r.player_id(), s.value, s.zscore))
                })
                .collect();
            scored.sort_by(|a, b| b.2.total_cmp(&a.2).then_with(|| a.0.cmp(b.0)));
            let picks = scored
                .into_iter()
                .take(PICKS_PER_CATEGORY)
                .filter_map(|(id, value, zscore)| {
                    let line = &valuation.rating(id)?.line;
                    Some(FreeAgentPick {
                        player_id: line.player_id.clone(),
                        name: line.name.clone(),
                        pro_team: line.pro_team.clone(),
                        positions: line.positions.clone(),
                        value,
                        zscore,
                    })
                })
                .collect();
            Some(CategoryHelp {
                category: name.clone(),
                tier,
                picks,
            })
        })
        .collect();

    debug!(
        team = %strength.team_id,
        weak_categories = categories.len(),
        "free-agent recommendations built"
    );
    TeamRecommendations {
        team_id: strength.team_id.clone(),
        categories,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
