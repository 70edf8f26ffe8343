// Hitter streaming: days where a professional lineup draws a soft matchup,
// with the free-agent hitters who would ride it.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::config::{EngineConfig, StatGroup};
use crate::matchup::{rate_game, MatchupTier, RemainingSchedule, ScheduleContext, ScoringPeriod};
use crate::team::{free_agents, TeamRoster};
use crate::valuation::Valuation;

/// Free-agent hitters listed per favorable game.
pub const HITTERS_PER_GAME: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HitterOpportunity {
    pub pro_team: String,
    pub opponent: String,
    pub park: String,
    pub home: bool,
    /// Offense rating of the game, 100 = neutral.
    pub rating: f64,
    pub tier: MatchupTier,
    /// Best unrostered hitters on `pro_team` by composite, best first.
    pub free_agents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HitterStreamDay {
    pub date: NaiveDate,
    /// Favorable games, best rating first.
    pub opportunities: Vec<HitterOpportunity>,
}

/// Favorable hitting games for every remaining day of `period`.
///
/// A game qualifies when its offense rating exceeds
/// `streaming.hitter_stream_rating`. Days without one are listed empty.
pub fn find_hitter_streams(
    valuation: &Valuation,
    rosters: &[TeamRoster],
    schedule: &RemainingSchedule<'_>,
    context: &ScheduleContext,
    period: &ScoringPeriod,
    config: &EngineConfig,
) -> Vec<HitterStreamDay> {
    let hitters: Vec<_> = free_agents(valuation, rosters)
        .into_iter()
        .filter(|r| r.line.group == StatGroup::Batting)
        .collect();
    let threshold = config.streaming.hitter_stream_rating;

    let first = schedule.as_of.map_or(period.start, |d| d.max(period.start));
    let mut days: Vec<HitterStreamDay> = first
        .iter_days()
        .take_while(|d| *d <= period.end)
        .map(|date| HitterStreamDay {
            date,
            opportunities: Vec::new(),
        })
        .collect();

    for game in schedule.remaining_games(period) {
        let quality = rate_game(game, context, config.streaming.league_k_rate);
        if quality.offense <= threshold {
            continue;
        }
        let Some(day) = days.iter_mut().find(|d| d.date == game.date) else {
            continue;
        };
        let picks = hitters
            .iter()
            .filter(|r| r.line.pro_team.as_deref() == Some(game.pro_team.as_str()))
            .take(HITTERS_PER_GAME)
            .map(|r| r.player_id().to_string())
            .collect();
        day.opportunities.push(HitterOpportunity {
            pro_team: game.pro_team.clone(),
            opponent: game.opponent.clone(),
            park: game.park_key().to_string(),
            home: game.home,
            rating: quality.offense,
            tier: quality.offense_tier,
            free_agents: picks,
        });
    }

    for day in &mut days {
        day.opportunities.sort_by(|a, b| {
            b.rating
                .total_cmp(&a.rating)
                .then_with(|| a.pro_team.cmp(&b.pro_team))
        });
    }
    debug!(
        period = %period.id,
        days = days.len(),
        opportunities = days.iter().map(|d| d.opportunities.len()).sum::<usize>(),
        "hitter streams found"
    );
    days
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
