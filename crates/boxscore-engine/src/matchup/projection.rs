// Head-to-head category projection for one scoring period.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::config::EngineConfig;
use crate::matchup::schedule::{GameVolume, ScoringPeriod};
use crate::team::{CategoryTotals, TeamSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryWinner {
    Home,
    Away,
    Tie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchupResult {
    HomeWin,
    AwayWin,
    /// Both sides win the same number of categories.
    Deadlock,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryProjection {
    pub category: String,
    pub home: f64,
    pub away: f64,
    /// Positive favors home, already oriented for lower-is-better categories.
    pub advantage: f64,
    pub winner: CategoryWinner,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchupProjection {
    pub period_id: String,
    pub generated_at: DateTime<Utc>,
    pub home: String,
    pub away: String,
    pub categories: Vec<CategoryProjection>,
    pub home_wins: usize,
    pub away_wins: usize,
    pub ties: usize,
    pub result: MatchupResult,
}

/// Compare two sets of totals category by category.
///
/// Exactly equal totals tie and count for neither side.
pub fn compare_totals(
    period: &ScoringPeriod,
    generated_at: DateTime<Utc>,
    (home_id, home): (&str, &CategoryTotals),
    (away_id, away): (&str, &CategoryTotals),
    config: &EngineConfig,
) -> MatchupProjection {
    let categories: Vec<CategoryProjection> = config
        .categories
        .iter()
        .map(|cat| {
            let h = home.value(&cat.name).unwrap_or(0.0);
            let a = away.value(&cat.name).unwrap_or(0.0);
            let advantage = cat.direction() * (h - a);
            let winner = if h == a {
                CategoryWinner::Tie
            } else if advantage > 0.0 {
                CategoryWinner::Home
            } else {
                CategoryWinner::Away
            };
            CategoryProjection {
                category: cat.name.clone(),
                home: h,
                away: a,
                advantage,
                winner,
            }
        })
        .collect();

    let count = |w: CategoryWinner| categories.iter().filter(|c| c.winner == w).count();
    let home_wins = count(CategoryWinner::Home);
    let away_wins = count(CategoryWinner::Away);
    let ties = count(CategoryWinner::Tie);
    let result = match home_wins.cmp(&away_wins) {
        std::cmp::Ordering::Greater => MatchupResult::HomeWin,
        std::cmp::Ordering::Less => MatchupResult::AwayWin,
        std::cmp::Ordering::Equal => MatchupResult::Deadlock,
    };

    MatchupProjection {
        period_id: period.id.clone(),
        generated_at,
        home: home_id.to_string(),
        away: away_id.to_string(),
        categories,
        home_wins,
        away_wins,
        ties,
        result,
    }
}

/// Project a matchup from the teams' current totals.
pub fn project_matchup(
    home: &TeamSnapshot,
    away: &TeamSnapshot,
    period: &ScoringPeriod,
    generated_at: DateTime<Utc>,
    config: &EngineConfig,
) -> MatchupProjection {
    compare_totals(
        period,
        generated_at,
        (&home.team_id, &home.totals),
        (&away.team_id, &away.totals),
        config,
    )
}

/// Totals a team's active players are expected to add over the rest of the
/// period, plus anything already banked.
///
/// Counts scale per-game production by expected games. Rates keep the
/// player's rate, weighted by expected sample (sample per game times games).
pub fn projected_totals(
    team: &TeamSnapshot,
    period: &ScoringPeriod,
    volume: &dyn GameVolume,
    banked: Option<&CategoryTotals>,
    config: &EngineConfig,
) -> CategoryTotals {
    let mut totals = CategoryTotals::empty(config);
    if let Some(banked) = banked {
        totals.merge(banked);
    }
    for member in team.active() {
        let line = &member.rating.line;
        let games = volume.expected_games(line, period);
        if games <= 0.0 {
            continue;
        }
        let expected_sample = line.sample_per_game() * games;
        for cat in config.categories_for(line.group) {
            let Some(value) = line.value(&cat.name) else {
                continue;
            };
            if cat.is_rate() {
                totals.record(cat, value, expected_sample);
            } else {
                let per_game = line.per_game(&cat.name).unwrap_or(0.0);
                totals.record(cat, per_game * games, 0.0);
            }
        }
    }
    totals
}

/// Banked totals for both sides of a matchup.
#[derive(Debug, Clone, Copy)]
pub struct Banked<'a> {
    pub home: &'a CategoryTotals,
    pub away: &'a CategoryTotals,
}

/// Project a matchup over the remaining schedule of a period.
pub fn project_remaining(
    home: &TeamSnapshot,
    away: &TeamSnapshot,
    period: &ScoringPeriod,
    volume: &dyn GameVolume,
    banked: Option<Banked<'_>>,
    generated_at: DateTime<Utc>,
    config: &EngineConfig,
) -> MatchupProjection {
    let home_totals = projected_totals(home, period, volume, banked.map(|b| b.home), config);
    let away_totals = projected_totals(away, period, volume, banked.map(|b| b.away), config);
    let projection = compare_totals(
        period,
        generated_at,
        (&home.team_id, &home_totals),
        (&away.team_id, &away_totals),
        config,
    );
    debug!(
        period = %period.id,
        home = %home.team_id,
        away = %away.team_id,
        result = ?projection.result,
        "matchup projected"
    );
    projection
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
