// Professional schedule: scoring periods, remaining games, matchup quality.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::position::Position;
use crate::stats::PlayerStatLine;

// ---------------------------------------------------------------------------
// Periods and schedule entries
// ---------------------------------------------------------------------------

/// A fantasy scoring period, inclusive of both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringPeriod {
    pub id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ScoringPeriod {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Days in the period.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// One professional game from one team's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledGame {
    pub pro_team: String,
    pub date: NaiveDate,
    pub opponent: String,
    /// Park name; the home team's code when absent.
    #[serde(default)]
    pub park: Option<String>,
    #[serde(default)]
    pub home: bool,
}

impl ScheduledGame {
    pub fn park_key(&self) -> &str {
        match &self.park {
            Some(p) => p,
            None if self.home => &self.pro_team,
            None => &self.opponent,
        }
    }
}

/// A pitcher's announced start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbableStart {
    pub player_id: String,
    pub date: NaiveDate,
    /// Opponent and park are taken from the player's schedule when absent.
    #[serde(default)]
    pub opponent: Option<String>,
    #[serde(default)]
    pub home: Option<bool>,
    #[serde(default)]
    pub park: Option<String>,
}

// ---------------------------------------------------------------------------
// Expected volume
// ---------------------------------------------------------------------------

/// Source of expected remaining games (or starts) for a player in a period.
pub trait GameVolume {
    fn expected_games(&self, line: &PlayerStatLine, period: &ScoringPeriod) -> f64;
}

/// Default rotation turns per team game for starters without announced starts.
pub const DEFAULT_ROTATION_SIZE: f64 = 5.0;

/// Expected volume from the remaining professional schedule.
///
/// Announced starts override the schedule for a player. Starters without
/// announced starts get one start per `rotation_size` team games.
#[derive(Debug, Clone)]
pub struct RemainingSchedule<'a> {
    pub games: &'a [ScheduledGame],
    pub probable_starts: &'a [ProbableStart],
    /// Games before this date are already banked.
    pub as_of: Option<NaiveDate>,
    pub rotation_size: f64,
}

impl<'a> RemainingSchedule<'a> {
    pub fn new(games: &'a [ScheduledGame], probable_starts: &'a [ProbableStart]) -> Self {
        RemainingSchedule {
            games,
            probable_starts,
            as_of: None,
            rotation_size: DEFAULT_ROTATION_SIZE,
        }
    }

    pub fn as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = Some(date);
        self
    }

    fn is_remaining(&self, date: NaiveDate, period: &ScoringPeriod) -> bool {
        period.contains(date) && self.as_of.map_or(true, |d| date >= d)
    }

    /// Every remaining game in the period.
    pub fn remaining_games<'s>(
        &'s self,
        period: &'s ScoringPeriod,
    ) -> impl Iterator<Item = &'a ScheduledGame> + 's {
        self.games.iter().filter(move |g| self.is_remaining(g.date, period))
    }

    /// Remaining games for a professional team in the period.
    pub fn team_games<'s>(
        &'s self,
        pro_team: &'s str,
        period: &'s ScoringPeriod,
    ) -> impl Iterator<Item = &'a ScheduledGame> + 's {
        self.games
            .iter()
            .filter(move |g| g.pro_team == pro_team && self.is_remaining(g.date, period))
    }

    /// The schedule entry for a professional team on a date.
    pub fn game_on(&self, pro_team: &str, date: NaiveDate) -> Option<&'a ScheduledGame> {
        self.games
            .iter()
            .find(|g| g.pro_team == pro_team && g.date == date)
    }

    /// Remaining announced starts for a player in the period.
    pub fn starts_for<'s>(
        &'s self,
        player_id: &'s str,
        period: &'s ScoringPeriod,
    ) -> impl Iterator<Item = &'a ProbableStart> + 's {
        self.probable_starts
            .iter()
            .filter(move |s| s.player_id == player_id && self.is_remaining(s.date, period))
    }
}

impl GameVolume for RemainingSchedule<'_> {
    fn expected_games(&self, line: &PlayerStatLine, period: &ScoringPeriod) -> f64 {
        let starts = self.starts_for(&line.player_id, period).count();
        if starts > 0 {
            return starts as f64;
        }
        let Some(team) = line.pro_team.as_deref() else {
            return 0.0;
        };
        let games = self.team_games(team, period).count() as f64;
        let starter_only = line.positions.contains(&Position::StartingPitcher)
            && !line.positions.contains(&Position::ReliefPitcher);
        if starter_only && self.rotation_size > 0.0 {
            (games / self.rotation_size).floor()
        } else {
            games
        }
    }
}

// ---------------------------------------------------------------------------
// Matchup quality
// ---------------------------------------------------------------------------

/// Strength ratings for a professional team, scaled so 100 is league average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProTeamRating {
    #[serde(default = "average_rating")]
    pub offense: f64,
    #[serde(default = "average_rating")]
    pub pitching: f64,
    /// Strikeout rate in percent.
    #[serde(default)]
    pub k_rate: Option<f64>,
}

fn average_rating() -> f64 {
    100.0
}

impl Default for ProTeamRating {
    fn default() -> Self {
        ProTeamRating {
            offense: 100.0,
            pitching: 100.0,
            k_rate: None,
        }
    }
}

/// Professional team ratings and park factors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleContext {
    #[serde(default)]
    pub pro_teams: BTreeMap<String, ProTeamRating>,
    #[serde(default)]
    pub park_factors: BTreeMap<String, f64>,
}

impl ScheduleContext {
    /// Ratings for a team; league average when unknown.
    pub fn team(&self, code: &str) -> ProTeamRating {
        self.pro_teams.get(code).copied().unwrap_or_default()
    }

    /// Run-scoring factor for a park; neutral when unknown.
    pub fn park_factor(&self, park: &str) -> f64 {
        self.park_factors.get(park).copied().unwrap_or(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchupTier {
    Tough,
    Average,
    Favorable,
    Good,
    Excellent,
}

impl MatchupTier {
    pub fn from_rating(rating: f64) -> Self {
        if rating > 120.0 {
            MatchupTier::Excellent
        } else if rating > 110.0 {
            MatchupTier::Good
        } else if rating > 100.0 {
            MatchupTier::Favorable
        } else if rating > 90.0 {
            MatchupTier::Average
        } else {
            MatchupTier::Tough
        }
    }
}

/// Quality of one game for a team's hitters and pitchers, 100 = neutral.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchupQuality {
    pub offense: f64,
    pub offense_tier: MatchupTier,
    pub pitching: f64,
    pub pitching_tier: MatchupTier,
}

/// Rate a game against `opponent` in a park with `park_factor`.
///
/// Hitters gain from weak opposing pitching, hitter-friendly parks and
/// low-strikeout opponents; pitchers from the reverse.
pub fn rate_matchup(opponent: &ProTeamRating, park_factor: f64, league_k_rate: f64) -> MatchupQuality {
    let pitching_strength = opponent.pitching.max(1.0);
    let offense_strength = opponent.offense.max(1.0);
    let k_rate = opponent.k_rate.unwrap_or(league_k_rate).max(0.1);
    let park = if park_factor > 0.0 { park_factor } else { 1.0 };

    let offense = 100.0 * (100.0 / pitching_strength) * park * (league_k_rate / k_rate);
    let pitching = 100.0 * (100.0 / offense_strength) * (1.0 / park) * (k_rate / league_k_rate);

    MatchupQuality {
        offense,
        offense_tier: MatchupTier::from_rating(offense),
        pitching,
        pitching_tier: MatchupTier::from_rating(pitching),
    }
}

/// Rate a scheduled game from the perspective of its `pro_team`.
pub fn rate_game(game: &ScheduledGame, context: &ScheduleContext, league_k_rate: f64) -> MatchupQuality {
    rate_matchup(
        &context.team(&game.opponent),
        context.park_factor(game.park_key()),
        league_k_rate,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
