// Canonical per-player stat line.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::config::StatGroup;
use crate::position::Position;

/// Time window a stat line was accumulated over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimeWindow {
    #[default]
    SeasonToDate,
    LastDays(u32),
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeWindow::SeasonToDate => write!(f, "season_to_date"),
            TimeWindow::LastDays(n) => write!(f, "last_{n}"),
        }
    }
}

impl FromStr for TimeWindow {
    type Err = String;

    /// Accepts `season`, `season_to_date`, `std`, and `last_N` / `lastN` /
    /// `last_N_days`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "season" | "season_to_date" | "std" => return Ok(TimeWindow::SeasonToDate),
            _ => {}
        }
        let rest = lower
            .strip_prefix("last")
            .ok_or_else(|| format!("unrecognized time window `{s}`"))?;
        let digits = rest.trim_start_matches('_').trim_end_matches("_days");
        match digits.parse::<u32>() {
            Ok(n) if n > 0 => Ok(TimeWindow::LastDays(n)),
            _ => Err(format!("unrecognized time window `{s}`")),
        }
    }
}

impl TryFrom<String> for TimeWindow {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeWindow> for String {
    fn from(w: TimeWindow) -> Self {
        w.to_string()
    }
}

/// A player's stats in the canonical schema.
///
/// `values` holds exactly the configured categories of the line's stat group.
/// Rate values are only meaningful together with `sample_size`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatLine {
    pub player_id: String,
    pub name: String,
    pub pro_team: Option<String>,
    pub positions: BTreeSet<Position>,
    pub group: StatGroup,
    pub values: BTreeMap<String, f64>,
    /// Plate appearances for hitters, innings for pitchers.
    pub sample_size: f64,
    pub games: f64,
    pub window: TimeWindow,
}

impl PlayerStatLine {
    pub fn value(&self, category: &str) -> Option<f64> {
        self.values.get(category).copied()
    }

    pub fn is_eligible_at(&self, pos: Position) -> bool {
        pos.accepts(&self.positions)
    }

    /// Category value per game played; zero when no games were played.
    pub fn per_game(&self, category: &str) -> Option<f64> {
        let v = self.value(category)?;
        Some(if self.games > 0.0 { v / self.games } else { 0.0 })
    }

    /// Sample size per game played; zero when no games were played.
    pub fn sample_per_game(&self) -> f64 {
        if self.games > 0.0 {
            self.sample_size / self.games
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_parse_forms() {
        assert_eq!("season".parse::<TimeWindow>().unwrap(), TimeWindow::SeasonToDate);
        assert_eq!("STD".parse::<TimeWindow>().unwrap(), TimeWindow::SeasonToDate);
        assert_eq!("last_14".parse::<TimeWindow>().unwrap(), TimeWindow::LastDays(14));
        assert_eq!("last7".parse::<TimeWindow>().unwrap(), TimeWindow::LastDays(7));
        assert_eq!("last_30_days".parse::<TimeWindow>().unwrap(), TimeWindow::LastDays(30));
        assert!("last_0".parse::<TimeWindow>().is_err());
        assert!("yesterday".parse::<TimeWindow>().is_err());
    }

    #[test]
    fn window_display_parses_back() {
        for w in [TimeWindow::SeasonToDate, TimeWindow::LastDays(15)] {
            assert_eq!(w.to_string().parse::<TimeWindow>().unwrap(), w);
        }
    }

    #[test]
    fn per_game_guards_zero_games() {
        let line = PlayerStatLine {
            player_id: "p".into(),
            name: "P".into(),
            pro_team: None,
            positions: BTreeSet::new(),
            group: StatGroup::Batting,
            values: [("HR".to_string(), 10.0)].into_iter().collect(),
            sample_size: 100.0,
            games: 0.0,
            window: TimeWindow::SeasonToDate,
        };
        assert_eq!(line.per_game("HR"), Some(0.0));
        assert_eq!(line.sample_per_game(), 0.0);
        assert_eq!(line.per_game("SB"), None);
    }
}
