// League snapshot: everything the engine reads for one run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::{CategoryKind, EngineConfig};
use crate::error::ValidationError;
use crate::matchup::{ProbableStart, ScheduleContext, ScheduledGame};
use crate::stats::RawStatRecord;
use crate::team::{CategoryTotals, TeamRoster};

/// A banked category value: a bare number for counts, value and weight for
/// rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BankedValue {
    Plain(f64),
    Weighted { value: f64, weight: f64 },
}

/// A head-to-head pairing for the scoring period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FantasyMatchup {
    pub home: String,
    pub away: String,
}

/// Immutable input for one engine run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeagueSnapshot {
    pub teams: Vec<TeamRoster>,
    pub players: Vec<RawStatRecord>,
    #[serde(default)]
    pub schedule: Vec<ScheduledGame>,
    #[serde(default)]
    pub probable_starts: Vec<ProbableStart>,
    #[serde(default)]
    pub context: ScheduleContext,
    #[serde(default)]
    pub matchups: Vec<FantasyMatchup>,
    /// Period totals already accumulated, by team then category.
    #[serde(default)]
    pub banked: BTreeMap<String, BTreeMap<String, BankedValue>>,
    /// Period value of the player each team would drop for a pickup.
    #[serde(default)]
    pub displaced_values: BTreeMap<String, f64>,
}

impl LeagueSnapshot {
    pub fn team(&self, team_id: &str) -> Result<&TeamRoster, ValidationError> {
        self.teams
            .iter()
            .find(|t| t.team_id == team_id)
            .ok_or_else(|| ValidationError::UnknownTeam {
                team_id: team_id.to_string(),
            })
    }

    /// Banked totals for a team, or `None` if nothing is banked.
    pub fn banked_totals(
        &self,
        team_id: &str,
        config: &EngineConfig,
    ) -> Result<Option<CategoryTotals>, ValidationError> {
        let Some(values) = self.banked.get(team_id) else {
            return Ok(None);
        };
        let invalid = |category: &str, message: &str| ValidationError::BankedTotal {
            team_id: team_id.to_string(),
            category: category.to_string(),
            message: message.to_string(),
        };

        let mut totals = CategoryTotals::empty(config);
        for (name, banked) in values {
            let cat = config
                .category(name)
                .ok_or_else(|| invalid(name, "is not a configured category"))?;
            match (cat.kind, *banked) {
                (CategoryKind::Count, BankedValue::Plain(v)) => totals.record(cat, v, 0.0),
                (CategoryKind::Count, BankedValue::Weighted { value, .. }) => {
                    totals.record(cat, value, 0.0)
                }
                (CategoryKind::Rate, BankedValue::Weighted { value, weight }) => {
                    if weight < 0.0 {
                        return Err(invalid(name, "has a negative weight"));
                    }
                    totals.record(cat, value, weight)
                }
                (CategoryKind::Rate, BankedValue::Plain(_)) => {
                    return Err(invalid(name, "is a rate and needs a weight"));
                }
            }
        }
        Ok(Some(totals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[test]
    fn parses_minimal_snapshot() {
        let json = r#"{
            "teams": [{"team_id": "t1", "entries": [{"player_id": "p1"}]}],
            "players": [{"id": "p1", "name": "One", "positions": "SS", "PA": 10, "R": 1, "HR": 0, "AVG": 0.3}]
        }"#;
        let snap: LeagueSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.teams.len(), 1);
        assert!(snap.schedule.is_empty());
        assert!(snap.team("t1").is_ok());
        assert!(matches!(snap.team("t2"), Err(ValidationError::UnknownTeam { .. })));
    }

    #[test]
    fn banked_totals_by_kind() {
        let config = test_config();
        let json = r#"{
            "teams": [], "players": [],
            "banked": {"t1": {"HR": 4, "AVG": {"value": 0.250, "weight": 40}}}
        }"#;
        let snap: LeagueSnapshot = serde_json::from_str(json).unwrap();
        let totals = snap.banked_totals("t1", &config).unwrap().unwrap();
        assert_eq!(totals.value("HR"), Some(4.0));
        assert_eq!(totals.get("AVG").unwrap().weight, 40.0);
        assert!(snap.banked_totals("t2", &config).unwrap().is_none());
    }

    #[test]
    fn banked_rate_without_weight_rejected() {
        let config = test_config();
        let json = r#"{"teams": [], "players": [], "banked": {"t1": {"ERA": 3.1}}}"#;
        let snap: LeagueSnapshot = serde_json::from_str(json).unwrap();
        assert!(matches!(
            snap.banked_totals("t1", &config),
            Err(ValidationError::BankedTotal { .. })
        ));
    }
}
