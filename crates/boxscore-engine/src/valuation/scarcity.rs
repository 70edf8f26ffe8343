// Positional scarcity: how much above-replacement talent is left unrostered.
//
// For each slot type with a replacement baseline, counts the free agents
// whose value over replacement at that slot is positive and measures how
// steeply value drops after the best of them.

use serde::Serialize;
use tracing::debug;

use crate::config::EngineConfig;
use crate::position::Position;
use crate::team::{free_agents, TeamRoster};
use crate::valuation::Valuation;

// ---------------------------------------------------------------------------
// Urgency
// ---------------------------------------------------------------------------

/// How thin the free-agent pool is at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScarcityUrgency {
    /// 0-2 free agents above replacement.
    Critical,
    /// 3-4 above replacement.
    High,
    /// 5-7 above replacement.
    Medium,
    /// 8 or more.
    Low,
}

impl ScarcityUrgency {
    pub fn from_count(players_above_replacement: usize) -> Self {
        match players_above_replacement {
            0..=2 => ScarcityUrgency::Critical,
            3..=4 => ScarcityUrgency::High,
            5..=7 => ScarcityUrgency::Medium,
            _ => ScarcityUrgency::Low,
        }
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScarcityEntry {
    pub position: Position,
    /// Rated players eligible at the slot, rostered or not.
    pub eligible_players: usize,
    /// Eligible players already on a fantasy roster.
    pub rostered_players: usize,
    /// Free agents with positive value over replacement at the slot.
    pub players_above_replacement: usize,
    pub top_available_vor: f64,
    /// Third-best free agent's value, or the worst one with fewer than three;
    /// 0.0 when none is above replacement.
    pub replacement_vor: f64,
    pub dropoff: f64,
    pub urgency: ScarcityUrgency,
}

/// Scarcity for every slot type with a replacement baseline.
///
/// Sorted most urgent first, then by dropoff descending, then slot order.
pub fn compute_scarcity(
    valuation: &Valuation,
    rosters: &[TeamRoster],
    config: &EngineConfig,
) -> Vec<ScarcityEntry> {
    let available = free_agents(valuation, rosters);
    let mut entries: Vec<ScarcityEntry> = valuation
        .baselines
        .positions()
        .map(|pos| {
            let eligible_players = valuation
                .ratings
                .iter()
                .filter(|r| r.line.is_eligible_at(pos))
                .count();
            let mut above: Vec<f64> = available
                .iter()
                .filter(|r| r.line.is_eligible_at(pos))
                .map(|r| valuation.value_at(r, pos, config))
                .filter(|&v| v > 0.0)
                .collect();
            above.sort_by(|a, b| b.total_cmp(a));
            let free = available.iter().filter(|r| r.line.is_eligible_at(pos)).count();

            let top_available_vor = above.first().copied().unwrap_or(0.0);
            let replacement_vor = above
                .get(2)
                .or_else(|| above.last())
                .copied()
                .unwrap_or(0.0);
            ScarcityEntry {
                position: pos,
                eligible_players,
                rostered_players: eligible_players - free,
                players_above_replacement: above.len(),
                top_available_vor,
                replacement_vor,
                dropoff: top_available_vor - replacement_vor,
                urgency: ScarcityUrgency::from_count(above.len()),
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        a.urgency
            .cmp(&b.urgency)
            .then_with(|| b.dropoff.total_cmp(&a.dropoff))
            .then_with(|| a.position.sort_order().cmp(&b.position.sort_order()))
    });
    debug!(
        positions = entries.len(),
        critical = entries
            .iter()
            .filter(|e| e.urgency == ScarcityUrgency::Critical)
            .count(),
        "position scarcity computed"
    );
    entries
}

/// Look up the entry for one position.
pub fn scarcity_for_position(scarcity: &[ScarcityEntry], position: Position) -> Option<&ScarcityEntry> {
    scarcity.iter().find(|e| e.position == position)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{test_config, StatGroup};
    use crate::stats::{PlayerStatLine, TimeWindow};
    use crate::team::{RosterEntry, RosterStatus};
    use crate::valuation::value_players;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn hitter(id: &str, pos: Position, hr: f64) -> PlayerStatLine {
        PlayerStatLine {
            player_id: id.into(),
            name: id.into(),
            pro_team: None,
            positions: [pos].into_iter().collect(),
            group: StatGroup::Batting,
            values: [
                ("R".to_string(), hr * 3.0),
                ("HR".to_string(), hr),
                ("AVG".to_string(), 0.250),
            ]
            .into_iter()
            .collect(),
            sample_size: 400.0,
            games: 100.0,
            window: TimeWindow::SeasonToDate,
        }
    }

    fn roster(id: &str, players: &[&str]) -> TeamRoster {
        TeamRoster {
            team_id: id.into(),
            name: id.into(),
            entries: players
                .iter()
                .map(|p| RosterEntry {
                    player_id: p.to_string(),
                    status: RosterStatus::Bench,
                })
                .collect(),
        }
    }

    #[test]
    fn urgency_from_count() {
        assert_eq!(ScarcityUrgency::from_count(0), ScarcityUrgency::Critical);
        assert_eq!(ScarcityUrgency::from_count(2), ScarcityUrgency::Critical);
        assert_eq!(ScarcityUrgency::from_count(3), ScarcityUrgency::High);
        assert_eq!(ScarcityUrgency::from_count(5), ScarcityUrgency::Medium);
        assert_eq!(ScarcityUrgency::from_count(8), ScarcityUrgency::Low);
        assert_eq!(ScarcityUrgency::from_count(40), ScarcityUrgency::Low);
    }

    #[test]
    fn rostered_players_do_not_count_as_available() {
        let config = test_config();
        // Two catcher slots league-wide: c2 (25 HR) is the baseline.
        let valuation = value_players(
            vec![
                hitter("c1", Position::Catcher, 30.0),
                hitter("c2", Position::Catcher, 25.0),
                hitter("c3", Position::Catcher, 20.0),
                hitter("c4", Position::Catcher, 10.0),
            ],
            &config,
        )
        .unwrap();

        let nobody = compute_scarcity(&valuation, &[], &config);
        let c = scarcity_for_position(&nobody, Position::Catcher).unwrap();
        assert_eq!(c.eligible_players, 4);
        assert_eq!(c.rostered_players, 0);
        assert_eq!(c.players_above_replacement, 1);
        assert_eq!(c.urgency, ScarcityUrgency::Critical);
        assert!(c.top_available_vor > 0.0);
        // A single player above replacement is also the replacement proxy.
        assert!(approx_eq(c.dropoff, 0.0, 1e-12));

        let rosters = vec![roster("t1", &["c1"])];
        let taken = compute_scarcity(&valuation, &rosters, &config);
        let c = scarcity_for_position(&taken, Position::Catcher).unwrap();
        assert_eq!(c.rostered_players, 1);
        assert_eq!(c.players_above_replacement, 0);
        assert_eq!(c.top_available_vor, 0.0);
    }

    #[test]
    fn dropoff_uses_third_best() {
        let config = test_config();
        // Four OF slots league-wide put the baseline at the fourth best
        // (28 HR), leaving three free agents above it.
        let lines: Vec<PlayerStatLine> = (0..7)
            .map(|i| hitter(&format!("o{i}"), Position::LeftField, 40.0 - 4.0 * i as f64))
            .collect();
        let valuation = value_players(lines, &config).unwrap();
        let values: Vec<f64> = (0..3)
            .map(|i| {
                let r = valuation.rating(&format!("o{i}")).unwrap();
                valuation.value_at(r, Position::Outfield, &config)
            })
            .collect();

        let entries = compute_scarcity(&valuation, &[], &config);
        let of = scarcity_for_position(&entries, Position::Outfield).unwrap();
        assert_eq!(of.players_above_replacement, 3);
        assert_eq!(of.urgency, ScarcityUrgency::High);
        assert!(approx_eq(of.top_available_vor, values[0], 1e-12));
        assert!(approx_eq(of.replacement_vor, values[2], 1e-12));
        assert!(approx_eq(of.dropoff, values[0] - values[2], 1e-12));
    }

    #[test]
    fn sorted_by_urgency_then_dropoff() {
        let entries = {
            let config = test_config();
            let lines = vec![
                hitter("c1", Position::Catcher, 30.0),
                hitter("f1", Position::FirstBase, 30.0),
            ];
            let valuation = value_players(lines, &config).unwrap();
            compute_scarcity(&valuation, &[], &config)
        };
        for pair in entries.windows(2) {
            assert!(pair[0].urgency <= pair[1].urgency);
            if pair[0].urgency == pair[1].urgency {
                assert!(pair[0].dropoff >= pair[1].dropoff);
            }
        }
    }
}
