// Replacement baselines and value over replacement.
//
// Each active lineup slot type gets a per-category baseline: the value of the
// Nth best eligible player, where N is the number of that slot league-wide.
// A player's value over replacement is taken at their most favorable slot.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::{CategoryDef, EngineConfig, StatGroup};
use crate::error::InsufficientDataError;
use crate::position::Position;
use crate::stats::PlayerStatLine;
use crate::valuation::zscore::{meets_floor, standardize, CategoryPoolStats, CategoryScore};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Whether a baseline rests on a full pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum Confidence {
    Normal,
    Low { reason: InsufficientDataError },
}

impl Confidence {
    pub fn is_low(&self) -> bool {
        matches!(self, Confidence::Low { .. })
    }
}

/// Replacement-level value for one (slot, category) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplacementBaseline {
    pub position: Position,
    pub category: String,
    pub value: f64,
    /// Number of league-wide slots the pool has to fill.
    pub rank_threshold: usize,
    /// Eligible players meeting the category floor.
    pub pool_size: usize,
    pub confidence: Confidence,
}

/// All baselines, keyed by slot and then category.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplacementBaselines {
    pub by_position: BTreeMap<Position, BTreeMap<String, ReplacementBaseline>>,
}

impl ReplacementBaselines {
    pub fn get(&self, pos: Position, category: &str) -> Option<&ReplacementBaseline> {
        self.by_position.get(&pos)?.get(category)
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.by_position.keys().copied()
    }

    /// Baselines flagged low-confidence, in slot then category order.
    pub fn low_confidence(&self) -> impl Iterator<Item = &ReplacementBaseline> {
        self.by_position
            .values()
            .flat_map(|m| m.values())
            .filter(|b| b.confidence.is_low())
    }
}

// ---------------------------------------------------------------------------
// Rank thresholds
// ---------------------------------------------------------------------------

fn slot_group(pos: Position) -> StatGroup {
    if pos.is_pitcher() {
        StatGroup::Pitching
    } else {
        StatGroup::Batting
    }
}

/// League-wide count of players the slot's pool must supply.
///
/// For a concrete or partial-flex slot this is its own slot count. The
/// catch-all slots (UTIL for hitters, P for pitchers) draw on every player of
/// their side, so their threshold is every active slot on that side.
pub fn rank_threshold(pos: Position, config: &EngineConfig) -> usize {
    let slots = config.slot_counts();
    let per_team = match pos {
        Position::Utility | Position::Pitcher => slots
            .iter()
            .filter(|(p, _)| p.is_active_slot() && slot_group(**p) == slot_group(pos))
            .map(|(_, &n)| n)
            .sum(),
        other => slots.get(&other).copied().unwrap_or(0),
    };
    per_team * config.league.num_teams
}

// ---------------------------------------------------------------------------
// Baselines
// ---------------------------------------------------------------------------

/// Baseline for one slot and category.
///
/// The pool is every line eligible at the slot that meets the category floor,
/// ordered best first. With at least `threshold` players the baseline is the
/// value at rank `threshold`; otherwise it falls back to the worst eligible
/// value (or the category mean for an empty pool) and is marked low
/// confidence.
fn baseline_for(
    pos: Position,
    cat: &CategoryDef,
    threshold: usize,
    lines: &[PlayerStatLine],
    pool: &CategoryPoolStats,
) -> ReplacementBaseline {
    let direction = cat.direction();
    let mut values: Vec<f64> = lines
        .iter()
        .filter(|l| l.group == cat.group && meets_floor(l, cat) && l.is_eligible_at(pos))
        .filter_map(|l| l.value(&cat.name))
        .collect();
    values.sort_by(|a, b| (direction * b).total_cmp(&(direction * a)));

    let low = |eligible: usize| Confidence::Low {
        reason: InsufficientDataError {
            position: pos,
            category: cat.name.clone(),
            eligible,
            required: threshold,
        },
    };

    let (value, confidence) = if values.len() >= threshold {
        (values[threshold - 1], Confidence::Normal)
    } else if let Some(&worst) = values.last() {
        (worst, low(values.len()))
    } else {
        (pool.stats.mean, low(0))
    };

    ReplacementBaseline {
        position: pos,
        category: cat.name.clone(),
        value,
        rank_threshold: threshold,
        pool_size: values.len(),
        confidence,
    }
}

/// Compute baselines for every active slot type in the league's roster.
///
/// Slots with no league-wide count have no pool and are skipped.
pub fn determine_replacement_levels(
    lines: &[PlayerStatLine],
    config: &EngineConfig,
    pools: &BTreeMap<String, CategoryPoolStats>,
) -> ReplacementBaselines {
    let mut baselines = ReplacementBaselines::default();

    for (&pos, _) in config.slot_counts().iter().filter(|(p, _)| p.is_active_slot()) {
        let threshold = rank_threshold(pos, config);
        if threshold == 0 {
            continue;
        }
        let entry = baselines.by_position.entry(pos).or_default();
        for cat in config.categories_for(slot_group(pos)) {
            let Some(pool) = pools.get(&cat.name) else {
                continue;
            };
            let baseline = baseline_for(pos, cat, threshold, lines, pool);
            if baseline.confidence.is_low() {
                debug!(
                    position = %pos,
                    category = %cat.name,
                    pool_size = baseline.pool_size,
                    threshold,
                    "low-confidence replacement baseline"
                );
            }
            entry.insert(cat.name.clone(), baseline);
        }
    }

    baselines
}

// ---------------------------------------------------------------------------
// Value over replacement
// ---------------------------------------------------------------------------

/// Weighted value over replacement for a line at one slot, with the
/// per-category contributions.
pub(crate) fn vor_at(
    pos: Position,
    scores: &BTreeMap<String, CategoryScore>,
    baselines: &ReplacementBaselines,
    config: &EngineConfig,
    pools: &BTreeMap<String, CategoryPoolStats>,
) -> (f64, BTreeMap<String, f64>) {
    let mut total = 0.0;
    let mut per_category = BTreeMap::new();
    for (name, score) in scores {
        let (Some(cat), Some(baseline), Some(pool)) =
            (config.category(name), baselines.get(pos, name), pools.get(name))
        else {
            continue;
        };
        let over = cat.direction() * standardize(score.value, baseline.value, &pool.stats);
        total += cat.weight * over;
        per_category.insert(name.clone(), over);
    }
    (total, per_category)
}

fn is_catch_all(pos: Position) -> bool {
    matches!(pos, Position::Utility | Position::Pitcher)
}

/// Value over replacement at the player's most favorable eligible slot.
///
/// Returns the total, the chosen slot, and the per-category distances at that
/// slot. Ties between slots go to the earlier slot in display order. The
/// catch-all slots are only used when a player has no other eligible slot.
pub fn compute_vor(
    line: &PlayerStatLine,
    scores: &BTreeMap<String, CategoryScore>,
    baselines: &ReplacementBaselines,
    config: &EngineConfig,
    pools: &BTreeMap<String, CategoryPoolStats>,
) -> (f64, Option<Position>, BTreeMap<String, f64>) {
    let mut eligible: Vec<Position> = baselines
        .positions()
        .filter(|&p| !is_catch_all(p) && slot_group(p) == line.group && line.is_eligible_at(p))
        .collect();
    if eligible.is_empty() {
        let fallback = match line.group {
            StatGroup::Batting => Position::Utility,
            StatGroup::Pitching => Position::Pitcher,
        };
        if baselines.by_position.contains_key(&fallback) {
            eligible.push(fallback);
        }
    }

    let mut best: Option<(f64, Position, BTreeMap<String, f64>)> = None;
    for pos in eligible {
        let (total, per_category) = vor_at(pos, scores, baselines, config, pools);
        if best.as_ref().map_or(true, |(b, _, _)| total > *b) {
            best = Some((total, pos, per_category));
        }
    }

    match best {
        Some((total, pos, per_category)) => (total, Some(pos), per_category),
        None => (0.0, None, BTreeMap::new()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::stats::TimeWindow;
    use crate::valuation::zscore::{compute_category_pools, score_category};
    use std::collections::BTreeSet;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn hitter(id: &str, positions: &[Position], hr: f64) -> PlayerStatLine {
        PlayerStatLine {
            player_id: id.into(),
            name: id.into(),
            pro_team: None,
            positions: positions.iter().copied().collect::<BTreeSet<_>>(),
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

    fn catchers(n: usize) -> Vec<PlayerStatLine> {
        (0..n)
            .map(|i| hitter(&format!("c{i}"), &[Position::Catcher], 30.0 - i as f64))
            .collect()
    }

    #[test]
    fn threshold_equals_league_slots() {
        let config = test_config();
        assert_eq!(rank_threshold(Position::Catcher, &config), 2);
        assert_eq!(rank_threshold(Position::Outfield, &config), 4);
        // UTIL covers C + 1B + SS + OF*2 + UTIL = 6 per team.
        assert_eq!(rank_threshold(Position::Utility, &config), 12);
        assert_eq!(rank_threshold(Position::ThirdBase, &config), 0);
    }

    #[test]
    fn baseline_is_nth_best() {
        let config = test_config();
        let lines = catchers(5);
        let pools = compute_category_pools(&lines, &config);
        let baselines = determine_replacement_levels(&lines, &config, &pools);
        let hr = baselines.get(Position::Catcher, "HR").unwrap();
        // 1 C slot * 2 teams: second best catcher (29 HR).
        assert_eq!(hr.rank_threshold, 2);
        assert_eq!(hr.value, 29.0);
        assert_eq!(hr.confidence, Confidence::Normal);
    }

    #[test]
    fn changing_slot_count_moves_baseline() {
        let mut config = test_config();
        let lines = catchers(5);
        let pools = compute_category_pools(&lines, &config);
        let before = determine_replacement_levels(&lines, &config, &pools)
            .get(Position::Catcher, "HR")
            .unwrap()
            .value;

        config.league.roster.insert("C".into(), 2);
        let after = determine_replacement_levels(&lines, &config, &pools)
            .get(Position::Catcher, "HR")
            .unwrap()
            .clone();
        assert_eq!(after.rank_threshold, 4);
        assert_eq!(after.value, 27.0);
        assert!(after.value < before);
    }

    #[test]
    fn lower_is_better_sorts_ascending() {
        let config = test_config();
        let mut lines = Vec::new();
        for (i, era) in [2.50, 3.00, 3.50, 4.00, 4.50, 5.00].iter().enumerate() {
            let mut values = BTreeMap::new();
            values.insert("ERA".to_string(), *era);
            values.insert("K".to_string(), 100.0);
            values.insert("W".to_string(), 8.0);
            lines.push(PlayerStatLine {
                player_id: format!("sp{i}"),
                name: format!("SP {i}"),
                pro_team: None,
                positions: [Position::StartingPitcher].into_iter().collect(),
                group: StatGroup::Pitching,
                values,
                sample_size: 100.0,
                games: 18.0,
                window: TimeWindow::SeasonToDate,
            });
        }
        let pools = compute_category_pools(&lines, &config);
        let baselines = determine_replacement_levels(&lines, &config, &pools);
        // 2 SP * 2 teams = 4: fourth best ERA.
        assert_eq!(baselines.get(Position::StartingPitcher, "ERA").unwrap().value, 4.00);
    }

    #[test]
    fn short_pool_is_low_confidence() {
        let config = test_config();
        let lines = catchers(1);
        let pools = compute_category_pools(&lines, &config);
        let baselines = determine_replacement_levels(&lines, &config, &pools);
        let hr = baselines.get(Position::Catcher, "HR").unwrap();
        assert_eq!(hr.value, 30.0);
        match &hr.confidence {
            Confidence::Low { reason } => {
                assert_eq!(reason.eligible, 1);
                assert_eq!(reason.required, 2);
            }
            other => panic!("expected low confidence, got {other:?}"),
        }
        // Shortstop pool is empty: falls back to the category mean.
        let ss = baselines.get(Position::ShortStop, "HR").unwrap();
        assert_eq!(ss.pool_size, 0);
        assert_eq!(ss.value, 30.0);
        assert!(ss.confidence.is_low());
    }

    #[test]
    fn vor_takes_best_position() {
        let config = test_config();
        let mut lines = catchers(3);
        lines.extend((0..6).map(|i| hitter(&format!("of{i}"), &[Position::LeftField], 40.0 - i as f64)));
        lines.push(hitter("flex", &[Position::Catcher, Position::LeftField], 33.0));
        let pools = compute_category_pools(&lines, &config);
        let baselines = determine_replacement_levels(&lines, &config, &pools);

        let flex = lines.last().unwrap();
        let scores: BTreeMap<String, CategoryScore> = config
            .categories_for(StatGroup::Batting)
            .filter_map(|c| score_category(flex, c, &pools[&c.name]).map(|s| (c.name.clone(), s)))
            .collect();
        let (vor, pos, per_cat) = compute_vor(flex, &scores, &baselines, &config, &pools);
        // Catcher baseline (HR 30) is weaker than OF (HR 37), so C wins.
        assert_eq!(pos, Some(Position::Catcher));
        assert!(vor > 0.0);
        let (c_total, _) = vor_at(Position::Catcher, &scores, &baselines, &config, &pools);
        let (of_total, _) = vor_at(Position::Outfield, &scores, &baselines, &config, &pools);
        assert!(approx_eq(vor, c_total, 1e-12));
        assert!(c_total > of_total);
        assert!(per_cat["HR"] > 0.0);
    }

    #[test]
    fn ineligible_player_falls_back_to_util() {
        let config = test_config();
        let mut lines = catchers(3);
        lines.push(hitter("dh", &[Position::DesignatedHitter], 25.0));
        let pools = compute_category_pools(&lines, &config);
        let baselines = determine_replacement_levels(&lines, &config, &pools);
        let dh = lines.last().unwrap();
        let scores: BTreeMap<String, CategoryScore> = config
            .categories_for(StatGroup::Batting)
            .filter_map(|c| score_category(dh, c, &pools[&c.name]).map(|s| (c.name.clone(), s)))
            .collect();
        let (_, pos, _) = compute_vor(dh, &scores, &baselines, &config, &pools);
        assert_eq!(pos, Some(Position::Utility));
    }
}
