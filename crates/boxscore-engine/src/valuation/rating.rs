// Player ratings: the full valuation pass over a normalized pool.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::ValidationError;
use crate::position::Position;
use crate::stats::{PlayerStatLine, TimeWindow};
use crate::valuation::replacement::{
    compute_vor, determine_replacement_levels, vor_at, ReplacementBaselines,
};
use crate::valuation::zscore::{compute_category_pools, score_category, CategoryPoolStats, CategoryScore};

/// A player's valuation for one window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerRating {
    pub line: PlayerStatLine,
    pub categories: BTreeMap<String, CategoryScore>,
    /// Weighted sum of category z-scores.
    pub composite: f64,
    /// Weighted sum of category distances over replacement at `best_position`.
    pub value_over_replacement: f64,
    pub best_position: Option<Position>,
}

impl PlayerRating {
    pub fn player_id(&self) -> &str {
        &self.line.player_id
    }
}

/// Output of a valuation run. Ratings are sorted by composite score,
/// descending, ties by player id.
#[derive(Debug, Clone, Serialize)]
pub struct Valuation {
    pub window: TimeWindow,
    pub pools: BTreeMap<String, CategoryPoolStats>,
    pub baselines: ReplacementBaselines,
    pub ratings: Vec<Arc<PlayerRating>>,
    #[serde(skip)]
    index: BTreeMap<String, usize>,
}

impl Valuation {
    pub fn rating(&self, player_id: &str) -> Option<&Arc<PlayerRating>> {
        self.index.get(player_id).map(|&i| &self.ratings[i])
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    /// Weighted value over replacement if `rating` filled slot `pos`.
    pub fn value_at(&self, rating: &PlayerRating, pos: Position, config: &EngineConfig) -> f64 {
        vor_at(pos, &rating.categories, &self.baselines, config, &self.pools).0
    }
}

/// Rate every line against the pool it belongs to.
///
/// All lines must share one time window; rates from different windows are not
/// comparable. An empty pool yields an empty valuation.
pub fn value_players(
    lines: Vec<PlayerStatLine>,
    config: &EngineConfig,
) -> Result<Valuation, ValidationError> {
    config.validate()?;

    let window = lines.first().map(|l| l.window).unwrap_or_default();
    if let Some(odd) = lines.iter().find(|l| l.window != window) {
        return Err(ValidationError::MixedWindows {
            player_id: odd.player_id.clone(),
            expected: window.to_string(),
            found: odd.window.to_string(),
        });
    }

    let pools = compute_category_pools(&lines, config);
    let baselines = determine_replacement_levels(&lines, config, &pools);

    let mut ratings: Vec<PlayerRating> = lines
        .into_iter()
        .map(|line| {
            let mut categories: BTreeMap<String, CategoryScore> = config
                .categories_for(line.group)
                .filter_map(|cat| {
                    let pool = pools.get(&cat.name)?;
                    score_category(&line, cat, pool).map(|s| (cat.name.clone(), s))
                })
                .collect();
            let composite = categories
                .iter()
                .filter_map(|(name, s)| config.category(name).map(|c| c.weight * s.zscore))
                .sum();
            let (vor, best_position, per_category) =
                compute_vor(&line, &categories, &baselines, config, &pools);
            for (name, over) in per_category {
                if let Some(score) = categories.get_mut(&name) {
                    score.over_replacement = over;
                }
            }
            PlayerRating {
                line,
                categories,
                composite,
                value_over_replacement: vor,
                best_position,
            }
        })
        .collect();

    ratings.sort_by(|a, b| {
        b.composite
            .total_cmp(&a.composite)
            .then_with(|| a.line.player_id.cmp(&b.line.player_id))
    });

    let ratings: Vec<Arc<PlayerRating>> = ratings.into_iter().map(Arc::new).collect();
    let index = ratings
        .iter()
        .enumerate()
        .map(|(i, r)| (r.line.player_id.clone(), i))
        .collect();

    let low = baselines.low_confidence().count();
    info!(
        players = ratings.len(),
        window = %window,
        low_confidence_baselines = low,
        "valuation complete"
    );

    Ok(Valuation {
        window,
        pools,
        baselines,
        ratings,
        index,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
