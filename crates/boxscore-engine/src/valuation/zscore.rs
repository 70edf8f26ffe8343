// Per-category pool statistics and standardized scores with sample floors.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::{CategoryDef, EngineConfig};
use crate::stats::PlayerStatLine;

// ---------------------------------------------------------------------------
// Pool statistics
// ---------------------------------------------------------------------------

/// Mean and spread for a single category across its eligible pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PoolStats {
    pub mean: f64,
    pub stdev: f64,
}

/// Threshold below which standard deviation is treated as zero.
pub const STDEV_EPSILON: f64 = 1e-9;

/// Compute mean and sample standard deviation (N - 1 denominator).
///
/// Returns zero stdev for fewer than two values and `{0, 0}` for an empty
/// slice.
pub fn compute_pool_stats(values: &[f64]) -> PoolStats {
    if values.is_empty() {
        return PoolStats {
            mean: 0.0,
            stdev: 0.0,
        };
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return PoolStats { mean, stdev: 0.0 };
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    PoolStats {
        mean,
        stdev: variance.sqrt(),
    }
}

/// Spread-normalized distance of `value` from `reference`.
///
/// Returns 0.0 if the spread is approximately zero; a degenerate category
/// contributes nothing.
pub fn standardize(value: f64, reference: f64, stats: &PoolStats) -> f64 {
    if stats.stdev < STDEV_EPSILON {
        return 0.0;
    }
    (value - reference) / stats.stdev
}

/// Standard z-score against the pool mean.
pub fn compute_zscore(value: f64, stats: &PoolStats) -> f64 {
    standardize(value, stats.mean, stats)
}

/// Pull a small-sample value toward the mean.
///
/// The retained share of the deviation is `sample / floor`, so a player at
/// half the floor keeps half their distance from the mean.
pub fn shrink_toward_mean(value: f64, mean: f64, sample: f64, floor: f64) -> f64 {
    if floor <= 0.0 || sample >= floor {
        return value;
    }
    let retained = (sample / floor).clamp(0.0, 1.0);
    mean + (value - mean) * retained
}

/// Statistics for one category's eligible pool.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryPoolStats {
    pub category: String,
    pub stats: PoolStats,
    /// Players meeting the category's sample floor.
    pub eligible: usize,
}

/// Whether a line meets a category's minimum sample.
pub fn meets_floor(line: &PlayerStatLine, cat: &CategoryDef) -> bool {
    line.sample_size >= cat.min_sample
}

/// Compute pool statistics for every configured category.
///
/// The pool for a category is every line of the category's stat group that
/// meets its sample floor.
pub fn compute_category_pools(
    lines: &[PlayerStatLine],
    config: &EngineConfig,
) -> BTreeMap<String, CategoryPoolStats> {
    config
        .categories
        .iter()
        .map(|cat| {
            let values: Vec<f64> = lines
                .iter()
                .filter(|l| l.group == cat.group && meets_floor(l, cat))
                .filter_map(|l| l.value(&cat.name))
                .collect();
            let pool = CategoryPoolStats {
                category: cat.name.clone(),
                stats: compute_pool_stats(&values),
                eligible: values.len(),
            };
            (cat.name.clone(), pool)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Per-player category scoring
// ---------------------------------------------------------------------------

/// One player's standing in one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryScore {
    /// Value as reported.
    pub raw: f64,
    /// Value used for scoring (shrunk for below-floor rate samples).
    pub value: f64,
    pub shrunk: bool,
    /// Whether the player counted toward pool stats and baselines.
    pub in_pool: bool,
    /// Oriented z-score: positive is good, even for lower-is-better categories.
    pub zscore: f64,
    /// Oriented distance above the replacement baseline at the player's best
    /// position, in spread units.
    pub over_replacement: f64,
}

/// Score one category for one line. `over_replacement` is filled by the
/// replacement stage.
pub fn score_category(
    line: &PlayerStatLine,
    cat: &CategoryDef,
    pool: &CategoryPoolStats,
) -> Option<CategoryScore> {
    let raw = line.value(&cat.name)?;
    let in_pool = meets_floor(line, cat);
    let value = if cat.is_rate() && !in_pool {
        shrink_toward_mean(raw, pool.stats.mean, line.sample_size, cat.min_sample)
    } else {
        raw
    };
    Some(CategoryScore {
        raw,
        value,
        shrunk: value != raw,
        in_pool,
        zscore: cat.direction() * compute_zscore(value, &pool.stats),
        over_replacement: 0.0,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
