// Engine configuration: scoring categories, roster slots, optimizer limits.
//
// The engine never reads configuration from ambient state. Every entry point
// takes an `&EngineConfig`, so parallel callers can use different settings.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::ValidationError;
use crate::position::Position;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub league: LeagueSettings,
    pub categories: Vec<CategoryDef>,
    #[serde(default)]
    pub samples: SampleFields,
    pub optimizer: OptimizerConstraints,
    #[serde(default)]
    pub streaming: StreamingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueSettings {
    pub num_teams: usize,
    /// Lineup slot tag -> slots per team, e.g. `{"C": 1, "OF": 3, "SP": 5, "BE": 6}`.
    pub roster: BTreeMap<String, usize>,
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Which kind of stat line a category applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatGroup {
    Batting,
    Pitching,
}

/// Counting stats are summed; rate stats are averaged weighted by sample size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Count,
    Rate,
}

/// What a missing category value becomes during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    Zero,
    /// Sample-weighted mean over the records that report the category.
    LeagueAverage,
    Fixed(f64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDef {
    pub name: String,
    pub group: StatGroup,
    pub kind: CategoryKind,
    #[serde(default)]
    pub lower_is_better: bool,
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Required: the missing-value policy is never implied.
    pub missing: MissingPolicy,
    #[serde(default = "default_true")]
    pub non_negative: bool,
    /// Minimum sample size to enter baseline and pool computation.
    #[serde(default)]
    pub min_sample: f64,
    /// Alternate field names accepted in raw records.
    #[serde(default)]
    pub aliases: Vec<String>,
}

fn default_weight() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

impl CategoryDef {
    pub fn is_rate(&self) -> bool {
        self.kind == CategoryKind::Rate
    }

    /// +1.0 when higher is better, -1.0 when lower is better.
    pub fn direction(&self) -> f64 {
        if self.lower_is_better {
            -1.0
        } else {
            1.0
        }
    }
}

/// Raw field that carries the sample size for each stat group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleFields {
    pub batting: String,
    pub pitching: String,
}

impl Default for SampleFields {
    fn default() -> Self {
        SampleFields {
            batting: "PA".into(),
            pitching: "IP".into(),
        }
    }
}

impl SampleFields {
    pub fn for_group(&self, group: StatGroup) -> &str {
        match group {
            StatGroup::Batting => &self.batting,
            StatGroup::Pitching => &self.pitching,
        }
    }
}

// ---------------------------------------------------------------------------
// Optimizer and streaming
// ---------------------------------------------------------------------------

/// Hard limits for one optimization call. Negative caps parse and are
/// reported as infeasible by the optimizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConstraints {
    pub max_starts: i64,
    pub max_transactions: i64,
    #[serde(default = "default_exchange_passes")]
    pub max_exchange_passes: usize,
    /// Fraction of the displaced roster player's value charged per acquisition.
    #[serde(default = "default_displacement_weight")]
    pub displacement_weight: f64,
}

fn default_exchange_passes() -> usize {
    4
}

fn default_displacement_weight() -> f64 {
    0.5
}

/// Parameters for turning a rating and a game context into start value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Value of a start by a replacement-level player in a neutral matchup.
    pub base_start_value: f64,
    /// Added start value per unit of composite value over replacement.
    pub rating_scale: f64,
    /// League-average strikeout rate, in percent.
    pub league_k_rate: f64,
    /// Offense rating a game needs before its hitters are worth streaming.
    #[serde(default = "default_hitter_stream_rating")]
    pub hitter_stream_rating: f64,
}

fn default_hitter_stream_rating() -> f64 {
    105.0
}

impl Default for StreamingConfig {
    fn default() -> Self {
        StreamingConfig {
            base_start_value: 10.0,
            rating_scale: 2.0,
            league_k_rate: 22.0,
            hitter_stream_rating: default_hitter_stream_rating(),
        }
    }
}

// ---------------------------------------------------------------------------
// Accessors and validation
// ---------------------------------------------------------------------------

impl EngineConfig {
    pub fn category(&self, name: &str) -> Option<&CategoryDef> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn categories_for(&self, group: StatGroup) -> impl Iterator<Item = &CategoryDef> {
        self.categories.iter().filter(move |c| c.group == group)
    }

    /// Parsed lineup slots per team. Unknown tags were rejected by `validate`,
    /// so they are skipped here.
    pub fn slot_counts(&self) -> BTreeMap<Position, usize> {
        self.league
            .roster
            .iter()
            .filter_map(|(key, &count)| Position::from_str_pos(key).map(|p| (p, count)))
            .fold(BTreeMap::new(), |mut acc, (pos, count)| {
                *acc.entry(pos).or_insert(0) += count;
                acc
            })
    }

    /// Slots at a position across the whole league.
    pub fn league_slots(&self, pos: Position) -> usize {
        self.slot_counts().get(&pos).copied().unwrap_or(0) * self.league.num_teams
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.league.num_teams == 0 {
            return Err(config_error("league.num_teams", "must be greater than 0"));
        }

        for key in self.league.roster.keys() {
            if Position::from_str_pos(key).is_none() {
                return Err(config_error(
                    "league.roster",
                    format!("unknown slot `{key}`"),
                ));
            }
        }
        if !self.slot_counts().iter().any(|(p, &n)| p.is_active_slot() && n > 0) {
            return Err(config_error("league.roster", "no active lineup slots"));
        }

        if self.categories.is_empty() {
            return Err(config_error("categories", "at least one category is required"));
        }

        let mut seen = BTreeSet::new();
        for cat in &self.categories {
            if cat.name.trim().is_empty() {
                return Err(config_error("categories.name", "must not be empty"));
            }
            if !seen.insert(cat.name.as_str()) {
                return Err(config_error(
                    "categories.name",
                    format!("duplicate category `{}`", cat.name),
                ));
            }
            if !cat.weight.is_finite() || cat.weight <= 0.0 {
                return Err(config_error(
                    &format!("categories.{}.weight", cat.name),
                    format!("must be > 0, got {}", cat.weight),
                ));
            }
            if !cat.min_sample.is_finite() || cat.min_sample < 0.0 {
                return Err(config_error(
                    &format!("categories.{}.min_sample", cat.name),
                    format!("must be >= 0, got {}", cat.min_sample),
                ));
            }
            if let MissingPolicy::Fixed(v) = cat.missing {
                if !v.is_finite() {
                    return Err(config_error(
                        &format!("categories.{}.missing", cat.name),
                        "fixed default must be finite",
                    ));
                }
            }
        }

        let w = self.optimizer.displacement_weight;
        if !w.is_finite() || w < 0.0 {
            return Err(config_error(
                "optimizer.displacement_weight",
                format!("must be >= 0, got {w}"),
            ));
        }

        let s = &self.streaming;
        if !s.league_k_rate.is_finite() || s.league_k_rate <= 0.0 {
            return Err(config_error(
                "streaming.league_k_rate",
                format!("must be > 0, got {}", s.league_k_rate),
            ));
        }
        if !s.hitter_stream_rating.is_finite() {
            return Err(config_error(
                "streaming.hitter_stream_rating",
                format!("must be a number, got {}", s.hitter_stream_rating),
            ));
        }

        Ok(())
    }
}

fn config_error(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError::Config {
        field: field.to_string(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Shared test fixture
// ---------------------------------------------------------------------------

/// A small two-team league used across the engine's unit tests.
#[cfg(test)]
pub(crate) fn test_config() -> EngineConfig {
    fn cat(
        name: &str,
        group: StatGroup,
        kind: CategoryKind,
        lower_is_better: bool,
        missing: MissingPolicy,
        min_sample: f64,
    ) -> CategoryDef {
        CategoryDef {
            name: name.into(),
            group,
            kind,
            lower_is_better,
            weight: 1.0,
            missing,
            non_negative: true,
            min_sample,
            aliases: Vec::new(),
        }
    }

    let mut roster = BTreeMap::new();
    roster.insert("C".into(), 1);
    roster.insert("1B".into(), 1);
    roster.insert("SS".into(), 1);
    roster.insert("OF".into(), 2);
    roster.insert("UTIL".into(), 1);
    roster.insert("SP".into(), 2);
    roster.insert("RP".into(), 1);
    roster.insert("BE".into(), 3);

    let mut k = cat("K", StatGroup::Pitching, CategoryKind::Count, false, MissingPolicy::Zero, 0.0);
    k.aliases = vec!["SO".into()];

    EngineConfig {
        league: LeagueSettings {
            num_teams: 2,
            roster,
        },
        categories: vec![
            cat("R", StatGroup::Batting, CategoryKind::Count, false, MissingPolicy::Zero, 0.0),
            cat("HR", StatGroup::Batting, CategoryKind::Count, false, MissingPolicy::Zero, 0.0),
            cat("AVG", StatGroup::Batting, CategoryKind::Rate, false, MissingPolicy::LeagueAverage, 50.0),
            k,
            cat("W", StatGroup::Pitching, CategoryKind::Count, false, MissingPolicy::Zero, 0.0),
            cat("ERA", StatGroup::Pitching, CategoryKind::Rate, true, MissingPolicy::LeagueAverage, 20.0),
        ],
        samples: SampleFields::default(),
        optimizer: OptimizerConstraints {
            max_starts: 7,
            max_transactions: 2,
            max_exchange_passes: 4,
            displacement_weight: 0.5,
        },
        streaming: StreamingConfig::default(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_is_valid() {
        test_config().validate().expect("fixture config should validate");
    }

    #[test]
    fn slot_counts_parse_tags() {
        let config = test_config();
        let slots = config.slot_counts();
        assert_eq!(slots.get(&Position::Outfield), Some(&2));
        assert_eq!(slots.get(&Position::StartingPitcher), Some(&2));
        assert_eq!(config.league_slots(Position::StartingPitcher), 4);
        assert_eq!(config.league_slots(Position::ThirdBase), 0);
    }

    #[test]
    fn rejects_num_teams_zero() {
        let mut config = test_config();
        config.league.num_teams = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ValidationError::Config { ref field, .. } if field == "league.num_teams"));
    }

    #[test]
    fn rejects_unknown_slot() {
        let mut config = test_config();
        config.league.roster.insert("QB".into(), 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_category() {
        let mut config = test_config();
        let dup = config.categories[0].clone();
        config.categories.push(dup);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate category `R`"));
    }

    #[test]
    fn rejects_zero_weight() {
        let mut config = test_config();
        config.categories[1].weight = 0.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ValidationError::Config { ref field, .. } if field == "categories.HR.weight"));
    }

    #[test]
    fn rejects_negative_floor() {
        let mut config = test_config();
        config.categories[2].min_sample = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_optimizer_caps_are_not_a_config_error() {
        // Reported as infeasible by the optimizer instead.
        let mut config = test_config();
        config.optimizer.max_transactions = -1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn streaming_threshold_defaults_when_absent() {
        let parsed: StreamingConfig =
            toml::from_str("base_start_value = 8.0\nrating_scale = 1.5\nleague_k_rate = 23.0\n").unwrap();
        assert_eq!(parsed.hitter_stream_rating, 105.0);

        let mut config = test_config();
        config.streaming.hitter_stream_rating = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::Config { ref field, .. }) if field == "streaming.hitter_stream_rating"
        ));
    }

    #[test]
    fn missing_policy_toml_forms() {
        #[derive(Deserialize)]
        struct Wrap {
            a: MissingPolicy,
            b: MissingPolicy,
            c: MissingPolicy,
        }
        let parsed: Wrap = toml::from_str(
            "a = \"zero\"\nb = \"league_average\"\nc = { fixed = 4.25 }\n",
        )
        .unwrap();
        assert_eq!(parsed.a, MissingPolicy::Zero);
        assert_eq!(parsed.b, MissingPolicy::LeagueAverage);
        assert_eq!(parsed.c, MissingPolicy::Fixed(4.25));
    }

    #[test]
    fn direction_flips_lower_is_better() {
        let config = test_config();
        assert_eq!(config.category("ERA").unwrap().direction(), -1.0);
        assert_eq!(config.category("HR").unwrap().direction(), 1.0);
    }
}
