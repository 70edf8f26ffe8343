// Stat normalizer: heterogeneous raw records -> canonical PlayerStatLine.
//
// Raw records come from whatever the data-access layer scraped: field names
// vary, values may be null or numeric strings, positions may be tag strings
// or ESPN slot ids. Missing category values are filled by each category's
// declared `MissingPolicy`; nothing is coerced implicitly.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::config::{CategoryDef, EngineConfig, MissingPolicy, StatGroup};
use crate::error::ValidationError;
use crate::position::{eligibility_from_tag, positions_from_espn_slot, Position};
use crate::stats::line::{PlayerStatLine, TimeWindow};

const ID_KEYS: &[&str] = &["player_id", "playerId", "id"];
const NAME_KEYS: &[&str] = &["name", "fullName", "full_name"];
const TEAM_KEYS: &[&str] = &["pro_team", "proTeam", "team"];
const POSITION_KEYS: &[&str] = &["positions", "eligibleSlots", "eligible_positions", "position"];
const GAMES_KEYS: &[&str] = &["games", "G", "GP", "gamesPlayed"];
const WINDOW_KEYS: &[&str] = &["window", "time_window"];
const GROUP_KEYS: &[&str] = &["group", "stat_group"];
const SAMPLE_KEY: &str = "sample_size";

/// Whether `key` names an identity field (id, name, team, positions, window
/// or group) rather than a stat. Identity values are read as text, so loaders
/// must not retype them: "007" is a different id from 7.
pub fn is_identity_field(key: &str) -> bool {
    [ID_KEYS, NAME_KEYS, TEAM_KEYS, POSITION_KEYS, WINDOW_KEYS, GROUP_KEYS]
        .iter()
        .any(|keys| keys.contains(&key))
}

/// One unnormalized record: arbitrary field name -> JSON value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawStatRecord(pub BTreeMap<String, Value>);

impl RawStatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// First non-null value among `keys`.
    fn lookup(&self, keys: &[&str]) -> Option<(&str, &Value)> {
        keys.iter().find_map(|k| match self.0.get_key_value(*k) {
            Some((key, v)) if !v.is_null() => Some((key.as_str(), v)),
            _ => None,
        })
    }
}

impl From<&PlayerStatLine> for RawStatRecord {
    /// Canonical form of a line, using the canonical field names.
    fn from(line: &PlayerStatLine) -> Self {
        let mut rec = RawStatRecord::new()
            .with("player_id", line.player_id.clone())
            .with("name", line.name.clone())
            .with(
                "positions",
                line.positions
                    .iter()
                    .map(|p| Value::from(p.display_str()))
                    .collect::<Vec<_>>(),
            )
            .with(
                "group",
                match line.group {
                    StatGroup::Batting => "batting",
                    StatGroup::Pitching => "pitching",
                },
            )
            .with(SAMPLE_KEY, line.sample_size)
            .with("games", line.games)
            .with("window", line.window.to_string());
        if let Some(team) = &line.pro_team {
            rec = rec.with("pro_team", team.clone());
        }
        for (cat, &v) in &line.values {
            rec = rec.with(cat, v);
        }
        rec
    }
}

// ---------------------------------------------------------------------------
// Field parsing
// ---------------------------------------------------------------------------

/// Record parsed up to (but not including) missing-value filling.
struct ParsedRecord {
    player_id: String,
    name: String,
    pro_team: Option<String>,
    positions: BTreeSet<Position>,
    group: StatGroup,
    reported: BTreeMap<String, f64>,
    sample_size: f64,
    games: f64,
    window: TimeWindow,
}

fn value_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_number(player_id: &str, field: &str, v: &Value) -> Result<f64, ValidationError> {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(x) if x.is_finite() => Ok(x),
        _ => Err(ValidationError::NotNumeric {
            player_id: player_id.to_string(),
            field: field.to_string(),
            value: v.to_string(),
        }),
    }
}

fn non_negative(player_id: &str, field: &str, value: f64) -> Result<f64, ValidationError> {
    if value < 0.0 {
        return Err(ValidationError::NegativeValue {
            player_id: player_id.to_string(),
            field: field.to_string(),
            value,
        });
    }
    Ok(value)
}

fn parse_tag(player_id: &str, tag: &str, out: &mut BTreeSet<Position>) -> Result<(), ValidationError> {
    let expanded = eligibility_from_tag(tag).ok_or_else(|| ValidationError::UnknownPosition {
        player_id: player_id.to_string(),
        tag: tag.to_string(),
    })?;
    out.extend(expanded);
    Ok(())
}

/// Positions may be a list of tags, a list of ESPN slot ids, or a single
/// string separated by `/` or `,`. Numeric items inside a string are slot ids.
fn parse_positions(player_id: &str, v: &Value) -> Result<BTreeSet<Position>, ValidationError> {
    let mut out = BTreeSet::new();
    let items: Vec<&Value> = match v {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    for item in items {
        match item {
            Value::Number(n) => {
                // Unknown ESPN slot ids are ignored: ESPN emits many slots
                // that carry no eligibility.
                if let Some(id) = n.as_u64().and_then(|id| u16::try_from(id).ok()) {
                    out.extend(positions_from_espn_slot(id));
                }
            }
            Value::String(s) => {
                for tag in s.split(['/', ',']).map(str::trim).filter(|t| !t.is_empty()) {
                    match tag.parse::<u16>() {
                        Ok(id) => out.extend(positions_from_espn_slot(id)),
                        Err(_) => parse_tag(player_id, tag, &mut out)?,
                    }
                }
            }
            Value::Null => {}
            other => {
                return Err(ValidationError::UnknownPosition {
                    player_id: player_id.to_string(),
                    tag: other.to_string(),
                })
            }
        }
    }
    Ok(out)
}

/// Decide batting vs pitching. An explicit group field wins; otherwise a
/// line whose positions are all pitching positions is a pitching line; with
/// no positions at all, the presence of the pitching sample field decides.
fn infer_group(
    raw: &RawStatRecord,
    player_id: &str,
    positions: &BTreeSet<Position>,
    config: &EngineConfig,
) -> Result<StatGroup, ValidationError> {
    if let Some((field, v)) = raw.lookup(GROUP_KEYS) {
        return match value_to_string(v).map(|s| s.to_lowercase()).as_deref() {
            Some("batting") | Some("hitting") | Some("hitter") => Ok(StatGroup::Batting),
            Some("pitching") | Some("pitcher") => Ok(StatGroup::Pitching),
            _ => Err(ValidationError::NotNumeric {
                player_id: player_id.to_string(),
                field: field.to_string(),
                value: v.to_string(),
            }),
        };
    }
    if !positions.is_empty() {
        return Ok(if positions.iter().all(Position::is_pitcher) {
            StatGroup::Pitching
        } else {
            StatGroup::Batting
        });
    }
    let has_pitching = raw.lookup(&[config.samples.pitching.as_str()]).is_some();
    let has_batting = raw.lookup(&[config.samples.batting.as_str()]).is_some();
    Ok(if has_pitching && !has_batting {
        StatGroup::Pitching
    } else {
        StatGroup::Batting
    })
}

fn category_keys(cat: &CategoryDef) -> Vec<&str> {
    std::iter::once(cat.name.as_str())
        .chain(cat.aliases.iter().map(String::as_str))
        .collect()
}

fn parse_record(
    index: usize,
    raw: &RawStatRecord,
    config: &EngineConfig,
) -> Result<ParsedRecord, ValidationError> {
    let player_id = raw
        .lookup(ID_KEYS)
        .and_then(|(_, v)| value_to_string(v))
        .ok_or_else(|| ValidationError::MissingField {
            index,
            field: "player_id".into(),
        })?;
    let pid = player_id.as_str();

    let name = raw
        .lookup(NAME_KEYS)
        .and_then(|(_, v)| value_to_string(v))
        .unwrap_or_else(|| player_id.clone());
    let pro_team = raw.lookup(TEAM_KEYS).and_then(|(_, v)| value_to_string(v));

    let positions = match raw.lookup(POSITION_KEYS) {
        Some((_, v)) => parse_positions(pid, v)?,
        None => BTreeSet::new(),
    };
    let group = infer_group(raw, pid, &positions, config)?;

    let window = match raw.lookup(WINDOW_KEYS) {
        Some((_, v)) => {
            let text = value_to_string(v).unwrap_or_default();
            text.parse().map_err(|_| ValidationError::InvalidWindow {
                player_id: player_id.clone(),
                value: v.to_string(),
            })?
        }
        None => TimeWindow::SeasonToDate,
    };

    let sample_keys = [SAMPLE_KEY, config.samples.for_group(group)];
    let sample_size = match raw.lookup(&sample_keys) {
        Some((field, v)) => non_negative(pid, field, parse_number(pid, field, v)?)?,
        None => 0.0,
    };
    let games = match raw.lookup(GAMES_KEYS) {
        Some((field, v)) => non_negative(pid, field, parse_number(pid, field, v)?)?,
        None => 0.0,
    };

    let mut reported = BTreeMap::new();
    for cat in config.categories_for(group) {
        if let Some((field, v)) = raw.lookup(&category_keys(cat)) {
            let value = parse_number(pid, field, v)?;
            if cat.non_negative {
                non_negative(pid, &cat.name, value)?;
            }
            reported.insert(cat.name.clone(), value);
        }
    }

    Ok(ParsedRecord {
        player_id,
        name,
        pro_team,
        positions,
        group,
        reported,
        sample_size,
        games,
        window,
    })
}

// ---------------------------------------------------------------------------
// Missing-value defaults
// ---------------------------------------------------------------------------

/// League average of a category over the records that report it.
///
/// Rates are weighted by sample size (falling back to a plain mean when no
/// reporting record has a sample); counts use a plain mean.
fn league_average(cat: &CategoryDef, records: &[ParsedRecord]) -> f64 {
    let reporting: Vec<(f64, f64)> = records
        .iter()
        .filter(|r| r.group == cat.group)
        .filter_map(|r| r.reported.get(&cat.name).map(|&v| (v, r.sample_size)))
        .collect();
    if reporting.is_empty() {
        return 0.0;
    }
    let total_sample: f64 = reporting.iter().map(|(_, s)| s).sum();
    if cat.is_rate() && total_sample > 0.0 {
        reporting.iter().map(|(v, s)| v * s).sum::<f64>() / total_sample
    } else {
        reporting.iter().map(|(v, _)| v).sum::<f64>() / reporting.len() as f64
    }
}

/// Normalize a batch of raw records into canonical stat lines.
///
/// Output order follows input order. Fails on the first record that lacks a
/// player id, carries a non-numeric or negative value where that is not
/// allowed, or repeats a player id.
pub fn normalize_records(
    records: &[RawStatRecord],
    config: &EngineConfig,
) -> Result<Vec<PlayerStatLine>, ValidationError> {
    let mut parsed = Vec::with_capacity(records.len());
    let mut seen = BTreeSet::new();
    for (index, raw) in records.iter().enumerate() {
        let rec = parse_record(index, raw, config)?;
        if !seen.insert(rec.player_id.clone()) {
            return Err(ValidationError::DuplicatePlayer {
                player_id: rec.player_id,
            });
        }
        parsed.push(rec);
    }

    let defaults: BTreeMap<&str, f64> = config
        .categories
        .iter()
        .map(|cat| {
            let value = match cat.missing {
                MissingPolicy::Zero => 0.0,
                MissingPolicy::Fixed(v) => v,
                MissingPolicy::LeagueAverage => league_average(cat, &parsed),
            };
            (cat.name.as_str(), value)
        })
        .collect();

    let mut filled = 0usize;
    let lines: Vec<PlayerStatLine> = parsed
        .into_iter()
        .map(|rec| {
            let mut values = BTreeMap::new();
            for cat in config.categories_for(rec.group) {
                let v = match rec.reported.get(&cat.name) {
                    Some(&v) => v,
                    None => {
                        filled += 1;
                        defaults[cat.name.as_str()]
                    }
                };
                values.insert(cat.name.clone(), v);
            }
            PlayerStatLine {
                player_id: rec.player_id,
                name: rec.name,
                pro_team: rec.pro_team,
                positions: rec.positions,
                group: rec.group,
                values,
                sample_size: rec.sample_size,
                games: rec.games,
                window: rec.window,
            }
        })
        .collect();

    debug!(
        "Normalized {} records ({} missing category values defaulted)",
        lines.len(),
        filled
    );
    Ok(lines)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use serde_json::json;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn raw(value: Value) -> RawStatRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn canonical_hitter_fields() {
        let records = vec![raw(json!({
            "playerId": 101,
            "fullName": "Hit Ter",
            "proTeam": "NYY",
            "eligibleSlots": [4, 6, 12, 16],
            "PA": 400,
            "G": 95,
            "R": 60, "HR": "18", "AVG": 0.281
        }))];
        let lines = normalize_records(&records, &test_config()).unwrap();
        let line = &lines[0];
        assert_eq!(line.player_id, "101");
        assert_eq!(line.name, "Hit Ter");
        assert_eq!(line.pro_team.as_deref(), Some("NYY"));
        assert_eq!(line.group, StatGroup::Batting);
        assert!(line.positions.contains(&Position::ShortStop));
        assert!(line.positions.contains(&Position::SecondBase));
        assert_eq!(line.positions.len(), 2);
        assert_eq!(line.sample_size, 400.0);
        assert_eq!(line.games, 95.0);
        assert_eq!(line.value("HR"), Some(18.0));
        // Only batting categories are carried.
        assert_eq!(line.values.len(), 3);
        assert_eq!(line.window, TimeWindow::SeasonToDate);
    }

    #[test]
    fn position_string_forms() {
        let records = vec![
            raw(json!({"id": "a", "positions": "2B/SS"})),
            raw(json!({"id": "b", "positions": "OF, DH"})),
            raw(json!({"id": "c", "positions": ["SP", "RP"]})),
        ];
        let lines = normalize_records(&records, &test_config()).unwrap();
        assert_eq!(lines[0].positions.len(), 2);
        assert!(lines[1].positions.contains(&Position::CenterField));
        assert!(lines[1].positions.contains(&Position::DesignatedHitter));
        assert_eq!(lines[2].group, StatGroup::Pitching);
    }

    #[test]
    fn numeric_slot_ids_inside_strings() {
        let records = vec![raw(json!({"id": "a", "eligibleSlots": "14"}))];
        let lines = normalize_records(&records, &test_config()).unwrap();
        assert!(lines[0].positions.contains(&Position::StartingPitcher));
        assert_eq!(lines[0].group, StatGroup::Pitching);
    }

    #[test]
    fn identity_fields_are_recognized() {
        for key in ["player_id", "playerId", "id", "fullName", "proTeam", "eligibleSlots", "window"] {
            assert!(is_identity_field(key), "{key}");
        }
        for key in ["PA", "HR", "games", "sample_size"] {
            assert!(!is_identity_field(key), "{key}");
        }
    }

    #[test]
    fn missing_player_id_is_validation_error() {
        let records = vec![
            raw(json!({"player_id": "ok"})),
            raw(json!({"name": "No Id", "HR": 3})),
        ];
        let err = normalize_records(&records, &test_config()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingField {
                index: 1,
                field: "player_id".into()
            }
        );
    }

    #[test]
    fn null_player_id_is_missing() {
        let records = vec![raw(json!({"player_id": null, "id": null}))];
        assert!(matches!(
            normalize_records(&records, &test_config()),
            Err(ValidationError::MissingField { .. })
        ));
    }

    #[test]
    fn negative_games_rejected() {
        let records = vec![raw(json!({"player_id": "p", "G": -1}))];
        let err = normalize_records(&records, &test_config()).unwrap_err();
        assert!(matches!(err, ValidationError::NegativeValue { ref field, .. } if field == "G"));
    }

    #[test]
    fn negative_count_category_rejected() {
        let records = vec![raw(json!({"player_id": "p", "positions": "1B", "HR": -2}))];
        let err = normalize_records(&records, &test_config()).unwrap_err();
        assert!(matches!(err, ValidationError::NegativeValue { ref field, .. } if field == "HR"));
    }

    #[test]
    fn non_numeric_value_is_not_coerced() {
        let records = vec![raw(json!({"player_id": "p", "positions": "1B", "HR": "lots"}))];
        let err = normalize_records(&records, &test_config()).unwrap_err();
        assert!(matches!(err, ValidationError::NotNumeric { ref field, .. } if field == "HR"));
    }

    #[test]
    fn unknown_position_tag_rejected() {
        let records = vec![raw(json!({"player_id": "p", "positions": "QB"}))];
        assert!(matches!(
            normalize_records(&records, &test_config()),
            Err(ValidationError::UnknownPosition { .. })
        ));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let records = vec![
            raw(json!({"player_id": "p"})),
            raw(json!({"player_id": "p"})),
        ];
        assert_eq!(
            normalize_records(&records, &test_config()).unwrap_err(),
            ValidationError::DuplicatePlayer {
                player_id: "p".into()
            }
        );
    }

    #[test]
    fn missing_count_defaults_to_zero_and_rate_to_weighted_average() {
        let records = vec![
            raw(json!({"player_id": "a", "positions": "1B", "PA": 300, "AVG": 0.300, "HR": 10})),
            raw(json!({"player_id": "b", "positions": "1B", "PA": 100, "AVG": 0.200, "HR": 5})),
            raw(json!({"player_id": "c", "positions": "1B", "PA": 50})),
        ];
        let lines = normalize_records(&records, &test_config()).unwrap();
        let c = &lines[2];
        assert_eq!(c.value("HR"), Some(0.0));
        assert_eq!(c.value("R"), Some(0.0));
        // (0.300*300 + 0.200*100) / 400 = 0.275
        assert!(approx_eq(c.value("AVG").unwrap(), 0.275, 1e-12));
    }

    #[test]
    fn fixed_policy_applies() {
        let mut config = test_config();
        config
            .categories
            .iter_mut()
            .find(|c| c.name == "ERA")
            .unwrap()
            .missing = MissingPolicy::Fixed(4.5);
        let records = vec![raw(json!({"player_id": "p", "positions": "SP", "IP": 10}))];
        let lines = normalize_records(&records, &config).unwrap();
        assert_eq!(lines[0].value("ERA"), Some(4.5));
    }

    #[test]
    fn category_alias_is_read() {
        let records = vec![raw(json!({"player_id": "p", "positions": "SP", "SO": 45}))];
        let lines = normalize_records(&records, &test_config()).unwrap();
        assert_eq!(lines[0].value("K"), Some(45.0));
    }

    #[test]
    fn group_inferred_from_sample_field_without_positions() {
        let records = vec![raw(json!({"player_id": "p", "IP": 12.0}))];
        let lines = normalize_records(&records, &test_config()).unwrap();
        assert_eq!(lines[0].group, StatGroup::Pitching);
        assert_eq!(lines[0].sample_size, 12.0);
    }

    #[test]
    fn window_tag_parsed_and_invalid_rejected() {
        let ok = vec![raw(json!({"player_id": "p", "window": "last_14"}))];
        assert_eq!(
            normalize_records(&ok, &test_config()).unwrap()[0].window,
            TimeWindow::LastDays(14)
        );
        let bad = vec![raw(json!({"player_id": "p", "window": "fortnight"}))];
        assert!(matches!(
            normalize_records(&bad, &test_config()),
            Err(ValidationError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn normalizing_canonical_lines_is_a_no_op() {
        let records = vec![
            raw(json!({"playerId": 7, "positions": "OF", "PA": 210, "G": 50, "R": 31, "AVG": 0.250, "window": "last_30"})),
            raw(json!({"playerId": 8, "positions": "SP", "IP": 40.1, "G": 7, "SO": 44, "ERA": "3.12"})),
            raw(json!({"playerId": 9, "positions": "C", "PA": 12})),
        ];
        let config = test_config();
        let first = normalize_records(&records, &config).unwrap();
        let canonical: Vec<RawStatRecord> = first.iter().map(RawStatRecord::from).collect();
        let second = normalize_records(&canonical, &config).unwrap();
        assert_eq!(first, second);
    }
}
