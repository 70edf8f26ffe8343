// Input loading: league snapshot JSON and optional raw player-stat CSV.

use boxscore_engine::stats::{is_identity_field, RawStatRecord};
use boxscore_engine::LeagueSnapshot;
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use crate::config::DataPaths;

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid snapshot JSON in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },
}

// ---------------------------------------------------------------------------
// CSV rows
// ---------------------------------------------------------------------------

/// Numeric stat cells become JSON numbers, blank cells are dropped so the
/// category's missing-value policy applies, anything else stays a string.
/// Identity columns are never retyped.
fn cell_value(header: &str, cell: &str) -> Option<Value> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    if is_identity_field(header) {
        return Some(Value::String(cell.to_string()));
    }
    if let Ok(i) = cell.parse::<i64>() {
        return Some(Value::Number(Number::from(i)));
    }
    match cell.parse::<f64>().ok().and_then(Number::from_f64) {
        Some(n) => Some(Value::Number(n)),
        None => Some(Value::String(cell.to_string())),
    }
}

fn load_records_from_reader<R: Read>(rdr: R) -> Result<Vec<RawStatRecord>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let headers = reader.headers()?.clone();
    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        match result {
            Ok(cells) => {
                let fields: BTreeMap<String, Value> = headers
                    .iter()
                    .zip(cells.iter())
                    .filter_map(|(h, c)| {
                        let h = h.trim();
                        cell_value(h, c).map(|v| (h.to_string(), v))
                    })
                    .collect();
                records.push(RawStatRecord(fields));
            }
            Err(e) => {
                warn!("skipping malformed player row {}: {}", row + 1, e);
            }
        }
    }
    Ok(records)
}

pub fn load_player_records(path: &Path) -> Result<Vec<RawStatRecord>, DataError> {
    let file = std::fs::File::open(path).map_err(|e| DataError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_records_from_reader(file).map_err(|e| DataError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

pub fn load_snapshot(path: &Path) -> Result<LeagueSnapshot, DataError> {
    let text = std::fs::read_to_string(path).map_err(|e| DataError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| DataError::Json {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load the snapshot, replacing its players with the CSV rows when configured.
pub fn load_all(paths: &DataPaths, base_dir: &Path) -> Result<LeagueSnapshot, DataError> {
    let mut snapshot = load_snapshot(&base_dir.join(&paths.snapshot))?;
    if let Some(csv_path) = &paths.players_csv {
        snapshot.players = load_player_records(&base_dir.join(csv_path))?;
        info!("Loaded {} player rows from {}", snapshot.players.len(), csv_path);
    }
    Ok(snapshot)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn csv_cells_parse_numbers_and_skip_blanks() {
        let csv = "id,name,positions,PA,HR,AVG\n\
                   p1,Ana Ortiz,SS/2B,410,12,.281\n\
                   p2,Ben Cho,OF,55,,\n";
        let records = load_records_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);

        let a = &records[0].0;
        assert_eq!(a["name"], Value::String("Ana Ortiz".into()));
        assert_eq!(a["positions"], Value::String("SS/2B".into()));
        assert_eq!(a["PA"].as_f64(), Some(410.0));
        assert_eq!(a["AVG"].as_f64(), Some(0.281));

        let b = &records[1].0;
        assert_eq!(b["PA"], Value::Number(55.into()));
        assert!(!b.contains_key("HR"));
        assert!(!b.contains_key("AVG"));
    }

    #[test]
    fn identity_columns_stay_text() {
        let csv = "player_id,name,positions,PA\n007,Bond,OF,400\n";
        let records = load_records_from_reader(csv.as_bytes()).unwrap();
        let r = &records[0].0;
        assert_eq!(r["player_id"], Value::String("007".into()));
        assert_eq!(r["name"], Value::String("Bond".into()));
        assert_eq!(r["positions"], Value::String("OF".into()));
        assert_eq!(r["PA"], Value::Number(400.into()));
    }

    #[test]
    fn numeric_slot_ids_stay_text_for_the_normalizer() {
        let csv = "playerId,eligibleSlots,IP\n12345,14,40.1\n";
        let records = load_records_from_reader(csv.as_bytes()).unwrap();
        let r = &records[0].0;
        assert_eq!(r["playerId"], Value::String("12345".into()));
        assert_eq!(r["eligibleSlots"], Value::String("14".into()));
        assert_eq!(r["IP"].as_f64(), Some(40.1));
    }

    #[test]
    fn short_rows_are_skipped() {
        let csv = "id,name,PA\np1,One,100\np2\np3,Three,90\n";
        let records = load_records_from_reader(csv.as_bytes()).unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.0["id"].clone()).collect();
        assert_eq!(ids, vec![Value::String("p1".into()), Value::String("p3".into())]);
    }

    #[test]
    fn load_all_replaces_players_from_csv() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("league.json"),
            r#"{"teams": [], "players": [{"id": "old", "name": "Old"}]}"#,
        )
        .unwrap();
        fs::write(tmp.path().join("players.csv"), "id,name,IP\nnew,New,40\n").unwrap();

        let paths = DataPaths {
            snapshot: "league.json".into(),
            players_csv: None,
        };
        let snap = load_all(&paths, tmp.path()).unwrap();
        assert_eq!(snap.players[0].0["id"], Value::String("old".into()));

        let paths = DataPaths {
            players_csv: Some("players.csv".into()),
            ..paths
        };
        let snap = load_all(&paths, tmp.path()).unwrap();
        assert_eq!(snap.players.len(), 1);
        assert_eq!(snap.players[0].0["id"], Value::String("new".into()));
    }

    #[test]
    fn missing_snapshot_is_io_error() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            load_snapshot(&tmp.path().join("nope.json")),
            Err(DataError::Io { .. })
        ));
    }

    #[test]
    fn bad_json_is_reported_with_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("league.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load_snapshot(&path).unwrap_err();
        assert!(err.to_string().contains("league.json"));
    }
}
