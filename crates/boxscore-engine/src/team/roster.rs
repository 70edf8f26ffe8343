// Roster entries and lineup slot assignment.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::RosterConstraintError;
use crate::position::Position;
use crate::valuation::{PlayerRating, Valuation};

/// Whether a rostered player counts toward team totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterStatus {
    #[default]
    Active,
    #[serde(alias = "reserve", alias = "injured")]
    Bench,
}

/// One player on a fantasy roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub player_id: String,
    #[serde(default)]
    pub status: RosterStatus,
}

/// A fantasy team's roster as supplied in a league snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRoster {
    pub team_id: String,
    #[serde(default)]
    pub name: String,
    pub entries: Vec<RosterEntry>,
}

impl TeamRoster {
    pub fn contains(&self, player_id: &str) -> bool {
        self.entries.iter().any(|e| e.player_id == player_id)
    }
}

/// Rated players on no team's roster, in rating order.
pub fn free_agents<'v>(valuation: &'v Valuation, rosters: &[TeamRoster]) -> Vec<&'v Arc<PlayerRating>> {
    let rostered: BTreeSet<&str> = rosters
        .iter()
        .flat_map(|r| r.entries.iter().map(|e| e.player_id.as_str()))
        .collect();
    valuation
        .ratings
        .iter()
        .filter(|r| !rostered.contains(r.player_id()))
        .collect()
}

// ---------------------------------------------------------------------------
// Slot assignment
// ---------------------------------------------------------------------------

/// Active lineup slots for one team, one entry per slot instance, in display
/// order.
pub fn lineup_slots(config: &EngineConfig) -> Vec<Position> {
    let mut slots: Vec<Position> = config
        .slot_counts()
        .into_iter()
        .filter(|(pos, _)| pos.is_active_slot())
        .flat_map(|(pos, count)| std::iter::repeat(pos).take(count))
        .collect();
    slots.sort_by_key(|p| p.sort_order());
    slots
}

/// Try to seat `player` by finding an augmenting path through the current
/// assignment.
fn augment(
    player: usize,
    eligible: &[Vec<usize>],
    visited: &mut [bool],
    slot_owner: &mut [Option<usize>],
) -> bool {
    for &slot in &eligible[player] {
        if visited[slot] {
            continue;
        }
        visited[slot] = true;
        let free = match slot_owner[slot] {
            None => true,
            Some(other) => augment(other, eligible, visited, slot_owner),
        };
        if free {
            slot_owner[slot] = Some(player);
            return true;
        }
    }
    false
}

/// Assign every active player to a distinct lineup slot.
///
/// `active` pairs player ids with their eligibility and must be sorted by
/// player id for a deterministic assignment. Returns `(player_id, slot)` in
/// slot display order, or the players a maximum matching leaves unplaced.
pub fn assign_slots(
    team_id: &str,
    active: &[(&str, &BTreeSet<Position>)],
    config: &EngineConfig,
) -> Result<Vec<(String, Position)>, RosterConstraintError> {
    let slots = lineup_slots(config);
    let eligible: Vec<Vec<usize>> = active
        .iter()
        .map(|(_, positions)| {
            slots
                .iter()
                .enumerate()
                .filter(|(_, slot)| slot.accepts(positions))
                .map(|(i, _)| i)
                .collect()
        })
        .collect();

    let mut slot_owner: Vec<Option<usize>> = vec![None; slots.len()];
    let mut unplaced = Vec::new();
    for (player, (id, _)) in active.iter().enumerate() {
        let mut visited = vec![false; slots.len()];
        if !augment(player, &eligible, &mut visited, &mut slot_owner) {
            unplaced.push(id.to_string());
        }
    }

    if !unplaced.is_empty() {
        return Err(RosterConstraintError {
            team_id: team_id.to_string(),
            unplaced,
        });
    }

    Ok(slot_owner
        .iter()
        .zip(&slots)
        .filter_map(|(owner, &slot)| owner.map(|p| (active[p].0.to_string(), slot)))
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
