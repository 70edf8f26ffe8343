// Team category totals built from a roster of ratings.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

use crate::config::{CategoryDef, CategoryKind, EngineConfig};
use crate::error::{EngineError, ValidationError};
use crate::position::Position;
use crate::stats::PlayerStatLine;
use crate::team::roster::{assign_slots, RosterStatus, TeamRoster};
use crate::valuation::{PlayerRating, Valuation};

// ---------------------------------------------------------------------------
// Category totals
// ---------------------------------------------------------------------------

/// Accumulated total for one category.
///
/// Counts keep a plain sum. Rates keep `Σ value × weight` and `Σ weight` so
/// that totals merge by sample rather than by averaging averages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub kind: CategoryKind,
    pub sum: f64,
    pub weight: f64,
}

impl CategoryTotal {
    pub fn new(kind: CategoryKind) -> Self {
        CategoryTotal {
            kind,
            sum: 0.0,
            weight: 0.0,
        }
    }

    /// Add a contribution. `weight` is ignored for counts.
    pub fn record(&mut self, value: f64, weight: f64) {
        match self.kind {
            CategoryKind::Count => self.sum += value,
            CategoryKind::Rate => {
                self.sum += value * weight;
                self.weight += weight;
            }
        }
    }

    pub fn merge(&mut self, other: &CategoryTotal) {
        self.sum += other.sum;
        self.weight += other.weight;
    }

    /// The category's displayed value: the sum for counts, the
    /// weight-averaged rate for rates (zero with no weight).
    pub fn value(&self) -> f64 {
        match self.kind {
            CategoryKind::Count => self.sum,
            CategoryKind::Rate if self.weight > 0.0 => self.sum / self.weight,
            CategoryKind::Rate => 0.0,
        }
    }
}

/// Totals for every configured category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CategoryTotals(pub BTreeMap<String, CategoryTotal>);

impl CategoryTotals {
    /// Zeroed totals for every configured category.
    pub fn empty(config: &EngineConfig) -> Self {
        CategoryTotals(
            config
                .categories
                .iter()
                .map(|c| (c.name.clone(), CategoryTotal::new(c.kind)))
                .collect(),
        )
    }

    pub fn get(&self, category: &str) -> Option<&CategoryTotal> {
        self.0.get(category)
    }

    pub fn value(&self, category: &str) -> Option<f64> {
        self.get(category).map(CategoryTotal::value)
    }

    pub fn record(&mut self, cat: &CategoryDef, value: f64, weight: f64) {
        self.0
            .entry(cat.name.clone())
            .or_insert_with(|| CategoryTotal::new(cat.kind))
            .record(value, weight);
    }

    /// Add a full stat line, weighting rates by its sample size.
    pub fn add_line(&mut self, line: &PlayerStatLine, config: &EngineConfig) {
        for cat in config.categories_for(line.group) {
            if let Some(v) = line.value(&cat.name) {
                self.record(cat, v, line.sample_size);
            }
        }
    }

    pub fn merge(&mut self, other: &CategoryTotals) {
        for (name, total) in &other.0 {
            self.0
                .entry(name.clone())
                .and_modify(|t| t.merge(total))
                .or_insert(*total);
        }
    }
}

// ---------------------------------------------------------------------------
// Team snapshot
// ---------------------------------------------------------------------------

/// A rostered player's rating with their lineup status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterMember {
    pub rating: Arc<PlayerRating>,
    pub status: RosterStatus,
    /// Lineup slot for active players.
    pub slot: Option<Position>,
}

/// A team's roster and the category totals derived from it.
///
/// Snapshots depend only on the league snapshot, not on the scoring period,
/// so they carry no stamp of their own. They leave the engine inside an
/// `EngineReport`, which carries the period id and generation time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSnapshot {
    pub team_id: String,
    pub name: String,
    /// Active players first, then bench, each by player id.
    pub members: Vec<RosterMember>,
    pub totals: CategoryTotals,
}

impl TeamSnapshot {
    pub fn active(&self) -> impl Iterator<Item = &RosterMember> {
        self.members.iter().filter(|m| m.status == RosterStatus::Active)
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.members.iter().any(|m| m.rating.player_id() == player_id)
    }

    /// Rebuild the snapshot's totals from its own members.
    pub fn recompute_totals(&self, config: &EngineConfig) -> CategoryTotals {
        sum_active(&self.members, config)
    }
}

fn sum_active(members: &[RosterMember], config: &EngineConfig) -> CategoryTotals {
    let mut totals = CategoryTotals::empty(config);
    for member in members.iter().filter(|m| m.status == RosterStatus::Active) {
        totals.add_line(&member.rating.line, config);
    }
    totals
}

/// Validate a team's active lineup and sum its category totals.
///
/// Every roster entry must have a rating in `valuation`, and no player may
/// appear twice. The active set must fit the league's lineup slots.
pub fn build_team_snapshot(
    roster: &TeamRoster,
    valuation: &Valuation,
    config: &EngineConfig,
) -> Result<TeamSnapshot, EngineError> {
    let mut seen = BTreeSet::new();
    let mut members = Vec::with_capacity(roster.entries.len());
    for entry in &roster.entries {
        if !seen.insert(entry.player_id.as_str()) {
            return Err(ValidationError::DuplicatePlayer {
                player_id: entry.player_id.clone(),
            }
            .into());
        }
        let rating = valuation
            .rating(&entry.player_id)
            .ok_or_else(|| ValidationError::UnknownPlayer {
                team_id: roster.team_id.clone(),
                player_id: entry.player_id.clone(),
            })?;
        members.push(RosterMember {
            rating: Arc::clone(rating),
            status: entry.status,
            slot: None,
        });
    }
    members.sort_by(|a, b| {
        a.status
            .cmp(&b.status)
            .then_with(|| a.rating.player_id().cmp(b.rating.player_id()))
    });

    let active: Vec<(&str, &BTreeSet<Position>)> = members
        .iter()
        .filter(|m| m.status == RosterStatus::Active)
        .map(|m| (m.rating.player_id(), &m.rating.line.positions))
        .collect();
    let assignment: BTreeMap<String, Position> =
        assign_slots(&roster.team_id, &active, config)?.into_iter().collect();
    for member in &mut members {
        member.slot = assignment.get(member.rating.player_id()).copied();
    }

    let totals = sum_active(&members, config);
    debug!(
        team = %roster.team_id,
        active = assignment.len(),
        bench = members.len() - assignment.len(),
        "team totals built"
    );

    Ok(TeamSnapshot {
        team_id: roster.team_id.clone(),
        name: roster.name.clone(),
        members,
        totals,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
