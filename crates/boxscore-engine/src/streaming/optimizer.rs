// Start/streaming optimizer: pick starts that maximize expected value within
// the period's start cap, transaction budget and per-day slot capacity.
//
// A start may use any slot it is eligible for. It takes the first eligible
// slot with room that day; if none has room, one start already placed that
// day may move to another of its eligible slots to make room.
//
// Greedy by marginal value, then a bounded number of exchange passes (swap one
// selected start for one outside candidate and refill greedily), then a final
// greedy sweep.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

use chrono::{DateTime, NaiveDate, Utc};

use crate::config::OptimizerConstraints;
use crate::error::{ConstraintInfeasibleError, EngineError, ValidationError};
use crate::matchup::ScoringPeriod;
use crate::position::Position;
use crate::streaming::candidates::StartCandidate;

/// Improvements smaller than this do not justify a swap.
const IMPROVEMENT_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// The constraint that kept a candidate out of the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// Every eligible slot was full that day, or the period's start cap was
    /// reached.
    SlotCapacity,
    TransactionBudget,
    /// The same player already starts that day.
    DayConflict,
    /// Acquisition cost outweighs the start's value.
    NoValueAdded,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectionReason::SlotCapacity => "slot capacity exceeded",
            RejectionReason::TransactionBudget => "transaction budget exceeded",
            RejectionReason::DayConflict => "player already starts that day",
            RejectionReason::NoValueAdded => "no value added",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub candidate: StartCandidate,
    pub reason: RejectionReason,
    /// Human-readable form of `reason`.
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizerResult {
    pub period_id: String,
    pub generated_at: DateTime<Utc>,
    /// Selected starts by date, slot, then player id. `slot` is the slot
    /// each start was assigned.
    pub selected: Vec<StartCandidate>,
    pub rejected: Vec<Rejection>,
    pub total_transaction_cost: u32,
    pub total_expected_value: f64,
    /// Expected value less the displacement charge for each acquisition.
    pub net_value: f64,
}

// ---------------------------------------------------------------------------
// Selection state
// ---------------------------------------------------------------------------

/// Where a candidate would go: its slot, and an optional move of one
/// already-placed start to another slot to make room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    slot: Position,
    relocate: Option<(usize, Position)>,
}

/// Running totals for a selection.
struct Selection<'a> {
    candidates: &'a [StartCandidate],
    /// Chosen candidate -> assigned slot.
    chosen: BTreeMap<usize, Position>,
    slot_days: BTreeMap<(NaiveDate, Position), usize>,
    player_days: BTreeSet<(NaiveDate, &'a str)>,
    acquired: BTreeMap<&'a str, u32>,
}

impl<'a> Selection<'a> {
    fn new(candidates: &'a [StartCandidate]) -> Self {
        Selection {
            candidates,
            chosen: BTreeMap::new(),
            slot_days: BTreeMap::new(),
            player_days: BTreeSet::new(),
            acquired: BTreeMap::new(),
        }
    }

    /// Rebuild a selection from known assignments.
    fn from_assignments(
        candidates: &'a [StartCandidate],
        assignments: impl IntoIterator<Item = (usize, Position)>,
    ) -> Self {
        let mut sel = Selection::new(candidates);
        for (i, slot) in assignments {
            sel.insert(
                i,
                Placement {
                    slot,
                    relocate: None,
                },
            );
        }
        sel
    }

    fn contains(&self, i: usize) -> bool {
        self.chosen.contains_key(&i)
    }

    fn has_room(&self, date: NaiveDate, slot: Position, capacity: &BTreeMap<Position, usize>) -> bool {
        let used = self.slot_days.get(&(date, slot)).copied().unwrap_or(0);
        used < capacity.get(&slot).copied().unwrap_or(0)
    }

    /// First eligible slot with room for candidate `i`, else the first slot
    /// that one relocation frees.
    fn placement(&self, i: usize, capacity: &BTreeMap<Position, usize>) -> Option<Placement> {
        let c = &self.candidates[i];
        let slots = c.eligible_slots();
        if let Some(&slot) = slots.iter().find(|&&s| self.has_room(c.date, s, capacity)) {
            return Some(Placement {
                slot,
                relocate: None,
            });
        }
        slots.iter().find_map(|&slot| {
            self.chosen
                .iter()
                .filter(|&(&j, &assigned)| assigned == slot && self.candidates[j].date == c.date)
                .find_map(|(&j, _)| {
                    self.candidates[j]
                        .eligible_slots()
                        .iter()
                        .find(|&&alt| alt != slot && self.has_room(c.date, alt, capacity))
                        .map(|&alt| Placement {
                            slot,
                            relocate: Some((j, alt)),
                        })
                })
        })
    }

    fn insert(&mut self, i: usize, placement: Placement) {
        let candidates = self.candidates;
        let c = &candidates[i];
        if let Some((j, alt)) = placement.relocate {
            if let Some(old) = self.chosen.insert(j, alt) {
                let date = candidates[j].date;
                if let Some(used) = self.slot_days.get_mut(&(date, old)) {
                    *used = used.saturating_sub(1);
                }
                *self.slot_days.entry((date, alt)).or_insert(0) += 1;
            }
        }
        self.chosen.insert(i, placement.slot);
        *self.slot_days.entry((c.date, placement.slot)).or_insert(0) += 1;
        self.player_days.insert((c.date, c.player_id.as_str()));
        if c.transaction_cost > 0 {
            let cost = self.acquired.entry(c.player_id.as_str()).or_insert(0);
            *cost = (*cost).max(c.transaction_cost);
        }
    }

    fn transactions(&self) -> u32 {
        self.acquired.values().sum()
    }

    /// Extra transactions adding candidate `i` would use.
    fn added_transactions(&self, i: usize) -> u32 {
        let c = &self.candidates[i];
        let held = self.acquired.get(c.player_id.as_str()).copied().unwrap_or(0);
        c.transaction_cost.saturating_sub(held)
    }

    /// Value candidate `i` adds: its expected value less the displacement
    /// charge if it brings in a new player.
    fn marginal(&self, i: usize, charge: f64) -> f64 {
        let c = &self.candidates[i];
        if c.transaction_cost > 0 && !self.acquired.contains_key(c.player_id.as_str()) {
            c.expected_value - charge
        } else {
            c.expected_value
        }
    }

    /// Where candidate `i` would go if it joined, checked in reporting order.
    fn admits(
        &self,
        i: usize,
        constraints: &OptimizerConstraints,
        capacity: &BTreeMap<Position, usize>,
        charge: f64,
    ) -> Result<Placement, RejectionReason> {
        let c = &self.candidates[i];
        if self.player_days.contains(&(c.date, c.player_id.as_str())) {
            return Err(RejectionReason::DayConflict);
        }
        if self.chosen.len() as i64 >= constraints.max_starts {
            return Err(RejectionReason::SlotCapacity);
        }
        let placement = self.placement(i, capacity).ok_or(RejectionReason::SlotCapacity)?;
        if i64::from(self.transactions() + self.added_transactions(i)) > constraints.max_transactions {
            return Err(RejectionReason::TransactionBudget);
        }
        if self.marginal(i, charge) <= 0.0 {
            return Err(RejectionReason::NoValueAdded);
        }
        Ok(placement)
    }

    /// Expected value less one displacement charge per acquired player.
    fn objective(&self, charge: f64) -> f64 {
        let ev: f64 = self
            .chosen
            .keys()
            .map(|&i| self.candidates[i].expected_value)
            .sum();
        ev - charge * self.acquired.len() as f64
    }
}

// ---------------------------------------------------------------------------
// Optimizer
// ---------------------------------------------------------------------------

fn validate_inputs(
    candidates: &[StartCandidate],
    constraints: &OptimizerConstraints,
    displaced_value: f64,
) -> Result<(), EngineError> {
    if constraints.max_starts < 0 {
        return Err(ConstraintInfeasibleError {
            constraint: "max_starts".into(),
            message: format!("must be non-negative, got {}", constraints.max_starts),
        }
        .into());
    }
    if constraints.max_transactions < 0 {
        return Err(ConstraintInfeasibleError {
            constraint: "max_transactions".into(),
            message: format!("must be non-negative, got {}", constraints.max_transactions),
        }
        .into());
    }
    if !displaced_value.is_finite() || displaced_value < 0.0 {
        return Err(ConstraintInfeasibleError {
            constraint: "displaced_value".into(),
            message: format!("must be a non-negative number, got {displaced_value}"),
        }
        .into());
    }
    for c in candidates {
        let problem = if !c.expected_value.is_finite() {
            Some("expected value is not finite")
        } else if !c.sample_size.is_finite() || c.sample_size < 0.0 {
            Some("sample size must be a non-negative number")
        } else {
            None
        };
        if let Some(message) = problem {
            return Err(ValidationError::InvalidCandidate {
                player_id: c.player_id.clone(),
                date: c.date.to_string(),
                message: message.into(),
            }
            .into());
        }
    }
    Ok(())
}

/// Greedy order: standalone value, then sample size, then player id, with
/// date and slot to make the order total.
fn greedy_order(candidates: &[StartCandidate], charge: f64) -> Vec<usize> {
    let standalone = |c: &StartCandidate| {
        if c.transaction_cost > 0 {
            c.expected_value - charge
        } else {
            c.expected_value
        }
    };
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        let (ca, cb) = (&candidates[a], &candidates[b]);
        standalone(cb)
            .total_cmp(&standalone(ca))
            .then_with(|| cb.sample_size.total_cmp(&ca.sample_size))
            .then_with(|| ca.player_id.cmp(&cb.player_id))
            .then_with(|| ca.date.cmp(&cb.date))
            .then_with(|| ca.slot.cmp(&cb.slot))
            .then(a.cmp(&b))
    });
    order
}

fn greedy_fill(
    sel: &mut Selection<'_>,
    order: &[usize],
    constraints: &OptimizerConstraints,
    capacity: &BTreeMap<Position, usize>,
    charge: f64,
) -> usize {
    let mut added = 0;
    loop {
        let mut changed = false;
        for &i in order {
            if sel.contains(i) {
                continue;
            }
            if let Ok(placement) = sel.admits(i, constraints, capacity, charge) {
                sel.insert(i, placement);
                added += 1;
                changed = true;
            }
        }
        if !changed {
            return added;
        }
    }
}

/// One exchange pass: for each outside candidate in greedy order, take the
/// first swap with a selected candidate that, after a greedy refill, strictly
/// improves the objective.
fn exchange_pass<'a>(
    sel: Selection<'a>,
    order: &[usize],
    constraints: &OptimizerConstraints,
    capacity: &BTreeMap<Position, usize>,
    charge: f64,
) -> (Selection<'a>, bool) {
    let candidates = sel.candidates;
    let mut current = sel;
    let mut improved = false;

    for &incoming in order {
        if current.contains(incoming) {
            continue;
        }
        let base = current.objective(charge);
        let chosen: Vec<(usize, Position)> = current.chosen.iter().map(|(&i, &s)| (i, s)).collect();
        for &(outgoing, _) in &chosen {
            let mut trial = Selection::from_assignments(
                candidates,
                chosen.iter().copied().filter(|&(i, _)| i != outgoing),
            );
            let Ok(placement) = trial.admits(incoming, constraints, capacity, charge) else {
                continue;
            };
            trial.insert(incoming, placement);
            greedy_fill(&mut trial, order, constraints, capacity, charge);
            if trial.objective(charge) > base + IMPROVEMENT_EPSILON {
                current = trial;
                improved = true;
                break;
            }
        }
    }

    (current, improved)
}

/// Choose starts for one team in `period`.
///
/// `capacity` maps each lineup slot type to its per-team count; a slot type
/// absent from the map has no room. `displaced_value` is the period value of
/// the roster player an acquisition would drop; each acquired player is
/// charged `displacement_weight` times that value once.
pub fn optimize_starts(
    candidates: &[StartCandidate],
    constraints: &OptimizerConstraints,
    capacity: &BTreeMap<Position, usize>,
    displaced_value: f64,
    period: &ScoringPeriod,
    generated_at: DateTime<Utc>,
) -> Result<OptimizerResult, EngineError> {
    validate_inputs(candidates, constraints, displaced_value)?;
    let charge = constraints.displacement_weight * displaced_value;
    let order = greedy_order(candidates, charge);

    let mut sel = Selection::new(candidates);
    greedy_fill(&mut sel, &order, constraints, capacity, charge);

    let mut passes = 0;
    while passes < constraints.max_exchange_passes {
        let (next, improved) = exchange_pass(sel, &order, constraints, capacity, charge);
        sel = next;
        passes += 1;
        if !improved {
            break;
        }
    }
    greedy_fill(&mut sel, &order, constraints, capacity, charge);

    let rejected: Vec<Rejection> = order
        .iter()
        .filter(|&&i| !sel.contains(i))
        .map(|&i| {
            let reason = sel
                .admits(i, constraints, capacity, charge)
                .err()
                .unwrap_or(RejectionReason::NoValueAdded);
            Rejection {
                candidate: candidates[i].clone(),
                reason,
                message: reason.to_string(),
            }
        })
        .collect();

    let mut selected: Vec<StartCandidate> = sel
        .chosen
        .iter()
        .map(|(&i, &slot)| StartCandidate {
            slot,
            ..candidates[i].clone()
        })
        .collect();
    selected.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.slot.cmp(&b.slot))
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    let total_expected_value: f64 = selected.iter().map(|c| c.expected_value).sum();
    let net_value = sel.objective(charge);
    let total_transaction_cost = sel.transactions();

    debug!(
        candidates = candidates.len(),
        selected = selected.len(),
        transactions = total_transaction_cost,
        passes,
        "start optimization complete"
    );

    Ok(OptimizerResult {
        period_id: period.id.clone(),
        generated_at,
        selected,
        rejected,
        total_transaction_cost,
        total_expected_value,
        net_value,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
