// Engine facade: runs the full pipeline over a league snapshot.
//
// Each stage is exposed separately so callers can fan matchups and per-team
// optimizations out across threads once `prepare` has produced the shared
// valuation and team snapshots.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::config::{EngineConfig, StatGroup};
use crate::error::{EngineError, ValidationError};
use crate::matchup::{
    compare_lineups, project_remaining, rate_game, Banked, LineupComparison, MatchupProjection,
    MatchupQuality, RemainingSchedule, ScoringPeriod,
};
use crate::position::Position;
use crate::snapshot::{FantasyMatchup, LeagueSnapshot};
use crate::stats::normalize_records;
use crate::streaming::candidates::base_start_value;
use crate::streaming::{
    build_start_candidates, find_hitter_streams, optimize_starts, HitterStreamDay, OptimizerResult,
};
use crate::team::{
    build_team_snapshot, league_strength, recommend_free_agents, CategoryTotals, TeamRecommendations,
    TeamSnapshot, TeamStrength,
};
use crate::valuation::{compute_scarcity, value_players, ScarcityEntry, Valuation};

/// Caller-supplied run parameters. The engine reads no clock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunContext {
    pub period: ScoringPeriod,
    pub generated_at: DateTime<Utc>,
    /// First day not yet played; defaults to the period start.
    pub as_of: Option<NaiveDate>,
}

impl RunContext {
    fn schedule<'a>(&self, snapshot: &'a LeagueSnapshot) -> RemainingSchedule<'a> {
        let schedule = RemainingSchedule::new(&snapshot.schedule, &snapshot.probable_starts);
        match self.as_of {
            Some(d) => schedule.as_of(d),
            None => schedule,
        }
    }
}

/// Valuation and team snapshots shared by the later stages.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub valuation: Valuation,
    pub teams: Vec<TeamSnapshot>,
}

impl Prepared {
    pub fn team(&self, team_id: &str) -> Result<&TeamSnapshot, ValidationError> {
        self.teams
            .iter()
            .find(|t| t.team_id == team_id)
            .ok_or_else(|| ValidationError::UnknownTeam {
                team_id: team_id.to_string(),
            })
    }
}

/// Quality of one professional game in the period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameQuality {
    pub pro_team: String,
    pub date: NaiveDate,
    pub opponent: String,
    pub quality: MatchupQuality,
}

/// Everything one run produces, stamped with period and generation time.
#[derive(Debug, Clone, Serialize)]
pub struct EngineReport {
    pub period_id: String,
    pub generated_at: DateTime<Utc>,
    pub valuation: Valuation,
    pub teams: Vec<TeamSnapshot>,
    pub strength: Vec<TeamStrength>,
    pub matchups: Vec<MatchupProjection>,
    pub streaming: BTreeMap<String, OptimizerResult>,
    pub schedule_quality: Vec<GameQuality>,
    /// Free-agent help for each team's weak categories, in team order.
    pub recommendations: Vec<TeamRecommendations>,
    pub scarcity: Vec<ScarcityEntry>,
    pub hitter_streams: Vec<HitterStreamDay>,
    /// Slot-by-slot lineup comparison for each scheduled pairing.
    pub lineups: Vec<LineupComparison>,
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Normalize, value, and build every team's snapshot.
pub fn prepare(snapshot: &LeagueSnapshot, config: &EngineConfig) -> Result<Prepared, EngineError> {
    config.validate()?;
    let lines = normalize_records(&snapshot.players, config)?;
    let valuation = value_players(lines, config)?;
    let teams = snapshot
        .teams
        .iter()
        .map(|roster| build_team_snapshot(roster, &valuation, config))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Prepared { valuation, teams })
}

/// Project one scheduled matchup over the rest of the period.
pub fn project_pairing(
    pairing: &FantasyMatchup,
    prepared: &Prepared,
    snapshot: &LeagueSnapshot,
    ctx: &RunContext,
    config: &EngineConfig,
) -> Result<MatchupProjection, EngineError> {
    let home = prepared.team(&pairing.home)?;
    let away = prepared.team(&pairing.away)?;
    let home_banked = snapshot.banked_totals(&home.team_id, config)?;
    let away_banked = snapshot.banked_totals(&away.team_id, config)?;
    let empty = CategoryTotals::empty(config);
    let banked = match (&home_banked, &away_banked) {
        (None, None) => None,
        (h, a) => Some(Banked {
            home: h.as_ref().unwrap_or(&empty),
            away: a.as_ref().unwrap_or(&empty),
        }),
    };
    let schedule = ctx.schedule(snapshot);
    Ok(project_remaining(
        home,
        away,
        &ctx.period,
        &schedule,
        banked,
        ctx.generated_at,
        config,
    ))
}

/// Value of the weakest pitcher on a team: what a pickup would displace.
fn default_displaced_value(team: &TeamSnapshot, config: &EngineConfig) -> f64 {
    team.members
        .iter()
        .filter(|m| m.rating.line.group == StatGroup::Pitching)
        .map(|m| base_start_value(&m.rating, config))
        .min_by(|a, b| a.total_cmp(b))
        .unwrap_or(0.0)
}

/// Choose starts for one team from announced starts in the period.
pub fn plan_streaming(
    team_id: &str,
    prepared: &Prepared,
    snapshot: &LeagueSnapshot,
    ctx: &RunContext,
    config: &EngineConfig,
) -> Result<OptimizerResult, EngineError> {
    let roster = snapshot.team(team_id)?;
    let team = prepared.team(team_id)?;
    let schedule = ctx.schedule(snapshot);
    let candidates = build_start_candidates(
        roster,
        &snapshot.teams,
        &prepared.valuation,
        &schedule,
        &snapshot.context,
        &ctx.period,
        config,
    );
    let capacity: BTreeMap<Position, usize> = config
        .slot_counts()
        .into_iter()
        .filter(|(p, _)| p.is_active_slot())
        .collect();
    let displaced = snapshot
        .displaced_values
        .get(team_id)
        .copied()
        .unwrap_or_else(|| default_displaced_value(team, config));
    optimize_starts(
        &candidates,
        &config.optimizer,
        &capacity,
        displaced,
        &ctx.period,
        ctx.generated_at,
    )
}

/// Rate every professional game in the period.
pub fn schedule_quality(snapshot: &LeagueSnapshot, ctx: &RunContext, config: &EngineConfig) -> Vec<GameQuality> {
    snapshot
        .schedule
        .iter()
        .filter(|g| ctx.period.contains(g.date))
        .map(|g| GameQuality {
            pro_team: g.pro_team.clone(),
            date: g.date,
            opponent: g.opponent.clone(),
            quality: rate_game(g, &snapshot.context, config.streaming.league_k_rate),
        })
        .collect()
}

/// Run the whole pipeline sequentially.
pub fn run(
    snapshot: &LeagueSnapshot,
    ctx: &RunContext,
    config: &EngineConfig,
) -> Result<EngineReport, EngineError> {
    let prepared = prepare(snapshot, config)?;
    let matchups = snapshot
        .matchups
        .iter()
        .map(|m| project_pairing(m, &prepared, snapshot, ctx, config))
        .collect::<Result<Vec<_>, _>>()?;
    let streaming = prepared
        .teams
        .iter()
        .map(|t| {
            plan_streaming(&t.team_id, &prepared, snapshot, ctx, config).map(|r| (t.team_id.clone(), r))
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;
    Ok(assemble(prepared, matchups, streaming, snapshot, ctx, config))
}

/// Combine stage outputs into a report.
pub fn assemble(
    prepared: Prepared,
    matchups: Vec<MatchupProjection>,
    streaming: BTreeMap<String, OptimizerResult>,
    snapshot: &LeagueSnapshot,
    ctx: &RunContext,
    config: &EngineConfig,
) -> EngineReport {
    let strength = league_strength(&prepared.teams, config);
    let schedule_quality = schedule_quality(snapshot, ctx, config);
    let recommendations = strength
        .iter()
        .map(|s| recommend_free_agents(s, &prepared.valuation, &snapshot.teams, config))
        .collect();
    let scarcity = compute_scarcity(&prepared.valuation, &snapshot.teams, config);
    let hitter_streams = find_hitter_streams(
        &prepared.valuation,
        &snapshot.teams,
        &ctx.schedule(snapshot),
        &snapshot.context,
        &ctx.period,
        config,
    );
    let lineups = snapshot
        .matchups
        .iter()
        .filter_map(|m| {
            let home = prepared.team(&m.home).ok()?;
            let away = prepared.team(&m.away).ok()?;
            Some(compare_lineups(home, away))
        })
        .collect();
    info!(
        period = %ctx.period.id,
        players = prepared.valuation.len(),
        teams = prepared.teams.len(),
        matchups = matchups.len(),
        "engine run complete"
    );
    EngineReport {
        period_id: ctx.period.id.clone(),
        generated_at: ctx.generated_at,
        valuation: prepared.valuation,
        teams: prepared.teams,
        strength,
        matchups,
        streaming,
        schedule_quality,
        recommendations,
        scarcity,
        hitter_streams,
        lineups,
    }
}
