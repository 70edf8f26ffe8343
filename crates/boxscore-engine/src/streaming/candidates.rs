// Start candidates: probable starts priced by opponent and park.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::matchup::{ProTeamRating, RemainingSchedule, ScheduleContext, ScoringPeriod};
use crate::position::Position;
use crate::team::TeamRoster;
use crate::valuation::{PlayerRating, Valuation};

/// A player-day pairing the optimizer can select.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartCandidate {
    pub player_id: String,
    pub date: NaiveDate,
    pub opponent: String,
    pub park_factor: f64,
    /// Opponent offense rating, 100 = league average.
    pub opponent_strength: f64,
    /// Lineup slot the start occupies: the preferred slot until the
    /// optimizer assigns one.
    pub slot: Position,
    /// Every slot the start may use, in preference order. Empty means
    /// `slot` only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slots: Vec<Position>,
    pub expected_value: f64,
    /// 0 when already rostered, 1 when a pickup is needed.
    pub transaction_cost: u32,
    pub sample_size: f64,
}

impl StartCandidate {
    pub fn eligible_slots(&self) -> &[Position] {
        if self.slots.is_empty() {
            std::slice::from_ref(&self.slot)
        } else {
            &self.slots
        }
    }
}

/// Opposing lineups striking out more often than this give a small bonus.
pub const HIGH_K_RATE: f64 = 24.0;

/// Multiplier on a start's value from the opposing lineup.
///
/// Stronger offenses lower the factor; the result stays within [0.7, 1.2]
/// before the strikeout bonus.
pub fn opponent_factor(opponent: &ProTeamRating) -> f64 {
    let factor = (2.0 - opponent.offense / 100.0).clamp(0.7, 1.2);
    match opponent.k_rate {
        Some(k) if k > HIGH_K_RATE => factor * 1.05,
        _ => factor,
    }
}

/// Multiplier on a start's value from the park, clamped to [0.85, 1.25].
///
/// Pitcher-friendly parks rate higher. Road starts feel 60% of the park's
/// deviation from neutral.
pub fn park_adjustment(park_factor: f64, home: bool) -> f64 {
    if park_factor <= 0.0 {
        return 1.0;
    }
    let raw = if home {
        1.0 / park_factor
    } else {
        1.0 / ((park_factor - 1.0) * 0.6 + 1.0)
    };
    raw.clamp(0.85, 1.25)
}

/// Value of one start before matchup adjustment, never negative.
pub fn base_start_value(rating: &PlayerRating, config: &EngineConfig) -> f64 {
    let s = &config.streaming;
    (s.base_start_value + s.rating_scale * rating.value_over_replacement).max(0.0)
}

/// Slots a start may occupy: SP then P, each only if the league uses it and
/// the player qualifies.
fn start_slots(rating: &PlayerRating, config: &EngineConfig) -> Vec<Position> {
    let counts = config.slot_counts();
    [Position::StartingPitcher, Position::Pitcher]
        .into_iter()
        .filter(|p| counts.get(p).copied().unwrap_or(0) > 0 && rating.line.is_eligible_at(*p))
        .collect()
}

/// Build start candidates for `team` from the announced starts in `period`.
///
/// Players on the team's roster cost nothing to start; free agents cost one
/// transaction. Players rostered elsewhere are skipped, as are announced
/// starts for players missing from the valuation.
pub fn build_start_candidates(
    team: &TeamRoster,
    rosters: &[TeamRoster],
    valuation: &Valuation,
    schedule: &RemainingSchedule<'_>,
    context: &ScheduleContext,
    period: &ScoringPeriod,
    config: &EngineConfig,
) -> Vec<StartCandidate> {
    let mut candidates = Vec::new();

    for start in schedule
        .probable_starts
        .iter()
        .filter(|s| period.contains(s.date) && schedule.as_of.map_or(true, |d| s.date >= d))
    {
        let Some(rating) = valuation.rating(&start.player_id) else {
            warn!(player = %start.player_id, "probable start for unrated player, skipping");
            continue;
        };
        let on_team = team.contains(&start.player_id);
        if !on_team
            && rosters
                .iter()
                .any(|r| r.team_id != team.team_id && r.contains(&start.player_id))
        {
            continue;
        }
        let slots = start_slots(rating, config);
        let Some(&slot) = slots.first() else {
            debug!(player = %start.player_id, "no pitching slot for start");
            continue;
        };

        let game = rating
            .line
            .pro_team
            .as_deref()
            .and_then(|t| schedule.game_on(t, start.date));
        let opponent = start
            .opponent
            .clone()
            .or_else(|| game.map(|g| g.opponent.clone()))
            .unwrap_or_else(|| "TBD".to_string());
        let home = start.home.or(game.map(|g| g.home)).unwrap_or(false);
        let park = start
            .park
            .clone()
            .or_else(|| game.map(|g| g.park_key().to_string()));
        let park_factor = park.map_or(1.0, |p| context.park_factor(&p));

        let opp = context.team(&opponent);
        let expected_value = base_start_value(rating, config)
            * opponent_factor(&opp)
            * park_adjustment(park_factor, home);

        candidates.push(StartCandidate {
            player_id: start.player_id.clone(),
            date: start.date,
            opponent,
            park_factor,
            opponent_strength: opp.offense,
            slot,
            slots,
            expected_value,
            transaction_cost: if on_team { 0 } else { 1 },
            sample_size: rating.line.sample_size,
        });
    }

    debug!(team = %team.team_id, candidates = candidates.len(), "start candidates built");
    candidates
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{test_config, StatGroup};
    use crate::matchup::{ProbableStart, ScheduledGame};
    use crate::stats::{PlayerStatLine, TimeWindow};
    use crate::team::{RosterEntry, RosterStatus};
    use crate::valuation::value_players;
    use std::collections::BTreeMap;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    fn pitcher(id: &str, team: &str, era: f64) -> PlayerStatLine {
        PlayerStatLine {
            player_id: id.into(),
            name: id.into(),
            pro_team: Some(team.into()),
            positions: [Position::StartingPitcher].into_iter().collect(),
            group: StatGroup::Pitching,
            values: [
                ("ERA".to_string(), era),
                ("K".to_string(), 90.0),
                ("W".to_string(), 6.0),
            ]
            .into_iter()
            .collect(),
            sample_size: 90.0,
            games: 15.0,
            window: TimeWindow::SeasonToDate,
        }
    }

    fn roster(id: &str, players: &[&str]) -> TeamRoster {
        TeamRoster {
            team_id: id.into(),
            name: id.into(),
            entries: players
                .iter()
                .map(|p| RosterEntry {
                    player_id: p.to_string(),
                    status: RosterStatus::Active,
                })
                .collect(),
        }
    }

    fn start(player: &str, d: u32) -> ProbableStart {
        ProbableStart {
            player_id: player.into(),
            date: date(d),
            opponent: None,
            home: None,
            park: None,
        }
    }

    #[test]
    fn opponent_factor_clamps_and_rewards_strikeouts() {
        let avg = ProTeamRating::default();
        assert_eq!(opponent_factor(&avg), 1.0);
        let weak = ProTeamRating {
            offense: 50.0,
            ..Default::default()
        };
        assert_eq!(opponent_factor(&weak), 1.2);
        let strong = ProTeamRating {
            offense: 140.0,
            ..Default::default()
        };
        assert!(approx_eq(opponent_factor(&strong), 0.7, 1e-12));
        let whiffs = ProTeamRating {
            offense: 100.0,
            pitching: 100.0,
            k_rate: Some(26.0),
        };
        assert!(approx_eq(opponent_factor(&whiffs), 1.05, 1e-12));
    }

    #[test]
    fn park_adjustment_home_and_road() {
        assert!(approx_eq(park_adjustment(1.1, true), 1.0 / 1.1, 1e-12));
        assert!(approx_eq(park_adjustment(1.1, false), 1.0 / 1.06, 1e-12));
        assert_eq!(park_adjustment(1.5, true), 0.85);
        assert_eq!(park_adjustment(0.7, true), 1.25);
        assert_eq!(park_adjustment(0.0, true), 1.0);
    }

    #[test]
    fn candidates_cost_and_ownership() {
        let config = test_config();
        let valuation = value_players(
            vec![
                pitcher("mine", "SEA", 3.2),
                pitcher("fa", "OAK", 3.8),
                pitcher("theirs", "HOU", 2.9),
            ],
            &config,
        )
        .unwrap();
        let me = roster("t1", &["mine"]);
        let them = roster("t2", &["theirs"]);
        let rosters = vec![me.clone(), them];
        let games = vec![ScheduledGame {
            pro_team: "OAK".into(),
            date: date(4),
            opponent: "TEX".into(),
            park: None,
            home: true,
        }];
        let starts = vec![start("mine", 3), start("fa", 4), start("theirs", 5), start("mine", 30)];
        let schedule = RemainingSchedule::new(&games, &starts);
        let mut context = ScheduleContext::default();
        context.park_factors.insert("OAK".into(), 0.9);
        let mut pro = BTreeMap::new();
        pro.insert(
            "TEX".to_string(),
            ProTeamRating {
                offense: 90.0,
                pitching: 100.0,
                k_rate: None,
            },
        );
        context.pro_teams = pro;
        let period = ScoringPeriod {
            id: "wk15".into(),
            start: date(1),
            end: date(7),
        };

        let cands = build_start_candidates(&me, &rosters, &valuation, &schedule, &context, &period, &config);
        assert_eq!(cands.len(), 2);
        let mine = cands.iter().find(|c| c.player_id == "mine").unwrap();
        assert_eq!(mine.transaction_cost, 0);
        assert_eq!(mine.opponent, "TBD");
        assert_eq!(mine.slot, Position::StartingPitcher);
        assert_eq!(mine.eligible_slots(), &[Position::StartingPitcher]);

        let fa = cands.iter().find(|c| c.player_id == "fa").unwrap();
        assert_eq!(fa.transaction_cost, 1);
        assert_eq!(fa.opponent, "TEX");
        assert_eq!(fa.park_factor, 0.9);
        let base = base_start_value(valuation.rating("fa").unwrap(), &config);
        // Opponent 1.1, home park 1/0.9.
        assert!(approx_eq(fa.expected_value, base * 1.1 * (1.0 / 0.9), 1e-9));
    }

    #[test]
    fn starts_list_every_pitching_slot_in_use() {
        let mut config = test_config();
        config.league.roster.insert("P".into(), 2);
        let valuation = value_players(vec![pitcher("sp", "SEA", 3.5)], &config).unwrap();
        let me = roster("t1", &["sp"]);
        let starts = vec![start("sp", 2)];
        let schedule = RemainingSchedule::new(&[], &starts);
        let period = ScoringPeriod {
            id: "wk15".into(),
            start: date(1),
            end: date(7),
        };
        let cands = build_start_candidates(
            &me,
            std::slice::from_ref(&me),
            &valuation,
            &schedule,
            &ScheduleContext::default(),
            &period,
            &config,
        );
        assert_eq!(cands.len(), 1);
        assert_eq!(cands[0].slot, Position::StartingPitcher);
        assert_eq!(cands[0].slots, vec![Position::StartingPitcher, Position::Pitcher]);
    }

    #[test]
    fn eligible_slots_default_to_the_preferred_slot() {
        let json = r#"{"player_id": "x", "date": "2025-07-02", "opponent": "OPP",
            "park_factor": 1.0, "opponent_strength": 100.0, "slot": "SP",
            "expected_value": 3.0, "transaction_cost": 0, "sample_size": 40.0}"#;
        let c: StartCandidate = serde_json::from_str(json).unwrap();
        assert!(c.slots.is_empty());
        assert_eq!(c.eligible_slots(), &[Position::StartingPitcher]);
    }
}
