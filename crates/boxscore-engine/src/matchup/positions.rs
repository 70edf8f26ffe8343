// Position-by-position comparison of two lineups.

use serde::Serialize;

use crate::matchup::projection::CategoryWinner;
use crate::position::Position;
use crate::team::TeamSnapshot;

/// One team's players in a lineup slot type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotSide {
    pub players: Vec<String>,
    /// Sum of the players' composite ratings.
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionMatchup {
    pub slot: Position,
    pub home: SlotSide,
    pub away: SlotSide,
    /// Home value less away value.
    pub difference: f64,
    pub edge: CategoryWinner,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineupComparison {
    pub home: String,
    pub away: String,
    /// In lineup display order.
    pub positions: Vec<PositionMatchup>,
    pub home_edges: usize,
    pub away_edges: usize,
}

fn side(team: &TeamSnapshot, slot: Position) -> SlotSide {
    let members: Vec<_> = team.active().filter(|m| m.slot == Some(slot)).collect();
    SlotSide {
        players: members.iter().map(|m| m.rating.player_id().to_string()).collect(),
        value: members.iter().map(|m| m.rating.composite).sum(),
    }
}

/// Compare the active players each team has seated in every slot type
/// either side uses.
pub fn compare_lineups(home: &TeamSnapshot, away: &TeamSnapshot) -> LineupComparison {
    let mut slots: Vec<Position> = home
        .active()
        .chain(away.active())
        .filter_map(|m| m.slot)
        .collect();
    slots.sort_by_key(|p| p.sort_order());
    slots.dedup();

    let positions: Vec<PositionMatchup> = slots
        .into_iter()
        .map(|slot| {
            let (h, a) = (side(home, slot), side(away, slot));
            let difference = h.value - a.value;
            let edge = if difference > 0.0 {
                CategoryWinner::Home
            } else if difference < 0.0 {
                CategoryWinner::Away
            } else {
                CategoryWinner::Tie
            };
            PositionMatchup {
                slot,
                home: h,
                away: a,
                difference,
                edge,
            }
        })
        .collect();

    let count = |w: CategoryWinner| positions.iter().filter(|p| p.edge == w).count();
    LineupComparison {
        home: home.team_id.clone(),
        away: away.team_id.clone(),
        home_edges: count(CategoryWinner::Home),
        away_edges: count(CategoryWinner::Away),
        positions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{test_config, StatGroup};
    use crate::stats::{PlayerStatLine, TimeWindow};
    use crate::team::{CategoryTotals, RosterMember, RosterStatus};
    use crate::valuation::PlayerRating;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn member(id: &str, slot: Option<Position>, composite: f64, status: RosterStatus) -> RosterMember {
        RosterMember {
            rating: Arc::new(PlayerRating {
                line: PlayerStatLine {
                    player_id: id.into(),
                    name: id.into(),
                    pro_team: None,
                    positions: slot.into_iter().collect(),
                    group: StatGroup::Batting,
                    values: BTreeMap::new(),
                    sample_size: 0.0,
                    games: 0.0,
                    window: TimeWindow::SeasonToDate,
                },
                categories: BTreeMap::new(),
                composite,
                value_over_replacement: 0.0,
                best_position: slot,
            }),
            status,
            slot,
        }
    }

    fn team(id: &str, members: Vec<RosterMember>) -> TeamSnapshot {
        TeamSnapshot {
            team_id: id.into(),
            name: id.into(),
            members,
            totals: CategoryTotals::empty(&test_config()),
        }
    }

    #[test]
    fn slots_compared_in_lineup_order() {
        let home = team(
            "h",
            vec![
                member("hc", Some(Position::Catcher), 1.5, RosterStatus::Active),
                member("hof1", Some(Position::Outfield), 2.0, RosterStatus::Active),
                member("hof2", Some(Position::Outfield), 0.5, RosterStatus::Active),
                member("hbn", None, 9.0, RosterStatus::Bench),
            ],
        );
        let away = team(
            "a",
            vec![
                member("ac", Some(Position::Catcher), 2.5, RosterStatus::Active),
                member("aof", Some(Position::Outfield), 1.0, RosterStatus::Active),
                member("ass", Some(Position::ShortStop), 0.0, RosterStatus::Active),
            ],
        );
        let cmp = compare_lineups(&home, &away);
        let slots: Vec<Position> = cmp.positions.iter().map(|p| p.slot).collect();
        assert_eq!(slots, vec![Position::Catcher, Position::ShortStop, Position::Outfield]);

        let c = &cmp.positions[0];
        assert_eq!(c.edge, CategoryWinner::Away);
        assert_eq!(c.difference, -1.0);

        // The home shortstop slot is empty; a zero-value away player ties it.
        let ss = &cmp.positions[1];
        assert!(ss.home.players.is_empty());
        assert_eq!(ss.edge, CategoryWinner::Tie);

        // Bench players never count.
        let of = &cmp.positions[2];
        assert_eq!(of.home.players, vec!["hof1", "hof2"]);
        assert_eq!(of.home.value, 2.5);
        assert_eq!(of.edge, CategoryWinner::Home);

        assert_eq!(cmp.home_edges, 1);
        assert_eq!(cmp.away_edges, 1);
    }
}
