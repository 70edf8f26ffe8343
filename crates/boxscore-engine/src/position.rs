// Position tags, lineup slot types, and ESPN slot id mapping.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ESPN slot ID constants (from ESPN Fantasy API v3)
// ---------------------------------------------------------------------------

pub const ESPN_SLOT_C: u16 = 0;
pub const ESPN_SLOT_1B: u16 = 1;
pub const ESPN_SLOT_2B: u16 = 2;
pub const ESPN_SLOT_3B: u16 = 3;
pub const ESPN_SLOT_SS: u16 = 4;
pub const ESPN_SLOT_OF: u16 = 5;
pub const ESPN_SLOT_MI: u16 = 6; // 2B/SS combo
pub const ESPN_SLOT_CI: u16 = 7; // 1B/3B combo
pub const ESPN_SLOT_LF: u16 = 8;
pub const ESPN_SLOT_CF: u16 = 9;
pub const ESPN_SLOT_RF: u16 = 10;
pub const ESPN_SLOT_DH: u16 = 11;
pub const ESPN_SLOT_UTIL: u16 = 12;
pub const ESPN_SLOT_P: u16 = 13; // Generic pitcher
pub const ESPN_SLOT_SP: u16 = 14;
pub const ESPN_SLOT_RP: u16 = 15;
pub const ESPN_SLOT_BE: u16 = 16;
pub const ESPN_SLOT_IL: u16 = 17;

/// Baseball positions and lineup slot types.
///
/// Concrete playing positions (C, 1B, ..., SP, RP) are what a player is
/// eligible at. Flex slots (OF, MI, CI, UTIL, P) only appear in lineup
/// definitions and accept several concrete positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Position {
    Catcher,
    FirstBase,
    SecondBase,
    ThirdBase,
    ShortStop,
    LeftField,
    CenterField,
    RightField,
    DesignatedHitter,
    Outfield,
    MiddleInfield,
    CornerInfield,
    Utility,
    StartingPitcher,
    ReliefPitcher,
    Pitcher,
    Bench,
    InjuredList,
}

/// Concrete hitter positions, in display order.
pub const HITTER_POSITIONS: &[Position] = &[
    Position::Catcher,
    Position::FirstBase,
    Position::SecondBase,
    Position::ThirdBase,
    Position::ShortStop,
    Position::LeftField,
    Position::CenterField,
    Position::RightField,
    Position::DesignatedHitter,
];

impl Position {
    /// Parse a position string into a Position.
    ///
    /// Handles ESPN-style abbreviations:
    /// - "1B" -> FirstBase, "2B" -> SecondBase, "3B" -> ThirdBase
    /// - "OF" -> Outfield, "MI" -> MiddleInfield, "CI" -> CornerInfield
    /// - "UTIL"/"UT" -> Utility, "BE"/"BN" -> Bench, "IL"/"DL" -> InjuredList
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "C" => Some(Position::Catcher),
            "1B" => Some(Position::FirstBase),
            "2B" => Some(Position::SecondBase),
            "3B" => Some(Position::ThirdBase),
            "SS" => Some(Position::ShortStop),
            "LF" => Some(Position::LeftField),
            "CF" => Some(Position::CenterField),
            "RF" => Some(Position::RightField),
            "DH" => Some(Position::DesignatedHitter),
            "OF" => Some(Position::Outfield),
            "MI" => Some(Position::MiddleInfield),
            "CI" => Some(Position::CornerInfield),
            "UTIL" | "UT" => Some(Position::Utility),
            "SP" => Some(Position::StartingPitcher),
            "RP" => Some(Position::ReliefPitcher),
            "P" => Some(Position::Pitcher),
            "BE" | "BN" => Some(Position::Bench),
            "IL" | "DL" => Some(Position::InjuredList),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Catcher => "C",
            Position::FirstBase => "1B",
            Position::SecondBase => "2B",
            Position::ThirdBase => "3B",
            Position::ShortStop => "SS",
            Position::LeftField => "LF",
            Position::CenterField => "CF",
            Position::RightField => "RF",
            Position::DesignatedHitter => "DH",
            Position::Outfield => "OF",
            Position::MiddleInfield => "MI",
            Position::CornerInfield => "CI",
            Position::Utility => "UTIL",
            Position::StartingPitcher => "SP",
            Position::ReliefPitcher => "RP",
            Position::Pitcher => "P",
            Position::Bench => "BE",
            Position::InjuredList => "IL",
        }
    }

    /// Whether this tag denotes pitching.
    pub fn is_pitcher(&self) -> bool {
        matches!(
            self,
            Position::StartingPitcher | Position::ReliefPitcher | Position::Pitcher
        )
    }

    /// Whether this slot holds a starter (counts toward category totals).
    pub fn is_active_slot(&self) -> bool {
        !matches!(self, Position::Bench | Position::InjuredList)
    }

    /// Concrete positions accepted by this lineup slot.
    ///
    /// A concrete position accepts only itself; flex slots expand.
    pub fn accepted_positions(&self) -> Vec<Position> {
        match self {
            Position::Outfield => vec![
                Position::LeftField,
                Position::CenterField,
                Position::RightField,
            ],
            Position::MiddleInfield => vec![Position::SecondBase, Position::ShortStop],
            Position::CornerInfield => vec![Position::FirstBase, Position::ThirdBase],
            Position::Utility => HITTER_POSITIONS.to_vec(),
            Position::Pitcher => vec![Position::StartingPitcher, Position::ReliefPitcher],
            Position::Bench | Position::InjuredList => Vec::new(),
            other => vec![*other],
        }
    }

    /// Whether a player with the given eligibility can fill this slot.
    ///
    /// Bench and IL accept anyone.
    pub fn accepts(&self, eligible: &std::collections::BTreeSet<Position>) -> bool {
        if !self.is_active_slot() {
            return true;
        }
        self.accepted_positions()
            .iter()
            .any(|p| eligible.contains(p))
    }

    /// Deterministic ordering index for slot display and assignment.
    pub fn sort_order(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

impl TryFrom<String> for Position {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Position::from_str_pos(&value).ok_or_else(|| format!("unknown position `{value}`"))
    }
}

impl From<Position> for String {
    fn from(pos: Position) -> Self {
        pos.display_str().to_string()
    }
}

// ---------------------------------------------------------------------------
// ESPN slot ID mapping functions
// ---------------------------------------------------------------------------

/// Expand an ESPN slot ID into the concrete positions it represents.
///
/// Combo slots (OF, MI, CI, P) expand to all their members; meta slots
/// (UTIL, BE, IL) and unknown ids carry no eligibility and return nothing.
pub fn positions_from_espn_slot(slot_id: u16) -> Vec<Position> {
    match slot_id {
        ESPN_SLOT_C => vec![Position::Catcher],
        ESPN_SLOT_1B => vec![Position::FirstBase],
        ESPN_SLOT_2B => vec![Position::SecondBase],
        ESPN_SLOT_3B => vec![Position::ThirdBase],
        ESPN_SLOT_SS => vec![Position::ShortStop],
        ESPN_SLOT_OF => vec![Position::LeftField, Position::CenterField, Position::RightField],
        ESPN_SLOT_MI => vec![Position::SecondBase, Position::ShortStop],
        ESPN_SLOT_CI => vec![Position::FirstBase, Position::ThirdBase],
        ESPN_SLOT_LF => vec![Position::LeftField],
        ESPN_SLOT_CF => vec![Position::CenterField],
        ESPN_SLOT_RF => vec![Position::RightField],
        ESPN_SLOT_DH => vec![Position::DesignatedHitter],
        ESPN_SLOT_P => vec![Position::StartingPitcher, Position::ReliefPitcher],
        ESPN_SLOT_SP => vec![Position::StartingPitcher],
        ESPN_SLOT_RP => vec![Position::ReliefPitcher],
        ESPN_SLOT_UTIL | ESPN_SLOT_BE | ESPN_SLOT_IL => Vec::new(),
        _ => Vec::new(),
    }
}

/// Expand a position tag from raw data into concrete eligibility.
///
/// "OF" in raw data means the player can play any outfield spot; the other
/// flex tags expand the same way. Meta tags carry no eligibility.
pub fn eligibility_from_tag(tag: &str) -> Option<Vec<Position>> {
    let pos = Position::from_str_pos(tag)?;
    Some(match pos {
        Position::Utility | Position::Bench | Position::InjuredList => Vec::new(),
        flex @ (Position::Outfield
        | Position::MiddleInfield
        | Position::CornerInfield
        | Position::Pitcher) => flex.accepted_positions(),
        concrete => vec![concrete],
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
