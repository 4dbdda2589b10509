//! Piece ranks, colours, movement legality and combat resolution.

use core::fmt;
use core::str::FromStr;

use crate::board::Board;
use crate::config::{is_lake, BOARD_SIZE};

/// Owner of a piece. Discriminants match the wire encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Color {
    #[default]
    None = 0,
    Blue = 1,
    Red = 2,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::Blue => Color::Red,
            Color::Red => Color::Blue,
            Color::None => Color::None,
        }
    }

    /// Index into per-colour tables, `None` for the neutral colour.
    pub(crate) fn index(self) -> Option<usize> {
        match self {
            Color::Blue => Some(0),
            Color::Red => Some(1),
            Color::None => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Color::None => "none",
            Color::Blue => "blue",
            Color::Red => "red",
        };
        f.write_str(name)
    }
}

/// Piece type. `Empty` and `Lake` fill the cells that hold no army piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Rank {
    #[default]
    Empty,
    Lake,
    Marshal,
    General,
    Colonel,
    Major,
    Captain,
    Lieutenant,
    Sergeant,
    Miner,
    Scout,
    Bomb,
    Spy,
    Flag,
}

/// Number of distinct army ranks.
pub const RANK_COUNT: usize = 12;

/// The twelve ranks that make up an army, in placement order.
pub const ARMY_RANKS: [Rank; RANK_COUNT] = [
    Rank::Marshal,
    Rank::General,
    Rank::Colonel,
    Rank::Major,
    Rank::Captain,
    Rank::Lieutenant,
    Rank::Sergeant,
    Rank::Miner,
    Rank::Scout,
    Rank::Bomb,
    Rank::Spy,
    Rank::Flag,
];

impl Rank {
    /// Combat strength. `Empty` and `Lake` sit below every army rank.
    pub const fn level(self) -> i8 {
        match self {
            Rank::Empty | Rank::Lake => -1,
            Rank::Marshal => 9,
            Rank::General => 8,
            Rank::Colonel => 7,
            Rank::Major => 6,
            Rank::Captain => 5,
            Rank::Lieutenant => 4,
            Rank::Sergeant => 3,
            Rank::Miner => 2,
            Rank::Scout => 1,
            Rank::Bomb | Rank::Spy | Rank::Flag => 0,
        }
    }

    pub const fn is_moveable(self) -> bool {
        !matches!(self, Rank::Empty | Rank::Lake | Rank::Bomb | Rank::Flag)
    }

    /// Position in [`ARMY_RANKS`], `None` for `Empty` and `Lake`.
    pub fn army_index(self) -> Option<usize> {
        ARMY_RANKS.iter().position(|r| *r == self)
    }

    /// One-letter symbol used by the terminal front end.
    pub const fn symbol(self) -> char {
        match self {
            Rank::Empty => '.',
            Rank::Lake => '~',
            Rank::Marshal => 'M',
            Rank::General => 'G',
            Rank::Colonel => 'C',
            Rank::Major => 'J',
            Rank::Captain => 'P',
            Rank::Lieutenant => 'L',
            Rank::Sergeant => 'E',
            Rank::Miner => 'I',
            Rank::Scout => 'S',
            Rank::Bomb => 'B',
            Rank::Spy => 'Y',
            Rank::Flag => 'F',
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Rank::Empty => "empty",
            Rank::Lake => "lake",
            Rank::Marshal => "marshal",
            Rank::General => "general",
            Rank::Colonel => "colonel",
            Rank::Major => "major",
            Rank::Captain => "captain",
            Rank::Lieutenant => "lieutenant",
            Rank::Sergeant => "sergeant",
            Rank::Miner => "miner",
            Rank::Scout => "scout",
            Rank::Bomb => "bomb",
            Rank::Spy => "spy",
            Rank::Flag => "flag",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a string names no army rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRankError;

impl fmt::Display for ParseRankError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown piece rank")
    }
}

impl FromStr for Rank {
    type Err = ParseRankError;

    /// Accepts a full rank name or its one-letter symbol, case-insensitively.
    /// Only army ranks parse; `empty` and `lake` are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        for rank in ARMY_RANKS {
            if s.eq_ignore_ascii_case(rank.name()) {
                return Ok(rank);
            }
            let mut chars = s.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                if c.to_ascii_uppercase() == rank.symbol() {
                    return Ok(rank);
                }
            }
        }
        Err(ParseRankError)
    }
}

/// A board value: a rank plus its owner. Plain data, copied per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Piece {
    pub rank: Rank,
    pub color: Color,
}

impl Piece {
    pub const EMPTY: Piece = Piece {
        rank: Rank::Empty,
        color: Color::None,
    };
    pub const LAKE: Piece = Piece {
        rank: Rank::Lake,
        color: Color::None,
    };

    /// Build a piece. `Empty` and `Lake` are always colourless.
    pub fn new(rank: Rank, color: Color) -> Self {
        match rank {
            Rank::Empty | Rank::Lake => Piece {
                rank,
                color: Color::None,
            },
            _ => Piece { rank, color },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rank == Rank::Empty
    }

    pub fn is_moveable(&self) -> bool {
        self.rank.is_moveable()
    }
}

/// Result of one piece attacking another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    BothRemoved,
    AttackerRemains,
    DefenderRemains,
    Invalid,
}

impl Outcome {
    /// Integer code: 0 both removed, 1 attacker remains, 2 defender remains,
    /// -1 invalid.
    pub fn code(self) -> i8 {
        match self {
            Outcome::BothRemoved => 0,
            Outcome::AttackerRemains => 1,
            Outcome::DefenderRemains => 2,
            Outcome::Invalid => -1,
        }
    }
}

/// Checks a move against the mover's abilities and the fixed terrain only.
///
/// Occupancy is not considered here: a Scout's path is checked separately
/// by [`path_is_clear`], and the destination piece by [`who_wins`].
pub fn is_move_valid(
    src_row: usize,
    src_col: usize,
    dst_row: usize,
    dst_col: usize,
    rank: Rank,
) -> bool {
    if !rank.is_moveable() {
        return false;
    }
    if dst_row >= BOARD_SIZE || dst_col >= BOARD_SIZE {
        return false;
    }
    if is_lake(dst_row, dst_col) {
        return false;
    }
    // exactly one axis changes: no diagonals, no standing still
    if (src_row == dst_row) == (src_col == dst_col) {
        return false;
    }
    let distance = src_row.abs_diff(dst_row) + src_col.abs_diff(dst_col);
    rank == Rank::Scout || distance == 1
}

/// Decides which piece survives when `attacker` moves onto `defender`.
pub fn who_wins(attacker: Piece, defender: Piece) -> Outcome {
    if !attacker.is_moveable() || defender.rank == Rank::Lake {
        return Outcome::Invalid;
    }
    if attacker.color != Color::None && attacker.color == defender.color {
        return Outcome::Invalid;
    }
    if defender.rank == Rank::Bomb {
        return if attacker.rank == Rank::Miner {
            Outcome::AttackerRemains
        } else {
            Outcome::DefenderRemains
        };
    }
    if attacker.rank == Rank::Spy && defender.rank == Rank::Marshal {
        return Outcome::AttackerRemains;
    }
    let (a, d) = (attacker.rank.level(), defender.rank.level());
    if a == d {
        Outcome::BothRemoved
    } else if a > d {
        Outcome::AttackerRemains
    } else {
        Outcome::DefenderRemains
    }
}

/// Returns `true` when every cell strictly between source and destination
/// is empty. Callers must already have established a straight-line move.
pub fn path_is_clear(
    board: &Board,
    src_row: usize,
    src_col: usize,
    dst_row: usize,
    dst_col: usize,
) -> bool {
    if src_row == dst_row {
        let (lo, hi) = (src_col.min(dst_col), src_col.max(dst_col));
        (lo + 1..hi).all(|c| board.is_empty_at(src_row, c))
    } else {
        let (lo, hi) = (src_row.min(dst_row), src_row.max(dst_row));
        (lo + 1..hi).all(|r| board.is_empty_at(r, src_col))
    }
}
