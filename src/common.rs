//! Error types for board, setup and move validation.

use crate::piece::{Color, Rank};

/// Errors returned by Board operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    /// Coordinates fall outside the 10x10 grid.
    OutOfBounds { row: usize, col: usize },
    /// Lake cells never change.
    LakeCell { row: usize, col: usize },
    /// Only a colour's own band can receive its setup.
    NoColor,
}

impl core::fmt::Display for BoardError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BoardError::OutOfBounds { row, col } => {
                write!(f, "Position ({}, {}) is off the board", row, col)
            }
            BoardError::LakeCell { row, col } => {
                write!(f, "Position ({}, {}) is a lake", row, col)
            }
            BoardError::NoColor => write!(f, "Setup must belong to red or blue"),
        }
    }
}

/// Errors returned while building a setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupError {
    /// Cell is outside the colour's four setup rows.
    OutsideBand { row: usize, col: usize },
    /// No piece of that rank is left to place.
    NotAvailable(Rank),
    /// `Empty` and `Lake` cannot be placed.
    NotArmyRank(Rank),
    /// Setup belongs to a different colour.
    WrongColor(Color),
    /// The setup was already committed to the board.
    AlreadyCommitted,
}

impl core::fmt::Display for SetupError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SetupError::OutsideBand { row, col } => {
                write!(f, "Position ({}, {}) is outside the setup rows", row, col)
            }
            SetupError::NotAvailable(rank) => write!(f, "No {} left to place", rank),
            SetupError::NotArmyRank(rank) => write!(f, "Cannot place {}", rank),
            SetupError::WrongColor(color) => write!(f, "Setup does not belong to {}", color),
            SetupError::AlreadyCommitted => write!(f, "Setup was already committed"),
        }
    }
}

/// Reasons a move request is refused before anything is transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    /// The battle has not started or is over.
    NotInPlay,
    NotYourTurn,
    /// Source cell does not hold one of the local player's pieces.
    NotYourPiece,
    /// Rank cannot make that move, or the destination is off-board or a lake.
    IllegalMove,
    /// A Scout would jump over a piece or lake.
    PathBlocked,
    /// Attack resolution is invalid (e.g. onto a friendly piece).
    InvalidAttack,
    Board(BoardError),
}

impl From<BoardError> for MoveError {
    fn from(err: BoardError) -> Self {
        MoveError::Board(err)
    }
}

impl core::fmt::Display for MoveError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MoveError::NotInPlay => write!(f, "The game is not in the battle phase"),
            MoveError::NotYourTurn => write!(f, "It is not your turn"),
            MoveError::NotYourPiece => write!(f, "No piece of yours at the source"),
            MoveError::IllegalMove => write!(f, "That piece cannot move there"),
            MoveError::PathBlocked => write!(f, "The path is blocked"),
            MoveError::InvalidAttack => write!(f, "That attack is not allowed"),
            MoveError::Board(e) => write!(f, "Board error: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BoardError {}
#[cfg(feature = "std")]
impl std::error::Error for SetupError {}
#[cfg(feature = "std")]
impl std::error::Error for MoveError {}
