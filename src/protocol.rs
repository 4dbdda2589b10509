//! Wire messages exchanged between the two peers.

use alloc::string::String;

use crate::config::{BOARD_SIZE, SETUP_ROWS};
use crate::piece::{Color, Piece, Rank};

/// A colour's 4x10 initial placement, row 0 being the first row of its band.
pub type SetupGrid = [[Rank; BOARD_SIZE]; SETUP_ROWS];

/// One side's committed setup.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct BoardSetupMessage {
    pub color: Color,
    pub grid: SetupGrid,
}

/// A change to one board cell, optionally carrying an inventory adjustment.
///
/// The `(-1, -1)` position with no piece is the termination sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct SinglePositionMessage {
    pub row: i8,
    pub col: i8,
    pub piece: Option<Piece>,
    pub adjust: Option<Piece>,
    pub is_removal: bool,
}

impl SinglePositionMessage {
    /// Cell update without an inventory change.
    pub fn set(row: usize, col: usize, piece: Piece) -> Self {
        Self {
            row: row as i8,
            col: col as i8,
            piece: Some(piece),
            adjust: None,
            is_removal: false,
        }
    }

    /// Cell update that also removes `captured` from its owner's inventory.
    pub fn capture(row: usize, col: usize, piece: Piece, captured: Piece) -> Self {
        Self {
            row: row as i8,
            col: col as i8,
            piece: Some(piece),
            adjust: Some(captured),
            is_removal: true,
        }
    }

    pub fn game_over() -> Self {
        Self {
            row: -1,
            col: -1,
            piece: None,
            adjust: None,
            is_removal: false,
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.row == -1 && self.col == -1
    }

    /// Board coordinates, `None` for the sentinel or out-of-range values.
    pub fn position(&self) -> Option<(usize, usize)> {
        let (r, c) = (usize::try_from(self.row).ok()?, usize::try_from(self.col).ok()?);
        (r < BOARD_SIZE && c < BOARD_SIZE).then_some((r, c))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct ChatMessage {
    pub text: String,
    pub color: Color,
}

/// Everything that travels on either link.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Message {
    /// First frame on each link, carrying the sender's protocol version.
    Hello { version: u16 },
    Setup(BoardSetupMessage),
    Position(SinglePositionMessage),
    Chat(ChatMessage),
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Hello { .. } => "hello",
            Message::Setup(_) => "setup",
            Message::Position(_) => "position",
            Message::Chat(_) => "chat",
        }
    }
}

/// Envelope numbering every frame sent on a link, starting at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    pub seq: u64,
    pub message: Message,
}
