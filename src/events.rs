//! Notifications published to whoever renders the game.

use alloc::string::String;

use crate::engine::GameStatus;
use crate::piece::Color;
use crate::protocol::{BoardSetupMessage, ChatMessage, SinglePositionMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// A whole setup band was committed.
    Setup(BoardSetupMessage),
    /// A single cell changed.
    Position(SinglePositionMessage),
    /// Both setups are on the board; `first` moves first.
    BattleStarted { first: Color },
    /// Local input was enabled or disabled.
    TurnChanged { my_turn: bool },
    Chat(ChatMessage),
    GameOver { status: GameStatus },
    /// A link failed; the game cannot continue.
    Disconnected { reason: String },
}

/// Receiver of board and session notifications.
pub trait EventSink: Send {
    fn publish(&mut self, event: GameEvent);
}

#[cfg(feature = "std")]
impl EventSink for tokio::sync::mpsc::UnboundedSender<GameEvent> {
    fn publish(&mut self, event: GameEvent) {
        // a closed receiver only means nobody is watching any more
        let _ = self.send(event);
    }
}
