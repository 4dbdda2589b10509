//! Per-peer game state machine: setup exchange, turn cycle and winner check.
//!
//! The engine performs no I/O. It validates local requests, produces the
//! messages that describe them, and applies messages coming from the
//! opponent. Both peers replaying the same messages keep identical boards.

use alloc::boxed::Box;
use rand::Rng;

use crate::board::Board;
use crate::common::{BoardError, MoveError, SetupError};
use crate::events::{EventSink, GameEvent};
use crate::piece::{is_move_valid, path_is_clear, who_wins, Color, Outcome, Piece, Rank};
use crate::protocol::{BoardSetupMessage, SinglePositionMessage};
use crate::setup::Setup;

/// Every move is described by exactly this many position messages.
pub const MESSAGES_PER_TURN: usize = 3;

/// The three messages describing one move, in application order.
pub type TurnMessages = [SinglePositionMessage; MESSAGES_PER_TURN];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingSetup,
    SetupExchanged,
    InPlay,
    GameOver,
}

/// Current status of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Won(Color),
    /// Both sides lost their last movable piece or flag in the same turn.
    Draw,
    /// A player ended the game before it was decided.
    Abandoned,
}

pub struct GameEngine {
    color: Color,
    board: Board,
    setup: Option<Setup>,
    phase: Phase,
    setup_sent: bool,
    setup_received: bool,
    my_turn: bool,
    status: GameStatus,
    turns: u32,
}

impl GameEngine {
    /// Fresh engine for the local `color`, waiting for setup.
    pub fn new(color: Color) -> Self {
        Self {
            color,
            board: Board::new(),
            setup: Setup::new(color).ok(),
            phase: Phase::AwaitingSetup,
            setup_sent: false,
            setup_received: false,
            my_turn: false,
            status: GameStatus::InProgress,
            turns: 0,
        }
    }

    pub fn set_sink(&mut self, sink: Box<dyn EventSink>) {
        self.board.set_sink(sink);
    }

    pub fn publish(&mut self, event: GameEvent) {
        self.board.notify(event);
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_my_turn(&self) -> bool {
        self.my_turn
    }

    /// Completed turns, counting both sides.
    pub fn turns_played(&self) -> u32 {
        self.turns
    }

    pub fn setup_sent(&self) -> bool {
        self.setup_sent
    }

    pub fn setup_received(&self) -> bool {
        self.setup_received
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Mutable access for arranging positions directly.
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn position(&self, row: usize, col: usize) -> Result<Piece, BoardError> {
        self.board.position(row, col)
    }

    /// The local setup while it is still being built.
    pub fn setup(&self) -> Option<&Setup> {
        self.setup.as_ref()
    }

    fn setup_mut(&mut self) -> Result<&mut Setup, SetupError> {
        if self.phase != Phase::AwaitingSetup {
            return Err(SetupError::AlreadyCommitted);
        }
        self.setup.as_mut().ok_or(SetupError::AlreadyCommitted)
    }

    /// Place `rank` for `color` at board position (row, col).
    pub fn add_to_setup(
        &mut self,
        row: usize,
        col: usize,
        rank: Rank,
        color: Color,
    ) -> Result<Option<Rank>, SetupError> {
        if color != self.color {
            return Err(SetupError::WrongColor(color));
        }
        self.setup_mut()?.place(row, col, rank)
    }

    pub fn remove_from_setup(&mut self, row: usize, col: usize) -> Option<Rank> {
        self.setup_mut().ok()?.remove(row, col)
    }

    pub fn fill_setup(&mut self) -> Result<(), SetupError> {
        self.setup_mut()?.fill_remaining();
        Ok(())
    }

    pub fn random_setup<R: Rng>(&mut self, rng: &mut R) -> Result<(), SetupError> {
        self.setup_mut()?.random_fill(rng);
        Ok(())
    }

    /// Pieces of `rank` left for `color`: the placement pool while the local
    /// setup is open, the board inventory otherwise.
    pub fn check_available(&self, rank: Rank, color: Color) -> u8 {
        match &self.setup {
            Some(setup) if color == self.color => setup.available(rank),
            _ => self.board.count(rank, color),
        }
    }

    /// Auto-fill and commit the local setup, returning the message to send.
    /// The setup only counts as exchanged after [`Self::setup_transmitted`].
    pub fn commit_setup(&mut self) -> Result<BoardSetupMessage, SetupError> {
        if self.phase != Phase::AwaitingSetup {
            return Err(SetupError::AlreadyCommitted);
        }
        let mut setup = self.setup.take().ok_or(SetupError::AlreadyCommitted)?;
        setup.fill_remaining();
        let grid = setup.grid();
        self.board
            .set_board(&grid, self.color, true)
            .map_err(|_| SetupError::WrongColor(self.color))?;
        Ok(BoardSetupMessage {
            color: self.color,
            grid,
        })
    }

    /// Record that the committed setup reached the opponent.
    pub fn setup_transmitted(&mut self) {
        if self.setup.is_some() {
            return;
        }
        self.setup_sent = true;
        self.advance_setup();
    }

    /// Commit the opponent's setup without re-transmitting it.
    pub fn apply_setup(&mut self, msg: &BoardSetupMessage) -> Result<(), SetupError> {
        if msg.color != self.color.opponent() || msg.color == Color::None {
            return Err(SetupError::WrongColor(msg.color));
        }
        if self.setup_received {
            return Err(SetupError::AlreadyCommitted);
        }
        self.board
            .set_board(&msg.grid, msg.color, true)
            .map_err(|_| SetupError::WrongColor(msg.color))?;
        self.setup_received = true;
        self.advance_setup();
        Ok(())
    }

    fn advance_setup(&mut self) {
        if self.phase == Phase::AwaitingSetup && self.setup_sent && self.setup_received {
            self.phase = Phase::SetupExchanged;
        }
    }

    /// Move from `SetupExchanged` into the battle. RED moves first.
    /// Returns `false` if the setups have not both been exchanged.
    pub fn begin_battle(&mut self) -> bool {
        if self.phase != Phase::SetupExchanged {
            return false;
        }
        self.phase = Phase::InPlay;
        self.my_turn = self.color == Color::Red;
        self.publish(GameEvent::BattleStarted { first: Color::Red });
        self.publish(GameEvent::TurnChanged {
            my_turn: self.my_turn,
        });
        // a setup without flag or movable pieces loses immediately
        self.refresh_status();
        true
    }

    /// Validate a local move and describe it, without touching the board.
    pub fn plan_move(
        &self,
        src_row: usize,
        src_col: usize,
        dst_row: usize,
        dst_col: usize,
    ) -> Result<TurnMessages, MoveError> {
        if self.phase != Phase::InPlay {
            return Err(MoveError::NotInPlay);
        }
        if !self.my_turn {
            return Err(MoveError::NotYourTurn);
        }
        let attacker = self.board.position(src_row, src_col)?;
        if attacker.color != self.color || attacker.color == Color::None {
            return Err(MoveError::NotYourPiece);
        }
        if !is_move_valid(src_row, src_col, dst_row, dst_col, attacker.rank) {
            return Err(MoveError::IllegalMove);
        }
        if attacker.rank == Rank::Scout
            && !path_is_clear(&self.board, src_row, src_col, dst_row, dst_col)
        {
            return Err(MoveError::PathBlocked);
        }
        let defender = self.board.position(dst_row, dst_col)?;
        let outcome = who_wins(attacker, defender);
        if outcome == Outcome::Invalid {
            return Err(MoveError::InvalidAttack);
        }
        Ok(turn_messages(
            (src_row, src_col),
            (dst_row, dst_col),
            attacker,
            defender,
            outcome,
        ))
    }

    /// Validate and apply a local move in one step.
    pub fn move_piece(
        &mut self,
        src_row: usize,
        src_col: usize,
        dst_row: usize,
        dst_col: usize,
    ) -> Result<TurnMessages, MoveError> {
        let msgs = self.plan_move(src_row, src_col, dst_row, dst_col)?;
        self.finish_local_turn(&msgs)?;
        Ok(msgs)
    }

    /// Apply a planned local move once it has been transmitted and hand the
    /// turn to the opponent.
    pub fn finish_local_turn(&mut self, msgs: &TurnMessages) -> Result<(), BoardError> {
        if self.phase != Phase::InPlay {
            return Ok(());
        }
        self.apply_turn(msgs)?;
        self.my_turn = false;
        self.publish(GameEvent::TurnChanged { my_turn: false });
        self.refresh_status();
        Ok(())
    }

    /// Apply the opponent's three messages and take the turn. A rejected
    /// turn changes nothing and the turn stays with the opponent.
    pub fn apply_remote_turn(&mut self, msgs: &TurnMessages) -> Result<(), BoardError> {
        if self.phase != Phase::InPlay {
            return Ok(());
        }
        self.apply_turn(msgs)?;
        self.my_turn = true;
        self.publish(GameEvent::TurnChanged { my_turn: true });
        self.refresh_status();
        Ok(())
    }

    /// All three messages are checked before the first is applied, so a
    /// rejected turn leaves the board untouched.
    fn apply_turn(&mut self, msgs: &TurnMessages) -> Result<(), BoardError> {
        for msg in msgs {
            self.board.check(msg)?;
        }
        for msg in msgs {
            self.board.apply(msg)?;
        }
        self.turns += 1;
        Ok(())
    }

    /// Status implied by the inventories alone.
    pub fn compute_status(&self) -> GameStatus {
        let lost = |color| {
            self.board
                .inventory(color)
                .map(|inv| inv.is_defeated())
                .unwrap_or(false)
        };
        match (lost(Color::Blue), lost(Color::Red)) {
            (true, true) => GameStatus::Draw,
            (true, false) => GameStatus::Won(Color::Red),
            (false, true) => GameStatus::Won(Color::Blue),
            (false, false) => GameStatus::InProgress,
        }
    }

    fn refresh_status(&mut self) {
        if self.phase != Phase::InPlay {
            return;
        }
        let status = self.compute_status();
        if status != GameStatus::InProgress {
            self.status = status;
            self.phase = Phase::GameOver;
            self.my_turn = false;
            self.publish(GameEvent::GameOver { status });
        }
    }

    /// Winning colour, `Color::None` while undecided, drawn or abandoned.
    pub fn winner(&self) -> Color {
        match self.status {
            GameStatus::Won(color) => color,
            _ => Color::None,
        }
    }

    /// Stop the game without a result, as when either side quits.
    pub fn end_game(&mut self) {
        if self.phase == Phase::GameOver {
            return;
        }
        self.phase = Phase::GameOver;
        self.my_turn = false;
        self.status = GameStatus::Abandoned;
        self.publish(GameEvent::GameOver {
            status: self.status,
        });
    }
}

/// Build the three messages for a resolved move.
///
/// Inventory adjustments ride on the messages whose cell they concern:
/// a removed defender on the outcome message, a removed attacker on the
/// outcome message when the defender holds, or on the destination message
/// when both fall.
fn turn_messages(
    (src_row, src_col): (usize, usize),
    (dst_row, dst_col): (usize, usize),
    attacker: Piece,
    defender: Piece,
    outcome: Outcome,
) -> TurnMessages {
    let cleared = SinglePositionMessage::set(src_row, src_col, Piece::EMPTY);
    let arrived = SinglePositionMessage::set(dst_row, dst_col, attacker);
    match outcome {
        Outcome::BothRemoved => [
            cleared,
            SinglePositionMessage::capture(dst_row, dst_col, attacker, attacker),
            SinglePositionMessage::capture(dst_row, dst_col, Piece::EMPTY, defender),
        ],
        Outcome::DefenderRemains => [
            cleared,
            arrived,
            SinglePositionMessage::capture(dst_row, dst_col, defender, attacker),
        ],
        // Invalid never reaches here; plan_move rejects it first
        Outcome::AttackerRemains | Outcome::Invalid => {
            let outcome = if defender.color == Color::None {
                arrived
            } else {
                SinglePositionMessage::capture(dst_row, dst_col, attacker, defender)
            };
            [cleared, arrived, outcome]
        }
    }
}
