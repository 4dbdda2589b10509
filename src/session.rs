#![cfg(feature = "std")]

//! Networked game: one engine, one connection and the listener tasks that
//! feed the opponent's messages into the engine.
//!
//! The game listener reads the opponent's setup and then loops over turn
//! cycles of exactly three position messages (or the termination
//! sentinel). The chat listener runs independently until stopped. Engine
//! state sits behind a `std::sync::Mutex` that is never held across an
//! `.await`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};
use rand::Rng;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

use crate::board::Grid;
use crate::common::SetupError;
use crate::config::{NetworkConfig, Role};
use crate::engine::{GameEngine, GameStatus, Phase, TurnMessages};
use crate::events::{EventSink, GameEvent};
use crate::network::Connection;
use crate::piece::{Color, Piece, Rank};
use crate::protocol::{ChatMessage, Message, SinglePositionMessage};
use crate::transport::NetworkError;

type SharedEngine = Arc<Mutex<GameEngine>>;

fn lock(engine: &SharedEngine) -> MutexGuard<'_, GameEngine> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Setup error: {0}")]
    Setup(SetupError),
    #[error(transparent)]
    Network(#[from] NetworkError),
}

pub struct Session {
    engine: SharedEngine,
    connection: Arc<Connection>,
    chat_running: Arc<AtomicBool>,
    /// Serializes outgoing game traffic so a turn's three writes never
    /// interleave with another move or the sentinel.
    turn_lock: AsyncMutex<()>,
    listeners: Mutex<Vec<JoinHandle<()>>>,
}

impl Session {
    /// Build both links as described by `config` and start listening.
    pub async fn connect(config: &NetworkConfig, sink: Box<dyn EventSink>) -> Result<Self, NetworkError> {
        let connection = Connection::establish(config).await?;
        Ok(Self::start(config.role, connection, sink))
    }

    /// Start a session over an established connection. Must be called from
    /// within a tokio runtime.
    pub fn start(role: Role, connection: Connection, sink: Box<dyn EventSink>) -> Self {
        let mut engine = GameEngine::new(role.color());
        engine.set_sink(sink);
        let engine = Arc::new(Mutex::new(engine));
        let connection = Arc::new(connection);
        let chat_running = Arc::new(AtomicBool::new(true));

        let game = tokio::spawn(game_listener(engine.clone(), connection.clone()));
        let chat = tokio::spawn(chat_listener(
            engine.clone(),
            connection.clone(),
            chat_running.clone(),
        ));
        info!("Session started as {:?} ({})", role, role.color());

        Self {
            engine,
            connection,
            chat_running,
            turn_lock: AsyncMutex::new(()),
            listeners: Mutex::new(vec![game, chat]),
        }
    }

    fn engine(&self) -> MutexGuard<'_, GameEngine> {
        lock(&self.engine)
    }

    pub fn color(&self) -> Color {
        self.engine().color()
    }

    pub fn phase(&self) -> Phase {
        self.engine().phase()
    }

    pub fn status(&self) -> GameStatus {
        self.engine().status()
    }

    pub fn is_my_turn(&self) -> bool {
        self.engine().is_my_turn()
    }

    pub fn winner(&self) -> Color {
        self.engine().winner()
    }

    /// Piece at (row, col), `None` when off the board.
    pub fn get_position(&self, row: usize, col: usize) -> Option<Piece> {
        self.engine().position(row, col).ok()
    }

    pub fn snapshot(&self) -> Grid {
        self.engine().board().snapshot()
    }

    pub fn check_available(&self, rank: Rank, color: Color) -> u8 {
        self.engine().check_available(rank, color)
    }

    pub fn add_to_setup(&self, row: usize, col: usize, rank: Rank, color: Color) -> bool {
        match self.engine().add_to_setup(row, col, rank, color) {
            Ok(_) => true,
            Err(e) => {
                debug!("setup placement rejected: {}", e);
                false
            }
        }
    }

    /// Rank placed at (row, col) in the uncommitted local setup.
    pub fn setup_piece(&self, row: usize, col: usize) -> Option<Rank> {
        self.engine().setup()?.placed(row, col)
    }

    pub fn remove_from_setup(&self, row: usize, col: usize) -> Option<Rank> {
        self.engine().remove_from_setup(row, col)
    }

    pub fn fill_setup(&self) -> Result<(), SetupError> {
        self.engine().fill_setup()
    }

    pub fn random_setup<R: Rng>(&self, rng: &mut R) -> Result<(), SetupError> {
        self.engine().random_setup(rng)
    }

    /// Fill, commit and transmit the local setup.
    pub async fn set_board(&self) -> Result<(), SessionError> {
        let _turn = self.turn_lock.lock().await;
        let msg = self.engine().commit_setup().map_err(SessionError::Setup)?;
        if let Err(e) = self.connection.write_setup(&msg).await {
            self.disconnected(&e);
            return Err(e.into());
        }
        let mut engine = self.engine();
        engine.setup_transmitted();
        if engine.begin_battle() {
            info!("Both setups exchanged, battle begins");
        }
        Ok(())
    }

    /// Validate, apply and transmit a move. `false` if the move is not
    /// legal right now or could not be transmitted.
    ///
    /// The move is applied and the turn handed over before the first write,
    /// so the opponent's reply can never be applied ahead of it.
    pub async fn move_piece(&self, src_row: usize, src_col: usize, dst_row: usize, dst_col: usize) -> bool {
        let _turn = self.turn_lock.lock().await;
        let played = self.engine().move_piece(src_row, src_col, dst_row, dst_col);
        let msgs = match played {
            Ok(msgs) => msgs,
            Err(e) => {
                debug!(
                    "move ({}, {}) -> ({}, {}) rejected: {}",
                    src_row, src_col, dst_row, dst_col, e
                );
                return false;
            }
        };
        for msg in &msgs {
            if let Err(e) = self.connection.write_position(msg).await {
                self.disconnected(&e);
                return false;
            }
        }
        true
    }

    pub async fn write_chat_message(&self, text: &str) -> Result<(), NetworkError> {
        let msg = ChatMessage {
            text: text.to_string(),
            color: self.color(),
        };
        self.connection.write_chat(&msg).await?;
        self.engine().publish(GameEvent::Chat(msg));
        Ok(())
    }

    /// Send the termination sentinel and end the local game.
    pub async fn write_game_over_msg(&self) -> Result<(), NetworkError> {
        let _turn = self.turn_lock.lock().await;
        let result = self
            .connection
            .write_position(&SinglePositionMessage::game_over())
            .await;
        self.engine().end_game();
        result
    }

    /// Stop the chat listener and close the chat link.
    pub async fn stop_chat(&self) {
        self.chat_running.store(false, Ordering::SeqCst);
        let _ = self.connection.close_chat_connection().await;
    }

    /// Close both links and wait for the listeners to exit.
    pub async fn shutdown(&self) {
        self.chat_running.store(false, Ordering::SeqCst);
        if self.connection.is_open() {
            let _ = self.connection.close_connection().await;
        }
        if self.connection.is_chat_open() {
            let _ = self.connection.close_chat_connection().await;
        }
        let handles: Vec<_> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for handle in handles {
            let _ = handle.await;
        }
    }

    pub fn last_error(&self) -> String {
        self.connection.last_error()
    }

    fn disconnected(&self, err: &NetworkError) {
        report_disconnect(&self.engine, err);
    }
}

fn report_disconnect(engine: &SharedEngine, err: &NetworkError) {
    let mut engine = lock(engine);
    if engine.phase() == Phase::GameOver {
        debug!("link closed after game over: {}", err);
        return;
    }
    warn!("connection lost: {}", err);
    engine.publish(GameEvent::Disconnected {
        reason: err.to_string(),
    });
}

enum TurnCycle {
    Move(TurnMessages),
    Quit,
}

/// Read one full turn: the sentinel, or exactly three position messages.
async fn read_turn(connection: &Connection) -> Result<TurnCycle, NetworkError> {
    let first = connection.read_position().await?;
    if first.is_game_over() {
        return Ok(TurnCycle::Quit);
    }
    let second = connection.read_position().await?;
    let third = connection.read_position().await?;
    Ok(TurnCycle::Move([first, second, third]))
}

/// Wait for the opponent's setup. Returns `false` if the game ended or the
/// link failed first.
async fn await_setup(engine: &SharedEngine, connection: &Connection) -> bool {
    let received = connection.read_message().await;
    match received {
        Ok(Message::Setup(msg)) => {
            let mut engine = lock(engine);
            if let Err(e) = engine.apply_setup(&msg) {
                warn!("rejected opponent setup: {}", e);
                return false;
            }
            info!("Received {} setup", msg.color);
            if engine.begin_battle() {
                info!("Both setups exchanged, battle begins");
            }
            true
        }
        Ok(Message::Position(msg)) if msg.is_game_over() => {
            info!("Opponent left during setup");
            lock(engine).end_game();
            false
        }
        Ok(other) => {
            warn!("expected setup, got {} message", other.kind());
            false
        }
        Err(e) => {
            report_disconnect(engine, &e);
            false
        }
    }
}

async fn game_listener(engine: SharedEngine, connection: Arc<Connection>) {
    if !await_setup(&engine, &connection).await {
        return;
    }
    loop {
        let cycle = read_turn(&connection).await;
        match cycle {
            Ok(TurnCycle::Move(msgs)) => {
                let applied = {
                    let mut engine = lock(&engine);
                    let applied = engine.apply_remote_turn(&msgs);
                    if applied.is_ok() && engine.phase() == Phase::GameOver {
                        info!("Game over: {:?}", engine.status());
                        break;
                    }
                    applied
                };
                if let Err(e) = applied {
                    // the boards can no longer agree; drop the game link
                    let err = NetworkError::Protocol(format!("rejected opponent move: {}", e));
                    report_disconnect(&engine, &err);
                    let _ = connection.close_connection().await;
                    break;
                }
            }
            Ok(TurnCycle::Quit) => {
                info!("Opponent ended the game");
                lock(&engine).end_game();
                break;
            }
            Err(e) => {
                // an incomplete cycle is dropped without applying any of it
                report_disconnect(&engine, &e);
                break;
            }
        }
    }
    debug!("game listener stopped");
}

async fn chat_listener(engine: SharedEngine, connection: Arc<Connection>, running: Arc<AtomicBool>) {
    while running.load(Ordering::SeqCst) {
        let received = connection.read_chat().await;
        match received {
            Ok(msg) => {
                lock(&engine).publish(GameEvent::Chat(msg));
            }
            Err(e) => {
                debug!("chat listener stopped: {}", e);
                break;
            }
        }
    }
}
