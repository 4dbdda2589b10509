//! Commonly used types and utilities for ease of import.

pub use crate::{
    who_wins, Board, Color, GameEngine, GameEvent, GameStatus, Outcome, Phase, Piece, Rank,
    Setup, SinglePositionMessage,
};

#[cfg(feature = "std")]
pub use crate::{Connection, NetworkConfig, Role, Session, SessionError};

#[cfg(feature = "std")]
pub use crate::transport::{in_memory::InMemoryTransport, tcp::TcpTransport, NetworkError, Transport};
