#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod board;
mod common;
mod config;
mod engine;
mod events;
mod inventory;
mod piece;
pub mod protocol;
mod setup;
#[cfg(feature = "std")]
pub mod cli;
#[cfg(feature = "std")]
pub mod clock;
#[cfg(feature = "std")]
mod logging;
#[cfg(feature = "std")]
pub mod network;
pub mod prelude;
#[cfg(feature = "std")]
mod session;
#[cfg(feature = "std")]
pub mod transport;

pub use board::*;
pub use common::*;
pub use config::*;
pub use engine::*;
pub use events::*;
pub use inventory::*;
pub use piece::*;
pub use protocol::*;
pub use setup::*;
#[cfg(feature = "std")]
pub use logging::{init_logging, parse_level, LOG_ENV};
#[cfg(feature = "std")]
pub use network::Connection;
#[cfg(feature = "std")]
pub use session::*;
#[cfg(feature = "std")]
pub use transport::{in_memory::InMemoryTransport, tcp::TcpTransport, NetworkError, Transport};
