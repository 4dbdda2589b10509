use alloc::string::{String, ToString};
use core::time::Duration;

use crate::piece::{Color, Rank};

pub const BOARD_SIZE: usize = 10;
/// Rows in each colour's setup band.
pub const SETUP_ROWS: usize = 4;
pub const ARMY_SIZE: usize = 40;

/// The eight permanent lake cells, as (row, col).
pub const LAKES: [(usize, usize); 8] = [
    (4, 2),
    (4, 3),
    (5, 2),
    (5, 3),
    (4, 6),
    (4, 7),
    (5, 6),
    (5, 7),
];

/// Army composition in placement order.
pub const ARMY: [(Rank, u8); 12] = [
    (Rank::Marshal, 1),
    (Rank::General, 1),
    (Rank::Colonel, 2),
    (Rank::Major, 3),
    (Rank::Captain, 4),
    (Rank::Lieutenant, 4),
    (Rank::Sergeant, 4),
    (Rank::Miner, 5),
    (Rank::Scout, 8),
    (Rank::Bomb, 6),
    (Rank::Spy, 1),
    (Rank::Flag, 1),
];

pub const PROTOCOL_VERSION: u16 = 1;

/// Largest frame accepted on either link. A full setup message is well
/// under a kilobyte; chat text is the only variable-size payload.
pub const MAX_FRAME_SIZE: u32 = 64 * 1024;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 4444;

/// Returns `true` if (row, col) is one of the fixed lake cells.
pub fn is_lake(row: usize, col: usize) -> bool {
    LAKES.contains(&(row, col))
}

/// Full-army count for `rank`, zero for `Empty`/`Lake`.
pub fn army_count(rank: Rank) -> u8 {
    ARMY.iter()
        .find(|(r, _)| *r == rank)
        .map(|(_, n)| *n)
        .unwrap_or(0)
}

/// First board row of the setup band owned by `color`.
pub fn band_start(color: Color) -> Option<usize> {
    match color {
        Color::Blue => Some(0),
        Color::Red => Some(BOARD_SIZE - SETUP_ROWS),
        Color::None => None,
    }
}

/// Which side of the connection this peer plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Listens, plays RED and moves first.
    Host,
    /// Connects, plays BLUE.
    Joiner,
}

impl Role {
    pub fn color(self) -> Color {
        match self {
            Role::Host => Color::Red,
            Role::Joiner => Color::Blue,
        }
    }
}

/// Endpoint configuration for building the two game links.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub role: Role,
    pub host: String,
    pub port: u16,
    /// Upper bound on a single blocking read. `None` waits forever.
    pub read_timeout: Option<Duration>,
}

impl NetworkConfig {
    pub fn host(port: u16) -> Self {
        Self {
            role: Role::Host,
            host: DEFAULT_HOST.to_string(),
            port,
            read_timeout: None,
        }
    }

    pub fn join(host: &str, port: u16) -> Self {
        Self {
            role: Role::Joiner,
            host: host.to_string(),
            port,
            read_timeout: None,
        }
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::host(DEFAULT_PORT)
    }
}
