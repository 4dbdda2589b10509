//! The 10x10 grid and the per-colour inventories that go with it.

use alloc::boxed::Box;
use core::fmt;

use crate::common::BoardError;
use crate::config::{band_start, is_lake, BOARD_SIZE, SETUP_ROWS};
use crate::events::{EventSink, GameEvent};
use crate::inventory::Inventory;
use crate::piece::{Color, Piece, Rank};
use crate::protocol::{BoardSetupMessage, SetupGrid, SinglePositionMessage};

/// Full grid by value, `grid[row][col]`.
pub type Grid = [[Piece; BOARD_SIZE]; BOARD_SIZE];

pub struct Board {
    grid: Grid,
    inventories: [Inventory; 2],
    sink: Option<Box<dyn EventSink>>,
}

impl Board {
    /// Empty board with the lakes in place and two full inventories.
    pub fn new() -> Self {
        let mut grid = [[Piece::EMPTY; BOARD_SIZE]; BOARD_SIZE];
        for (r, row) in grid.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                if is_lake(r, c) {
                    *cell = Piece::LAKE;
                }
            }
        }
        Board {
            grid,
            inventories: [Inventory::full(), Inventory::full()],
            sink: None,
        }
    }

    /// Register the sink that receives cell and setup notifications,
    /// replacing any previous one.
    pub fn set_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sink = Some(sink);
    }

    pub fn notify(&mut self, event: GameEvent) {
        if let Some(sink) = self.sink.as_mut() {
            sink.publish(event);
        }
    }

    fn check_bounds(row: usize, col: usize) -> Result<(), BoardError> {
        if row >= BOARD_SIZE || col >= BOARD_SIZE {
            return Err(BoardError::OutOfBounds { row, col });
        }
        Ok(())
    }

    pub fn position(&self, row: usize, col: usize) -> Result<Piece, BoardError> {
        Self::check_bounds(row, col)?;
        Ok(self.grid[row][col])
    }

    /// `true` for an in-bounds cell holding `Empty`.
    pub fn is_empty_at(&self, row: usize, col: usize) -> bool {
        self.position(row, col).map(|p| p.is_empty()).unwrap_or(false)
    }

    /// Place `piece` at (row, col) and notify the sink. Lake cells reject
    /// every write, and a lake cannot be written elsewhere.
    pub fn set_position(&mut self, row: usize, col: usize, piece: Piece) -> Result<(), BoardError> {
        Self::check_bounds(row, col)?;
        if is_lake(row, col) || piece.rank == Rank::Lake {
            return Err(BoardError::LakeCell { row, col });
        }
        let piece = Piece::new(piece.rank, piece.color);
        self.grid[row][col] = piece;
        self.notify(GameEvent::Position(SinglePositionMessage::set(row, col, piece)));
        Ok(())
    }

    /// Replace the cell with `Empty` and return what was there. A lake is
    /// returned unchanged.
    pub fn remove_position(&mut self, row: usize, col: usize) -> Result<Piece, BoardError> {
        Self::check_bounds(row, col)?;
        let previous = self.grid[row][col];
        if previous.rank == Rank::Lake {
            return Ok(previous);
        }
        self.grid[row][col] = Piece::EMPTY;
        self.notify(GameEvent::Position(SinglePositionMessage::set(row, col, Piece::EMPTY)));
        Ok(previous)
    }

    /// Take one `piece.rank` off its owner's inventory. `false` for
    /// colourless pieces or a rank already at zero.
    pub fn remove_piece(&mut self, piece: Piece) -> bool {
        match piece.color.index() {
            Some(i) => self.inventories[i].remove(piece.rank),
            None => false,
        }
    }

    /// Return one `piece.rank` to its owner's inventory. `false` for
    /// colourless pieces or a rank already at its army count.
    pub fn add_piece(&mut self, piece: Piece) -> bool {
        match piece.color.index() {
            Some(i) => self.inventories[i].add(piece.rank),
            None => false,
        }
    }

    /// Commit a setup grid into `color`'s band.
    ///
    /// The colour's inventory is rebuilt from the committed grid so that it
    /// always matches what is on the board.
    pub fn set_board(&mut self, grid: &SetupGrid, color: Color, notify: bool) -> Result<(), BoardError> {
        let (start, idx) = match (band_start(color), color.index()) {
            (Some(start), Some(idx)) => (start, idx),
            _ => return Err(BoardError::NoColor),
        };
        let mut inventory = Inventory::empty();
        for (offset, ranks) in grid.iter().enumerate() {
            let row = start + offset;
            for (col, &rank) in ranks.iter().enumerate() {
                let piece = match rank {
                    Rank::Lake => Piece::EMPTY,
                    rank => Piece::new(rank, color),
                };
                if !piece.is_empty() && !inventory.add(piece.rank) {
                    // more of this rank than an army holds; leave the cell empty
                    self.grid[row][col] = Piece::EMPTY;
                    continue;
                }
                self.grid[row][col] = piece;
            }
        }
        self.inventories[idx] = inventory;
        if notify {
            self.notify(GameEvent::Setup(BoardSetupMessage { color, grid: *grid }));
        }
        Ok(())
    }

    /// Check that [`Self::apply`] would accept `msg`, without changing
    /// anything.
    pub fn check(&self, msg: &SinglePositionMessage) -> Result<(usize, usize), BoardError> {
        let (row, col) = msg.position().ok_or(BoardError::OutOfBounds {
            row: msg.row as usize,
            col: msg.col as usize,
        })?;
        Self::check_bounds(row, col)?;
        if let Some(piece) = msg.piece.filter(|p| !p.is_empty()) {
            if is_lake(row, col) || piece.rank == Rank::Lake {
                return Err(BoardError::LakeCell { row, col });
            }
        }
        Ok((row, col))
    }

    /// Apply a received or locally generated cell update.
    pub fn apply(&mut self, msg: &SinglePositionMessage) -> Result<(), BoardError> {
        let (row, col) = self.check(msg)?;
        match msg.piece {
            Some(piece) if !piece.is_empty() => self.set_position(row, col, piece)?,
            _ => {
                self.remove_position(row, col)?;
            }
        }
        if let Some(adjust) = msg.adjust {
            if msg.is_removal {
                self.remove_piece(adjust);
            } else {
                self.add_piece(adjust);
            }
        }
        Ok(())
    }

    pub fn inventory(&self, color: Color) -> Option<&Inventory> {
        color.index().map(|i| &self.inventories[i])
    }

    /// Pieces of `rank` still on the board for `color`.
    pub fn count(&self, rank: Rank, color: Color) -> u8 {
        self.inventory(color).map(|inv| inv.count(rank)).unwrap_or(0)
    }

    /// Cells currently holding a piece of `color`, counted from the grid.
    pub fn pieces_on_board(&self, color: Color) -> usize {
        self.grid
            .iter()
            .flatten()
            .filter(|p| color != Color::None && p.color == color)
            .count()
    }

    pub fn snapshot(&self) -> Grid {
        self.grid
    }

    /// Setup rows owned by `color`, or `None` for the neutral colour.
    pub fn band(color: Color) -> Option<core::ops::Range<usize>> {
        band_start(color).map(|start| start..start + SETUP_ROWS)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board {{")?;
        for row in self.grid.iter() {
            write!(f, "  ")?;
            for piece in row.iter() {
                let ch = match piece.color {
                    Color::Red => piece.rank.symbol().to_ascii_uppercase(),
                    Color::Blue => piece.rank.symbol().to_ascii_lowercase(),
                    Color::None => piece.rank.symbol(),
                };
                write!(f, "{}", ch)?;
            }
            writeln!(f)?;
        }
        write!(
            f,
            "  blue: {:?}\n  red: {:?}\n}}",
            self.inventories[0], self.inventories[1]
        )
    }
}
