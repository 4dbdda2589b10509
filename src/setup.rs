//! Staging area for one colour's initial placement.

use alloc::vec::Vec;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::common::SetupError;
use crate::config::{army_count, band_start, BOARD_SIZE, SETUP_ROWS};
use crate::piece::{Color, Rank, ARMY_RANKS};
use crate::protocol::SetupGrid;

/// A colour's 4x10 placement in progress.
///
/// Availability is always derived from what is placed, so overwriting or
/// clearing a cell returns its rank to the pool automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setup {
    color: Color,
    start: usize,
    cells: [[Option<Rank>; BOARD_SIZE]; SETUP_ROWS],
}

impl Setup {
    /// Empty setup for `color`. Fails for the neutral colour.
    pub fn new(color: Color) -> Result<Self, SetupError> {
        let start = band_start(color).ok_or(SetupError::WrongColor(color))?;
        Ok(Self {
            color,
            start,
            cells: [[None; BOARD_SIZE]; SETUP_ROWS],
        })
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Translate a board row into a row of this setup.
    fn local_row(&self, row: usize, col: usize) -> Result<usize, SetupError> {
        if row < self.start || row >= self.start + SETUP_ROWS || col >= BOARD_SIZE {
            return Err(SetupError::OutsideBand { row, col });
        }
        Ok(row - self.start)
    }

    pub fn placed_count(&self, rank: Rank) -> u8 {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| **cell == Some(rank))
            .count() as u8
    }

    /// How many more of `rank` may be placed.
    pub fn available(&self, rank: Rank) -> u8 {
        army_count(rank).saturating_sub(self.placed_count(rank))
    }

    /// Rank placed at board position (row, col), if any.
    pub fn placed(&self, row: usize, col: usize) -> Option<Rank> {
        let r = self.local_row(row, col).ok()?;
        self.cells[r][col]
    }

    /// Place `rank` at board position (row, col), returning the rank it
    /// replaced.
    pub fn place(&mut self, row: usize, col: usize, rank: Rank) -> Result<Option<Rank>, SetupError> {
        if rank.army_index().is_none() {
            return Err(SetupError::NotArmyRank(rank));
        }
        let r = self.local_row(row, col)?;
        let previous = self.cells[r][col];
        if previous == Some(rank) {
            return Ok(previous);
        }
        if self.available(rank) == 0 {
            return Err(SetupError::NotAvailable(rank));
        }
        self.cells[r][col] = Some(rank);
        Ok(previous)
    }

    /// Clear board position (row, col), returning what was placed there.
    pub fn remove(&mut self, row: usize, col: usize) -> Option<Rank> {
        let r = self.local_row(row, col).ok()?;
        self.cells[r][col].take()
    }

    fn empty_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..SETUP_ROWS)
            .flat_map(|r| (0..BOARD_SIZE).map(move |c| (r, c)))
            .filter(|&(r, c)| self.cells[r][c].is_none())
    }

    /// Ranks still to be placed, in army order.
    fn pool(&self) -> Vec<Rank> {
        ARMY_RANKS
            .iter()
            .flat_map(|&rank| core::iter::repeat(rank).take(self.available(rank) as usize))
            .collect()
    }

    /// Give every unplaced cell, in row-major order, the next rank still
    /// available in army order.
    pub fn fill_remaining(&mut self) {
        let pool = self.pool();
        let targets: Vec<_> = self.empty_cells().collect();
        for ((r, c), rank) in targets.into_iter().zip(pool) {
            self.cells[r][c] = Some(rank);
        }
    }

    /// Like [`Setup::fill_remaining`] but with the remaining pool shuffled.
    pub fn random_fill<R: Rng>(&mut self, rng: &mut R) {
        let mut pool = self.pool();
        pool.shuffle(rng);
        let targets: Vec<_> = self.empty_cells().collect();
        for ((r, c), rank) in targets.into_iter().zip(pool) {
            self.cells[r][c] = Some(rank);
        }
    }

    pub fn is_complete(&self) -> bool {
        self.empty_cells().next().is_none()
    }

    /// Placement as sent on the wire; unplaced cells are `Empty`.
    pub fn grid(&self) -> SetupGrid {
        let mut grid = [[Rank::Empty; BOARD_SIZE]; SETUP_ROWS];
        for (r, row) in self.cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                grid[r][c] = cell.unwrap_or(Rank::Empty);
            }
        }
        grid
    }
}
