//! Per-colour count of army pieces still on the board.

use crate::config::ARMY;
use crate::piece::{Rank, ARMY_RANKS, RANK_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inventory {
    counts: [u8; RANK_COUNT],
}

impl Inventory {
    /// A complete army: 40 pieces.
    pub fn full() -> Self {
        let mut counts = [0u8; RANK_COUNT];
        for (i, (_, n)) in ARMY.iter().enumerate() {
            counts[i] = *n;
        }
        Self { counts }
    }

    pub fn empty() -> Self {
        Self {
            counts: [0u8; RANK_COUNT],
        }
    }

    /// Remaining count for `rank`, zero for `Empty`/`Lake`.
    pub fn count(&self, rank: Rank) -> u8 {
        rank.army_index().map(|i| self.counts[i]).unwrap_or(0)
    }

    /// Decrement `rank`. Returns `false` if it was already zero.
    pub fn remove(&mut self, rank: Rank) -> bool {
        match rank.army_index() {
            Some(i) if self.counts[i] > 0 => {
                self.counts[i] -= 1;
                true
            }
            _ => false,
        }
    }

    /// Increment `rank`. Returns `false` if the army composition would be
    /// exceeded.
    pub fn add(&mut self, rank: Rank) -> bool {
        match rank.army_index() {
            Some(i) if self.counts[i] < ARMY[i].1 => {
                self.counts[i] += 1;
                true
            }
            _ => false,
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|&n| n as usize).sum()
    }

    /// `true` if at least one movable rank still has a piece.
    pub fn has_moveable(&self) -> bool {
        ARMY_RANKS
            .iter()
            .zip(self.counts.iter())
            .any(|(rank, &n)| rank.is_moveable() && n > 0)
    }

    /// The flag is gone or nothing left can move.
    pub fn is_defeated(&self) -> bool {
        self.count(Rank::Flag) == 0 || !self.has_moveable()
    }

    /// (rank, count) pairs in army order.
    pub fn iter(&self) -> impl Iterator<Item = (Rank, u8)> + '_ {
        ARMY_RANKS.iter().copied().zip(self.counts.iter().copied())
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::full()
    }
}
