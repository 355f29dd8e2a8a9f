//! Ordered-tap pattern challenge on a 3x3 grid.
//!
//! Cells are numbered 0..9 row by row. The user must tap the highlighted
//! cells in the order they were assigned. One wrong tap wipes all progress.

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const GRID_CELLS: usize = 9;
pub const MIN_LENGTH: usize = 4;
pub const MAX_LENGTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TapResult {
    /// Correct next cell, more to go.
    Progress,
    /// Correct final cell.
    Completed,
    /// Wrong cell; progress was reset.
    Reset,
    /// Tap outside the grid or after completion.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternChallenge {
    sequence: Vec<usize>,
    tapped: Vec<usize>,
    #[serde(default)]
    error: bool,
}

impl PatternChallenge {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let len = rng.gen_range(MIN_LENGTH..=MAX_LENGTH);
        // Sampled indices come back in random order, which is the tap order.
        let sequence = index::sample(rng, GRID_CELLS, len).into_vec();
        Self::from_sequence(sequence)
    }

    pub fn from_sequence(sequence: Vec<usize>) -> Self {
        Self {
            sequence,
            tapped: Vec::new(),
            error: false,
        }
    }

    pub fn sequence(&self) -> &[usize] {
        &self.sequence
    }

    pub fn tapped(&self) -> &[usize] {
        &self.tapped
    }

    /// 1-based position of `cell` in the required order, for labelling.
    pub fn order_of(&self, cell: usize) -> Option<usize> {
        self.sequence.iter().position(|&c| c == cell).map(|p| p + 1)
    }

    /// Set by a wrong tap, cleared by the next tap.
    pub fn has_error(&self) -> bool {
        self.error
    }

    pub fn tap(&mut self, cell: usize) -> TapResult {
        if cell >= GRID_CELLS || self.is_satisfied() {
            return TapResult::Ignored;
        }
        self.error = false;
        if self.sequence.get(self.tapped.len()) == Some(&cell) {
            self.tapped.push(cell);
            if self.is_satisfied() {
                TapResult::Completed
            } else {
                TapResult::Progress
            }
        } else {
            self.tapped.clear();
            self.error = true;
            TapResult::Reset
        }
    }

    pub fn is_satisfied(&self) -> bool {
        !self.sequence.is_empty() && self.tapped == self.sequence
    }
}
