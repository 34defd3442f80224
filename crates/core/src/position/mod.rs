use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Placement of an object on the canvas, in percent of the canvas size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub top: f32,
    pub left: f32,
}

/// Source of canvas coordinates. Placement is cosmetic, so tests can swap
/// in a deterministic source without changing any game outcome.
pub trait PositionSource {
    /// Returns a value in `[0, range)`.
    fn next_coordinate(&mut self, range: f32) -> f32;

    fn next_position(&mut self, range: f32) -> Position {
        let top = self.next_coordinate(range);
        let left = self.next_coordinate(range);
        Position { top, left }
    }
}

/// Uniform placement backed by any [`rand`] generator.
#[derive(Debug, Clone)]
pub struct RngPositions<R> {
    rng: R,
}

impl<R: Rng> RngPositions<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngPositions<ChaCha8Rng> {
    /// Reproducible placement for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(ChaCha8Rng::from_entropy())
    }
}

impl<R: Rng> PositionSource for RngPositions<R> {
    fn next_coordinate(&mut self, range: f32) -> f32 {
        let value = self.rng.gen_range(0.0..range);
        // f32 rounding can land exactly on the bound.
        if value >= range {
            0.0
        } else {
            value
        }
    }
}

/// Cycles through a fixed list of coordinates.
#[derive(Debug, Clone)]
pub struct FixedPositions {
    values: Vec<f32>,
    cursor: usize,
}

impl FixedPositions {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values, cursor: 0 }
    }
}

impl Default for FixedPositions {
    fn default() -> Self {
        Self::new(vec![0.0])
    }
}

impl PositionSource for FixedPositions {
    fn next_coordinate(&mut self, range: f32) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor = self.cursor.wrapping_add(1);
        if (0.0..range).contains(&value) {
            value
        } else {
            0.0
        }
    }
}
