//! Random-walk price model.
//!
//! Each tick draws `u ~ U(-1, 1)` and moves the price by
//! `u * volatility + drift`, where the small positive drift biases the walk
//! upward over long runs.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::Stock;

/// Default per-tick upward drift.
pub const DEFAULT_DRIFT: f64 = 0.0001;

/// Uniform random walk with constant drift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomWalk {
    pub drift: f64,
}

impl Default for RandomWalk {
    fn default() -> Self {
        Self { drift: DEFAULT_DRIFT }
    }
}

impl RandomWalk {
    pub fn new(drift: f64) -> Self {
        Self { drift }
    }

    /// Fractional move for one tick given a uniform draw in [-1, 1).
    pub fn delta(&self, volatility: f64, draw: f64) -> f64 {
        draw * volatility + self.drift
    }

    /// Advance a stock by one tick. Always succeeds; the stock clamps and caps.
    pub fn tick<R: Rng + ?Sized>(&self, stock: &mut Stock, rng: &mut R) {
        let draw: f64 = rng.gen_range(-1.0..1.0);
        let delta = self.delta(stock.volatility, draw);
        let next = stock.price() * (1.0 + delta);
        stock.advance(next);
    }
}
