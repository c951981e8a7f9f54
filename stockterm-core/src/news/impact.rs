//! News-to-price impact model.
//!
//! Numeric impacts move a price by `impact × U[0.5, 1)`. Qualitative impacts
//! are first mapped onto a bounded numeric range:
//!
//! | direction | multiplier − 1           |
//! |-----------|--------------------------|
//! | positive  | (0, +qualitative_max]    |
//! | negative  | [−qualitative_max, 0)    |
//! | neutral   | [−neutral_band, +neutral_band) |

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::{Impact, Qualitative, Stock};

pub const DEFAULT_QUALITATIVE_MAX: f64 = 0.03;
pub const DEFAULT_NEUTRAL_BAND: f64 = 0.01;

/// Tunable bounds for qualitative impacts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactModel {
    pub qualitative_max: f64,
    pub neutral_band: f64,
}

impl Default for ImpactModel {
    fn default() -> Self {
        Self {
            qualitative_max: DEFAULT_QUALITATIVE_MAX,
            neutral_band: DEFAULT_NEUTRAL_BAND,
        }
    }
}

impl ImpactModel {
    /// Price multiplier for one affected stock.
    pub fn multiplier<R: Rng + ?Sized>(&self, impact: &Impact, rng: &mut R) -> f64 {
        let u: f64 = rng.gen();
        match impact {
            Impact::Numeric(x) => 1.0 + x * (0.5 + u * 0.5),
            // 1 - u lies in (0, 1], keeping the move strictly non-zero.
            Impact::Qualitative(Qualitative::Positive) => 1.0 + self.qualitative_max * (1.0 - u),
            Impact::Qualitative(Qualitative::Negative) => 1.0 - self.qualitative_max * (1.0 - u),
            Impact::Qualitative(Qualitative::Neutral) => {
                1.0 + self.neutral_band * (u * 2.0 - 1.0)
            }
        }
    }

    pub fn apply<R: Rng + ?Sized>(&self, stock: &mut Stock, impact: &Impact, rng: &mut R) {
        let m = self.multiplier(impact, rng);
        stock.shock(m);
    }

    /// Signed score used by market sentiment.
    pub fn sentiment_score(&self, impact: &Impact) -> f64 {
        match impact {
            Impact::Numeric(x) => *x,
            Impact::Qualitative(q) => q.direction() * self.qualitative_max,
        }
    }
}
