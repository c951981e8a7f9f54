//! Short-window price trend classification.
//!
//! Compares the first and last of the most recent `periods` prices.
//! Change > +1% is bullish, < -1% bearish, anything else sideways.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_TREND_PERIODS: usize = 5;

/// Percent move beyond which a window counts as trending.
const TREND_THRESHOLD_PCT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Bullish,
    Bearish,
    Sideways,
    InsufficientData,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Trend::Bullish => "bullish",
            Trend::Bearish => "bearish",
            Trend::Sideways => "sideways",
            Trend::InsufficientData => "insufficient data",
        };
        f.write_str(s)
    }
}

pub fn trend(history: &[f64], periods: usize) -> Trend {
    if periods == 0 || history.len() < periods {
        return Trend::InsufficientData;
    }
    let recent = &history[history.len() - periods..];
    let first = recent[0];
    let last = recent[recent.len() - 1];
    if first == 0.0 {
        return Trend::Sideways;
    }
    let change = (last - first) / first * 100.0;
    if change > TREND_THRESHOLD_PCT {
        Trend::Bullish
    } else if change < -TREND_THRESHOLD_PCT {
        Trend::Bearish
    } else {
        Trend::Sideways
    }
}
