//! Support and resistance levels from the lookback window's quartiles.

use serde::{Deserialize, Serialize};

pub const DEFAULT_LEVELS_LOOKBACK: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupportResistance {
    pub support: f64,
    pub resistance: f64,
}

/// Support at the 25th-percentile index, resistance at the 75th, of the
/// sorted last `lookback` prices.
pub fn support_resistance(history: &[f64], lookback: usize) -> Option<SupportResistance> {
    if lookback == 0 || history.len() < lookback {
        return None;
    }
    let mut sorted = history[history.len() - lookback..].to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let support_idx = (n as f64 * 0.25).floor() as usize;
    let resistance_idx = (n as f64 * 0.75).floor() as usize;
    Some(SupportResistance {
        support: sorted[support_idx.min(n - 1)],
        resistance: sorted[resistance_idx.min(n - 1)],
    })
}
