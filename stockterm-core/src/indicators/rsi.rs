//! Relative Strength Index (RSI).
//!
//! Seeds average gain and average loss from the first `period` price changes,
//! then applies Wilder smoothing over every remaining change:
//! `avg = (avg * (period - 1) + current) / period`.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//! Edge case: avg_loss == 0 → RSI = 100 (including a flat series).

/// Default RSI lookback.
pub const DEFAULT_RSI_PERIOD: usize = 14;

pub fn rsi(history: &[f64], period: usize) -> Option<f64> {
    if period == 0 || history.len() < period + 1 {
        return None;
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for pair in history[..=period].windows(2) {
        let change = pair[1] - pair[0];
        avg_gain += change.max(0.0);
        avg_loss += (-change).max(0.0);
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;

    let smoothing = (period - 1) as f64;
    for pair in history[period..].windows(2) {
        let change = pair[1] - pair[0];
        avg_gain = (avg_gain * smoothing + change.max(0.0)) / period as f64;
        avg_loss = (avg_loss * smoothing + (-change).max(0.0)) / period as f64;
    }

    if avg_loss == 0.0 {
        return Some(100.0);
    }
    Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
}
