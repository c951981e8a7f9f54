//! Simple Moving Average (SMA).
//!
//! Mean of the last `period` prices. `None` until `period` samples exist.

pub fn sma(history: &[f64], period: usize) -> Option<f64> {
    if period == 0 || history.len() < period {
        return None;
    }
    let window = &history[history.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}
