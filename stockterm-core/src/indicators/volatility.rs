//! Annualized historical volatility.
//!
//! Population standard deviation of simple returns over the last `periods`
//! prices, scaled by sqrt(252) and expressed in percent.

pub const DEFAULT_VOLATILITY_PERIODS: usize = 20;

/// Trading days per year used for annualization.
const TRADING_DAYS: f64 = 252.0;

pub fn volatility(history: &[f64], periods: usize) -> Option<f64> {
    if periods < 2 || history.len() < periods {
        return None;
    }
    let window = &history[history.len() - periods..];
    let returns: Vec<f64> = window
        .windows(2)
        .map(|pair| (pair[1] - pair[0]) / pair[0])
        .collect();

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt() * TRADING_DAYS.sqrt() * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn constant_returns_have_zero_volatility() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 * 1.01_f64.powi(i)).collect();
        assert_approx(volatility(&prices, 20).unwrap(), 0.0, 1e-9);
    }

    #[test]
    fn alternating_returns() {
        // Returns alternate +10% / -10%: mean ≈ 0, stdev ≈ 0.1 (population)
        let prices = [100.0, 110.0, 99.0, 108.9, 98.01];
        let returns = [0.1, -0.1, 0.1, -0.1];
        let mean: f64 = returns.iter().sum::<f64>() / 4.0;
        let var: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / 4.0;
        let expected = var.sqrt() * 252f64.sqrt() * 100.0;
        assert_approx(volatility(&prices, 5).unwrap(), expected, 1e-6);
    }

    #[test]
    fn needs_full_window() {
        let prices = [100.0; 19];
        assert_eq!(volatility(&prices, 20), None);
    }
}
