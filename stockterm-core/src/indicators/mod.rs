//! Technical indicators over a stock's price history.
//!
//! Every indicator is a pure function of a history slice ordered oldest to
//! newest and returns `None` (or [`Trend::InsufficientData`]) when the
//! history is shorter than its window. Identical input always produces
//! identical output.

pub mod levels;
pub mod rsi;
pub mod sma;
pub mod trend;
pub mod volatility;

pub use levels::{support_resistance, SupportResistance, DEFAULT_LEVELS_LOOKBACK};
pub use rsi::{rsi, DEFAULT_RSI_PERIOD};
pub use sma::sma;
pub use trend::{trend, Trend, DEFAULT_TREND_PERIODS};
pub use volatility::{volatility, DEFAULT_VOLATILITY_PERIODS};

use serde::{Deserialize, Serialize};

use crate::domain::Stock;

/// SMA window used by the analysis snapshot.
pub const DEFAULT_SMA_PERIOD: usize = 20;

/// All indicators for one stock at its default windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalAnalysis {
    pub symbol: String,
    pub sma20: Option<f64>,
    pub rsi: Option<f64>,
    pub trend: Trend,
    pub volatility: Option<f64>,
    pub support_resistance: Option<SupportResistance>,
}

pub fn analyze(stock: &Stock) -> TechnicalAnalysis {
    let history = stock.history();
    TechnicalAnalysis {
        symbol: stock.symbol.clone(),
        sma20: sma(history, DEFAULT_SMA_PERIOD),
        rsi: rsi(history, DEFAULT_RSI_PERIOD),
        trend: trend(history, DEFAULT_TREND_PERIODS),
        volatility: volatility(history, DEFAULT_VOLATILITY_PERIODS),
        support_resistance: support_resistance(history, DEFAULT_LEVELS_LOOKBACK),
    }
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_stock_has_nothing_available() {
        let stock = Stock::new("AAPL", "Apple Inc.", 150.0, 0.02);
        let ta = analyze(&stock);
        assert_eq!(ta.symbol, "AAPL");
        assert_eq!(ta.sma20, None);
        assert_eq!(ta.rsi, None);
        assert_eq!(ta.trend, Trend::InsufficientData);
        assert_eq!(ta.volatility, None);
        assert_eq!(ta.support_resistance, None);
    }

    #[test]
    fn full_history_populates_every_field() {
        let mut stock = Stock::new("AAPL", "Apple Inc.", 100.0, 0.02);
        for i in 1..30 {
            stock.advance(100.0 + i as f64);
        }
        let ta = analyze(&stock);
        assert!(ta.sma20.is_some());
        assert_eq!(ta.rsi, Some(100.0));
        assert_eq!(ta.trend, Trend::Bullish);
        assert!(ta.volatility.is_some());
        let levels = ta.support_resistance.unwrap();
        assert!(levels.support < levels.resistance);
    }

    #[test]
    fn analysis_is_deterministic() {
        let mut stock = Stock::new("NVDA", "NVIDIA Corp.", 400.0, 0.035);
        for p in [401.0, 398.5, 405.2, 410.0, 402.3, 399.9, 404.4, 407.7] {
            stock.advance(p);
        }
        assert_eq!(analyze(&stock), analyze(&stock));
    }
}
