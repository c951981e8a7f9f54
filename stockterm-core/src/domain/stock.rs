//! Stock: a tradable symbol with a current price and bounded price history.

use serde::{Deserialize, Serialize};

/// Maximum number of prices retained in a stock's history.
pub const HISTORY_CAP: usize = 50;

/// Floor applied to every price mutation.
pub const MIN_PRICE: f64 = 0.01;

/// A single stock in the simulated universe.
///
/// Price state is private so every mutation goes through [`Stock::advance`]
/// or [`Stock::shock`], both of which clamp to [`MIN_PRICE`] and keep the
/// history bounded at [`HISTORY_CAP`].
#[derive(Debug, Clone, PartialEq)]
pub struct Stock {
    pub symbol: String,
    pub name: String,
    /// Fraction of price the walk may move per tick.
    pub volatility: f64,
    price: f64,
    previous_price: f64,
    history: Vec<f64>,
}

impl Stock {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, price: f64, volatility: f64) -> Self {
        let price = price.max(MIN_PRICE);
        Self {
            symbol: symbol.into(),
            name: name.into(),
            volatility,
            price,
            previous_price: price,
            history: vec![price],
        }
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn previous_price(&self) -> f64 {
        self.previous_price
    }

    /// Price history, oldest first. Never empty.
    pub fn history(&self) -> &[f64] {
        &self.history
    }

    pub fn price_change(&self) -> f64 {
        self.price - self.previous_price
    }

    pub fn price_change_percent(&self) -> f64 {
        if self.previous_price <= 0.0 {
            return 0.0;
        }
        self.price_change() / self.previous_price * 100.0
    }

    /// Move to a new price as a regular tick: snapshots the previous price first.
    pub fn advance(&mut self, new_price: f64) {
        self.previous_price = self.price;
        self.record(new_price);
    }

    /// Multiply the price in place (news shock). The previous-price snapshot is kept.
    pub fn shock(&mut self, multiplier: f64) {
        self.record(self.price * multiplier);
    }

    /// Overlay persisted state onto this stock.
    ///
    /// An empty history falls back to the restored price so the
    /// non-empty invariant holds.
    pub fn restore(&mut self, snapshot: &StockSnapshot) {
        self.price = snapshot.price.max(MIN_PRICE);
        self.previous_price = snapshot.previous_price;
        self.history = snapshot
            .history
            .iter()
            .copied()
            .filter(|p| p.is_finite())
            .map(|p| p.max(MIN_PRICE))
            .collect();
        if self.history.is_empty() {
            self.history.push(self.price);
        }
        self.truncate_history();
    }

    pub fn snapshot(&self) -> StockSnapshot {
        StockSnapshot {
            symbol: self.symbol.clone(),
            price: self.price,
            previous_price: self.previous_price,
            history: self.history.clone(),
            volatility: self.volatility,
        }
    }

    fn record(&mut self, price: f64) {
        self.price = if price.is_finite() { price.max(MIN_PRICE) } else { MIN_PRICE };
        self.history.push(self.price);
        self.truncate_history();
    }

    fn truncate_history(&mut self) {
        if self.history.len() > HISTORY_CAP {
            let excess = self.history.len() - HISTORY_CAP;
            self.history.drain(..excess);
        }
    }
}

/// Persisted shape of a stock's mutable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSnapshot {
    pub symbol: String,
    pub price: f64,
    pub previous_price: f64,
    #[serde(default)]
    pub history: Vec<f64>,
    #[serde(default)]
    pub volatility: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_stock_has_seeded_history() {
        let s = Stock::new("AAPL", "Apple Inc.", 150.0, 0.02);
        assert_eq!(s.history(), &[150.0]);
        assert_eq!(s.previous_price(), 150.0);
        assert_eq!(s.price_change(), 0.0);
    }

    #[test]
    fn advance_tracks_previous_price() {
        let mut s = Stock::new("AAPL", "Apple Inc.", 100.0, 0.02);
        s.advance(110.0);
        assert_eq!(s.previous_price(), 100.0);
        assert_eq!(s.price(), 110.0);
        assert!((s.price_change_percent() - 10.0).abs() < 1e-10);
    }

    #[test]
    fn shock_keeps_previous_price() {
        let mut s = Stock::new("AAPL", "Apple Inc.", 100.0, 0.02);
        s.shock(1.02);
        assert_eq!(s.previous_price(), 100.0);
        assert!((s.price() - 102.0).abs() < 1e-10);
        assert_eq!(s.history().len(), 2);
    }

    #[test]
    fn price_is_clamped() {
        let mut s = Stock::new("LYFT", "Lyft Inc.", 1.0, 0.05);
        s.shock(0.0);
        assert_eq!(s.price(), MIN_PRICE);
        s.advance(-5.0);
        assert_eq!(s.price(), MIN_PRICE);
        s.advance(f64::NAN);
        assert_eq!(s.price(), MIN_PRICE);
    }

    #[test]
    fn history_is_capped() {
        let mut s = Stock::new("AAPL", "Apple Inc.", 100.0, 0.02);
        for i in 0..120 {
            s.advance(100.0 + i as f64);
        }
        assert_eq!(s.history().len(), HISTORY_CAP);
        assert_eq!(*s.history().last().unwrap(), 219.0);
        assert_eq!(s.history()[0], 170.0);
    }

    #[test]
    fn restore_with_empty_history_uses_price() {
        let mut s = Stock::new("AAPL", "Apple Inc.", 150.0, 0.02);
        s.restore(&StockSnapshot {
            symbol: "AAPL".into(),
            price: 175.5,
            previous_price: 170.0,
            history: vec![],
            volatility: 0.02,
        });
        assert_eq!(s.price(), 175.5);
        assert_eq!(s.history(), &[175.5]);
    }

    #[test]
    fn zero_previous_price_yields_zero_percent() {
        let mut s = Stock::new("AAPL", "Apple Inc.", 150.0, 0.02);
        s.restore(&StockSnapshot {
            symbol: "AAPL".into(),
            price: 150.0,
            previous_price: 0.0,
            history: vec![150.0],
            volatility: 0.02,
        });
        assert_eq!(s.price_change_percent(), 0.0);
    }
}
