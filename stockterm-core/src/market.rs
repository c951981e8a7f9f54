//! Market: the stock universe, the player roster and market-wide views.
//!
//! The market is the single mutable owner of stocks and players. Trades go
//! through it against the current player.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::{Player, Stock, StockSnapshot, Transaction, DEFAULT_INITIAL_CASH};
use crate::indicators::{analyze, TechnicalAnalysis};
use crate::ledger::TradeRejection;
use crate::price_model::RandomWalk;

/// The fixed seed table: symbol, name, initial price, volatility.
pub const SEED_UNIVERSE: [(&str, &str, f64, f64); 15] = [
    ("AAPL", "Apple Inc.", 150.00, 0.02),
    ("GOOGL", "Alphabet Inc.", 2800.00, 0.025),
    ("MSFT", "Microsoft Corp.", 300.00, 0.018),
    ("TSLA", "Tesla Inc.", 800.00, 0.04),
    ("AMZN", "Amazon.com Inc.", 3200.00, 0.03),
    ("NVDA", "NVIDIA Corp.", 400.00, 0.035),
    ("META", "Meta Platforms", 320.00, 0.03),
    ("NFLX", "Netflix Inc.", 450.00, 0.025),
    ("AMD", "Advanced Micro Devices", 120.00, 0.035),
    ("SPOT", "Spotify Technology", 250.00, 0.03),
    ("UBER", "Uber Technologies", 45.00, 0.04),
    ("LYFT", "Lyft Inc.", 12.00, 0.05),
    ("ZOOM", "Zoom Video Communications", 75.00, 0.03),
    ("SHOP", "Shopify Inc.", 85.00, 0.04),
    ("SQ", "Block Inc.", 65.00, 0.035),
];

/// Average percent change beyond which the market counts as trending.
const MARKET_TREND_THRESHOLD: f64 = 0.5;

pub fn seed_universe() -> Vec<Stock> {
    SEED_UNIVERSE
        .iter()
        .map(|&(symbol, name, price, vol)| Stock::new(symbol, name, price, vol))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketTrend {
    Bullish,
    Bearish,
    Sideways,
}

impl fmt::Display for MarketTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MarketTrend::Bullish => "bullish",
            MarketTrend::Bearish => "bearish",
            MarketTrend::Sideways => "sideways",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    pub total_stocks: usize,
    /// Sum of current prices, not share-weighted.
    pub total_market_cap: f64,
    pub avg_change: f64,
    pub top_gainer: Option<String>,
    pub top_loser: Option<String>,
    pub market_trend: MarketTrend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub name: String,
    pub total_value: f64,
    pub profit: f64,
    pub profit_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStatus {
    pub is_running: bool,
    pub total_stocks: usize,
    pub total_players: usize,
    pub current_player: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Market {
    stocks: Vec<Stock>,
    players: Vec<Player>,
    current: Option<usize>,
    walk: RandomWalk,
    initial_cash: f64,
}

impl Default for Market {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_CASH)
    }
}

impl Market {
    /// Market seeded with [`SEED_UNIVERSE`] and no players.
    pub fn new(initial_cash: f64) -> Self {
        Self::with_stocks(seed_universe(), initial_cash)
    }

    pub fn with_stocks(stocks: Vec<Stock>, initial_cash: f64) -> Self {
        Self {
            stocks,
            players: Vec::new(),
            current: None,
            walk: RandomWalk::default(),
            initial_cash,
        }
    }

    // ── Stocks ──

    pub fn stocks(&self) -> &[Stock] {
        &self.stocks
    }

    pub fn stocks_mut(&mut self) -> &mut [Stock] {
        &mut self.stocks
    }

    pub fn stock(&self, symbol: &str) -> Option<&Stock> {
        self.stocks.iter().find(|s| s.symbol == symbol)
    }

    pub fn stock_mut(&mut self, symbol: &str) -> Option<&mut Stock> {
        self.stocks.iter_mut().find(|s| s.symbol == symbol)
    }

    /// Advance every stock by one random-walk tick.
    pub fn tick_all<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for stock in &mut self.stocks {
            self.walk.tick(stock, rng);
        }
    }

    fn ranked_by<F>(&self, limit: usize, mut cmp: F) -> Vec<&Stock>
    where
        F: FnMut(&Stock, &Stock) -> std::cmp::Ordering,
    {
        let mut sorted: Vec<&Stock> = self.stocks.iter().collect();
        sorted.sort_by(|a, b| cmp(a, b));
        sorted.truncate(limit);
        sorted
    }

    /// Largest percent change first; ties keep seed order.
    pub fn top_gainers(&self, limit: usize) -> Vec<&Stock> {
        self.ranked_by(limit, |a, b| {
            b.price_change_percent().total_cmp(&a.price_change_percent())
        })
    }

    pub fn top_losers(&self, limit: usize) -> Vec<&Stock> {
        self.ranked_by(limit, |a, b| {
            a.price_change_percent().total_cmp(&b.price_change_percent())
        })
    }

    /// Highest configured volatility first.
    pub fn most_volatile(&self, limit: usize) -> Vec<&Stock> {
        self.ranked_by(limit, |a, b| b.volatility.total_cmp(&a.volatility))
    }

    pub fn summary(&self) -> MarketSummary {
        let total_market_cap = self.stocks.iter().map(Stock::price).sum();
        let avg_change = if self.stocks.is_empty() {
            0.0
        } else {
            self.stocks.iter().map(Stock::price_change_percent).sum::<f64>()
                / self.stocks.len() as f64
        };
        let market_trend = if avg_change > MARKET_TREND_THRESHOLD {
            MarketTrend::Bullish
        } else if avg_change < -MARKET_TREND_THRESHOLD {
            MarketTrend::Bearish
        } else {
            MarketTrend::Sideways
        };
        MarketSummary {
            total_stocks: self.stocks.len(),
            total_market_cap,
            avg_change,
            top_gainer: self.top_gainers(1).first().map(|s| s.symbol.clone()),
            top_loser: self.top_losers(1).first().map(|s| s.symbol.clone()),
            market_trend,
        }
    }

    pub fn technical_analysis(&self, symbol: &str) -> Option<TechnicalAnalysis> {
        self.stock(symbol).map(analyze)
    }

    // ── Players ──

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    /// Add a player with the configured starting cash and make it current.
    pub fn add_player(&mut self, name: impl Into<String>) -> &Player {
        self.players.push(Player::new(name, self.initial_cash));
        let idx = self.players.len() - 1;
        self.current = Some(idx);
        &self.players[idx]
    }

    /// Select the first player with this name. Returns false if none matches.
    pub fn switch_player(&mut self, name: &str) -> bool {
        match self.players.iter().position(|p| p.name == name) {
            Some(idx) => {
                self.current = Some(idx);
                true
            }
            None => false,
        }
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.current.and_then(|i| self.players.get(i))
    }

    pub fn buy(&mut self, symbol: &str, quantity: u64) -> Result<Transaction, TradeRejection> {
        let stock = self
            .stocks
            .iter()
            .find(|s| s.symbol == symbol)
            .ok_or_else(|| TradeRejection::UnknownSymbol(symbol.to_string()))?;
        let player = self
            .current
            .and_then(|i| self.players.get_mut(i))
            .ok_or(TradeRejection::NoActivePlayer)?;
        player.buy(stock, quantity)
    }

    pub fn sell(&mut self, symbol: &str, quantity: u64) -> Result<Transaction, TradeRejection> {
        let stock = self
            .stocks
            .iter()
            .find(|s| s.symbol == symbol)
            .ok_or_else(|| TradeRejection::UnknownSymbol(symbol.to_string()))?;
        let player = self
            .current
            .and_then(|i| self.players.get_mut(i))
            .ok_or(TradeRejection::NoActivePlayer)?;
        player.sell(stock, quantity)
    }

    /// Players ranked by total value, highest first; ties keep roster order.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut valued: Vec<(&Player, f64)> = self
            .players
            .iter()
            .map(|p| (p, p.total_value(&self.stocks)))
            .collect();
        valued.sort_by(|a, b| b.1.total_cmp(&a.1));
        valued
            .into_iter()
            .enumerate()
            .map(|(i, (player, _))| {
                let v = player.valuation(&self.stocks);
                LeaderboardEntry {
                    rank: i + 1,
                    name: player.name.clone(),
                    total_value: v.total_value,
                    profit: v.profit,
                    profit_percent: v.profit_percent,
                }
            })
            .collect()
    }

    pub fn status(&self, is_running: bool) -> MarketStatus {
        MarketStatus {
            is_running,
            total_stocks: self.stocks.len(),
            total_players: self.players.len(),
            current_player: self.current_player().map(|p| p.name.clone()),
        }
    }

    // ── Persistence overlay ──

    pub fn stock_snapshots(&self) -> Vec<StockSnapshot> {
        self.stocks.iter().map(Stock::snapshot).collect()
    }

    /// Overlay saved stock state positionally onto the seed universe.
    ///
    /// Entries whose symbol does not match the seed at the same position are
    /// skipped. Returns the number of stocks restored.
    pub fn restore_stocks(&mut self, snapshots: &[StockSnapshot]) -> usize {
        let mut restored = 0;
        for (stock, snap) in self.stocks.iter_mut().zip(snapshots) {
            if stock.symbol == snap.symbol {
                stock.restore(snap);
                restored += 1;
            }
        }
        restored
    }

    /// Replace the roster. The first player becomes current.
    pub fn restore_players(&mut self, players: Vec<Player>) {
        self.current = if players.is_empty() { None } else { Some(0) };
        self.players = players;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn three_stocks() -> Vec<Stock> {
        vec![
            Stock::new("A", "Alpha", 100.0, 0.02),
            Stock::new("B", "Beta", 100.0, 0.05),
            Stock::new("C", "Gamma", 100.0, 0.03),
        ]
    }

    #[test]
    fn seed_universe_has_fifteen_stocks() {
        let market = Market::default();
        assert_eq!(market.stocks().len(), 15);
        let aapl = market.stock("AAPL").unwrap();
        assert_eq!(aapl.price(), 150.0);
        assert_eq!(aapl.volatility, 0.02);
        assert_eq!(market.stocks()[14].symbol, "SQ");
    }

    #[test]
    fn tick_all_moves_every_stock() {
        let mut market = Market::default();
        let mut rng = StdRng::seed_from_u64(5);
        market.tick_all(&mut rng);
        for s in market.stocks() {
            assert_eq!(s.history().len(), 2);
            assert!(s.price() >= 0.01);
        }
    }

    #[test]
    fn gainers_and_losers_are_stable() {
        let mut market = Market::with_stocks(three_stocks(), 1000.0);
        market.stock_mut("A").unwrap().advance(105.0);
        market.stock_mut("B").unwrap().advance(95.0);
        market.stock_mut("C").unwrap().advance(105.0);

        let gainers: Vec<&str> = market.top_gainers(3).iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(gainers, vec!["A", "C", "B"]);
        let losers: Vec<&str> = market.top_losers(2).iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(losers, vec!["B", "A"]);
        let volatile: Vec<&str> =
            market.most_volatile(2).iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(volatile, vec!["B", "C"]);
    }

    #[test]
    fn summary_classifies_trend() {
        let mut market = Market::with_stocks(three_stocks(), 1000.0);
        let s = market.summary();
        assert_eq!(s.total_market_cap, 300.0);
        assert_eq!(s.market_trend, MarketTrend::Sideways);

        for sym in ["A", "B", "C"] {
            market.stock_mut(sym).unwrap().advance(101.0);
        }
        let s = market.summary();
        assert!((s.avg_change - 1.0).abs() < 1e-9);
        assert_eq!(s.market_trend, MarketTrend::Bullish);
        assert_eq!(s.top_gainer.as_deref(), Some("A"));
    }

    #[test]
    fn empty_market_summary() {
        let market = Market::with_stocks(vec![], 1000.0);
        let s = market.summary();
        assert_eq!(s.avg_change, 0.0);
        assert_eq!(s.top_gainer, None);
    }

    #[test]
    fn trading_requires_a_current_player() {
        let mut market = Market::default();
        assert_eq!(market.buy("AAPL", 1), Err(TradeRejection::NoActivePlayer));
        market.add_player("ada");
        assert_eq!(
            market.buy("NOPE", 1),
            Err(TradeRejection::UnknownSymbol("NOPE".into()))
        );

        let tx = market.buy("AAPL", 10).unwrap();
        assert_eq!(tx.total, 1500.0);
        let ada = market.current_player().unwrap();
        assert_eq!(ada.cash, 8500.0);
        assert_eq!(ada.quantity_of("AAPL"), 10);

        market.sell("AAPL", 10).unwrap();
        assert_eq!(market.current_player().unwrap().cash, 10_000.0);
    }

    #[test]
    fn switching_players() {
        let mut market = Market::default();
        market.add_player("ada");
        market.add_player("bob");
        assert_eq!(market.current_player().unwrap().name, "bob");
        assert!(market.switch_player("ada"));
        assert_eq!(market.current_player().unwrap().name, "ada");
        assert!(!market.switch_player("eve"));
        assert_eq!(market.current_player().unwrap().name, "ada");
    }

    #[test]
    fn leaderboard_ranks_by_total_value() {
        let mut market = Market::default();
        market.restore_players(vec![
            Player::new("a", 12_000.0),
            Player::new("b", 15_000.0),
            Player::new("c", 9_000.0),
        ]);
        let board = market.leaderboard();
        let ranked: Vec<(usize, f64)> = board.iter().map(|e| (e.rank, e.total_value)).collect();
        assert_eq!(ranked, vec![(1, 15_000.0), (2, 12_000.0), (3, 9_000.0)]);
        assert_eq!(board[0].name, "b");
    }

    #[test]
    fn leaderboard_ties_keep_roster_order() {
        let mut market = Market::default();
        market.restore_players(vec![Player::new("x", 100.0), Player::new("y", 100.0)]);
        let names: Vec<String> = market.leaderboard().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn restore_stocks_overlays_matching_positions() {
        let mut market = Market::default();
        let mut snaps = market.stock_snapshots();
        snaps[0].price = 999.0;
        snaps[0].history = vec![990.0, 999.0];
        snaps[1].symbol = "WRONG".into();
        snaps.truncate(3);

        assert_eq!(market.restore_stocks(&snaps), 2);
        assert_eq!(market.stock("AAPL").unwrap().price(), 999.0);
        assert_eq!(market.stock("GOOGL").unwrap().price(), 2800.0);
        assert_eq!(market.stock("TSLA").unwrap().price(), 800.0);
    }

    #[test]
    fn status_reports_roster() {
        let mut market = Market::default();
        assert_eq!(market.status(false).current_player, None);
        market.add_player("ada");
        let status = market.status(true);
        assert!(status.is_running);
        assert_eq!(status.total_stocks, 15);
        assert_eq!(status.total_players, 1);
        assert_eq!(status.current_player.as_deref(), Some("ada"));
    }
}
