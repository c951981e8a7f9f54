//! Ledger: trade execution and portfolio accounting on a [`Player`].
//!
//! Trades either fully apply or leave the player untouched. A rejected trade
//! is an expected outcome, reported as a [`TradeRejection`].
//!
//! Accounting identity: `total_value == cash + Σ quantity × current price`
//! over held symbols present in the universe. Symbols missing from the
//! universe are skipped rather than failing the valuation.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Player, Stock, TradeSide, Transaction};

/// Why a trade was not executed. No state was mutated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TradeRejection {
    #[error("quantity must be a positive whole number of shares")]
    InvalidQuantity,

    #[error("insufficient funds: need {cost:.2}, have {cash:.2}")]
    InsufficientFunds { cost: f64, cash: f64 },

    #[error("insufficient holdings of {symbol}: requested {requested}, held {held}")]
    InsufficientHoldings {
        symbol: String,
        requested: u64,
        held: u64,
    },

    #[error("unknown stock symbol: {0}")]
    UnknownSymbol(String),

    #[error("no active player; add or select a player first")]
    NoActivePlayer,
}

/// Point-in-time valuation of a player's account.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Valuation {
    pub cash: f64,
    pub portfolio_value: f64,
    pub total_value: f64,
    pub profit: f64,
    pub profit_percent: f64,
}

/// One line of the diversification breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingBreakdown {
    pub symbol: String,
    pub name: String,
    pub quantity: u64,
    pub value: f64,
    /// Share of the invested value, in percent.
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiversificationScore {
    WellDiversified,
    ModeratelyDiversified,
    Concentrated,
}

impl DiversificationScore {
    pub fn from_positions(positions: usize) -> Self {
        if positions > 5 {
            DiversificationScore::WellDiversified
        } else if positions > 2 {
            DiversificationScore::ModeratelyDiversified
        } else {
            DiversificationScore::Concentrated
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub total_positions: usize,
    /// Percentage held in the single largest position (0 with no holdings).
    pub concentration_risk: f64,
    pub diversification_score: DiversificationScore,
}

fn find<'a>(stocks: &'a [Stock], symbol: &str) -> Option<&'a Stock> {
    stocks.iter().find(|s| s.symbol == symbol)
}

impl Player {
    /// Buy `quantity` shares at the stock's current price.
    pub fn buy(&mut self, stock: &Stock, quantity: u64) -> Result<Transaction, TradeRejection> {
        if quantity == 0 {
            return Err(TradeRejection::InvalidQuantity);
        }
        let price = stock.price();
        let cost = price * quantity as f64;
        if self.cash < cost {
            return Err(TradeRejection::InsufficientFunds {
                cost,
                cash: self.cash,
            });
        }

        let held = self.quantity_of(&stock.symbol);
        let Some(new_quantity) = held.checked_add(quantity) else {
            return Err(TradeRejection::InvalidQuantity);
        };

        self.cash -= cost;
        self.holdings.insert(stock.symbol.clone(), new_quantity);
        let tx = Transaction {
            kind: TradeSide::Buy,
            symbol: stock.symbol.clone(),
            quantity,
            price,
            total: cost,
            timestamp: Utc::now(),
        };
        self.transaction_history.push(tx.clone());
        Ok(tx)
    }

    /// Sell `quantity` held shares at the stock's current price.
    pub fn sell(&mut self, stock: &Stock, quantity: u64) -> Result<Transaction, TradeRejection> {
        if quantity == 0 {
            return Err(TradeRejection::InvalidQuantity);
        }
        let held = self.quantity_of(&stock.symbol);
        if held < quantity {
            return Err(TradeRejection::InsufficientHoldings {
                symbol: stock.symbol.clone(),
                requested: quantity,
                held,
            });
        }

        let price = stock.price();
        let proceeds = price * quantity as f64;
        self.cash += proceeds;
        let remaining = held - quantity;
        if remaining == 0 {
            self.holdings.remove(&stock.symbol);
        } else {
            self.holdings.insert(stock.symbol.clone(), remaining);
        }
        let tx = Transaction {
            kind: TradeSide::Sell,
            symbol: stock.symbol.clone(),
            quantity,
            price,
            total: proceeds,
            timestamp: Utc::now(),
        };
        self.transaction_history.push(tx.clone());
        Ok(tx)
    }

    /// Largest whole number of shares the player's cash covers.
    pub fn max_affordable(&self, stock: &Stock) -> u64 {
        if self.cash <= 0.0 {
            return 0;
        }
        (self.cash / stock.price()).floor() as u64
    }

    pub fn portfolio_value(&self, stocks: &[Stock]) -> f64 {
        self.holdings
            .iter()
            .filter_map(|(symbol, &qty)| find(stocks, symbol).map(|s| s.price() * qty as f64))
            .sum()
    }

    pub fn valuation(&self, stocks: &[Stock]) -> Valuation {
        let portfolio_value = self.portfolio_value(stocks);
        let total_value = self.cash + portfolio_value;
        let profit = total_value - self.initial_cash;
        let profit_percent = if self.initial_cash != 0.0 {
            profit / self.initial_cash * 100.0
        } else {
            0.0
        };
        Valuation {
            cash: self.cash,
            portfolio_value,
            total_value,
            profit,
            profit_percent,
        }
    }

    pub fn total_value(&self, stocks: &[Stock]) -> f64 {
        self.cash + self.portfolio_value(stocks)
    }

    /// Holdings ranked by their share of total value (cash included),
    /// largest first.
    ///
    /// Ties keep symbol order. Empty when total value is not positive.
    pub fn diversification(&self, stocks: &[Stock]) -> Vec<HoldingBreakdown> {
        let total = self.total_value(stocks);
        if total <= 0.0 {
            return Vec::new();
        }
        let lines: Vec<(&Stock, u64, f64)> = self
            .holdings
            .iter()
            .filter_map(|(symbol, &qty)| {
                find(stocks, symbol).map(|s| (s, qty, s.price() * qty as f64))
            })
            .collect();

        let mut breakdown: Vec<HoldingBreakdown> = lines
            .into_iter()
            .map(|(stock, quantity, value)| HoldingBreakdown {
                symbol: stock.symbol.clone(),
                name: stock.name.clone(),
                quantity,
                value,
                percentage: value / total * 100.0,
            })
            .collect();
        breakdown.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
        breakdown
    }

    pub fn risk_metrics(&self, stocks: &[Stock]) -> RiskMetrics {
        let breakdown = self.diversification(stocks);
        RiskMetrics {
            total_positions: breakdown.len(),
            concentration_risk: breakdown.first().map_or(0.0, |h| h.percentage),
            diversification_score: DiversificationScore::from_positions(breakdown.len()),
        }
    }
}
