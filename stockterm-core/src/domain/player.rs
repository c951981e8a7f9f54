//! Player: cash, holdings and the append-only transaction log.
//!
//! Trading and valuation logic lives in [`crate::ledger`]; this module only
//! defines the data.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Starting cash for a newly added player unless configured otherwise.
pub const DEFAULT_INITIAL_CASH: f64 = 10_000.0;

/// Direction of a ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn label(self) -> &'static str {
        match self {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
        }
    }
}

/// One executed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "type")]
    pub kind: TradeSide,
    pub symbol: String,
    pub quantity: u64,
    /// Unit price at execution.
    pub price: f64,
    pub total: f64,
    pub timestamp: DateTime<Utc>,
}

/// A participant trading against simulated cash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub name: String,
    pub cash: f64,
    pub initial_cash: f64,
    /// symbol -> shares held. Zero-quantity entries are removed.
    #[serde(rename = "portfolio", default)]
    pub holdings: BTreeMap<String, u64>,
    #[serde(default)]
    pub transaction_history: Vec<Transaction>,
}

impl Player {
    pub fn new(name: impl Into<String>, initial_cash: f64) -> Self {
        Self {
            name: name.into(),
            cash: initial_cash,
            initial_cash,
            holdings: BTreeMap::new(),
            transaction_history: Vec::new(),
        }
    }

    pub fn quantity_of(&self, symbol: &str) -> u64 {
        self.holdings.get(symbol).copied().unwrap_or(0)
    }

    /// Most recent transactions first.
    pub fn recent_transactions(&self, limit: usize) -> Vec<&Transaction> {
        self.transaction_history.iter().rev().take(limit).collect()
    }
}
