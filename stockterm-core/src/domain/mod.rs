//! Domain types for StockTerm

pub mod news;
pub mod player;
pub mod stock;

pub use news::{ExternalNews, Impact, News, Qualitative};
pub use player::{Player, TradeSide, Transaction, DEFAULT_INITIAL_CASH};
pub use stock::{Stock, StockSnapshot, HISTORY_CAP, MIN_PRICE};
