//! Stockterm Core: market simulation and portfolio accounting engine.
//!
//! This crate contains everything with numeric semantics:
//! - Domain types (stocks, players, transactions, news)
//! - Random-walk price model with a bounded history
//! - Technical indicators over price history
//! - Ledger: trades, valuation, diversification, risk
//! - Market: stock universe, roster, rankings, leaderboard
//! - News feed and the news-to-price impact model
//! - Deterministic RNG streams
//!
//! No I/O happens here. Scheduling, persistence and external news live in
//! `stockterm-runner`.

pub mod domain;
pub mod indicators;
pub mod ledger;
pub mod market;
pub mod news;
pub mod price_model;
pub mod rng;
