//! Stockterm Runner: drives a `stockterm-core` market over time.
//!
//! This crate builds on `stockterm-core` to provide:
//! - TOML configuration with defaults and validation
//! - The simulation owner (market + news feed + RNG streams)
//! - A timer thread and a single-consumer engine thread
//! - JSON persistence, named sessions and backups
//! - Portfolio export to JSON and CSV
//! - External news sources behind a cache, fallback chain and circuit breaker

pub mod circuit_breaker;
pub mod config;
pub mod engine;
pub mod export;
pub mod news_source;
pub mod persistence;
pub mod scheduler;
pub mod simulation;

pub use circuit_breaker::CircuitBreaker;
pub use config::{ConfigError, NewsSourceConfig, SimConfig, SourceKind};
pub use engine::{
    spawn_engine, Command, EngineEvent, EngineHandle, ErrorKind, Snapshot, Task,
};
pub use export::{write_export, ExportFormat, PortfolioExport};
pub use news_source::{
    build_news_source, ArticlesApiSource, CachedNewsSource, FallbackChain, NewsSource,
    NewsSourceError,
};
pub use persistence::{PersistenceError, SavedState, SessionInfo, Store};
pub use scheduler::{Intervals, Scheduler, Timer};
pub use simulation::Simulation;
