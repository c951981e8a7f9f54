//! News generation, ingestion and price impact.

pub mod feed;
pub mod impact;
pub mod templates;

pub use feed::{
    MarketSentiment, NewsFeed, NewsSummary, DEFAULT_MAX_NEWS, SENTIMENT_WINDOW,
    STOCK_SPECIFIC_PROBABILITY,
};
pub use impact::{ImpactModel, DEFAULT_NEUTRAL_BAND, DEFAULT_QUALITATIVE_MAX};
pub use templates::{NewsTemplate, MARKET_TEMPLATES, STOCK_TEMPLATES};
