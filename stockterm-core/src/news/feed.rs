//! Rolling news feed: generation, ingestion, impact application, sentiment.
//!
//! Items are kept most-recent-first and capped; the oldest are evicted.

use std::collections::VecDeque;
use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::impact::ImpactModel;
use super::templates::{MARKET_TEMPLATES, STOCK_TEMPLATES};
use crate::domain::{ExternalNews, News, Stock};

pub const DEFAULT_MAX_NEWS: usize = 50;

/// Chance a generated item targets a single stock rather than the market.
pub const STOCK_SPECIFIC_PROBABILITY: f64 = 0.7;

/// Number of recent items sentiment is computed over.
pub const SENTIMENT_WINDOW: usize = 20;

const SENTIMENT_THRESHOLD: f64 = 0.02;
const STOCK_JITTER: f64 = 0.02;
const MARKET_JITTER: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketSentiment {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for MarketSentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MarketSentiment::Bullish => "bullish",
            MarketSentiment::Bearish => "bearish",
            MarketSentiment::Neutral => "neutral",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsSummary {
    pub total: usize,
    pub unread: usize,
    pub recent: Vec<News>,
    pub sentiment: MarketSentiment,
}

#[derive(Debug, Clone)]
pub struct NewsFeed {
    items: VecDeque<News>,
    max_items: usize,
    model: ImpactModel,
}

impl Default for NewsFeed {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NEWS, ImpactModel::default())
    }
}

impl NewsFeed {
    pub fn new(max_items: usize, model: ImpactModel) -> Self {
        Self {
            items: VecDeque::with_capacity(max_items),
            max_items: max_items.max(1),
            model,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All items, most recent first.
    pub fn items(&self) -> impl Iterator<Item = &News> {
        self.items.iter()
    }

    /// Prepend an item, evicting the oldest beyond capacity.
    pub fn push(&mut self, news: News) -> &News {
        self.items.push_front(news);
        self.items.truncate(self.max_items);
        &self.items[0]
    }

    /// Generate one synthetic item and prepend it.
    ///
    /// With an empty universe every item is market-wide.
    pub fn generate<R: Rng + ?Sized>(&mut self, stocks: &[Stock], rng: &mut R) -> &News {
        let stock_specific = rng.gen::<f64>() < STOCK_SPECIFIC_PROBABILITY;
        let news = match (stock_specific, stocks.choose(rng)) {
            (true, Some(stock)) => {
                let template = STOCK_TEMPLATES.choose(rng).unwrap_or(&STOCK_TEMPLATES[0]);
                let jitter = (rng.gen::<f64>() - 0.5) * STOCK_JITTER;
                News::synthetic(
                    format!("{}: {}", stock.name, template.title),
                    template.content,
                    template.impact + jitter,
                    vec![stock.symbol.clone()],
                )
            }
            _ => {
                let template = MARKET_TEMPLATES.choose(rng).unwrap_or(&MARKET_TEMPLATES[0]);
                let jitter = (rng.gen::<f64>() - 0.5) * MARKET_JITTER;
                News::synthetic(
                    format!("Market News: {}", template.title),
                    template.content,
                    template.impact + jitter,
                    Vec::new(),
                )
            }
        };
        self.push(news)
    }

    /// Whether an external article with this title and url is already held.
    pub fn contains_external(&self, title: &str, url: &str) -> bool {
        self.items
            .iter()
            .any(|n| n.is_real && n.title == title && n.url.as_deref() == Some(url))
    }

    /// Wrap an externally sourced record and prepend it.
    pub fn ingest_external(&mut self, external: ExternalNews) -> &News {
        self.push(News::from(external))
    }

    /// Apply every unread item that names affected stocks, then mark it read.
    ///
    /// Unknown symbols are skipped. Items without affected stocks stay
    /// unread. Returns the number of items applied.
    pub fn apply_impact<R: Rng + ?Sized>(&mut self, stocks: &mut [Stock], rng: &mut R) -> usize {
        let mut applied = 0;
        for item in self.items.iter_mut() {
            if item.is_read || item.affected_stocks.is_empty() {
                continue;
            }
            for symbol in &item.affected_stocks {
                if let Some(stock) = stocks.iter_mut().find(|s| &s.symbol == symbol) {
                    self.model.apply(stock, &item.impact, rng);
                }
            }
            item.mark_read();
            applied += 1;
        }
        applied
    }

    pub fn sentiment(&self) -> MarketSentiment {
        let recent: Vec<f64> = self
            .items
            .iter()
            .take(SENTIMENT_WINDOW)
            .map(|n| self.model.sentiment_score(&n.impact))
            .collect();
        if recent.is_empty() {
            return MarketSentiment::Neutral;
        }
        let avg = recent.iter().sum::<f64>() / recent.len() as f64;
        if avg > SENTIMENT_THRESHOLD {
            MarketSentiment::Bullish
        } else if avg < -SENTIMENT_THRESHOLD {
            MarketSentiment::Bearish
        } else {
            MarketSentiment::Neutral
        }
    }

    pub fn latest(&self, limit: usize) -> Vec<&News> {
        self.items.iter().take(limit).collect()
    }

    pub fn unread(&self) -> Vec<&News> {
        self.items.iter().filter(|n| !n.is_read).collect()
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.is_read).count()
    }

    pub fn mark_all_read(&mut self) {
        self.items.iter_mut().for_each(News::mark_read);
    }

    pub fn for_stock(&self, symbol: &str) -> Vec<&News> {
        self.items.iter().filter(|n| n.affects(symbol)).collect()
    }

    pub fn summary(&self) -> NewsSummary {
        NewsSummary {
            total: self.items.len(),
            unread: self.unread_count(),
            recent: self.latest(5).into_iter().cloned().collect(),
            sentiment: self.sentiment(),
        }
    }

    /// Replace contents with persisted items (most recent first), capped.
    pub fn restore(&mut self, items: Vec<News>) {
        self.items = items.into_iter().take(self.max_items).collect();
    }
}
