//! The simulation owner: market, news feed and RNG streams in one place.
//!
//! Exactly one thread (the engine) holds a `Simulation` at a time. Every
//! mutation (price tick, news generation, external merge, trade) goes
//! through `&mut self`, so there is no interleaving to reason about.

use rand::Rng;
use tracing::{debug, info};

use stockterm_core::domain::{ExternalNews, News};
use stockterm_core::market::Market;
use stockterm_core::news::NewsFeed;
use stockterm_core::rng::{RngHierarchy, SimRngs};

use crate::config::SimConfig;
use crate::persistence::SavedState;

#[derive(Debug)]
pub struct Simulation {
    market: Market,
    feed: NewsFeed,
    rngs: SimRngs,
    seed: u64,
    news_probability: f64,
}

impl Simulation {
    /// Fresh simulation over the seed universe. Uses the configured seed, or
    /// draws one from entropy.
    pub fn new(config: &SimConfig) -> Self {
        let hierarchy = config
            .seed
            .map(RngHierarchy::new)
            .unwrap_or_else(RngHierarchy::from_entropy);
        let seed = hierarchy.master_seed();
        debug!(seed, "simulation RNG hierarchy ready");
        Self {
            market: Market::new(config.initial_cash),
            feed: NewsFeed::new(config.max_news, config.impact),
            rngs: SimRngs::from_hierarchy(&hierarchy),
            seed,
            news_probability: config.news_probability,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn market(&self) -> &Market {
        &self.market
    }

    pub fn market_mut(&mut self) -> &mut Market {
        &mut self.market
    }

    pub fn feed(&self) -> &NewsFeed {
        &self.feed
    }

    pub fn feed_mut(&mut self) -> &mut NewsFeed {
        &mut self.feed
    }

    pub fn universe_symbols(&self) -> Vec<String> {
        self.market.stocks().iter().map(|s| s.symbol.clone()).collect()
    }

    /// One price step across the whole universe.
    pub fn tick(&mut self) {
        self.market.tick_all(&mut self.rngs.prices);
    }

    /// Generate one synthetic item and apply pending impact.
    pub fn generate_news(&mut self) -> News {
        let news = self
            .feed
            .generate(self.market.stocks(), &mut self.rngs.news)
            .clone();
        self.apply_pending_impact();
        news
    }

    /// A news timer firing: produces an item with the configured probability.
    pub fn on_news_timer(&mut self) -> Option<News> {
        if self.rngs.news.gen::<f64>() < self.news_probability {
            Some(self.generate_news())
        } else {
            None
        }
    }

    /// Merge externally sourced items, newest ending up first, then apply
    /// their impact. Articles already in the feed (same title and url) are
    /// skipped, so a cached batch never moves prices twice. Returns the
    /// number merged.
    pub fn ingest_external(&mut self, items: Vec<ExternalNews>) -> usize {
        let offered = items.len();
        let mut fresh: Vec<ExternalNews> = Vec::with_capacity(offered);
        for item in items {
            let seen = self.feed.contains_external(&item.title, &item.url)
                || fresh.iter().any(|f| f.title == item.title && f.url == item.url);
            if !seen {
                fresh.push(item);
            }
        }
        if fresh.len() < offered {
            debug!(skipped = offered - fresh.len(), "skipped external news already in feed");
        }

        let count = fresh.len();
        for item in fresh.into_iter().rev() {
            self.feed.ingest_external(item);
        }
        if count > 0 {
            self.apply_pending_impact();
            info!(count, "merged external news");
        }
        count
    }

    fn apply_pending_impact(&mut self) -> usize {
        let applied = self
            .feed
            .apply_impact(self.market.stocks_mut(), &mut self.rngs.impact);
        if applied > 0 {
            debug!(applied, "news impact applied");
        }
        applied
    }

    pub fn state(&self) -> SavedState {
        SavedState {
            stocks: self.market.stock_snapshots(),
            players: self.market.players().to_vec(),
            news: self.feed.items().cloned().collect(),
        }
    }

    /// Overlay saved state: stocks positionally, players and news wholesale.
    pub fn restore(&mut self, state: SavedState) {
        let restored = self.market.restore_stocks(&state.stocks);
        if restored < state.stocks.len() {
            debug!(
                restored,
                saved = state.stocks.len(),
                "some saved stocks did not match the universe"
            );
        }
        self.market.restore_players(state.players);
        self.feed.restore(state.news);
        info!(
            stocks = restored,
            players = self.market.players().len(),
            news = self.feed.len(),
            "state restored"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stockterm_core::domain::{Impact, Qualitative};

    fn seeded(seed: u64) -> Simulation {
        Simulation::new(&SimConfig {
            seed: Some(seed),
            ..SimConfig::default()
        })
    }

    fn external(title: &str, symbol: &str) -> ExternalNews {
        ExternalNews {
            title: title.into(),
            content: String::new(),
            impact: Impact::Qualitative(Qualitative::Positive),
            affected_stocks: vec![symbol.into()],
            timestamp: Utc::now(),
            source: "wire".into(),
            url: "https://example.invalid/a".into(),
        }
    }

    #[test]
    fn seeded_runs_replay_identically() {
        let run = |seed| {
            let mut sim = seeded(seed);
            for _ in 0..20 {
                sim.tick();
                sim.on_news_timer();
            }
            (sim.market().stock_snapshots(), sim.feed().len())
        };
        assert_eq!(run(9), run(9));
        assert_ne!(run(9).0, run(10).0);
    }

    #[test]
    fn generated_news_is_applied_immediately() {
        let mut sim = seeded(3);
        for _ in 0..10 {
            sim.generate_news();
        }
        assert!(sim
            .feed()
            .items()
            .filter(|n| !n.affected_stocks.is_empty())
            .all(|n| n.is_read));
    }

    #[test]
    fn news_probability_bounds() {
        let mut never = Simulation::new(&SimConfig {
            seed: Some(1),
            news_probability: 0.0,
            ..SimConfig::default()
        });
        let mut always = Simulation::new(&SimConfig {
            seed: Some(1),
            news_probability: 1.0,
            ..SimConfig::default()
        });
        for _ in 0..10 {
            assert!(never.on_news_timer().is_none());
            assert!(always.on_news_timer().is_some());
        }
    }

    #[test]
    fn external_items_keep_newest_first_and_move_prices() {
        let mut sim = seeded(5);
        let before = sim.market().stock("AAPL").unwrap().price();
        let merged = sim.ingest_external(vec![external("newest", "AAPL"), external("older", "AAPL")]);
        assert_eq!(merged, 2);

        let titles: Vec<&str> = sim.feed().items().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["newest", "older"]);
        assert!(sim.feed().items().all(|n| n.is_real && n.is_read));
        assert!(sim.market().stock("AAPL").unwrap().price() > before);
    }

    #[test]
    fn cached_batch_merges_once() {
        use crate::news_source::{CachedNewsSource, NewsSource, NewsSourceError};
        use std::time::Duration;

        struct Fixed(Vec<ExternalNews>);
        impl NewsSource for Fixed {
            fn name(&self) -> &str {
                "fixed"
            }
            fn fetch(&self, limit: usize) -> Result<Vec<ExternalNews>, NewsSourceError> {
                Ok(self.0.iter().take(limit).cloned().collect())
            }
        }

        let source = CachedNewsSource::new(
            Fixed(vec![external("Apple rallies", "AAPL")]),
            Duration::from_secs(900),
        );
        let mut sim = seeded(11);
        assert_eq!(sim.ingest_external(source.fetch(5).unwrap()), 1);
        let after_first = sim.market().stock("AAPL").unwrap().price();

        assert_eq!(sim.ingest_external(source.fetch(5).unwrap()), 0);
        assert_eq!(sim.market().stock("AAPL").unwrap().price(), after_first);
        assert_eq!(
            sim.feed().items().filter(|n| n.title == "Apple rallies").count(),
            1
        );
    }

    #[test]
    fn duplicates_within_one_batch_merge_once() {
        let mut sim = seeded(12);
        let merged = sim.ingest_external(vec![external("same", "MSFT"), external("same", "MSFT")]);
        assert_eq!(merged, 1);
        assert_eq!(sim.feed().len(), 1);
    }

    #[test]
    fn state_restore_roundtrip() {
        let mut sim = seeded(8);
        sim.market_mut().add_player("ada");
        sim.market_mut().buy("MSFT", 2).unwrap();
        sim.tick();
        sim.generate_news();
        let state = sim.state();

        let mut fresh = seeded(99);
        fresh.restore(state.clone());
        assert_eq!(fresh.state(), state);
        assert_eq!(fresh.market().current_player().unwrap().name, "ada");
    }
}
