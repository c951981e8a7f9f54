//! External news sources.
//!
//! The [`NewsSource`] trait abstracts over article APIs so the engine can
//! swap implementations and mock them in tests. Sources return
//! [`ExternalNews`] records ready for the feed; how they were obtained is
//! invisible to the core.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use stockterm_core::domain::{ExternalNews, Impact, Qualitative};

use crate::circuit_breaker::CircuitBreaker;
use crate::config::{NewsSourceConfig, SimConfig, SourceKind};

#[derive(Debug, Clone, Error)]
pub enum NewsSourceError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by {0}")]
    RateLimited(String),

    #[error("authentication rejected by {0}")]
    AuthenticationRequired(String),

    #[error("unexpected response from {source_name}: {detail}")]
    ResponseFormatChanged { source_name: String, detail: String },

    #[error("{0} is cooling down after repeated failures")]
    CircuitBreakerTripped(String),

    #[error("HTTP client setup failed: {0}")]
    Client(String),

    #[error("no news sources configured")]
    NoSources,

    #[error("all news sources failed; last error: {0}")]
    AllSourcesFailed(String),
}

pub trait NewsSource: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch up to `limit` items. May serve cached data.
    fn fetch(&self, limit: usize) -> Result<Vec<ExternalNews>, NewsSourceError>;

    /// Fetch bypassing any cache.
    fn refresh(&self, limit: usize) -> Result<Vec<ExternalNews>, NewsSourceError> {
        self.fetch(limit)
    }

    fn is_available(&self) -> bool {
        true
    }
}

// ── Headline heuristics ──────────────────────────────────────────────

const POSITIVE_WORDS: [&str; 11] = [
    "rise", "gain", "up", "surge", "bull", "profit", "growth", "positive", "strong", "beat",
    "exceed",
];

const NEGATIVE_WORDS: [&str; 11] = [
    "fall", "drop", "down", "crash", "bear", "loss", "decline", "negative", "weak", "miss",
    "below",
];

/// Direction of a headline by counting which keyword list has more hits.
///
/// Matching is by substring, so "upgrade" counts for "up".
pub fn classify_impact(title: &str, description: &str) -> Qualitative {
    let text = format!("{title} {description}").to_lowercase();
    let score = |words: &[&str]| words.iter().filter(|w| text.contains(**w)).count();
    let positive = score(&POSITIVE_WORDS);
    let negative = score(&NEGATIVE_WORDS);
    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Qualitative::Positive,
        std::cmp::Ordering::Less => Qualitative::Negative,
        std::cmp::Ordering::Equal => Qualitative::Neutral,
    }
}

/// Universe symbols mentioned as whole words in `text`; when none are, one to
/// three distinct random symbols.
pub fn extract_symbols<R: Rng + ?Sized>(
    text: &str,
    universe: &[String],
    rng: &mut R,
) -> Vec<String> {
    let upper = text.to_uppercase();
    let tokens: Vec<&str> = upper
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    let mentioned: Vec<String> = universe
        .iter()
        .filter(|sym| tokens.contains(&sym.as_str()))
        .cloned()
        .collect();
    if !mentioned.is_empty() || universe.is_empty() {
        return mentioned;
    }
    let count = rng.gen_range(1..=3);
    universe.choose_multiple(rng, count).cloned().collect()
}

// ── Articles API (NewsAPI / GNews) ───────────────────────────────────

#[derive(Debug, Deserialize)]
struct ArticlesResponse {
    #[serde(default)]
    articles: Option<Vec<Article>>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    published_at: Option<DateTime<Utc>>,
    source: Option<ArticleSource>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

/// Article search endpoint returning `{ "articles": [...] }`.
pub struct ArticlesApiSource {
    config: NewsSourceConfig,
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    universe: Vec<String>,
    rng: Mutex<StdRng>,
}

impl ArticlesApiSource {
    pub fn new(
        config: NewsSourceConfig,
        universe: Vec<String>,
        circuit_breaker: Arc<CircuitBreaker>,
        seed: u64,
    ) -> Result<Self, NewsSourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("stockterm/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NewsSourceError::Client(e.to_string()))?;
        Ok(Self {
            config,
            client,
            circuit_breaker,
            universe,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        })
    }

    fn query(&self, limit: usize) -> Vec<(&'static str, String)> {
        let mut params = vec![("q", self.config.query.clone())];
        match self.config.kind {
            SourceKind::NewsApi => {
                params.push(("language", "en".into()));
                params.push(("sortBy", "publishedAt".into()));
                params.push(("pageSize", limit.to_string()));
                if let Some(key) = &self.config.api_key {
                    params.push(("apiKey", key.clone()));
                }
            }
            SourceKind::GNews => {
                params.push(("lang", "en".into()));
                params.push(("max", limit.to_string()));
                if let Some(key) = &self.config.api_key {
                    params.push(("token", key.clone()));
                }
            }
        }
        params
    }

    fn parse(&self, body: ArticlesResponse, limit: usize) -> Result<Vec<ExternalNews>, NewsSourceError> {
        let articles = body.articles.ok_or_else(|| NewsSourceError::ResponseFormatChanged {
            source_name: self.config.name.clone(),
            detail: body.message.unwrap_or_else(|| "missing `articles`".into()),
        })?;
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(articles_to_news(
            articles,
            limit,
            &self.config.name,
            &self.universe,
            &mut *rng,
        ))
    }
}

fn articles_to_news<R: Rng + ?Sized>(
    articles: Vec<Article>,
    limit: usize,
    fallback_source: &str,
    universe: &[String],
    rng: &mut R,
) -> Vec<ExternalNews> {
    articles
        .into_iter()
        .filter_map(|a| {
            let title = a.title.filter(|t| !t.trim().is_empty())?;
            let description = a.description.or(a.content).unwrap_or_default();
            let impact = classify_impact(&title, &description);
            let affected_stocks = extract_symbols(&format!("{title} {description}"), universe, &mut *rng);
            Some(ExternalNews {
                impact: Impact::Qualitative(impact),
                affected_stocks,
                timestamp: a.published_at.unwrap_or_else(Utc::now),
                source: a
                    .source
                    .and_then(|s| s.name)
                    .unwrap_or_else(|| fallback_source.to_string()),
                url: a.url.unwrap_or_default(),
                title,
                content: description,
            })
        })
        .take(limit)
        .collect()
}

impl NewsSource for ArticlesApiSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn fetch(&self, limit: usize) -> Result<Vec<ExternalNews>, NewsSourceError> {
        let name = self.config.name.clone();
        if !self.circuit_breaker.is_allowed() {
            return Err(NewsSourceError::CircuitBreakerTripped(name));
        }

        let resp = match self.client.get(&self.config.url).query(&self.query(limit)).send() {
            Ok(resp) => resp,
            Err(e) => {
                self.circuit_breaker.record_failure();
                return Err(NewsSourceError::NetworkUnreachable(e.to_string()));
            }
        };

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            self.circuit_breaker.trip();
            return Err(NewsSourceError::AuthenticationRequired(name));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            self.circuit_breaker.trip();
            return Err(NewsSourceError::RateLimited(name));
        }
        if !status.is_success() {
            self.circuit_breaker.record_failure();
            return Err(NewsSourceError::ResponseFormatChanged {
                source_name: name,
                detail: format!("HTTP {status}"),
            });
        }

        let body: ArticlesResponse = resp.json().map_err(|e| {
            self.circuit_breaker.record_failure();
            NewsSourceError::ResponseFormatChanged {
                source_name: name.clone(),
                detail: e.to_string(),
            }
        })?;
        let items = self.parse(body, limit)?;
        self.circuit_breaker.record_success();
        debug!(source = %name, count = items.len(), "fetched articles");
        Ok(items)
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

// ── Composition ──────────────────────────────────────────────────────

/// Tries each source in order; the first non-empty result wins.
pub struct FallbackChain {
    sources: Vec<Box<dyn NewsSource>>,
}

impl FallbackChain {
    pub fn new(sources: Vec<Box<dyn NewsSource>>) -> Self {
        Self { sources }
    }

    fn run(
        &self,
        limit: usize,
        call: impl Fn(&dyn NewsSource) -> Result<Vec<ExternalNews>, NewsSourceError>,
    ) -> Result<Vec<ExternalNews>, NewsSourceError> {
        if self.sources.is_empty() {
            return Err(NewsSourceError::NoSources);
        }
        let mut last_error = None;
        for source in &self.sources {
            if !source.is_available() {
                debug!(source = source.name(), "skipping unavailable news source");
                last_error = Some(NewsSourceError::CircuitBreakerTripped(source.name().into()));
                continue;
            }
            match call(source.as_ref()) {
                Ok(items) if !items.is_empty() => return Ok(items.into_iter().take(limit).collect()),
                Ok(_) => {
                    debug!(source = source.name(), "news source returned nothing");
                }
                Err(e) => {
                    warn!(source = source.name(), error = %e, "news source failed, trying next");
                    last_error = Some(e);
                }
            }
        }
        Err(NewsSourceError::AllSourcesFailed(
            last_error.map_or_else(|| "no items returned".to_string(), |e| e.to_string()),
        ))
    }
}

impl NewsSource for FallbackChain {
    fn name(&self) -> &str {
        "fallback-chain"
    }

    fn fetch(&self, limit: usize) -> Result<Vec<ExternalNews>, NewsSourceError> {
        self.run(limit, |s| s.fetch(limit))
    }

    fn refresh(&self, limit: usize) -> Result<Vec<ExternalNews>, NewsSourceError> {
        self.run(limit, |s| s.refresh(limit))
    }

    fn is_available(&self) -> bool {
        self.sources.iter().any(|s| s.is_available())
    }
}

/// Serves the last successful result until it expires.
pub struct CachedNewsSource<S> {
    inner: S,
    ttl: Duration,
    cache: Mutex<Option<(Instant, Vec<ExternalNews>)>>,
}

impl<S: NewsSource> CachedNewsSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cache: Mutex::new(None),
        }
    }

    fn store(&self, items: &[ExternalNews]) {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        *cache = Some((Instant::now(), items.to_vec()));
    }
}

impl<S: NewsSource> NewsSource for CachedNewsSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(&self, limit: usize) -> Result<Vec<ExternalNews>, NewsSourceError> {
        {
            let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some((at, items)) = cache.as_ref() {
                if at.elapsed() < self.ttl {
                    return Ok(items.iter().take(limit).cloned().collect());
                }
            }
        }
        self.refresh(limit)
    }

    fn refresh(&self, limit: usize) -> Result<Vec<ExternalNews>, NewsSourceError> {
        let items = self.inner.refresh(limit)?;
        self.store(&items);
        Ok(items)
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}

/// Build the configured source stack: cache over a fallback chain of
/// article APIs, each with its own circuit breaker. `None` when no sources
/// are configured.
pub fn build_news_source(
    config: &SimConfig,
    universe: Vec<String>,
    seed: u64,
) -> Result<Option<Arc<dyn NewsSource>>, NewsSourceError> {
    if config.news_sources.is_empty() {
        return Ok(None);
    }
    let mut sources: Vec<Box<dyn NewsSource>> = Vec::with_capacity(config.news_sources.len());
    for (i, source) in config.news_sources.iter().enumerate() {
        let breaker = Arc::new(CircuitBreaker::default_source());
        sources.push(Box::new(ArticlesApiSource::new(
            source.clone(),
            universe.clone(),
            breaker,
            seed.wrapping_add(i as u64),
        )?));
    }
    let cached = CachedNewsSource::new(FallbackChain::new(sources), config.news_cache_ttl());
    Ok(Some(Arc::new(cached)))
}
