//! Simulation configuration, loaded from TOML.
//!
//! Every field has a default, so an empty or missing file yields a working
//! simulation. Unknown keys are rejected to catch typos early.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockterm_core::domain::DEFAULT_INITIAL_CASH;
use stockterm_core::news::{ImpactModel, DEFAULT_MAX_NEWS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which article API a news source speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// `apiKey` query parameter, `pageSize` limit.
    NewsApi,
    /// `token` query parameter, `max` limit.
    GNews,
}

/// One external news endpoint. Sources are tried in listed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewsSourceConfig {
    pub name: String,
    pub kind: SourceKind,
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_query")]
    pub query: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_query() -> String {
    "stock market finance trading".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub initial_cash: f64,
    pub price_interval_ms: u64,
    pub news_interval_ms: u64,
    /// Chance a news timer firing produces an item.
    pub news_probability: f64,
    pub real_news_interval_secs: u64,
    /// Items merged per external refresh.
    pub real_news_limit: usize,
    pub news_cache_secs: u64,
    pub max_news: usize,
    /// Master seed; drawn from entropy when absent.
    pub seed: Option<u64>,
    pub data_dir: PathBuf,
    pub exports_dir: PathBuf,
    pub impact: ImpactModel,
    pub news_sources: Vec<NewsSourceConfig>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            initial_cash: DEFAULT_INITIAL_CASH,
            price_interval_ms: 3_000,
            news_interval_ms: 10_000,
            news_probability: 0.3,
            real_news_interval_secs: 15 * 60,
            real_news_limit: 5,
            news_cache_secs: 15 * 60,
            max_news: DEFAULT_MAX_NEWS,
            seed: None,
            data_dir: PathBuf::from("data"),
            exports_dir: PathBuf::from("exports"),
            impact: ImpactModel::default(),
            news_sources: Vec::new(),
        }
    }
}

impl SimConfig {
    /// Load from a TOML file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config: SimConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_cash.is_finite() && self.initial_cash > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "initial_cash must be positive, got {}",
                self.initial_cash
            )));
        }
        for (name, value) in [
            ("price_interval_ms", self.price_interval_ms),
            ("news_interval_ms", self.news_interval_ms),
            ("real_news_interval_secs", self.real_news_interval_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be positive")));
            }
        }
        if !(0.0..=1.0).contains(&self.news_probability) {
            return Err(ConfigError::Invalid(format!(
                "news_probability must be within [0, 1], got {}",
                self.news_probability
            )));
        }
        if self.max_news == 0 {
            return Err(ConfigError::Invalid("max_news must be positive".into()));
        }
        if self.impact.qualitative_max < 0.0 || self.impact.neutral_band < 0.0 {
            return Err(ConfigError::Invalid("impact bounds must be non-negative".into()));
        }
        Ok(())
    }

    pub fn price_interval(&self) -> Duration {
        Duration::from_millis(self.price_interval_ms)
    }

    pub fn news_interval(&self) -> Duration {
        Duration::from_millis(self.news_interval_ms)
    }

    pub fn real_news_interval(&self) -> Duration {
        Duration::from_secs(self.real_news_interval_secs)
    }

    pub fn news_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.news_cache_secs)
    }
}
