//! JSON persistence: market data, players, news, named sessions and backups.
//!
//! Layout under the data directory:
//!
//! ```text
//! market_data.json   { "stocks": [...],  "lastUpdated": ... }
//! players.json       { "players": [...], "lastUpdated": ... }
//! news.json          { "news": [...],    "lastUpdated": ... }
//! sessions.json      { "<name>": { "stocks", "players", "news", "savedAt" } }
//! backups/backup_YYYYMMDD_HHMM.json
//! ```
//!
//! Writes are last-write-wins. [`Store::load_state`] never fails: unreadable
//! files are logged and treated as empty.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use stockterm_core::domain::{News, Player, StockSnapshot};

pub const MARKET_FILE: &str = "market_data.json";
pub const PLAYERS_FILE: &str = "players.json";
pub const NEWS_FILE: &str = "news.json";
pub const SESSIONS_FILE: &str = "sessions.json";
pub const BACKUPS_DIR: &str = "backups";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no session named '{0}'")]
    SessionNotFound(String),
}

/// Everything needed to resume a simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedState {
    #[serde(default)]
    pub stocks: Vec<StockSnapshot>,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub news: Vec<News>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarketFile {
    #[serde(default)]
    stocks: Vec<StockSnapshot>,
    #[serde(default)]
    last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayersFile {
    #[serde(default)]
    players: Vec<Player>,
    #[serde(default)]
    last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsFile {
    #[serde(default)]
    news: Vec<News>,
    #[serde(default)]
    last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(flatten)]
    pub state: SavedState,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub name: String,
    pub saved_at: DateTime<Utc>,
    pub players: usize,
}

#[derive(Debug, Clone)]
pub struct Store {
    data_dir: PathBuf,
}

impl Store {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    /// `None` when the file does not exist.
    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>, PersistenceError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(PersistenceError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| PersistenceError::Json {
                path: path.to_path_buf(),
                source,
            })
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), PersistenceError> {
        let io_err = |source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(value).map_err(|source| PersistenceError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(io_err)?;
        debug!(path = %path.display(), "wrote JSON");
        Ok(())
    }

    pub fn load_stocks(&self) -> Result<Vec<StockSnapshot>, PersistenceError> {
        Ok(self
            .read_json::<MarketFile>(&self.path(MARKET_FILE))?
            .map(|f| f.stocks)
            .unwrap_or_default())
    }

    pub fn save_stocks(&self, stocks: &[StockSnapshot]) -> Result<(), PersistenceError> {
        let file = MarketFile {
            stocks: stocks.to_vec(),
            last_updated: Some(Utc::now()),
        };
        self.write_json(&self.path(MARKET_FILE), &file)
    }

    pub fn load_players(&self) -> Result<Vec<Player>, PersistenceError> {
        Ok(self
            .read_json::<PlayersFile>(&self.path(PLAYERS_FILE))?
            .map(|f| f.players)
            .unwrap_or_default())
    }

    pub fn save_players(&self, players: &[Player]) -> Result<(), PersistenceError> {
        let file = PlayersFile {
            players: players.to_vec(),
            last_updated: Some(Utc::now()),
        };
        self.write_json(&self.path(PLAYERS_FILE), &file)
    }

    pub fn load_news(&self) -> Result<Vec<News>, PersistenceError> {
        Ok(self
            .read_json::<NewsFile>(&self.path(NEWS_FILE))?
            .map(|f| f.news)
            .unwrap_or_default())
    }

    pub fn save_news(&self, news: &[News]) -> Result<(), PersistenceError> {
        let file = NewsFile {
            news: news.to_vec(),
            last_updated: Some(Utc::now()),
        };
        self.write_json(&self.path(NEWS_FILE), &file)
    }

    /// Load all three data files. Failures are logged and yield empty parts.
    pub fn load_state(&self) -> SavedState {
        fn or_empty<T>(what: &str, result: Result<Vec<T>, PersistenceError>) -> Vec<T> {
            result.unwrap_or_else(|e| {
                warn!(error = %e, "could not load {what}; starting empty");
                Vec::new()
            })
        }
        SavedState {
            stocks: or_empty("market data", self.load_stocks()),
            players: or_empty("players", self.load_players()),
            news: or_empty("news", self.load_news()),
        }
    }

    /// Write all three data files, attempting each even if an earlier one fails.
    pub fn save_state(&self, state: &SavedState) -> Result<(), PersistenceError> {
        let results = [
            self.save_stocks(&state.stocks),
            self.save_players(&state.players),
            self.save_news(&state.news),
        ];
        results.into_iter().collect()
    }

    // ── Sessions ──

    pub fn sessions(&self) -> Result<BTreeMap<String, Session>, PersistenceError> {
        Ok(self
            .read_json(&self.path(SESSIONS_FILE))?
            .unwrap_or_default())
    }

    /// Save under `name`, replacing any existing session of that name.
    pub fn save_session(&self, name: &str, state: &SavedState) -> Result<(), PersistenceError> {
        let mut sessions = self.sessions()?;
        sessions.insert(
            name.to_string(),
            Session {
                state: state.clone(),
                saved_at: Utc::now(),
            },
        );
        self.write_json(&self.path(SESSIONS_FILE), &sessions)
    }

    pub fn load_session(&self, name: &str) -> Result<SavedState, PersistenceError> {
        self.sessions()?
            .remove(name)
            .map(|s| s.state)
            .ok_or_else(|| PersistenceError::SessionNotFound(name.to_string()))
    }

    /// Returns whether a session was removed.
    pub fn delete_session(&self, name: &str) -> Result<bool, PersistenceError> {
        let mut sessions = self.sessions()?;
        if sessions.remove(name).is_none() {
            return Ok(false);
        }
        self.write_json(&self.path(SESSIONS_FILE), &sessions)?;
        Ok(true)
    }

    pub fn list_sessions(&self) -> Result<Vec<SessionInfo>, PersistenceError> {
        Ok(self
            .sessions()?
            .into_iter()
            .map(|(name, s)| SessionInfo {
                name,
                saved_at: s.saved_at,
                players: s.state.players.len(),
            })
            .collect())
    }

    // ── Backups ──

    /// Bundle every data file as it currently exists on disk into
    /// `backups/backup_YYYYMMDD_HHMM.json`. Missing files become `null`.
    pub fn create_backup(&self) -> Result<PathBuf, PersistenceError> {
        let raw = |file: &str| -> Result<serde_json::Value, PersistenceError> {
            Ok(self
                .read_json::<serde_json::Value>(&self.path(file))?
                .unwrap_or(serde_json::Value::Null))
        };
        let bundle = serde_json::json!({
            "marketData": raw(MARKET_FILE)?,
            "players": raw(PLAYERS_FILE)?,
            "news": raw(NEWS_FILE)?,
            "sessions": raw(SESSIONS_FILE)?,
            "backupDate": Utc::now(),
        });
        let name = format!("backup_{}.json", Local::now().format("%Y%m%d_%H%M"));
        let path = self.data_dir.join(BACKUPS_DIR).join(name);
        self.write_json(&path, &bundle)?;
        Ok(path)
    }
}
