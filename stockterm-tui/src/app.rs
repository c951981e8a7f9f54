//! Application state: single-owner, main-thread only.
//!
//! The engine thread owns the simulation; the UI only ever sees the latest
//! [`Snapshot`]. Key handlers queue [`Request`]s which the main loop forwards
//! to the engine.

use std::collections::VecDeque;

use chrono::NaiveDateTime;

use stockterm_core::domain::Stock;
use stockterm_runner::{Command, ErrorKind, ExportFormat, SessionInfo, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Market,
    Portfolio,
    News,
    Analysis,
    Chart,
    Leaderboard,
    Help,
}

const PANELS: [Panel; 7] = [
    Panel::Market,
    Panel::Portfolio,
    Panel::News,
    Panel::Analysis,
    Panel::Chart,
    Panel::Leaderboard,
    Panel::Help,
];

impl Panel {
    pub fn index(self) -> usize {
        PANELS.iter().position(|p| *p == self).unwrap_or(0)
    }

    pub fn from_index(i: usize) -> Option<Self> {
        PANELS.get(i).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Panel::Market => "Market",
            Panel::Portfolio => "Portfolio",
            Panel::News => "News",
            Panel::Analysis => "Analysis",
            Panel::Chart => "Chart",
            Panel::Leaderboard => "Leaderboard",
            Panel::Help => "Help",
        }
    }

    pub fn next(self) -> Panel {
        PANELS[(self.index() + 1) % PANELS.len()]
    }

    pub fn prev(self) -> Panel {
        PANELS[(self.index() + PANELS.len() - 1) % PANELS.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Trade,
    News,
    Storage,
    Other,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Trade => "TRADE",
            ErrorCategory::News => "NEWS",
            ErrorCategory::Storage => "DISK",
            ErrorCategory::Other => "ERR",
        }
    }
}

impl From<ErrorKind> for ErrorCategory {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::News => ErrorCategory::News,
            ErrorKind::Storage => ErrorCategory::Storage,
            ErrorKind::Player => ErrorCategory::Other,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub timestamp: NaiveDateTime,
    pub category: ErrorCategory,
    pub message: String,
}

/// What a text prompt is collecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    BuySymbol,
    BuyQuantity { symbol: String },
    SellSymbol,
    SellQuantity { symbol: String },
    AddPlayer,
    SwitchPlayer,
    ExportFormat,
    SaveSession,
    LoadSession,
    DeleteSession,
}

impl PromptKind {
    pub fn title(&self) -> String {
        match self {
            PromptKind::BuySymbol => "Buy: symbol or number".into(),
            PromptKind::BuyQuantity { symbol } => format!("Buy {symbol}: quantity (or 'max')"),
            PromptKind::SellSymbol => "Sell: symbol or number".into(),
            PromptKind::SellQuantity { symbol } => format!("Sell {symbol}: quantity (or 'all')"),
            PromptKind::AddPlayer => "New player name".into(),
            PromptKind::SwitchPlayer => "Switch to player".into(),
            PromptKind::ExportFormat => "Export format (json / csv)".into(),
            PromptKind::SaveSession => "Save session as".into(),
            PromptKind::LoadSession => "Load session".into(),
            PromptKind::DeleteSession => "Delete session".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
    /// Extra line shown under the title (e.g. max affordable).
    pub hint: Option<String>,
}

impl Prompt {
    pub fn new(kind: PromptKind) -> Self {
        Self {
            kind,
            input: String::new(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    None,
    Welcome,
    Prompt(Prompt),
    ErrorHistory,
    Sessions(Vec<SessionInfo>),
}

/// Something for the main loop to hand to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Engine(Command),
    TogglePriceUpdates,
}

pub struct AppState {
    pub active_panel: Panel,
    pub running: bool,
    pub snapshot: Option<Snapshot>,
    /// Selected row in the market table.
    pub cursor: usize,
    pub news_scroll: usize,
    pub overlay: Overlay,
    pub status_message: Option<(String, StatusLevel)>,
    pub error_history: VecDeque<ErrorRecord>,
    pub error_scroll: usize,
    pub requests: Vec<Request>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            active_panel: Panel::Market,
            running: true,
            snapshot: None,
            cursor: 0,
            news_scroll: 0,
            overlay: Overlay::Welcome,
            status_message: None,
            error_history: VecDeque::with_capacity(50),
            error_scroll: 0,
            requests: Vec::new(),
        }
    }

    pub fn request(&mut self, command: Command) {
        self.requests.push(Request::Engine(command));
    }

    pub fn stocks(&self) -> &[Stock] {
        self.snapshot
            .as_ref()
            .map(|s| s.market.stocks())
            .unwrap_or(&[])
    }

    pub fn selected_stock(&self) -> Option<&Stock> {
        self.stocks().get(self.cursor)
    }

    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        let len = snapshot.market.stocks().len();
        if len > 0 && self.cursor >= len {
            self.cursor = len - 1;
        }
        self.snapshot = Some(snapshot);
    }

    /// Push an error to the history, capping at 50.
    pub fn push_error(&mut self, category: ErrorCategory, message: String) {
        self.error_history.push_front(ErrorRecord {
            timestamp: chrono::Local::now().naive_local(),
            category,
            message: message.clone(),
        });
        if self.error_history.len() > 50 {
            self.error_history.pop_back();
        }
        self.status_message = Some((message, StatusLevel::Error));
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }
}

/// Resolve user input to a symbol: a 1-based row number or a symbol,
/// case-insensitive.
pub fn resolve_symbol(input: &str, stocks: &[Stock]) -> Option<String> {
    let input = input.trim();
    if let Ok(n) = input.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| stocks.get(i))
            .map(|s| s.symbol.clone());
    }
    stocks
        .iter()
        .find(|s| s.symbol.eq_ignore_ascii_case(input))
        .map(|s| s.symbol.clone())
}

/// Parse a share count. `max` / `all` resolve to `limit`.
pub fn parse_quantity(input: &str, limit: u64) -> Option<u64> {
    match input.trim().to_ascii_lowercase().as_str() {
        "max" | "all" => Some(limit),
        other => other.parse::<u64>().ok(),
    }
}

pub fn parse_export_format(input: &str) -> Option<ExportFormat> {
    match input.trim().to_ascii_lowercase().as_str() {
        "j" | "json" => Some(ExportFormat::Json),
        "c" | "csv" => Some(ExportFormat::Csv),
        _ => None,
    }
}
