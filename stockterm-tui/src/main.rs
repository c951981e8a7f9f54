//! Stockterm TUI: interactive stock market trading terminal.
//!
//! Panels:
//! 1. Market: live prices, market summary
//! 2. Portfolio: valuation, diversification, risk, recent trades
//! 3. News: generated and real news with sentiment
//! 4. Analysis: technical indicators for the selected stock
//! 5. Chart: price history with SMA overlay
//! 6. Leaderboard: players ranked by total value
//! 7. Help: keyboard shortcuts
//!
//! Usage: `stockterm [config.toml]`

mod app;
mod input;
mod theme;
mod ui;

use std::fs::OpenOptions;
use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use stockterm_core::domain::TradeSide;
use stockterm_runner::{
    build_news_source, spawn_engine, EngineEvent, EngineHandle, SimConfig, Simulation, Store,
};

use crate::app::{AppState, ErrorCategory, Overlay, Request};

const LOG_FILE: &str = "stockterm.log";

fn main() -> Result<()> {
    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);
    let config = SimConfig::load(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;

    init_logging(&config.data_dir)?;
    info!(config = %config_path.display(), "starting stockterm");

    // Restore saved state over the seed universe.
    let store = Store::new(&config.data_dir);
    let mut sim = Simulation::new(&config);
    sim.restore(store.load_state());

    let source = build_news_source(&config, sim.universe_symbols(), sim.seed())
        .unwrap_or_else(|e| {
            warn!(error = %e, "external news disabled");
            None
        });

    let handle = spawn_engine(&config, sim, store, source).context("starting engine")?;
    let mut app = AppState::new();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app, &handle);

    // Engine saves market, players and news on shutdown.
    handle.shutdown();
    info!("stockterm exited");

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// `./stockterm.toml` if present, else the per-user config directory.
fn default_config_path() -> PathBuf {
    let local = PathBuf::from("stockterm.toml");
    if local.exists() {
        return local;
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stockterm")
        .join("config.toml")
}

/// Log to `<data_dir>/stockterm.log`; the terminal belongs to the UI.
fn init_logging(data_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;
    let path = data_dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    handle: &EngineHandle,
) -> Result<()> {
    loop {
        // 1. Render
        terminal.draw(|f| ui::draw(f, app))?;

        // 2. Drain engine events (non-blocking)
        while let Ok(ev) = handle.events().try_recv() {
            handle_engine_event(app, ev);
        }

        // 3. Poll for input events (50ms timeout for ~20 FPS tick)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        // 4. Forward queued requests
        for request in std::mem::take(&mut app.requests) {
            match request {
                Request::Engine(cmd) => {
                    if !handle.send(cmd) {
                        app.push_error(ErrorCategory::Other, "engine is not running".into());
                    }
                }
                Request::TogglePriceUpdates => {
                    // Status text arrives from the engine.
                    handle.toggle_price_updates();
                }
            }
        }

        // 5. Check quit
        if !app.running {
            break;
        }
    }
    Ok(())
}

fn handle_engine_event(app: &mut AppState, ev: EngineEvent) {
    match ev {
        EngineEvent::Snapshot(snapshot) => app.apply_snapshot(*snapshot),
        EngineEvent::Traded(tx) => {
            let verb = match tx.kind {
                TradeSide::Buy => "Bought",
                TradeSide::Sell => "Sold",
            };
            app.set_status(format!(
                "{verb} {} {} @ ${:.2} (total ${:.2})",
                tx.quantity, tx.symbol, tx.price, tx.total
            ));
        }
        EngineEvent::Rejected(rejection) => {
            app.push_error(ErrorCategory::Trade, rejection.to_string());
        }
        EngineEvent::Info(msg) => app.set_status(msg),
        EngineEvent::Error { kind, message } => app.push_error(kind.into(), message),
        EngineEvent::Sessions(sessions) => app.overlay = Overlay::Sessions(sessions),
        EngineEvent::Exported(path) => {
            app.set_status(format!("Portfolio exported to {}", path.display()));
        }
        EngineEvent::Stopped => app.running = false,
    }
}
