//! Engine thread: the single consumer that owns the [`Simulation`].
//!
//! Timer firings, user commands and external-news results all arrive on one
//! mpsc queue and are applied in order. After every state change the engine
//! publishes a [`Snapshot`] for the front-end to render.
//!
//! External fetches run on a short-lived thread so a slow endpoint never
//! stalls price ticks; the result comes back as [`Task::MergeExternal`].

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use stockterm_core::domain::{ExternalNews, Transaction};
use stockterm_core::ledger::TradeRejection;
use stockterm_core::market::Market;
use stockterm_core::news::NewsFeed;

use crate::config::SimConfig;
use crate::export::{write_export, ExportFormat};
use crate::news_source::{NewsSource, NewsSourceError};
use crate::persistence::{SessionInfo, Store};
use crate::scheduler::{Intervals, Scheduler, Timer};
use crate::simulation::Simulation;

/// Requests from the front-end.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Buy { symbol: String, quantity: u64 },
    Sell { symbol: String, quantity: u64 },
    AddPlayer(String),
    SwitchPlayer(String),
    SetPriceUpdates(bool),
    GenerateNews,
    MarkAllRead,
    /// Force an external refresh, bypassing the cache.
    RefreshNews,
    Save,
    SaveSession(String),
    LoadSession(String),
    DeleteSession(String),
    ListSessions,
    Export(ExportFormat),
    Backup,
}

#[derive(Debug)]
pub enum Task {
    Timer(Timer),
    Command(Command),
    MergeExternal(Result<Vec<ExternalNews>, NewsSourceError>),
    Shutdown,
}

/// Read-only copy of the state for rendering.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub market: Market,
    pub feed: NewsFeed,
    pub price_updates: bool,
    pub fetching_news: bool,
    pub seed: u64,
}

/// What an [`EngineEvent::Error`] is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown or invalid player name.
    Player,
    /// External news could not be fetched.
    News,
    /// Saving, loading, exporting or backing up failed.
    Storage,
}

#[derive(Debug)]
pub enum EngineEvent {
    Snapshot(Box<Snapshot>),
    Traded(Transaction),
    Rejected(TradeRejection),
    Info(String),
    Error { kind: ErrorKind, message: String },
    Sessions(Vec<SessionInfo>),
    Exported(PathBuf),
    Stopped,
}

/// Owner-side handle: queue sender, event receiver, timer thread.
pub struct EngineHandle {
    tasks: Sender<Task>,
    events: Receiver<EngineEvent>,
    price_updates: Arc<AtomicBool>,
    scheduler: Scheduler,
    thread: Option<JoinHandle<()>>,
}

impl EngineHandle {
    /// Enqueue a command. `false` once the engine has stopped.
    pub fn send(&self, command: Command) -> bool {
        self.tasks.send(Task::Command(command)).is_ok()
    }

    pub fn events(&self) -> &Receiver<EngineEvent> {
        &self.events
    }

    pub fn price_updates(&self) -> bool {
        self.price_updates.load(Ordering::SeqCst)
    }

    /// Takes effect immediately: ticks already queued are dropped.
    pub fn set_price_updates(&self, enabled: bool) {
        self.price_updates.store(enabled, Ordering::SeqCst);
        self.send(Command::SetPriceUpdates(enabled));
    }

    pub fn toggle_price_updates(&self) -> bool {
        let enabled = !self.price_updates();
        self.set_price_updates(enabled);
        enabled
    }

    /// Stop timers, let the engine save, and wait for it to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.scheduler.stop();
        if let Some(handle) = self.thread.take() {
            let _ = self.tasks.send(Task::Shutdown);
            if handle.join().is_err() {
                warn!("engine thread panicked");
            }
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawn the engine and scheduler threads. Price updates start enabled.
pub fn spawn_engine(
    config: &SimConfig,
    sim: Simulation,
    store: Store,
    source: Option<Arc<dyn NewsSource>>,
) -> std::io::Result<EngineHandle> {
    let (task_tx, task_rx) = mpsc::channel();
    let (event_tx, event_rx) = mpsc::channel();
    let price_updates = Arc::new(AtomicBool::new(true));

    let engine = Engine {
        sim,
        store,
        exports_dir: config.exports_dir.clone(),
        source,
        real_news_limit: config.real_news_limit,
        price_updates: Arc::clone(&price_updates),
        fetching: false,
        tasks: task_tx.clone(),
        events: event_tx,
    };
    let thread = thread::Builder::new()
        .name("stockterm-engine".into())
        .spawn(move || engine.run(task_rx))?;
    let scheduler =
        match Scheduler::spawn(Intervals::from_config(config), task_tx.clone(), Task::Timer) {
            Ok(s) => s,
            Err(e) => {
                let _ = task_tx.send(Task::Shutdown);
                let _ = thread.join();
                return Err(e);
            }
        };

    Ok(EngineHandle {
        tasks: task_tx,
        events: event_rx,
        price_updates,
        scheduler,
        thread: Some(thread),
    })
}

struct Engine {
    sim: Simulation,
    store: Store,
    exports_dir: PathBuf,
    source: Option<Arc<dyn NewsSource>>,
    real_news_limit: usize,
    price_updates: Arc<AtomicBool>,
    fetching: bool,
    tasks: Sender<Task>,
    events: Sender<EngineEvent>,
}

impl Engine {
    fn run(mut self, rx: Receiver<Task>) {
        info!(seed = self.sim.seed(), "engine started");
        if self.source.is_some() {
            self.refresh_news(false);
        }
        self.publish();

        while let Ok(task) = rx.recv() {
            match task {
                Task::Shutdown => {
                    self.save();
                    break;
                }
                Task::Timer(timer) => self.on_timer(timer),
                Task::Command(cmd) => self.on_command(cmd),
                Task::MergeExternal(result) => self.on_external(result),
            }
        }
        info!("engine stopped");
        self.emit(EngineEvent::Stopped);
    }

    fn emit(&self, event: EngineEvent) {
        // A closed receiver means the front-end is gone; keep going until Shutdown.
        let _ = self.events.send(event);
    }

    fn publish(&self) {
        self.emit(EngineEvent::Snapshot(Box::new(Snapshot {
            market: self.sim.market().clone(),
            feed: self.sim.feed().clone(),
            price_updates: self.price_updates.load(Ordering::SeqCst),
            fetching_news: self.fetching,
            seed: self.sim.seed(),
        })));
    }

    fn on_timer(&mut self, timer: Timer) {
        match timer {
            Timer::PriceTick => {
                if !self.price_updates.load(Ordering::SeqCst) {
                    return;
                }
                self.sim.tick();
            }
            Timer::News => {
                if self.sim.on_news_timer().is_none() {
                    return;
                }
            }
            Timer::ExternalNews => self.refresh_news(false),
        }
        self.publish();
    }

    fn on_command(&mut self, cmd: Command) {
        debug!(?cmd, "command");
        match cmd {
            Command::Buy { symbol, quantity } => {
                let result = self.sim.market_mut().buy(&symbol, quantity);
                self.on_trade(result);
            }
            Command::Sell { symbol, quantity } => {
                let result = self.sim.market_mut().sell(&symbol, quantity);
                self.on_trade(result);
            }
            Command::AddPlayer(name) => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    self.error(ErrorKind::Player, "player name cannot be empty".into());
                    return;
                }
                let cash = self.sim.market_mut().add_player(name.clone()).cash;
                info!(player = %name, cash, "player added");
                self.emit(EngineEvent::Info(format!(
                    "Player '{name}' created with ${cash:.2}"
                )));
            }
            Command::SwitchPlayer(name) => {
                if self.sim.market_mut().switch_player(&name) {
                    self.emit(EngineEvent::Info(format!("Switched to player '{name}'")));
                } else {
                    self.error(ErrorKind::Player, format!("no player named '{name}'"));
                }
            }
            Command::SetPriceUpdates(enabled) => {
                self.price_updates.store(enabled, Ordering::SeqCst);
                info!(enabled, "price updates");
                let msg = if enabled { "Market updates started" } else { "Market updates stopped" };
                self.emit(EngineEvent::Info(msg.into()));
            }
            Command::GenerateNews => {
                let news = self.sim.generate_news();
                self.emit(EngineEvent::Info(format!("News: {}", news.title)));
            }
            Command::MarkAllRead => self.sim.feed_mut().mark_all_read(),
            Command::RefreshNews => self.refresh_news(true),
            Command::Save => {
                if self.save() {
                    self.emit(EngineEvent::Info("Game saved".into()));
                }
            }
            Command::SaveSession(name) => {
                match self.store.save_session(&name, &self.sim.state()) {
                    Ok(()) => self.emit(EngineEvent::Info(format!("Session '{name}' saved"))),
                    Err(e) => self.fail("save session", e),
                }
            }
            Command::LoadSession(name) => match self.store.load_session(&name) {
                Ok(state) => {
                    self.sim.restore(state);
                    self.emit(EngineEvent::Info(format!("Session '{name}' loaded")));
                }
                Err(e) => self.fail("load session", e),
            },
            Command::DeleteSession(name) => match self.store.delete_session(&name) {
                Ok(true) => self.emit(EngineEvent::Info(format!("Session '{name}' deleted"))),
                Ok(false) => self.error(ErrorKind::Storage, format!("no session named '{name}'")),
                Err(e) => self.fail("delete session", e),
            },
            Command::ListSessions => match self.store.list_sessions() {
                Ok(sessions) => self.emit(EngineEvent::Sessions(sessions)),
                Err(e) => self.fail("list sessions", e),
            },
            Command::Export(format) => self.export(format),
            Command::Backup => match self.store.create_backup() {
                Ok(path) => self.emit(EngineEvent::Info(format!("Backup written to {}", path.display()))),
                Err(e) => self.fail("backup", e),
            },
        }
        self.publish();
    }

    fn on_trade(&self, result: Result<Transaction, TradeRejection>) {
        match result {
            Ok(tx) => {
                info!(side = tx.kind.label(), symbol = %tx.symbol, quantity = tx.quantity, total = tx.total, "trade");
                self.emit(EngineEvent::Traded(tx));
            }
            Err(rejection) => {
                debug!(%rejection, "trade rejected");
                self.emit(EngineEvent::Rejected(rejection));
            }
        }
    }

    fn fail(&self, what: &str, err: impl std::fmt::Display) {
        warn!(error = %err, "{what} failed");
        self.error(ErrorKind::Storage, format!("{what} failed: {err}"));
    }

    fn error(&self, kind: ErrorKind, message: String) {
        self.emit(EngineEvent::Error { kind, message });
    }

    fn save(&self) -> bool {
        match self.store.save_state(&self.sim.state()) {
            Ok(()) => {
                info!(dir = %self.store.data_dir().display(), "state saved");
                true
            }
            Err(e) => {
                self.fail("save", e);
                false
            }
        }
    }

    fn export(&self, format: ExportFormat) {
        let Some(player) = self.sim.market().current_player() else {
            self.emit(EngineEvent::Rejected(TradeRejection::NoActivePlayer));
            return;
        };
        match write_export(&self.exports_dir, player, self.sim.market().stocks(), format) {
            Ok(path) => {
                info!(path = %path.display(), "portfolio exported");
                self.emit(EngineEvent::Exported(path));
            }
            Err(e) => self.fail("export", format!("{e:#}")),
        }
    }

    /// Start an external fetch, or fall back to synthetic news when there is
    /// no source or the thread cannot be started.
    fn refresh_news(&mut self, force: bool) {
        let Some(source) = self.source.clone() else {
            let news = self.sim.generate_news();
            self.emit(EngineEvent::Info(format!(
                "No external news configured; generated: {}",
                news.title
            )));
            return;
        };
        if self.fetching {
            debug!("external fetch already in flight");
            return;
        }
        let tasks = self.tasks.clone();
        let limit = self.real_news_limit;
        let spawned = thread::Builder::new()
            .name("stockterm-fetch".into())
            .spawn(move || {
                let result = if force {
                    source.refresh(limit)
                } else {
                    source.fetch(limit)
                };
                let _ = tasks.send(Task::MergeExternal(result));
            });
        match spawned {
            Ok(_) => {
                self.fetching = true;
                debug!(force, "external fetch started");
            }
            Err(e) => {
                warn!(error = %e, "could not start fetch thread; generating news instead");
                self.sim.generate_news();
            }
        }
    }

    fn on_external(&mut self, result: Result<Vec<ExternalNews>, NewsSourceError>) {
        self.fetching = false;
        match result {
            Ok(items) if !items.is_empty() => match self.sim.ingest_external(items) {
                0 => self.emit(EngineEvent::Info("No new real news since last refresh".into())),
                merged => self.emit(EngineEvent::Info(format!("Fetched {merged} real news items"))),
            },
            Ok(_) => {
                self.sim.generate_news();
                self.emit(EngineEvent::Info("No real news returned; generated market news".into()));
            }
            Err(e) => {
                warn!(error = %e, "external news unavailable; falling back to synthetic");
                self.sim.generate_news();
                self.error(
                    ErrorKind::News,
                    format!("Real news unavailable ({e}); generated market news"),
                );
            }
        }
        self.publish();
    }
}
