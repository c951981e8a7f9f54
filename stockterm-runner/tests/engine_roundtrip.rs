//! Integration tests for the engine thread: commands, timers, external news
//! merging, and persistence on shutdown.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use stockterm_core::domain::{ExternalNews, Impact, Qualitative};
use stockterm_core::ledger::TradeRejection;
use stockterm_runner::{
    spawn_engine, Command, EngineEvent, ErrorKind, ExportFormat, NewsSource, NewsSourceError,
    SimConfig, Simulation, Snapshot, Store,
};

const WAIT: Duration = Duration::from_secs(5);

fn config(dir: &std::path::Path, price_ms: u64) -> SimConfig {
    SimConfig {
        seed: Some(2024),
        price_interval_ms: price_ms,
        news_interval_ms: 3_600_000,
        real_news_interval_secs: 3_600,
        data_dir: dir.join("data"),
        exports_dir: dir.join("exports"),
        ..SimConfig::default()
    }
}

/// Receive events until `pred` matches one, returning it.
fn wait_for<T>(
    events: &Receiver<EngineEvent>,
    mut pred: impl FnMut(EngineEvent) -> Option<T>,
) -> T {
    let deadline = Instant::now() + WAIT;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let event = events
            .recv_timeout(remaining)
            .expect("timed out waiting for engine event");
        if let Some(found) = pred(event) {
            return found;
        }
    }
}

fn next_snapshot(events: &Receiver<EngineEvent>) -> Snapshot {
    wait_for(events, |e| match e {
        EngineEvent::Snapshot(s) => Some(*s),
        _ => None,
    })
}

#[test]
fn trades_flow_through_engine_and_persist_on_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 3_600_000);
    let store = Store::new(&config.data_dir);
    let handle = spawn_engine(&config, Simulation::new(&config), store.clone(), None).unwrap();

    handle.send(Command::Buy {
        symbol: "AAPL".into(),
        quantity: 1,
    });
    let rejection = wait_for(handle.events(), |e| match e {
        EngineEvent::Rejected(r) => Some(r),
        _ => None,
    });
    assert_eq!(rejection, TradeRejection::NoActivePlayer);

    handle.send(Command::AddPlayer("ada".into()));
    handle.send(Command::Buy {
        symbol: "AAPL".into(),
        quantity: 10,
    });
    let tx = wait_for(handle.events(), |e| match e {
        EngineEvent::Traded(tx) => Some(tx),
        _ => None,
    });
    assert_eq!(tx.symbol, "AAPL");
    assert_eq!(tx.quantity, 10);

    handle.send(Command::Sell {
        symbol: "AAPL".into(),
        quantity: 11,
    });
    let rejection = wait_for(handle.events(), |e| match e {
        EngineEvent::Rejected(r) => Some(r),
        _ => None,
    });
    assert!(matches!(rejection, TradeRejection::InsufficientHoldings { .. }));

    handle.shutdown();

    let saved = store.load_state();
    assert_eq!(saved.players.len(), 1);
    assert_eq!(saved.players[0].holdings.get("AAPL"), Some(&10));
    assert_eq!(saved.stocks.len(), 15);
}

#[test]
fn stopping_price_updates_freezes_prices() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 5);
    let handle = spawn_engine(
        &config,
        Simulation::new(&config),
        Store::new(&config.data_dir),
        None,
    )
    .unwrap();

    // Let some ticks happen.
    std::thread::sleep(Duration::from_millis(60));
    handle.set_price_updates(false);
    handle.set_price_updates(false);
    assert!(!handle.price_updates());
    wait_for(handle.events(), |e| match e {
        EngineEvent::Info(msg) if msg.contains("stopped") => Some(()),
        _ => None,
    });

    handle.send(Command::MarkAllRead);
    let frozen = next_snapshot(handle.events());
    assert!(!frozen.price_updates);
    std::thread::sleep(Duration::from_millis(60));
    handle.send(Command::MarkAllRead);
    let later = next_snapshot(handle.events());
    assert_eq!(
        frozen.market.stock_snapshots(),
        later.market.stock_snapshots()
    );

    assert!(handle.toggle_price_updates());
    handle.shutdown();
}

struct StubSource {
    result: Result<Vec<ExternalNews>, NewsSourceError>,
    calls: AtomicUsize,
}

impl NewsSource for StubSource {
    fn name(&self) -> &str {
        "stub"
    }

    fn fetch(&self, limit: usize) -> Result<Vec<ExternalNews>, NewsSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result
            .clone()
            .map(|items| items.into_iter().take(limit).collect())
    }
}

#[test]
fn external_news_is_merged_as_real_items() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 3_600_000);
    let source = Arc::new(StubSource {
        result: Ok(vec![ExternalNews {
            title: "Chipmakers surge".into(),
            content: "strong quarter".into(),
            impact: Impact::Qualitative(Qualitative::Positive),
            affected_stocks: vec!["NVDA".into()],
            timestamp: Utc::now(),
            source: "Wire".into(),
            url: "https://example.invalid/nvda".into(),
        }]),
        calls: AtomicUsize::new(0),
    });
    let handle = spawn_engine(
        &config,
        Simulation::new(&config),
        Store::new(&config.data_dir),
        Some(source.clone() as Arc<dyn NewsSource>),
    )
    .unwrap();

    let snapshot = wait_for(handle.events(), |e| match e {
        EngineEvent::Snapshot(s) if s.feed.items().any(|n| n.is_real) => Some(*s),
        _ => None,
    });
    let real = snapshot.feed.items().find(|n| n.is_real).unwrap();
    assert_eq!(real.title, "Chipmakers surge");
    assert!(real.is_read, "impact applied on merge");
    assert!(source.calls.load(Ordering::SeqCst) >= 1);
    handle.shutdown();
}

#[test]
fn failing_source_falls_back_to_synthetic_news() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 3_600_000);
    let source = Arc::new(StubSource {
        result: Err(NewsSourceError::NetworkUnreachable("offline".into())),
        calls: AtomicUsize::new(0),
    });
    let handle = spawn_engine(
        &config,
        Simulation::new(&config),
        Store::new(&config.data_dir),
        Some(source as Arc<dyn NewsSource>),
    )
    .unwrap();

    let message = wait_for(handle.events(), |e| match e {
        EngineEvent::Error { kind: ErrorKind::News, message } => Some(message),
        _ => None,
    });
    assert!(message.contains("offline"));
    let snapshot = wait_for(handle.events(), |e| match e {
        EngineEvent::Snapshot(s) if !s.feed.is_empty() => Some(*s),
        _ => None,
    });
    assert!(snapshot.feed.items().all(|n| !n.is_real));
    handle.shutdown();
}

#[test]
fn errors_carry_their_kind() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 3_600_000);
    let handle = spawn_engine(
        &config,
        Simulation::new(&config),
        Store::new(&config.data_dir),
        None,
    )
    .unwrap();

    handle.send(Command::SwitchPlayer("nobody".into()));
    let kind = wait_for(handle.events(), |e| match e {
        EngineEvent::Error { kind, .. } => Some(kind),
        _ => None,
    });
    assert_eq!(kind, ErrorKind::Player);

    handle.send(Command::DeleteSession("missing".into()));
    let kind = wait_for(handle.events(), |e| match e {
        EngineEvent::Error { kind, .. } => Some(kind),
        _ => None,
    });
    assert_eq!(kind, ErrorKind::Storage);
    handle.shutdown();
}

#[test]
fn sessions_export_and_backup_commands() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 3_600_000);
    let store = Store::new(&config.data_dir);
    let handle = spawn_engine(&config, Simulation::new(&config), store.clone(), None).unwrap();

    handle.send(Command::AddPlayer("grace".into()));
    handle.send(Command::Buy {
        symbol: "MSFT".into(),
        quantity: 3,
    });
    handle.send(Command::SaveSession("checkpoint".into()));
    handle.send(Command::ListSessions);
    let sessions = wait_for(handle.events(), |e| match e {
        EngineEvent::Sessions(s) => Some(s),
        _ => None,
    });
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].name, "checkpoint");

    handle.send(Command::Export(ExportFormat::Json));
    let path = wait_for(handle.events(), |e| match e {
        EngineEvent::Exported(p) => Some(p),
        _ => None,
    });
    assert!(path.starts_with(&config.exports_dir));
    let body: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(body["playerName"], "grace");

    handle.send(Command::Save);
    handle.send(Command::Backup);
    wait_for(handle.events(), |e| match e {
        EngineEvent::Info(msg) if msg.starts_with("Backup written") => Some(()),
        _ => None,
    });
    let backups = std::fs::read_dir(config.data_dir.join("backups")).unwrap().count();
    assert_eq!(backups, 1);

    handle.send(Command::DeleteSession("checkpoint".into()));
    handle.shutdown();
    assert!(store.list_sessions().unwrap().is_empty());
}
