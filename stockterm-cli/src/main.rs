//! Stockterm CLI: headless simulation, reports and save-file management.
//!
//! Commands:
//! - `simulate` runs price ticks and news without a terminal UI
//! - `summary` prints the market overview and movers
//! - `status` prints the market status line
//! - `leaderboard` ranks players by total value
//! - `analyze` prints technical indicators for one symbol
//! - `buy` / `sell` trade for a player and save the result
//! - `export` writes a player's portfolio as JSON or CSV
//! - `backup` bundles all data files into `backups/`
//! - `sessions list|save|load|delete` manages named sessions

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use stockterm_core::domain::Stock;
use stockterm_core::indicators::Trend;
use stockterm_runner::{write_export, ExportFormat, SimConfig, Simulation, Store};

#[derive(Parser)]
#[command(
    name = "stockterm-cli",
    about = "Stockterm CLI: headless stock market simulation"
)]
struct Cli {
    /// Path to a TOML config file. Defaults apply when it does not exist.
    #[arg(long, global = true, default_value = "stockterm.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Advance the market without a UI.
    Simulate {
        /// Number of price ticks to run.
        #[arg(long, default_value_t = 100)]
        ticks: usize,

        /// Fire the news timer every this many ticks (0 disables news).
        #[arg(long, default_value_t = 3)]
        news_every: usize,

        /// Start from the saved state instead of the seed universe.
        #[arg(long, default_value_t = false)]
        resume: bool,

        /// Write market, players and news back to the data directory.
        #[arg(long, default_value_t = false)]
        save: bool,
    },
    /// Market overview, top gainers, losers and most volatile stocks.
    Summary {
        /// How many stocks to list per ranking.
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Running flag, counts and current player.
    Status,
    /// Players ranked by total value.
    Leaderboard,
    /// Technical indicators for one stock.
    Analyze {
        /// Stock symbol (case-insensitive).
        symbol: String,
    },
    /// Buy shares for a player (created if missing).
    Buy {
        symbol: String,
        quantity: u64,
        #[arg(long)]
        player: String,
    },
    /// Sell shares for a player.
    Sell {
        symbol: String,
        quantity: u64,
        #[arg(long)]
        player: String,
    },
    /// Export a player's portfolio to the exports directory.
    Export {
        #[arg(long)]
        player: String,

        /// json or csv.
        #[arg(long, default_value = "json")]
        format: ExportFormat,

        /// Override the configured exports directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Bundle market, players, news and sessions into a backup file.
    Backup,
    /// Named session management.
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// List saved sessions.
    List,
    /// Save the current state under a name.
    Save { name: String },
    /// Replace the current state with a saved session.
    Load { name: String },
    /// Delete a saved session.
    Delete { name: String },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = SimConfig::load(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    let store = Store::new(&config.data_dir);

    match cli.command {
        Commands::Simulate {
            ticks,
            news_every,
            resume,
            save,
        } => run_simulate(&config, &store, ticks, news_every, resume, save),
        Commands::Summary { limit } => run_summary(&load_simulation(&config, &store), limit),
        Commands::Status => run_status(&load_simulation(&config, &store)),
        Commands::Leaderboard => run_leaderboard(&load_simulation(&config, &store)),
        Commands::Analyze { symbol } => run_analyze(&load_simulation(&config, &store), &symbol),
        Commands::Buy {
            symbol,
            quantity,
            player,
        } => run_trade(&config, &store, &player, &symbol, quantity, true),
        Commands::Sell {
            symbol,
            quantity,
            player,
        } => run_trade(&config, &store, &player, &symbol, quantity, false),
        Commands::Export {
            player,
            format,
            output_dir,
        } => {
            let dir = output_dir.unwrap_or_else(|| config.exports_dir.clone());
            run_export(&load_simulation(&config, &store), &player, format, &dir)
        }
        Commands::Backup => {
            let path = store.create_backup()?;
            println!("Backup written to: {}", path.display());
            Ok(())
        }
        Commands::Sessions { action } => run_sessions(&config, &store, action),
    }
}

/// Seed universe overlaid with whatever the data directory holds.
fn load_simulation(config: &SimConfig, store: &Store) -> Simulation {
    let mut sim = Simulation::new(config);
    sim.restore(store.load_state());
    sim
}

fn run_simulate(
    config: &SimConfig,
    store: &Store,
    ticks: usize,
    news_every: usize,
    resume: bool,
    save: bool,
) -> Result<()> {
    let mut sim = if resume {
        load_simulation(config, store)
    } else {
        Simulation::new(config)
    };
    info!(seed = sim.seed(), ticks, "simulating");

    let mut generated = 0usize;
    for tick in 1..=ticks {
        sim.tick();
        if news_every > 0 && tick % news_every == 0 {
            if let Some(news) = sim.on_news_timer() {
                generated += 1;
                println!("[tick {tick:>4}] {} ({})", news.title, news.impact);
            }
        }
    }

    println!();
    println!("Seed: {}", sim.seed());
    println!("Ticks: {ticks}  News generated: {generated}");
    run_summary(&sim, 5)?;

    if save {
        store.save_state(&sim.state())?;
        println!("State saved to: {}", store.data_dir().display());
    }
    Ok(())
}

fn run_summary(sim: &Simulation, limit: usize) -> Result<()> {
    let market = sim.market();
    let summary = market.summary();

    println!("Market: {} stocks, trend {}", summary.total_stocks, summary.market_trend);
    println!("Total market cap: ${:.2}", summary.total_market_cap);
    println!("Average change: {:+.2}%", summary.avg_change);
    if let Some(sym) = &summary.top_gainer {
        println!("Top gainer: {sym}");
    }
    if let Some(sym) = &summary.top_loser {
        println!("Top loser: {sym}");
    }

    print_ranking("Top gainers", &market.top_gainers(limit));
    print_ranking("Top losers", &market.top_losers(limit));
    print_ranking("Most volatile", &market.most_volatile(limit));

    let news = sim.feed().summary();
    println!();
    println!(
        "News: {} items, {} unread, sentiment {}",
        news.total, news.unread, news.sentiment
    );
    Ok(())
}

fn print_ranking(title: &str, stocks: &[&Stock]) {
    println!();
    println!("{title}");
    println!("{:<8} {:<28} {:>10} {:>9}", "Symbol", "Name", "Price", "Change");
    println!("{}", "-".repeat(58));
    for s in stocks {
        println!(
            "{:<8} {:<28} {:>10.2} {:>+8.2}%",
            s.symbol,
            s.name,
            s.price(),
            s.price_change_percent()
        );
    }
}

fn run_status(sim: &Simulation) -> Result<()> {
    // The CLI never runs the price timer.
    let status = sim.market().status(false);
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

fn run_leaderboard(sim: &Simulation) -> Result<()> {
    let board = sim.market().leaderboard();
    if board.is_empty() {
        println!("No players yet.");
        return Ok(());
    }

    println!(
        "{:>4} {:<20} {:>14} {:>12} {:>9}",
        "Rank", "Player", "Total", "Profit", "Profit%"
    );
    println!("{}", "-".repeat(63));
    for entry in &board {
        println!(
            "{:>4} {:<20} {:>14.2} {:>+12.2} {:>+8.2}%",
            entry.rank, entry.name, entry.total_value, entry.profit, entry.profit_percent
        );
    }
    Ok(())
}

fn run_analyze(sim: &Simulation, symbol: &str) -> Result<()> {
    let symbol = symbol.to_uppercase();
    let Some(analysis) = sim.market().technical_analysis(&symbol) else {
        bail!("unknown symbol '{symbol}'");
    };
    let Some(stock) = sim.market().stock(&symbol) else {
        bail!("unknown symbol '{symbol}'");
    };

    println!("{} ({})", stock.symbol, stock.name);
    println!(
        "Price: ${:.2} ({:+.2}%)",
        stock.price(),
        stock.price_change_percent()
    );
    println!("History: {} points", stock.history().len());
    println!("SMA(20): {}", fmt_opt(analysis.sma20, |v| format!("${v:.2}")));
    println!("RSI(14): {}", fmt_opt(analysis.rsi, |v| format!("{v:.1}")));
    println!("Volatility: {}", fmt_opt(analysis.volatility, |v| format!("{v:.2}%")));
    let trend_note = match analysis.trend {
        Trend::InsufficientData => " (needs more history)",
        _ => "",
    };
    println!("Trend: {}{trend_note}", analysis.trend);
    match analysis.support_resistance {
        Some(levels) => println!(
            "Support: ${:.2}  Resistance: ${:.2}",
            levels.support, levels.resistance
        ),
        None => println!("Support/Resistance: n/a"),
    }

    let related = sim.feed().for_stock(&symbol);
    if !related.is_empty() {
        println!();
        println!("Related news:");
        for news in related.iter().take(5) {
            println!("  [{}] {}", news.impact, news.title);
        }
    }
    Ok(())
}

fn fmt_opt(value: Option<f64>, f: impl Fn(f64) -> String) -> String {
    value.map(f).unwrap_or_else(|| "n/a".to_string())
}

fn run_trade(
    config: &SimConfig,
    store: &Store,
    player: &str,
    symbol: &str,
    quantity: u64,
    buy: bool,
) -> Result<()> {
    let mut sim = load_simulation(config, store);
    let market = sim.market_mut();
    if !market.switch_player(player) {
        if !buy {
            bail!("no player named '{player}'");
        }
        market.add_player(player);
        info!(player, "created player");
    }

    let symbol = symbol.to_uppercase();
    let result = if buy {
        market.buy(&symbol, quantity)
    } else {
        market.sell(&symbol, quantity)
    };
    let tx = match result {
        Ok(tx) => tx,
        Err(rejection) => bail!("trade rejected: {rejection}"),
    };

    println!(
        "{} {} {} @ ${:.2} (total ${:.2})",
        if buy { "Bought" } else { "Sold" },
        tx.quantity,
        tx.symbol,
        tx.price,
        tx.total
    );
    store.save_state(&sim.state())?;
    Ok(())
}

fn run_export(sim: &Simulation, player: &str, format: ExportFormat, dir: &Path) -> Result<()> {
    let Some(p) = sim.market().players().iter().find(|p| p.name == player) else {
        bail!("no player named '{player}'");
    };
    let path = write_export(dir, p, sim.market().stocks(), format)?;
    println!("Portfolio exported to: {}", path.display());
    Ok(())
}

fn run_sessions(config: &SimConfig, store: &Store, action: SessionAction) -> Result<()> {
    match action {
        SessionAction::List => {
            let sessions = store.list_sessions()?;
            if sessions.is_empty() {
                println!("No saved sessions.");
                return Ok(());
            }
            println!("{:<24} {:<17} {:>8}", "Name", "Saved", "Players");
            println!("{}", "-".repeat(51));
            for s in &sessions {
                println!(
                    "{:<24} {:<17} {:>8}",
                    s.name,
                    s.saved_at
                        .with_timezone(&chrono::Local)
                        .format("%Y-%m-%d %H:%M"),
                    s.players
                );
            }
        }
        SessionAction::Save { name } => {
            let sim = load_simulation(config, store);
            store.save_session(&name, &sim.state())?;
            println!("Session '{name}' saved.");
        }
        SessionAction::Load { name } => {
            let state = store.load_session(&name)?;
            let mut sim = Simulation::new(config);
            sim.restore(state);
            store.save_state(&sim.state())?;
            println!("Session '{name}' loaded.");
        }
        SessionAction::Delete { name } => {
            if store.delete_session(&name)? {
                println!("Session '{name}' deleted.");
            } else {
                warn!(session = %name, "no such session");
                println!("No session named '{name}'.");
            }
        }
    }
    Ok(())
}
