//! Portfolio export: JSON and CSV documents for one player.
//!
//! Both formats carry the same content: valuation, diversification
//! breakdown and up to 50 most recent transactions (most recent first).
//! Files land in the exports directory as
//! `portfolio_<name>_<YYYY-MM-DD>.<json|csv>`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use stockterm_core::domain::{Player, Stock, Transaction};
use stockterm_core::ledger::HoldingBreakdown;

/// Transactions included in an export.
pub const EXPORT_TRANSACTIONS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => bail!("unknown export format '{other}' (expected json or csv)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioExport {
    pub player_name: String,
    pub export_date: DateTime<Utc>,
    pub cash: f64,
    pub portfolio_value: f64,
    pub total_value: f64,
    pub profit: f64,
    pub profit_percent: f64,
    pub holdings: Vec<HoldingBreakdown>,
    pub transaction_history: Vec<Transaction>,
}

impl PortfolioExport {
    pub fn build(player: &Player, stocks: &[Stock]) -> Self {
        let valuation = player.valuation(stocks);
        Self {
            player_name: player.name.clone(),
            export_date: Utc::now(),
            cash: valuation.cash,
            portfolio_value: valuation.portfolio_value,
            total_value: valuation.total_value,
            profit: valuation.profit,
            profit_percent: valuation.profit_percent,
            holdings: player.diversification(stocks),
            transaction_history: player
                .recent_transactions(EXPORT_TRANSACTIONS)
                .into_iter()
                .cloned()
                .collect(),
        }
    }
}

pub fn export_json(export: &PortfolioExport) -> Result<String> {
    serde_json::to_string_pretty(export).context("failed to serialize portfolio export to JSON")
}

/// Summary row, then a blank line and a transaction section.
///
/// The holdings cell lists `SYM:qty@$value` entries joined by `"; "`.
pub fn export_csv(export: &PortfolioExport) -> Result<String> {
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(vec![]);

    wtr.write_record([
        "Player",
        "Export Date",
        "Cash",
        "Portfolio Value",
        "Total Value",
        "Profit",
        "Profit %",
        "Holdings",
    ])?;
    let holdings = export
        .holdings
        .iter()
        .map(|h| format!("{}:{}@${:.2}", h.symbol, h.quantity, h.value))
        .collect::<Vec<_>>()
        .join("; ");
    wtr.write_record([
        export.player_name.clone(),
        export.export_date.to_rfc3339(),
        format!("{:.2}", export.cash),
        format!("{:.2}", export.portfolio_value),
        format!("{:.2}", export.total_value),
        format!("{:.2}", export.profit),
        format!("{:.2}", export.profit_percent),
        holdings,
    ])?;

    wtr.write_record([""])?;
    wtr.write_record(["Transaction History"])?;
    wtr.write_record(["Type", "Symbol", "Quantity", "Price", "Total", "Timestamp"])?;
    for t in &export.transaction_history {
        wtr.write_record([
            t.kind.label().to_uppercase(),
            t.symbol.clone(),
            t.quantity.to_string(),
            format!("{:.2}", t.price),
            format!("{:.2}", t.total),
            t.timestamp.to_rfc3339(),
        ])?;
    }

    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

pub fn export_filename(player_name: &str, format: ExportFormat) -> String {
    let safe: String = player_name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!(
        "portfolio_{safe}_{}.{}",
        Local::now().format("%Y-%m-%d"),
        format.extension()
    )
}

/// Render and write the export for `player`, returning the file path.
pub fn write_export(
    dir: &Path,
    player: &Player,
    stocks: &[Stock],
    format: ExportFormat,
) -> Result<PathBuf> {
    let export = PortfolioExport::build(player, stocks);
    let body = match format {
        ExportFormat::Json => export_json(&export)?,
        ExportFormat::Csv => export_csv(&export)?,
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create exports dir {}", dir.display()))?;
    let path = dir.join(export_filename(&player.name, format));
    std::fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockterm_core::market::Market;

    fn traded_market() -> Market {
        let mut market = Market::default();
        market.add_player("ada");
        market.buy("AAPL", 10).unwrap();
        market.buy("MSFT", 2).unwrap();
        market.sell("AAPL", 4).unwrap();
        market
    }

    #[test]
    fn build_reflects_valuation() {
        let market = traded_market();
        let player = market.current_player().unwrap();
        let export = PortfolioExport::build(player, market.stocks());
        let v = player.valuation(market.stocks());
        assert_eq!(export.total_value, v.total_value);
        assert_eq!(export.holdings.len(), 2);
        assert_eq!(export.transaction_history.len(), 3);
        assert_eq!(export.transaction_history[0].symbol, "AAPL");
        assert_eq!(export.transaction_history[0].quantity, 4);
    }

    #[test]
    fn json_uses_camel_case_keys() {
        let market = traded_market();
        let export = PortfolioExport::build(market.current_player().unwrap(), market.stocks());
        let json = export_json(&export).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["playerName"], "ada");
        assert!(value["profitPercent"].is_number());
        assert_eq!(value["transactionHistory"][0]["type"], "sell");
    }

    #[test]
    fn csv_has_summary_and_transaction_sections() {
        let market = traded_market();
        let export = PortfolioExport::build(market.current_player().unwrap(), market.stocks());
        let csv = export_csv(&export).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert!(lines[0].starts_with("Player,Export Date,Cash"));
        assert!(lines[1].starts_with("ada,"));
        assert!(lines[1].contains("AAPL:6@$"));
        assert!(lines.contains(&"Transaction History"));
        assert!(lines.iter().any(|l| l.starts_with("SELL,AAPL,4,")));
    }

    #[test]
    fn write_export_names_file_by_player_and_date() {
        let dir = tempfile::tempdir().unwrap();
        let market = traded_market();
        let player = market.current_player().unwrap();
        let path = write_export(dir.path(), player, market.stocks(), ExportFormat::Csv).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("portfolio_ada_"));
        assert!(name.ends_with(".csv"));
        assert!(path.exists());
    }

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn filenames_never_escape_the_exports_dir(name in ".{0,40}") {
                let file = export_filename(&name, ExportFormat::Json);
                prop_assert!(file.starts_with("portfolio_"));
                prop_assert!(file.ends_with(".json"));
                prop_assert!(!file.contains('/'));
                prop_assert!(!file.contains('\\'));
                prop_assert!(!file.contains(".."));
            }
        }
    }
}
