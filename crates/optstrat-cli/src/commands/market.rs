use clap::Args;
use serde_json::{json, Value};
use tracing::info;

use optstrat_core::chart::render_price_history;
use optstrat_core::market_data::{MarketDataProvider, OptionsChainProvider};

use crate::input;
use crate::snapshot::SnapshotProvider;

/// Arguments for a stock quote
#[derive(Args)]
pub struct QuoteArgs {
    /// Ticker symbol
    pub ticker: String,

    /// Directory holding <TICKER>.json market snapshots
    #[arg(long, default_value = ".")]
    pub snapshot_dir: String,

    /// Write the price history as SVG to this path
    #[arg(long)]
    pub chart: Option<String>,
}

/// Arguments for an options chain
#[derive(Args)]
pub struct ChainArgs {
    /// Ticker symbol
    pub ticker: String,

    /// Directory holding <TICKER>.json market snapshots
    #[arg(long, default_value = ".")]
    pub snapshot_dir: String,
}

pub fn run_quote(args: QuoteArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let provider = SnapshotProvider::new(&args.snapshot_dir);
    let quote = provider.quote(&args.ticker)?;
    let mut result = serde_json::to_value(&quote)?;

    if let Some(ref path) = args.chart {
        let closes = provider.history(&args.ticker)?;
        let svg = render_price_history(&closes, &format!("{} Price History", quote.ticker))?;
        let written = input::file::write_artifact(path, &svg)?;
        info!(path = %written.display(), "wrote price history chart");
        result["chart"] = json!(written.display().to_string());
    }

    Ok(json!({ "success": true, "result": result }))
}

pub fn run_chain(args: ChainArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let provider = SnapshotProvider::new(&args.snapshot_dir);
    let chain = provider.chain(&args.ticker)?;
    Ok(json!({ "success": true, "result": chain }))
}
