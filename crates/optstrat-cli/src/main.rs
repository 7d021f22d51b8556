mod commands;
mod input;
mod output;
mod snapshot;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde_json::json;
use std::process;
use tracing::Level;

use commands::evaluate::EvaluateArgs;
use commands::market::{ChainArgs, QuoteArgs};
use commands::preset::PresetArgs;
use commands::price::PriceArgs;
use optstrat_core::StrategyError;

/// Profit/loss profiles and risk metrics for option strategies
#[derive(Parser)]
#[command(
    name = "optstrat",
    version,
    about = "Profit/loss profiles and risk metrics for option strategies",
    long_about = "Evaluates multi-leg stock and option strategies at a target date: \
                  P/L across a price domain, probability of profit under a lognormal \
                  terminal price, expected profit and loss, and profitable ranges."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log debug events to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a strategy request (P/L and risk metrics)
    Evaluate(EvaluateArgs),
    /// Black-Scholes price, greeks and ITM probability of one option
    Price(PriceArgs),
    /// List preset strategies or build one around the money
    Preset(PresetArgs),
    /// Stock quote and historical volatility from a market snapshot
    Quote(QuoteArgs),
    /// Options chain from a market snapshot
    Chain(ChainArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Failure document printed on stdout so callers can tell a failed
/// evaluation apart from a successful one with empty metrics.
fn error_document(e: &(dyn std::error::Error + 'static)) -> serde_json::Value {
    let kind = match e.downcast_ref::<StrategyError>() {
        Some(StrategyError::InvalidParameter { .. }) => "invalid_parameter",
        Some(StrategyError::UnsupportedLegType { .. }) => "unsupported_leg_type",
        Some(StrategyError::UpstreamDataUnavailable { .. }) => "upstream_data_unavailable",
        Some(StrategyError::Chart(_)) => "chart",
        Some(StrategyError::SerializationError(_)) => "serialization",
        None => "error",
    };
    let field = e
        .downcast_ref::<StrategyError>()
        .and_then(StrategyError::field);
    json!({
        "success": false,
        "error": e.to_string(),
        "kind": kind,
        "field": field,
    })
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Evaluate(args) => commands::evaluate::run_evaluate(args),
        Commands::Price(args) => commands::price::run_price(args),
        Commands::Preset(args) => commands::preset::run_preset(args),
        Commands::Quote(args) => commands::market::run_quote(args),
        Commands::Chain(args) => commands::market::run_chain(args),
        Commands::Version => {
            println!("optstrat {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            output::json::print_json(&error_document(e.as_ref()));
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_document_for_invalid_parameter() {
        let err: Box<dyn std::error::Error> =
            Box::new(StrategyError::invalid("stock_price", "must be positive"));
        let doc = error_document(err.as_ref());
        assert_eq!(doc["success"], json!(false));
        assert_eq!(doc["kind"], json!("invalid_parameter"));
        assert_eq!(doc["field"], json!("stock_price"));
    }

    #[test]
    fn test_error_document_for_plain_error() {
        let err: Box<dyn std::error::Error> = "--input <file.json> or stdin required".into();
        let doc = error_document(err.as_ref());
        assert_eq!(doc["kind"], json!("error"));
        assert_eq!(doc["field"], serde_json::Value::Null);
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["optstrat", "--output", "table", "preset", "--list"]).unwrap();
        assert!(matches!(cli.output, OutputFormat::Table));
        assert!(matches!(cli.command, Commands::Preset(_)));
    }
}
