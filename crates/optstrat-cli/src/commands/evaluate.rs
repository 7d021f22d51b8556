use clap::Args;
use serde_json::{json, Value};
use tracing::info;

use optstrat_core::chart::render_pl_chart;
use optstrat_core::request::{analyze_request, parse_request};
use optstrat_core::evaluate_curve;

use crate::input;

/// Arguments for strategy evaluation
#[derive(Args)]
pub struct EvaluateArgs {
    /// Path to JSON request file
    #[arg(long)]
    pub input: Option<String>,

    /// Write the P/L diagram as SVG to this path
    #[arg(long)]
    pub chart: Option<String>,

    /// Include the sampled P/L curve in the output
    #[arg(long)]
    pub curve: bool,

    /// Number of curve samples when --curve is given
    #[arg(long, default_value_t = 101)]
    pub samples: usize,
}

pub fn run_evaluate(args: EvaluateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = input::read_request(args.input.as_deref(), "strategy evaluation")?;
    let report = analyze_request(&request)?;
    let mut value = serde_json::to_value(&report)?;

    if args.chart.is_none() && !args.curve {
        return Ok(value);
    }

    let parsed = parse_request(&request)?;
    let curve = evaluate_curve(&parsed.market, &parsed.legs, &parsed.config)?;

    if let Some(ref path) = args.chart {
        let svg = render_pl_chart(
            curve.grid.prices(),
            &curve.values,
            &report.result.title,
            Some(parsed.market.stock_price()),
        )?;
        let written = input::file::write_artifact(path, &svg)?;
        info!(path = %written.display(), "wrote P/L chart");
        value["chart"] = json!(written.display().to_string());
    }

    if args.curve {
        value["curve"] = Value::Array(sample_points(curve.grid.prices(), &curve.values, args.samples));
    }

    Ok(value)
}

/// Evenly spaced `{price, pl}` rows from the full curve, always keeping both ends.
fn sample_points(prices: &[f64], values: &[f64], samples: usize) -> Vec<Value> {
    let n = prices.len().min(values.len());
    if n == 0 {
        return Vec::new();
    }
    let samples = samples.clamp(2, n);
    let stride = (n - 1) as f64 / (samples - 1) as f64;
    (0..samples)
        .map(|i| ((i as f64 * stride).round() as usize).min(n - 1))
        .map(|i| json!({"price": prices[i], "pl": values[i]}))
        .collect()
}
