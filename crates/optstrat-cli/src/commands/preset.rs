use clap::Args;
use serde_json::{json, Value};

use optstrat_core::presets::{PresetStrategy, DEFAULT_WING_WIDTH};
use optstrat_core::request::{parse_request, ReportMetrics};
use optstrat_core::evaluate;

use crate::input;

/// Arguments for preset strategies
#[derive(Args)]
pub struct PresetArgs {
    /// Preset to build (e.g. iron_condor, bull-call-spread)
    pub name: Option<String>,

    /// List the available presets
    #[arg(long)]
    pub list: bool,

    /// Path to a JSON request holding the market (stock_price, volatility, dates)
    #[arg(long)]
    pub input: Option<String>,

    /// Strike spacing as a fraction of the stock price
    #[arg(long, default_value_t = DEFAULT_WING_WIDTH)]
    pub wing_width: f64,

    /// Also evaluate the built strategy
    #[arg(long)]
    pub evaluate: bool,
}

pub fn run_preset(args: PresetArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if args.list || args.name.is_none() {
        let catalog: Vec<_> = PresetStrategy::ALL.iter().map(|p| p.describe()).collect();
        return Ok(json!({ "results": catalog }));
    }

    let preset: PresetStrategy = match args.name.as_deref() {
        Some(name) => name.parse()?,
        None => return Err("preset name required".into()),
    };

    let request = input::read_request(args.input.as_deref(), "preset construction")?;
    let parsed = parse_request(&request)?;
    let legs = preset.build_legs(&parsed.market, args.wing_width)?;

    let mut result = json!({
        "strategy": preset.key(),
        "name": preset.name(),
        "description": preset.description(),
        "legs": legs,
    });

    if args.evaluate {
        let out = evaluate(&parsed.market, &legs, &parsed.config)?;
        result["metrics"] = serde_json::to_value(ReportMetrics::from(&out.result))?;
        return Ok(json!({
            "result": result,
            "methodology": out.methodology,
            "warnings": out.warnings,
        }));
    }

    Ok(json!({ "result": result }))
}
