use clap::Args;
use serde_json::Value;
use std::time::Instant;

use optstrat_core::pricing::{value_option, OptionInput};
use optstrat_core::with_metadata;

use crate::input;

/// Arguments for single-option pricing
#[derive(Args)]
pub struct PriceArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_price(args: PriceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let opt_input: OptionInput = match args.input {
        Some(ref path) => input::file::read_json(path)?,
        None => serde_json::from_value(input::read_request(None, "option pricing")?)?,
    };
    let valuation = value_option(&opt_input)?;
    let output = with_metadata(
        "Black-Scholes-Merton with continuous dividend yield",
        &opt_input,
        Vec::new(),
        start.elapsed().as_micros() as u64,
        valuation,
    );
    Ok(serde_json::to_value(output)?)
}
