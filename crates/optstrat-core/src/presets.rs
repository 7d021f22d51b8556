use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StrategyError;
use crate::market::MarketParameters;
use crate::pricing::black_scholes::{value_unchecked, OptionInput};
use crate::strategy::StrategyLeg;
use crate::types::*;
use crate::StrategyResult;

/// Strike spacing, as a fraction of spot, when none is given.
pub const DEFAULT_WING_WIDTH: f64 = 0.05;

/// Shares per stock leg in presets that hold the underlying (one contract's worth).
pub const SHARES_PER_CONTRACT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetStrategy {
    CoveredCall,
    ProtectivePut,
    BullCallSpread,
    BearPutSpread,
    IronCondor,
    Straddle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetDescription {
    pub key: String,
    pub name: String,
    pub description: String,
}

impl PresetStrategy {
    pub const ALL: [PresetStrategy; 6] = [
        PresetStrategy::CoveredCall,
        PresetStrategy::ProtectivePut,
        PresetStrategy::BullCallSpread,
        PresetStrategy::BearPutSpread,
        PresetStrategy::IronCondor,
        PresetStrategy::Straddle,
    ];

    pub fn key(self) -> &'static str {
        match self {
            PresetStrategy::CoveredCall => "covered_call",
            PresetStrategy::ProtectivePut => "protective_put",
            PresetStrategy::BullCallSpread => "bull_call_spread",
            PresetStrategy::BearPutSpread => "bear_put_spread",
            PresetStrategy::IronCondor => "iron_condor",
            PresetStrategy::Straddle => "straddle",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PresetStrategy::CoveredCall => "Covered Call",
            PresetStrategy::ProtectivePut => "Protective Put",
            PresetStrategy::BullCallSpread => "Bull Call Spread",
            PresetStrategy::BearPutSpread => "Bear Put Spread",
            PresetStrategy::IronCondor => "Iron Condor",
            PresetStrategy::Straddle => "Long Straddle",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            PresetStrategy::CoveredCall => "Buy stock and sell call option",
            PresetStrategy::ProtectivePut => "Buy stock and buy put option",
            PresetStrategy::BullCallSpread => "Buy lower strike call, sell higher strike call",
            PresetStrategy::BearPutSpread => "Buy higher strike put, sell lower strike put",
            PresetStrategy::IronCondor => "Sell call spread and put spread",
            PresetStrategy::Straddle => "Buy call and put at same strike",
        }
    }

    pub fn describe(self) -> PresetDescription {
        PresetDescription {
            key: self.key().to_string(),
            name: self.name().to_string(),
            description: self.description().to_string(),
        }
    }

    /// Build the preset's legs around the money.
    ///
    /// Strikes sit at spot and at multiples of `wing_width × spot` away from
    /// it, rounded to cents. Premiums are Black-Scholes values at the start
    /// date for options expiring on the target date.
    pub fn build_legs(
        self,
        market: &MarketParameters,
        wing_width: f64,
    ) -> StrategyResult<Vec<StrategyLeg>> {
        if !wing_width.is_finite() || wing_width <= 0.0 || wing_width >= 0.5 {
            return Err(StrategyError::invalid(
                "wing_width",
                "must be between 0 and 0.5 (exclusive)",
            ));
        }
        let spot = market.stock_price();
        let atm = round_cents(spot);
        let wing = round_cents(spot * wing_width);
        if wing <= 0.0 {
            return Err(StrategyError::invalid(
                "wing_width",
                "too narrow for the stock price",
            ));
        }

        let call = |k: f64, action| StrategyLeg::call(k, premium(market, k, OptionType::Call), 1, action);
        let put = |k: f64, action| StrategyLeg::put(k, premium(market, k, OptionType::Put), 1, action);

        let legs = match self {
            PresetStrategy::CoveredCall => vec![
                StrategyLeg::stock(SHARES_PER_CONTRACT, Action::Buy),
                StrategyLeg::call(
                    atm + wing,
                    premium(market, atm + wing, OptionType::Call),
                    SHARES_PER_CONTRACT,
                    Action::Sell,
                ),
            ],
            PresetStrategy::ProtectivePut => vec![
                StrategyLeg::stock(SHARES_PER_CONTRACT, Action::Buy),
                StrategyLeg::put(
                    atm - wing,
                    premium(market, atm - wing, OptionType::Put),
                    SHARES_PER_CONTRACT,
                    Action::Buy,
                ),
            ],
            PresetStrategy::BullCallSpread => {
                vec![call(atm, Action::Buy), call(atm + wing, Action::Sell)]
            }
            PresetStrategy::BearPutSpread => {
                vec![put(atm, Action::Buy), put(atm - wing, Action::Sell)]
            }
            PresetStrategy::IronCondor => vec![
                put(atm - 2.0 * wing, Action::Buy),
                put(atm - wing, Action::Sell),
                call(atm + wing, Action::Sell),
                call(atm + 2.0 * wing, Action::Buy),
            ],
            PresetStrategy::Straddle => vec![call(atm, Action::Buy), put(atm, Action::Buy)],
        };

        for (i, leg) in legs.iter().enumerate() {
            leg.validate(i, market)?;
        }
        Ok(legs)
    }
}

impl fmt::Display for PresetStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for PresetStrategy {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        PresetStrategy::ALL
            .into_iter()
            .find(|p| p.key() == wanted)
            .ok_or_else(|| StrategyError::invalid("strategy_name", format!("unknown preset '{}'", s)))
    }
}

/// Model premium for an option expiring on the target date, rounded to cents.
/// Non-positive strikes get a zero premium and are rejected by leg validation.
fn premium(market: &MarketParameters, strike: Price, option_type: OptionType) -> Price {
    if strike <= 0.0 {
        return 0.0;
    }
    round_cents(value_unchecked(&OptionInput {
        spot_price: market.stock_price(),
        strike_price: strike,
        volatility: market.volatility(),
        risk_free_rate: market.interest_rate(),
        dividend_yield: market.dividend_yield(),
        time_to_expiry: market.time_to_target(),
        option_type,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MarketInput;
    use chrono::NaiveDate;

    fn market() -> MarketParameters {
        MarketParameters::new(MarketInput {
            stock_price: 100.0,
            volatility: 0.25,
            interest_rate: 0.01,
            dividend_yield: 0.0,
            start_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            target_date: NaiveDate::from_ymd_opt(2026, 7, 17).unwrap(),
            min_stock: 50.0,
            max_stock: 150.0,
            days_in_year: 365,
        })
        .unwrap()
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("iron_condor".parse::<PresetStrategy>().unwrap(), PresetStrategy::IronCondor);
        assert_eq!("Bull-Call-Spread".parse::<PresetStrategy>().unwrap(), PresetStrategy::BullCallSpread);
        assert!("strangle".parse::<PresetStrategy>().is_err());
    }

    #[test]
    fn test_catalog_complete() {
        for p in PresetStrategy::ALL {
            let d = p.describe();
            assert_eq!(d.key.parse::<PresetStrategy>().unwrap(), p);
            assert!(!d.description.is_empty());
        }
    }

    #[test]
    fn test_iron_condor_structure() {
        let legs = PresetStrategy::IronCondor.build_legs(&market(), 0.05).unwrap();
        let strikes: Vec<f64> = legs.iter().filter_map(|l| l.strike()).collect();
        assert_eq!(strikes, vec![90.0, 95.0, 105.0, 110.0]);
        let net: f64 = legs.iter().map(|l| match l {
            StrategyLeg::Call(o) | StrategyLeg::Put(o) => l.action().sign() * o.premium,
            StrategyLeg::Stock(_) => 0.0,
        }).sum();
        // An iron condor is opened for a credit
        assert!(net < 0.0);
    }

    #[test]
    fn test_bull_call_spread_debit() {
        let legs = PresetStrategy::BullCallSpread.build_legs(&market(), 0.05).unwrap();
        match (&legs[0], &legs[1]) {
            (StrategyLeg::Call(long), StrategyLeg::Call(short)) => {
                assert!(long.premium > short.premium);
                assert_eq!(long.strike, 100.0);
                assert_eq!(short.strike, 105.0);
            }
            _ => panic!("expected two call legs"),
        }
    }

    #[test]
    fn test_wing_width_bounds() {
        let err = PresetStrategy::Straddle.build_legs(&market(), 0.0).unwrap_err();
        assert_eq!(err.field(), Some("wing_width"));
        assert!(PresetStrategy::IronCondor.build_legs(&market(), 0.6).is_err());
    }
}
