use crate::market::MarketParameters;
use crate::pricing::black_scholes::{intrinsic_value, value_unchecked, OptionInput};
use crate::types::*;

use super::leg::{OptionLeg, StrategyLeg};

/// Cash outlay to open the leg: positive for a debit, negative for a credit.
pub fn leg_cost(leg: &StrategyLeg, market: &MarketParameters) -> f64 {
    let entry = match leg {
        StrategyLeg::Stock(s) => s.prev_pos.unwrap_or_else(|| market.stock_price()),
        StrategyLeg::Call(o) | StrategyLeg::Put(o) => o.premium,
    };
    leg.multiplier() * entry
}

/// Per-unit value of an option leg at the target date with the underlying at `s`.
///
/// A leg expiring on the target date is worth its intrinsic value; a leg
/// with time left is marked to the Black-Scholes model.
fn option_value_at_target(
    o: &OptionLeg,
    option_type: OptionType,
    s: Price,
    market: &MarketParameters,
) -> Price {
    let remaining = match o.expiration {
        Some(exp) => market.years_between(market.target_date(), exp),
        None => 0.0,
    };

    if remaining <= 0.0 {
        return intrinsic_value(s, o.strike, option_type);
    }

    if s <= 0.0 {
        // Worthless underlying: the call is dead, the put pays the strike at expiry.
        return match option_type {
            OptionType::Call => 0.0,
            OptionType::Put => o.strike * (-market.interest_rate() * remaining).exp(),
        };
    }

    value_unchecked(&OptionInput {
        spot_price: s,
        strike_price: o.strike,
        volatility: market.volatility(),
        risk_free_rate: market.interest_rate(),
        dividend_yield: market.dividend_yield(),
        time_to_expiry: remaining,
        option_type,
    })
}

/// Signed value of the leg at the target date with the underlying at `s`.
///
/// Entry cost is not netted here; the aggregator subtracts the strategy cost once.
pub fn leg_value(leg: &StrategyLeg, s: Price, market: &MarketParameters) -> f64 {
    let unit = match leg {
        StrategyLeg::Stock(_) => s,
        StrategyLeg::Call(o) => option_value_at_target(o, OptionType::Call, s, market),
        StrategyLeg::Put(o) => option_value_at_target(o, OptionType::Put, s, market),
    };
    leg.multiplier() * unit
}
