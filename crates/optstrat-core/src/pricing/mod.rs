pub mod black_scholes;

pub use black_scholes::{
    greeks, itm_probability, price, value_option, OptionGreeks, OptionInput, OptionValuation,
    TerminalDistribution,
};
