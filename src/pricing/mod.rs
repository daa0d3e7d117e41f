pub mod oracle;
pub mod quote;

use alloy::primitives::U256;
use bigdecimal::{BigDecimal, ToPrimitive};
use std::str::FromStr;

pub use oracle::{PriceOracle, PriceOutcome};
pub use quote::AnchorQuoteSource;

pub fn u256_to_decimal(val: U256) -> BigDecimal {
    BigDecimal::from_str(&val.to_string()).unwrap_or_default()
}

/// Convert a raw token amount to human units using token decimals.
pub fn raw_to_human(amount: U256, decimals: u8) -> f64 {
    let divisor = BigDecimal::from_str(&format!("1e{}", decimals)).unwrap_or_else(|_| BigDecimal::from(1));
    (u256_to_decimal(amount) / divisor).to_f64().unwrap_or(0.0)
}
