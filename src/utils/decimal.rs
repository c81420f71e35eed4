//! Decimal arithmetic utilities for share and allocation calculations.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Largest whole share count not exceeding `value`.
///
/// Negative inputs clamp to zero: a share count can never go below nothing.
pub fn floor_shares(value: Decimal) -> i64 {
    if value <= Decimal::ZERO {
        return 0;
    }
    value.floor().to_i64().unwrap_or(i64::MAX)
}

/// Round to the nearest whole share, halves rounding away from zero.
pub fn round_shares(value: Decimal) -> i64 {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}

/// Cost of `shares` whole shares at `price`.
pub fn share_cost(shares: i64, price: Decimal) -> Decimal {
    Decimal::from(shares) * price
}

/// Safe division that returns zero if divisor is zero.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator == Decimal::ZERO {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

/// Express `part` as a percentage of `total` (0-100 scale).
pub fn percent_of(part: Decimal, total: Decimal) -> Decimal {
    safe_div(part, total) * dec!(100)
}
