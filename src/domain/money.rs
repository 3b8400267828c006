use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Splits `total` evenly across `recipients`, rounded to cents.
///
/// Remainder cents are not redistributed, so the rounded shares may not sum
/// back to `total` exactly.
pub fn per_recipient_share(total: Decimal, recipients: usize) -> Decimal {
    let divisor = Decimal::from(recipients.max(1) as u64);
    (total / divisor).round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Converts a major-unit amount to integer minor units (cents).
///
/// Rounds half-to-even instead of truncating. Returns `None` when the value
/// does not fit in an `i64`.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    amount
        .checked_mul(dec!(100))?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
        .to_i64()
}
