//! Quantity helpers with decimal precision.

use rust_decimal::Decimal;

/// Returns `part` as a percentage of `whole`, rounded to 2 decimal places.
///
/// Returns zero when `whole` is zero so callers never divide by zero.
#[must_use]
pub fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        Decimal::ZERO
    } else {
        (part / whole * Decimal::ONE_HUNDRED).round_dp(2)
    }
}
