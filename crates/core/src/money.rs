//! Storage bounds for money amounts.
//!
//! Every amount column is `NUMERIC(19,4)`. Amounts that do not fit are
//! rejected before planning so the stored value always equals the value
//! the caller is told about.

use rust_decimal::Decimal;

/// Decimal places kept by the amount columns.
pub const MONEY_SCALE: u32 = 4;

/// Integer digits kept by the amount columns (19 precision minus the scale).
const MONEY_INTEGER_DIGITS: u32 = 15;

/// Returns true if `amount` is stored without rounding or overflow.
///
/// Trailing zeros do not count against the scale, so `400.00000` fits.
#[must_use]
pub fn fits_storage(amount: Decimal) -> bool {
    amount.normalize().scale() <= MONEY_SCALE && amount.abs() < money_limit()
}

fn money_limit() -> Decimal {
    Decimal::from(10_i64.pow(MONEY_INTEGER_DIGITS))
}
