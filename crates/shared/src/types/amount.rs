//! Base-currency amount helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All amounts are `rust_decimal::Decimal` values in the ledger's base currency.

use rust_decimal::{Decimal, RoundingStrategy};

/// Absolute tolerance used by every balance-equality check (0.01).
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Number of decimal places amounts are displayed with.
pub const DISPLAY_SCALE: u32 = 2;

/// Rounds an amount to two decimals, half away from zero.
#[must_use]
pub fn round_display(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns true if two amounts are equal within [`BALANCE_TOLERANCE`].
#[must_use]
pub fn within_tolerance(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= BALANCE_TOLERANCE
}

/// Returns true if an amount is larger in magnitude than [`BALANCE_TOLERANCE`].
///
/// Used to decide whether a temporary account still needs closing.
#[must_use]
pub fn is_material(amount: Decimal) -> bool {
    amount.abs() > BALANCE_TOLERANCE
}
