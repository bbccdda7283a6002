//! Monetary types for price and volume representation.

use rust_decimal::{Decimal, RoundingStrategy};

/// Price represented as a Decimal for precision.
pub type Price = Decimal;

/// Volume or order quantity represented as a Decimal for precision.
pub type Volume = Decimal;

/// Decimal places kept on order quantities.
pub const SIZE_DECIMALS: u32 = 2;

const BPS_PER_UNIT: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// Truncate a quantity toward zero to the tradable precision.
#[must_use]
pub fn floor_size(size: Volume) -> Volume {
    size.round_dp_with_strategy(SIZE_DECIMALS, RoundingStrategy::ToZero)
}

/// Convert basis points into a fraction (`25` -> `0.0025`).
#[must_use]
pub fn bps_to_fraction(bps: u32) -> Decimal {
    Decimal::from(bps) / BPS_PER_UNIT
}

/// Relative change from `from` to `to`, in basis points.
///
/// Returns zero when `from` is zero.
#[must_use]
pub fn change_bps(from: Price, to: Price) -> Decimal {
    if from.is_zero() {
        return Decimal::ZERO;
    }
    (to - from) / from * BPS_PER_UNIT
}
