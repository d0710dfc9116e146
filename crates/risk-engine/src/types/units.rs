//! Conversions between on-chain integers, UI floats and off-chain `Decimal`.
//!
//! Basis points, base units (`u128` scaled by `10^decimals`) and float input
//! from the presentation layer all enter the engine through these helpers.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::constants::{BPS_DENOMINATOR, MAX_DECIMAL_MANTISSA};
use crate::errors::RiskError;

/// Largest scale `Decimal` supports.
const MAX_SCALE: u32 = 28;

/// Convert basis points to a fraction (7500 -> 0.75).
pub fn bps_to_fraction(bps: u32) -> Decimal {
    Decimal::from(bps) / BPS_DENOMINATOR
}

/// Convert an on-chain base-unit amount to display units: `amount / 10^decimals`.
///
/// Exact whenever the amount fits the 96-bit mantissa and `decimals <= 28`.
/// Larger amounts lose their least significant digits; amounts that still
/// overflow with no decimals left saturate at `Decimal::MAX`.
pub fn to_display_units(base_units: u128, decimals: u8) -> Decimal {
    let mut raw = base_units;
    let mut scale = u32::from(decimals);

    while raw > MAX_DECIMAL_MANTISSA && scale > 0 {
        raw /= 10;
        scale -= 1;
    }
    if raw > MAX_DECIMAL_MANTISSA {
        return Decimal::MAX;
    }

    let mut value = Decimal::from_i128_with_scale(raw as i128, scale.min(MAX_SCALE));
    for _ in MAX_SCALE..scale {
        value /= Decimal::TEN;
    }
    value
}

/// Lossless-as-possible `u128` -> `Decimal`, saturating at `Decimal::MAX`.
pub fn saturating_decimal(value: u128) -> Decimal {
    Decimal::from_u128(value).unwrap_or(Decimal::MAX)
}

/// Accept an amount typed into a UI as a float.
///
/// NaN, infinities and magnitudes `Decimal` cannot hold are rejected here, so
/// nothing downstream ever sees a non-finite amount.
pub fn amount_from_f64(value: f64) -> Result<Decimal, RiskError> {
    if !value.is_finite() {
        return Err(RiskError::InvalidAmount { value });
    }
    Decimal::from_f64(value).ok_or(RiskError::InvalidAmount { value })
}
