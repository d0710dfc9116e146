//! Kinked utilization interest-rate model.
//!
//! Below the optimal utilization the borrow APR climbs gently from the
//! minimum to the optimal rate; past the kink it climbs steeply to the
//! maximum. Suppliers earn the borrow APR scaled by utilization, minus the
//! protocol's reserve factor.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::constants::{MAX_DECIMAL_MANTISSA, ONE_HUNDRED, SECONDS_PER_YEAR};
use crate::types::units::{bps_to_fraction, saturating_decimal};
use crate::types::{InterestRateCurveConfig, RateSnapshot};

/// Utilization and APRs for a reserve with the given borrowed/cash totals.
///
/// An empty pool (`borrowed + cash == 0`) yields all-zero rates.
pub fn compute_rates(
    curve: &InterestRateCurveConfig,
    reserve_factor_bips: u32,
    total_borrowed_base_units: u128,
    total_cash_base_units: u128,
) -> RateSnapshot {
    let Some(utilization_pct) = utilization_pct(total_borrowed_base_units, total_cash_base_units)
    else {
        return RateSnapshot::ZERO;
    };

    let borrow_apr_pct = borrow_apr_pct(curve, utilization_pct);

    let keep = (Decimal::ONE - bps_to_fraction(reserve_factor_bips)).max(Decimal::ZERO);
    let supply_apr_pct = borrow_apr_pct
        .saturating_mul(utilization_pct / ONE_HUNDRED)
        .saturating_mul(keep);

    RateSnapshot {
        utilization_pct,
        borrow_apr_pct,
        supply_apr_pct,
    }
}

/// `100 * borrowed / (borrowed + cash)`, or `None` for an empty pool.
///
/// Totals past the 96-bit mantissa are halved together until they fit, which
/// keeps the ratio.
fn utilization_pct(borrowed: u128, cash: u128) -> Option<Decimal> {
    let (mut borrowed, mut cash) = (borrowed, cash);
    while borrowed
        .checked_add(cash)
        .map_or(true, |total| total > MAX_DECIMAL_MANTISSA)
    {
        borrowed >>= 1;
        cash >>= 1;
    }

    let total = borrowed + cash;
    if total == 0 {
        return None;
    }
    let ratio = saturating_decimal(borrowed) / saturating_decimal(total);
    Some(ratio * ONE_HUNDRED)
}

/// Piecewise-linear borrow APR at `utilization_pct`.
///
/// Saturates instead of overflowing for curves with extreme rates.
fn borrow_apr_pct(curve: &InterestRateCurveConfig, utilization_pct: Decimal) -> Decimal {
    let optimal_u = curve.optimal_utilization_pct;
    let min = curve.min_borrow_rate_pct;
    let opt = curve.optimal_borrow_rate_pct;
    let max = curve.max_borrow_rate_pct;

    // No gentle slope at all: the whole curve is past the kink.
    if optimal_u <= Decimal::ZERO {
        return max;
    }

    if utilization_pct <= optimal_u {
        let gentle = opt.saturating_sub(min).saturating_mul(utilization_pct / optimal_u);
        return min.saturating_add(gentle);
    }

    let steep_span = ONE_HUNDRED - optimal_u;
    if steep_span <= Decimal::ZERO {
        return opt;
    }
    let excess = ((utilization_pct - optimal_u) / steep_span).min(Decimal::ONE);
    opt.saturating_add(max.saturating_sub(opt).saturating_mul(excess))
}

// ---------------------------------------------------------------------------
// Interest accrual
// ---------------------------------------------------------------------------

/// Growth factor of a debt after `seconds` at `borrow_apr_pct`.
///
/// Three-term Taylor expansion of continuous compounding:
/// `1 + r*t + (r*t)^2 / 2` with `r = apr / 100 / SECONDS_PER_YEAR`.
/// Returns `None` if the factor does not fit a `Decimal`.
pub fn compound_factor(borrow_apr_pct: Decimal, seconds: u64) -> Option<Decimal> {
    let rate_per_second = borrow_apr_pct / ONE_HUNDRED / Decimal::from(SECONDS_PER_YEAR);
    let r_dt = rate_per_second.checked_mul(Decimal::from(seconds))?;
    let second_order = r_dt.checked_mul(r_dt)? / dec!(2);

    Decimal::ONE.checked_add(r_dt)?.checked_add(second_order)
}
