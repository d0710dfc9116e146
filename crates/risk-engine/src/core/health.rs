//! Health factor, collateral and borrowing-power arithmetic.
//!
//! Every function here is pure. Thresholds come from [`HealthThresholds`]
//! rather than literals so the simulator, validator and display layer agree.

use rust_decimal::Decimal;

use crate::config::HealthThresholds;
use crate::constants::{DEBT_EPSILON_USD, ONE_HUNDRED};
use crate::types::units::bps_to_fraction;
use crate::types::{BorrowingPower, HealthFactor, LiquidationDistance, PortfolioSnapshot};

use super::interest_rate::compound_factor;

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

/// `collateral / borrow`.
///
/// Debt under [`DEBT_EPSILON_USD`] counts as fully repaid and gives
/// `Infinite`, as does a quotient too large for `Decimal`.
pub fn health_factor(collateral_value_usd: Decimal, borrow_value_usd: Decimal) -> HealthFactor {
    if borrow_value_usd < DEBT_EPSILON_USD {
        return HealthFactor::Infinite;
    }
    match collateral_value_usd
        .max(Decimal::ZERO)
        .checked_div(borrow_value_usd)
    {
        Some(hf) => HealthFactor::Finite(hf),
        None => HealthFactor::Infinite,
    }
}

/// Risk-weighted collateral of one asset: `supplied * lt / 10000`.
pub fn collateral_value(supplied_usd: Decimal, liquidation_threshold_bips: u32) -> Decimal {
    supplied_usd.saturating_mul(bps_to_fraction(liquidation_threshold_bips))
}

/// Sum of per-asset collateral values, each weighted by its own threshold.
pub fn aggregate_collateral_value<I>(positions: I) -> Decimal
where
    I: IntoIterator<Item = (Decimal, u32)>,
{
    positions
        .into_iter()
        .fold(Decimal::ZERO, |acc, (supplied_usd, lt_bips)| {
            acc.saturating_add(collateral_value(supplied_usd, lt_bips))
        })
}

// ---------------------------------------------------------------------------
// Portfolio metrics
// ---------------------------------------------------------------------------

/// Borrowing capacity implied by `loan_to_value_bips` and how much of it is used.
pub fn borrowing_power(portfolio: &PortfolioSnapshot, loan_to_value_bips: u32) -> BorrowingPower {
    let total = collateral_value(portfolio.total_supplied_usd, loan_to_value_bips);
    let used = portfolio.total_borrowed_usd;
    let available = total.saturating_sub(used).max(Decimal::ZERO);

    let utilization_pct = if total > Decimal::ZERO {
        used.checked_div(total)
            .and_then(|ratio| ratio.checked_mul(ONE_HUNDRED))
            .unwrap_or(Decimal::MAX)
    } else {
        Decimal::ZERO
    };

    BorrowingPower {
        total,
        used,
        available,
        utilization_pct,
    }
}

/// Collateral headroom before liquidation.
///
/// `is_at_risk` uses the portfolio's reported health factor against the safe
/// line, not the recomputed single-threshold collateral.
pub fn liquidation_distance(
    portfolio: &PortfolioSnapshot,
    liquidation_threshold_bips: u32,
    thresholds: &HealthThresholds,
) -> LiquidationDistance {
    if !portfolio.has_debt() {
        return LiquidationDistance {
            distance_usd: None,
            percent_to_liquidation: Decimal::ZERO,
            is_at_risk: false,
        };
    }

    let collateral = collateral_value(portfolio.total_supplied_usd, liquidation_threshold_bips);
    let distance = collateral.saturating_sub(portfolio.total_borrowed_usd);
    let percent_to_liquidation = if collateral > Decimal::ZERO {
        distance
            .checked_div(collateral)
            .map(|ratio| ratio.saturating_mul(ONE_HUNDRED))
            .unwrap_or(Decimal::MIN)
    } else {
        Decimal::ZERO
    };

    LiquidationDistance {
        distance_usd: Some(distance),
        percent_to_liquidation,
        is_at_risk: thresholds.is_at_risk(portfolio.health_factor),
    }
}

// ---------------------------------------------------------------------------
// Prediction
// ---------------------------------------------------------------------------

/// Health factor after `seconds` of interest accrual at `borrow_apr_pct`.
///
/// Collateral is held fixed. A debt too large to represent after accrual is
/// reported as `HealthFactor::ZERO`.
pub fn predict_health_factor(
    collateral_value_usd: Decimal,
    borrow_value_usd: Decimal,
    borrow_apr_pct: Decimal,
    seconds: u64,
) -> HealthFactor {
    if borrow_value_usd < DEBT_EPSILON_USD {
        return HealthFactor::Infinite;
    }

    match compound_factor(borrow_apr_pct, seconds).and_then(|f| borrow_value_usd.checked_mul(f)) {
        Some(projected_debt) => health_factor(collateral_value_usd, projected_debt),
        None => HealthFactor::ZERO,
    }
}
