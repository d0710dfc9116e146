//! Largest amounts a user can borrow or withdraw and still pass validation.
//!
//! Results are display units of the reserve's asset, truncated to its
//! decimals so that submitting the figure never rounds past a floor.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::units::{bps_to_fraction, to_display_units};
use crate::types::{PortfolioSnapshot, ReserveSnapshot};

use super::health::borrowing_power;
use super::simulator::Simulator;

/// Largest borrow of `reserve`'s asset that clears borrowing power, pool
/// liquidity, the borrow cap and the borrow health-factor floor. Zero when
/// that figure is under the policy's minimum action amount.
pub fn max_borrow_amount(
    simulator: &Simulator,
    portfolio: &PortfolioSnapshot,
    reserve: &ReserveSnapshot,
    available_liquidity: Decimal,
) -> Decimal {
    let price = reserve.price_usd;
    if price <= Decimal::ZERO || portfolio.total_supplied_usd <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let power_usd = borrowing_power(portfolio, reserve.risk.loan_to_value_bips).available;

    // collateral / (borrowed + x) >= floor  =>  x <= collateral / floor - borrowed
    let floor = simulator.policy().borrow_floor;
    let collateral = simulator.current_collateral(portfolio, reserve);
    let floor_usd = collateral
        .checked_div(floor)
        .map(|max_debt| max_debt.saturating_sub(portfolio.total_borrowed_usd))
        .unwrap_or(Decimal::MAX);

    let mut amount = power_usd
        .min(floor_usd)
        .checked_div(price)
        .unwrap_or(Decimal::MAX)
        .min(available_liquidity);

    if let Some(limit) = reserve.risk.borrow_limit_base_units {
        let limit = to_display_units(limit, reserve.risk.decimals);
        amount = amount.min(limit.saturating_sub(reserve.total_borrowed_display()));
    }

    let amount = truncate(amount.max(Decimal::ZERO), reserve);
    if amount < simulator.policy().min_action_amount {
        return Decimal::ZERO;
    }
    amount
}

/// Largest withdrawal of `reserve`'s asset that keeps the health factor at or
/// above the caution line. Everything supplied when nothing is borrowed.
pub fn max_withdraw_amount(
    simulator: &Simulator,
    portfolio: &PortfolioSnapshot,
    reserve: &ReserveSnapshot,
    asset_supplied: Decimal,
) -> Decimal {
    let asset_supplied = asset_supplied.max(Decimal::ZERO);
    if !portfolio.has_debt() || reserve.price_usd <= Decimal::ZERO {
        return asset_supplied;
    }

    let lt = bps_to_fraction(simulator.threshold_for(portfolio, reserve));
    if lt.is_zero() {
        return asset_supplied;
    }

    // (collateral - x * lt) / borrowed >= caution
    //   =>  x <= (collateral - caution * borrowed) / lt
    let caution = simulator.policy().thresholds.caution;
    let collateral = simulator.current_collateral(portfolio, reserve);
    let Some(required) = portfolio.total_borrowed_usd.checked_mul(caution) else {
        return Decimal::ZERO;
    };
    let amount = collateral
        .saturating_sub(required)
        .max(Decimal::ZERO)
        .checked_div(lt)
        .and_then(|spare_usd| spare_usd.checked_div(reserve.price_usd))
        .unwrap_or(Decimal::MAX)
        .min(asset_supplied);
    truncate(amount, reserve)
}

fn truncate(amount: Decimal, reserve: &ReserveSnapshot) -> Decimal {
    amount.round_dp_with_strategy(u32::from(reserve.risk.decimals), RoundingStrategy::ToZero)
}
