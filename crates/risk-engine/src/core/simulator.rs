//! What-if projection of a single lending action.
//!
//! The simulator never mutates the snapshot it is given: it works on copies
//! and returns projected values. Inputs the projection cannot honour
//! (negative amounts, overflow, a withdraw beyond what is supplied) fail
//! closed as a degenerate Danger result.

use rust_decimal::Decimal;
use tracing::warn;

use crate::config::{RiskPolicy, SimulationMode};
use crate::constants::DEBT_EPSILON_USD;
use crate::types::{
    ActionKind, AssetPosition, HealthBand, HealthFactor, PortfolioSnapshot, ReserveSnapshot,
    SimulationResult,
};

use super::health::{aggregate_collateral_value, collateral_value, health_factor};

/// Projected collateral and debt after an action, in USD.
#[derive(Debug, Clone, Copy)]
struct Projection {
    collateral_usd: Decimal,
    borrow_usd: Decimal,
}

#[derive(Debug, Clone)]
pub struct Simulator {
    policy: RiskPolicy,
}

impl Simulator {
    pub fn new(policy: RiskPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RiskPolicy {
        &self.policy
    }

    /// Project `portfolio` after `kind` of `amount` display units of `reserve`'s asset.
    pub fn simulate(
        &self,
        portfolio: &PortfolioSnapshot,
        kind: ActionKind,
        reserve: &ReserveSnapshot,
        amount: Decimal,
    ) -> SimulationResult {
        if amount.is_sign_negative()
            || reserve.price_usd.is_sign_negative()
            || portfolio.total_supplied_usd.is_sign_negative()
            || portfolio.total_borrowed_usd.is_sign_negative()
        {
            return self.degenerate(portfolio, kind, reserve, Decimal::ZERO, "negative input");
        }

        let Some(amount_usd) = amount.checked_mul(reserve.price_usd) else {
            return self.degenerate(portfolio, kind, reserve, Decimal::ZERO, "amount overflow");
        };

        if kind == ActionKind::Withdraw {
            let withdrawable = self.withdrawable_usd(portfolio, reserve);
            if amount_usd > withdrawable.saturating_add(DEBT_EPSILON_USD) {
                let reason = "withdraw exceeds supplied";
                return self.degenerate(portfolio, kind, reserve, amount_usd, reason);
            }
        }

        let Some(projection) = self.project(portfolio, kind, reserve, amount_usd) else {
            return self.degenerate(portfolio, kind, reserve, amount_usd, "projection overflow");
        };

        let projected_health_factor =
            health_factor(projection.collateral_usd, projection.borrow_usd);
        let band = self.policy.thresholds.classify(projected_health_factor);

        let estimated_liquidation_price = if kind.reduces_margin() {
            liquidation_price(reserve.price_usd, &projection)
        } else {
            None
        };

        SimulationResult {
            kind,
            amount_usd,
            current_health_factor: portfolio.health_factor,
            projected_health_factor,
            projected_collateral_value_usd: projection.collateral_usd,
            projected_borrow_value_usd: projection.borrow_usd,
            safety_tier: band.tier(),
            band,
            estimated_liquidation_price,
            degenerate: false,
        }
    }

    /// Risk-weighted collateral of `portfolio` as the simulator sees it
    /// before any action.
    pub fn current_collateral(
        &self,
        portfolio: &PortfolioSnapshot,
        reserve: &ReserveSnapshot,
    ) -> Decimal {
        if self.uses_positions(portfolio) {
            aggregate_collateral_value(
                portfolio
                    .positions
                    .iter()
                    .map(|p| (p.supplied_usd, p.liquidation_threshold_bips)),
            )
        } else {
            collateral_value(
                portfolio.total_supplied_usd,
                reserve.risk.liquidation_threshold_bips,
            )
        }
    }

    /// Liquidation threshold applied to collateral of `reserve`'s asset.
    pub fn threshold_for(&self, portfolio: &PortfolioSnapshot, reserve: &ReserveSnapshot) -> u32 {
        if self.uses_positions(portfolio) {
            if let Some(position) = portfolio.position(&reserve.asset) {
                return position.liquidation_threshold_bips;
            }
        }
        reserve.risk.liquidation_threshold_bips
    }

    /// USD supplied of `reserve`'s asset: the matching position when
    /// positions drive the projection, otherwise the whole supplied total.
    fn withdrawable_usd(
        &self,
        portfolio: &PortfolioSnapshot,
        reserve: &ReserveSnapshot,
    ) -> Decimal {
        if self.uses_positions(portfolio) {
            portfolio
                .position(&reserve.asset)
                .map_or(Decimal::ZERO, |p| p.supplied_usd)
        } else {
            portfolio.total_supplied_usd
        }
    }

    fn uses_positions(&self, portfolio: &PortfolioSnapshot) -> bool {
        self.policy.simulation_mode == SimulationMode::Aggregated && !portfolio.positions.is_empty()
    }

    fn project(
        &self,
        portfolio: &PortfolioSnapshot,
        kind: ActionKind,
        reserve: &ReserveSnapshot,
        amount_usd: Decimal,
    ) -> Option<Projection> {
        if self.uses_positions(portfolio) {
            project_aggregated(portfolio, kind, reserve, amount_usd)
        } else {
            project_single_reserve(portfolio, kind, reserve, amount_usd)
        }
    }

    fn degenerate(
        &self,
        portfolio: &PortfolioSnapshot,
        kind: ActionKind,
        reserve: &ReserveSnapshot,
        amount_usd: Decimal,
        reason: &str,
    ) -> SimulationResult {
        warn!(
            action = kind.as_str(),
            asset = %reserve.asset,
            reason,
            "simulation degenerate, reporting danger"
        );
        SimulationResult {
            kind,
            amount_usd,
            current_health_factor: portfolio.health_factor,
            projected_health_factor: HealthFactor::ZERO,
            projected_collateral_value_usd: self
                .current_collateral(portfolio, reserve)
                .max(Decimal::ZERO),
            projected_borrow_value_usd: portfolio.total_borrowed_usd.max(Decimal::ZERO),
            safety_tier: HealthBand::Danger.tier(),
            band: HealthBand::Danger,
            estimated_liquidation_price: None,
            degenerate: true,
        }
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(RiskPolicy::default())
    }
}

// ---------------------------------------------------------------------------
// Projection helpers
// ---------------------------------------------------------------------------

/// Apply an action's delta to one supplied/borrowed pair.
///
/// Withdraw and repay are clamped at what is there, so neither side goes
/// negative. Withdraws reach here at most dust above the supplied amount.
fn apply_delta(
    kind: ActionKind,
    supplied: &mut Decimal,
    borrowed: &mut Decimal,
    amount_usd: Decimal,
) -> Option<()> {
    match kind {
        ActionKind::Supply => *supplied = supplied.checked_add(amount_usd)?,
        ActionKind::Borrow => *borrowed = borrowed.checked_add(amount_usd)?,
        ActionKind::Withdraw => *supplied -= amount_usd.min(*supplied),
        ActionKind::Repay => *borrowed -= amount_usd.min(*borrowed),
    }
    Some(())
}

/// Whole portfolio weighted by the acted-on reserve's threshold.
fn project_single_reserve(
    portfolio: &PortfolioSnapshot,
    kind: ActionKind,
    reserve: &ReserveSnapshot,
    amount_usd: Decimal,
) -> Option<Projection> {
    let mut supplied = portfolio.total_supplied_usd;
    let mut borrowed = portfolio.total_borrowed_usd;
    apply_delta(kind, &mut supplied, &mut borrowed, amount_usd)?;

    Some(Projection {
        collateral_usd: collateral_value(supplied, reserve.risk.liquidation_threshold_bips),
        borrow_usd: borrowed,
    })
}

/// Each position keeps its own threshold; the delta lands on the position
/// for `reserve.asset`, which is opened at the reserve's threshold if absent.
fn project_aggregated(
    portfolio: &PortfolioSnapshot,
    kind: ActionKind,
    reserve: &ReserveSnapshot,
    amount_usd: Decimal,
) -> Option<Projection> {
    let mut positions = portfolio.positions.clone();
    let index = match positions.iter().position(|p| p.asset == reserve.asset) {
        Some(i) => i,
        None => {
            positions.push(AssetPosition {
                asset: reserve.asset.clone(),
                supplied_usd: Decimal::ZERO,
                borrowed_usd: Decimal::ZERO,
                liquidation_threshold_bips: reserve.risk.liquidation_threshold_bips,
            });
            positions.len() - 1
        }
    };

    let target = &mut positions[index];
    let borrowed_before = target.borrowed_usd;
    apply_delta(kind, &mut target.supplied_usd, &mut target.borrowed_usd, amount_usd)?;
    let borrow_change = target.borrowed_usd.checked_sub(borrowed_before)?;

    let collateral_usd = aggregate_collateral_value(
        positions
            .iter()
            .map(|p| (p.supplied_usd, p.liquidation_threshold_bips)),
    );
    let borrow_usd = portfolio
        .total_borrowed_usd
        .checked_add(borrow_change)?
        .max(Decimal::ZERO);

    Some(Projection {
        collateral_usd,
        borrow_usd,
    })
}

/// Price at which the projected position reaches HF = 1, holding debt fixed.
fn liquidation_price(price_usd: Decimal, projection: &Projection) -> Option<Decimal> {
    if projection.borrow_usd < DEBT_EPSILON_USD || projection.collateral_usd <= Decimal::ZERO {
        return None;
    }
    price_usd
        .checked_mul(projection.borrow_usd)?
        .checked_div(projection.collateral_usd)
}
