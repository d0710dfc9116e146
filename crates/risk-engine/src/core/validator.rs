//! Pre-flight checks for supply, borrow, repay and withdraw.
//!
//! Each action runs a fixed sequence of gates and the first failing gate
//! decides the outcome, so a caller always gets exactly one reason. Gates
//! that pass may still attach a [`Caution`] the user should confirm.

use rust_decimal::Decimal;
use tracing::debug;

use crate::config::RiskPolicy;
use crate::types::units::to_display_units;
use crate::types::{
    ActionKind, ActionRequest, Caution, HealthFactor, PortfolioSnapshot, Rejection,
    ReserveSnapshot, ValidationResult,
};

use super::health::borrowing_power;
use super::simulator::Simulator;

/// Outcome of one action's gate sequence.
type Gate = Result<Option<Caution>, Rejection>;

#[derive(Debug, Clone, Default)]
pub struct Validator {
    simulator: Simulator,
}

impl Validator {
    pub fn new(policy: RiskPolicy) -> Self {
        Self {
            simulator: Simulator::new(policy),
        }
    }

    pub fn policy(&self) -> &RiskPolicy {
        self.simulator.policy()
    }

    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    /// Run the checks for `request.kind` against `reserve` and `portfolio`.
    pub fn validate(
        &self,
        request: &ActionRequest,
        reserve: &ReserveSnapshot,
        portfolio: &PortfolioSnapshot,
    ) -> ValidationResult {
        let gate = match request.kind {
            ActionKind::Supply => self.check_supply(request, reserve),
            ActionKind::Borrow => self.check_borrow(request, reserve, portfolio),
            ActionKind::Repay => self.check_repay(request, reserve),
            ActionKind::Withdraw => self.check_withdraw(request, reserve, portfolio),
        };

        match gate {
            Ok(None) => ValidationResult::accept(),
            Ok(Some(caution)) => {
                debug!(
                    action = request.kind.as_str(),
                    asset = %reserve.asset,
                    amount = %request.amount,
                    %caution,
                    "action accepted with caution"
                );
                ValidationResult::accept_with_caution(caution)
            }
            Err(rejection) => {
                debug!(
                    action = request.kind.as_str(),
                    asset = %reserve.asset,
                    amount = %request.amount,
                    reason = %rejection,
                    "action rejected"
                );
                ValidationResult::reject(rejection)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Supply
    // -----------------------------------------------------------------------

    fn check_supply(&self, request: &ActionRequest, reserve: &ReserveSnapshot) -> Gate {
        let amount = request.amount;

        // 1. Well-formed amount
        ensure_positive(amount)?;

        // 2. Wallet balance
        if amount > request.spendable_balance {
            return Err(Rejection::InsufficientBalance {
                amount,
                balance: request.spendable_balance,
            });
        }

        // 3. Protocol minimum
        self.ensure_minimum(amount)?;

        // 4. Deposit cap
        if let Some(limit) = reserve.risk.deposit_limit_base_units {
            let remaining = remaining_capacity(limit, reserve.total_supply_display(), reserve);
            if amount > remaining {
                return Err(Rejection::DepositLimitExceeded { remaining });
            }
        }

        Ok(None)
    }

    // -----------------------------------------------------------------------
    // Borrow
    // -----------------------------------------------------------------------

    fn check_borrow(
        &self,
        request: &ActionRequest,
        reserve: &ReserveSnapshot,
        portfolio: &PortfolioSnapshot,
    ) -> Gate {
        let amount = request.amount;
        let policy = self.policy();

        // 1. Well-formed amount
        ensure_positive(amount)?;

        // 2. Something to borrow against
        if portfolio.total_supplied_usd <= Decimal::ZERO {
            return Err(Rejection::CollateralRequired);
        }

        // 3. Pool liquidity
        if amount > request.available_liquidity {
            return Err(Rejection::InsufficientLiquidity {
                amount,
                available: request.available_liquidity,
            });
        }

        // 4. Borrowing power
        let available_usd = borrowing_power(portfolio, reserve.risk.loan_to_value_bips).available;
        let requested_usd = amount
            .checked_mul(reserve.price_usd)
            .unwrap_or(Decimal::MAX);
        if requested_usd > available_usd {
            return Err(Rejection::ExceedsBorrowingPower {
                requested_usd,
                available_usd,
            });
        }

        // 5. Borrow cap
        if let Some(limit) = reserve.risk.borrow_limit_base_units {
            let remaining = remaining_capacity(limit, reserve.total_borrowed_display(), reserve);
            if amount > remaining {
                return Err(Rejection::BorrowLimitExceeded { remaining });
            }
        }

        // 6. Protocol minimum
        self.ensure_minimum(amount)?;

        // 7. Projected health factor
        let projected =
            self.projected_health_factor(portfolio, ActionKind::Borrow, reserve, amount);
        if projected.is_below(policy.borrow_floor) {
            return Err(Rejection::HealthFactorTooLow {
                projected,
                floor: policy.borrow_floor,
            });
        }

        Ok(self.low_health_caution(projected))
    }

    // -----------------------------------------------------------------------
    // Repay
    // -----------------------------------------------------------------------

    fn check_repay(&self, request: &ActionRequest, reserve: &ReserveSnapshot) -> Gate {
        let amount = request.amount;

        ensure_positive(amount)?;

        if request.asset_borrowed_base_units == 0 {
            return Err(Rejection::NothingBorrowed);
        }

        if amount > request.spendable_balance {
            return Err(Rejection::InsufficientBalance {
                amount,
                balance: request.spendable_balance,
            });
        }

        let outstanding =
            to_display_units(request.asset_borrowed_base_units, reserve.risk.decimals);
        if amount > outstanding {
            return Ok(Some(Caution::RepayClamped {
                requested: amount,
                outstanding,
            }));
        }

        Ok(None)
    }

    // -----------------------------------------------------------------------
    // Withdraw
    // -----------------------------------------------------------------------

    fn check_withdraw(
        &self,
        request: &ActionRequest,
        reserve: &ReserveSnapshot,
        portfolio: &PortfolioSnapshot,
    ) -> Gate {
        let amount = request.amount;
        let policy = self.policy();

        ensure_positive(amount)?;

        let supplied = to_display_units(request.asset_supplied_base_units, reserve.risk.decimals);
        if amount > supplied {
            return Err(Rejection::ExceedsSupplied { amount, supplied });
        }

        // Without debt a full exit is always allowed.
        if !portfolio.has_debt() {
            return Ok(None);
        }

        let projected =
            self.projected_health_factor(portfolio, ActionKind::Withdraw, reserve, amount);
        if projected.is_below(policy.withdraw_floor) {
            return Err(Rejection::WouldBeLiquidatable {
                projected,
                floor: policy.withdraw_floor,
            });
        }
        if projected.is_below(policy.thresholds.caution) {
            return Err(Rejection::HealthFactorTooLow {
                projected,
                floor: policy.thresholds.caution,
            });
        }

        Ok(self.low_health_caution(projected))
    }

    // -----------------------------------------------------------------------
    // Shared gates
    // -----------------------------------------------------------------------

    fn ensure_minimum(&self, amount: Decimal) -> Result<(), Rejection> {
        let minimum = self.policy().min_action_amount;
        if amount < minimum {
            return Err(Rejection::BelowMinimum { amount, minimum });
        }
        Ok(())
    }

    /// Degenerate simulations project HF 0, so they fail every floor.
    fn projected_health_factor(
        &self,
        portfolio: &PortfolioSnapshot,
        kind: ActionKind,
        reserve: &ReserveSnapshot,
        amount: Decimal,
    ) -> HealthFactor {
        self.simulator
            .simulate(portfolio, kind, reserve, amount)
            .projected_health_factor
    }

    fn low_health_caution(&self, projected: HealthFactor) -> Option<Caution> {
        let threshold = self.policy().thresholds.safe;
        projected
            .is_below(threshold)
            .then_some(Caution::LowHealthFactor {
                projected,
                threshold,
            })
    }
}

fn ensure_positive(amount: Decimal) -> Result<(), Rejection> {
    if amount <= Decimal::ZERO {
        return Err(Rejection::NonPositiveAmount);
    }
    Ok(())
}

/// Display-unit headroom under a base-unit cap, never negative.
fn remaining_capacity(
    limit_base_units: u128,
    used_display: Decimal,
    reserve: &ReserveSnapshot,
) -> Decimal {
    let limit = to_display_units(limit_base_units, reserve.risk.decimals);
    limit.saturating_sub(used_display).max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::health::health_factor;
    use crate::types::{AssetPosition, InterestRateCurveConfig, ReserveRiskParameters};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    /// 6-decimal stablecoin reserve priced at $1.
    fn reserve(ltv: u32, lt: u32) -> ReserveSnapshot {
        ReserveSnapshot {
            asset: "USDC".into(),
            price_usd: dec!(1),
            risk: ReserveRiskParameters::new(ltv, lt, 1000, 6).unwrap(),
            curve: InterestRateCurveConfig::new(dec!(0), dec!(4), dec!(60), dec!(80)).unwrap(),
            total_borrowed_base_units: 0,
            total_cash_base_units: 0,
        }
    }

    fn portfolio(supplied: Decimal, borrowed: Decimal, hf: HealthFactor) -> PortfolioSnapshot {
        PortfolioSnapshot::new(supplied, borrowed, hf)
    }

    fn no_debt() -> PortfolioSnapshot {
        portfolio(dec!(1000), Decimal::ZERO, HealthFactor::Infinite)
    }

    fn validator() -> Validator {
        Validator::default()
    }

    fn reason(result: &ValidationResult) -> String {
        result.rejection_reason().unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Supply
    // -----------------------------------------------------------------------

    #[test]
    fn test_supply_exceeding_balance_rejected() {
        let req = ActionRequest::new(ActionKind::Supply, dec!(1000)).with_balance(dec!(500));
        let r = validator().validate(&req, &reserve(7500, 8000), &no_debt());
        assert!(!r.is_accepted());
        assert!(reason(&r).contains("insufficient balance"));
    }

    #[test]
    fn test_supply_below_minimum_rejected() {
        let req = ActionRequest::new(ActionKind::Supply, dec!(0.0001)).with_balance(dec!(100));
        let r = validator().validate(&req, &reserve(7500, 8000), &no_debt());
        assert!(!r.is_accepted());
        assert!(reason(&r).contains("minimum"));
    }

    #[test]
    fn test_non_positive_amount_rejected_first() {
        for kind in [
            ActionKind::Supply,
            ActionKind::Borrow,
            ActionKind::Repay,
            ActionKind::Withdraw,
        ] {
            let req = ActionRequest::new(kind, Decimal::ZERO);
            let r = validator().validate(&req, &reserve(7500, 8000), &no_debt());
            assert_eq!(r.rejection(), Some(&Rejection::NonPositiveAmount), "{kind:?}");
        }
    }

    #[test]
    fn test_supply_deposit_limit() {
        let mut res = reserve(7500, 8000);
        res.risk = res.risk.with_deposit_limit(1_000_000_000); // 1000 USDC
        res.total_cash_base_units = 900_000_000;

        let req = ActionRequest::new(ActionKind::Supply, dec!(150)).with_balance(dec!(500));
        let r = validator().validate(&req, &res, &no_debt());
        assert_eq!(
            r.rejection(),
            Some(&Rejection::DepositLimitExceeded { remaining: dec!(100) })
        );

        let req = ActionRequest::new(ActionKind::Supply, dec!(100)).with_balance(dec!(500));
        assert!(validator().validate(&req, &res, &no_debt()).is_accepted());
    }

    #[test]
    fn test_supply_accepted_without_caution() {
        let req = ActionRequest::new(ActionKind::Supply, dec!(10)).with_balance(dec!(10));
        let r = validator().validate(&req, &reserve(7500, 8000), &no_debt());
        assert_eq!(r, ValidationResult::accept());
    }

    // -----------------------------------------------------------------------
    // Borrow
    // -----------------------------------------------------------------------

    #[test]
    fn test_borrow_without_collateral_rejected() {
        let empty = portfolio(Decimal::ZERO, Decimal::ZERO, HealthFactor::Infinite);
        let req = ActionRequest::new(ActionKind::Borrow, dec!(10)).with_liquidity(dec!(1000));
        let r = validator().validate(&req, &reserve(7500, 8000), &empty);
        assert_eq!(r.rejection(), Some(&Rejection::CollateralRequired));
    }

    #[test]
    fn test_borrow_beyond_liquidity_rejected() {
        let req = ActionRequest::new(ActionKind::Borrow, dec!(100)).with_liquidity(dec!(50));
        let r = validator().validate(&req, &reserve(7500, 8000), &no_debt());
        assert!(reason(&r).contains("insufficient liquidity"));
    }

    #[test]
    fn test_borrow_beyond_borrowing_power_rejected() {
        let p = portfolio(dec!(1000), dec!(300), HealthFactor::Finite(dec!(2.0)));
        let req =
            ActionRequest::new(ActionKind::Borrow, dec!(500)).with_liquidity(dec!(10_000));
        let r = validator().validate(&req, &reserve(7500, 8000), &p);
        assert_eq!(
            r.rejection(),
            Some(&Rejection::ExceedsBorrowingPower {
                requested_usd: dec!(500),
                available_usd: dec!(450),
            })
        );
    }

    #[test]
    fn test_borrow_limit_rejected() {
        let mut res = reserve(7500, 8000);
        res.risk = res.risk.with_borrow_limit(50_000_000); // 50 USDC
        res.total_borrowed_base_units = 45_000_000;
        let req = ActionRequest::new(ActionKind::Borrow, dec!(10)).with_liquidity(dec!(1000));
        let r = validator().validate(&req, &res, &no_debt());
        assert_eq!(
            r.rejection(),
            Some(&Rejection::BorrowLimitExceeded { remaining: dec!(5) })
        );
    }

    #[test]
    fn test_borrow_below_minimum_rejected() {
        let req =
            ActionRequest::new(ActionKind::Borrow, dec!(0.0005)).with_liquidity(dec!(1000));
        let r = validator().validate(&req, &reserve(7500, 8000), &no_debt());
        assert!(reason(&r).contains("minimum"));
    }

    #[test]
    fn test_borrow_near_liquidation_rejected() {
        // Borrowing power leaves room (950 - 900 = 50), but 960 / 910 < 1.1.
        let p = portfolio(dec!(1000), dec!(900), HealthFactor::Finite(dec!(1.05)));
        let req = ActionRequest::new(ActionKind::Borrow, dec!(10)).with_liquidity(dec!(1000));
        let r = validator().validate(&req, &reserve(9500, 9600), &p);
        assert!(!r.is_accepted());
        assert!(reason(&r).contains("health factor too low"), "got {}", reason(&r));
    }

    #[test]
    fn test_borrow_in_caution_band_needs_confirmation() {
        // 800 / 600 = 1.33
        let p = portfolio(dec!(1000), dec!(400), HealthFactor::Finite(dec!(2.0)));
        let req = ActionRequest::new(ActionKind::Borrow, dec!(200)).with_liquidity(dec!(1000));
        let r = validator().validate(&req, &reserve(8000, 8000), &p);
        assert!(r.is_accepted());
        assert!(r.needs_confirmation());
        assert!(matches!(r.caution(), Some(Caution::LowHealthFactor { .. })));
        assert!(r.caution_note().unwrap().contains("1.33"));
    }

    #[test]
    fn test_borrow_comfortably_accepted() {
        let p = portfolio(dec!(1000), dec!(100), HealthFactor::Finite(dec!(8.0)));
        let req = ActionRequest::new(ActionKind::Borrow, dec!(100)).with_liquidity(dec!(1000));
        let r = validator().validate(&req, &reserve(7500, 8000), &p);
        assert_eq!(r, ValidationResult::accept());
    }

    // -----------------------------------------------------------------------
    // Repay
    // -----------------------------------------------------------------------

    #[test]
    fn test_repay_with_nothing_borrowed_rejected() {
        let req = ActionRequest::new(ActionKind::Repay, dec!(10)).with_balance(dec!(100));
        let r = validator().validate(&req, &reserve(7500, 8000), &no_debt());
        assert_eq!(r.rejection(), Some(&Rejection::NothingBorrowed));
    }

    #[test]
    fn test_repay_exceeding_balance_rejected() {
        let req = ActionRequest::new(ActionKind::Repay, dec!(50))
            .with_balance(dec!(20))
            .with_position(0, 100_000_000);
        let p = portfolio(dec!(1000), dec!(100), HealthFactor::Finite(dec!(8.0)));
        let r = validator().validate(&req, &reserve(7500, 8000), &p);
        assert!(reason(&r).contains("insufficient balance"));
    }

    #[test]
    fn test_repay_over_outstanding_is_clamped() {
        // 100 USDC owed, 150 offered.
        let req = ActionRequest::new(ActionKind::Repay, dec!(150))
            .with_balance(dec!(500))
            .with_position(0, 100_000_000);
        let p = portfolio(dec!(1000), dec!(100), HealthFactor::Finite(dec!(8.0)));
        let r = validator().validate(&req, &reserve(7500, 8000), &p);
        assert!(r.is_accepted());
        assert_eq!(
            r.caution(),
            Some(&Caution::RepayClamped {
                requested: dec!(150),
                outstanding: dec!(100),
            })
        );
    }

    #[test]
    fn test_partial_repay_accepted_plainly() {
        let req = ActionRequest::new(ActionKind::Repay, dec!(40))
            .with_balance(dec!(500))
            .with_position(0, 100_000_000);
        let p = portfolio(dec!(1000), dec!(100), HealthFactor::Finite(dec!(8.0)));
        assert_eq!(
            validator().validate(&req, &reserve(7500, 8000), &p),
            ValidationResult::accept()
        );
    }

    // -----------------------------------------------------------------------
    // Withdraw
    // -----------------------------------------------------------------------

    #[test]
    fn test_withdraw_exceeding_supplied_rejected() {
        let req = ActionRequest::new(ActionKind::Withdraw, dec!(1001))
            .with_position(1_000_000_000, 0);
        let r = validator().validate(&req, &reserve(7500, 8000), &no_debt());
        assert!(reason(&r).contains("exceeds supplied amount"));
    }

    #[test]
    fn test_withdraw_underwater_rejected() {
        // 1000 * 0.8 = 800 collateral, 500 debt. Withdrawing 500 leaves 400 / 500.
        let p = portfolio(dec!(1000), dec!(500), HealthFactor::Finite(dec!(1.6)));
        let req = ActionRequest::new(ActionKind::Withdraw, dec!(500))
            .with_position(1_000_000_000, 0);
        let r = validator().validate(&req, &reserve(7500, 8000), &p);
        assert!(
            reason(&r).contains("health factor would drop below 1.0"),
            "got {}",
            reason(&r)
        );
    }

    #[test]
    fn test_withdraw_below_caution_line_rejected() {
        // 700 * 0.8 = 560 / 500 = 1.12
        let p = portfolio(dec!(1000), dec!(500), HealthFactor::Finite(dec!(1.6)));
        let req = ActionRequest::new(ActionKind::Withdraw, dec!(300))
            .with_position(1_000_000_000, 0);
        let r = validator().validate(&req, &reserve(7500, 8000), &p);
        assert!(matches!(r.rejection(), Some(Rejection::HealthFactorTooLow { .. })));
        assert!(reason(&r).contains("health factor too low"));
    }

    #[test]
    fn test_withdraw_in_caution_band_needs_confirmation() {
        // 850 * 0.8 = 680 / 500 = 1.36
        let p = portfolio(dec!(1000), dec!(500), HealthFactor::Finite(dec!(1.6)));
        let req = ActionRequest::new(ActionKind::Withdraw, dec!(150))
            .with_position(1_000_000_000, 0);
        let r = validator().validate(&req, &reserve(7500, 8000), &p);
        assert!(r.needs_confirmation());
    }

    #[test]
    fn test_withdraw_of_asset_missing_from_positions_rejected() {
        // APT 100 and USDC 900, both at 80%: 800 collateral against 600 debt.
        let p = PortfolioSnapshot::from_positions(vec![
            AssetPosition {
                asset: "APT".into(),
                supplied_usd: dec!(100),
                borrowed_usd: Decimal::ZERO,
                liquidation_threshold_bips: 8000,
            },
            AssetPosition {
                asset: "USDC".into(),
                supplied_usd: dec!(900),
                borrowed_usd: dec!(600),
                liquidation_threshold_bips: 8000,
            },
        ]);
        let mut btc = reserve(7500, 8000);
        btc.asset = "BTC".into();
        let req = ActionRequest::new(ActionKind::Withdraw, dec!(500))
            .with_position(500_000_000, 0);

        let r = validator().validate(&req, &btc, &p);
        assert!(matches!(r.rejection(), Some(Rejection::WouldBeLiquidatable { .. })));
    }

    #[test]
    fn test_withdraw_full_exit_without_debt_accepted() {
        let req = ActionRequest::new(ActionKind::Withdraw, dec!(1000))
            .with_position(1_000_000_000, 0);
        let r = validator().validate(&req, &reserve(7500, 8000), &no_debt());
        assert_eq!(r, ValidationResult::accept());
    }

    #[test]
    fn test_configured_floors_are_honoured() {
        let strict = Validator::new(RiskPolicy {
            borrow_floor: dec!(1.4),
            ..RiskPolicy::default()
        });
        // 800 / 600 = 1.33: cautioned by default, rejected under a 1.4 floor.
        let p = portfolio(dec!(1000), dec!(400), HealthFactor::Finite(dec!(2.0)));
        let req = ActionRequest::new(ActionKind::Borrow, dec!(200)).with_liquidity(dec!(1000));
        assert!(validator().validate(&req, &reserve(8000, 8000), &p).is_accepted());
        assert!(!strict.validate(&req, &reserve(8000, 8000), &p).is_accepted());
    }

    proptest! {
        #[test]
        fn accepted_borrow_never_breaches_floor(
            supplied in 1u64..1_000_000,
            borrowed in 0u64..1_000_000,
            amount in 1u64..1_000_000,
            ltv in 0u32..=10_000,
            lt in 0u32..=10_000,
        ) {
            let supplied = Decimal::from(supplied);
            let borrowed = Decimal::from(borrowed);
            let res = reserve(ltv, lt);
            let lt_fraction = Decimal::from(lt) / dec!(10_000);
            let p = portfolio(supplied, borrowed, health_factor(supplied * lt_fraction, borrowed));
            let req = ActionRequest::new(ActionKind::Borrow, Decimal::from(amount))
                .with_liquidity(dec!(10_000_000));

            let v = validator();
            let result = v.validate(&req, &res, &p);
            if result.is_accepted() {
                let projected = v
                    .simulator()
                    .simulate(&p, ActionKind::Borrow, &res, Decimal::from(amount))
                    .projected_health_factor;
                prop_assert!(!projected.is_below(dec!(1.1)), "accepted at {projected}");
            }
        }

        #[test]
        fn full_exit_without_debt_always_accepted(supplied in 1u64..u64::MAX) {
            let amount = to_display_units(u128::from(supplied), 6);
            let req = ActionRequest::new(ActionKind::Withdraw, amount)
                .with_position(u128::from(supplied), 0);
            let r = validator().validate(&req, &reserve(7500, 8000), &no_debt());
            prop_assert!(r.is_accepted());
        }
    }
}
