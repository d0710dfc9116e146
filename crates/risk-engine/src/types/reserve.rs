use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::ONE_HUNDRED;
use crate::core::interest_rate::compute_rates;
use crate::errors::RiskError;

use super::outcome::RateSnapshot;
use super::units::to_display_units;

const MAX_BPS: u32 = 10_000;

/// Per-asset protocol risk configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveRiskParameters {
    /// Share of supplied value counted as borrowing power.
    pub loan_to_value_bips: u32,
    /// Share of supplied value counted as liquidation-safe collateral.
    /// Expected to be >= `loan_to_value_bips`; the engine does not enforce it.
    pub liquidation_threshold_bips: u32,
    /// Protocol cut of borrow interest.
    pub reserve_factor_bips: u32,
    #[serde(default)]
    pub deposit_limit_base_units: Option<u128>,
    #[serde(default)]
    pub borrow_limit_base_units: Option<u128>,
    pub decimals: u8,
}

impl ReserveRiskParameters {
    pub fn new(
        loan_to_value_bips: u32,
        liquidation_threshold_bips: u32,
        reserve_factor_bips: u32,
        decimals: u8,
    ) -> Result<Self, RiskError> {
        let params = Self {
            loan_to_value_bips,
            liquidation_threshold_bips,
            reserve_factor_bips,
            deposit_limit_base_units: None,
            borrow_limit_base_units: None,
            decimals,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn with_deposit_limit(mut self, limit_base_units: u128) -> Self {
        self.deposit_limit_base_units = Some(limit_base_units);
        self
    }

    pub fn with_borrow_limit(mut self, limit_base_units: u128) -> Self {
        self.borrow_limit_base_units = Some(limit_base_units);
        self
    }

    /// All basis-point fields must lie in [0, 10000].
    pub fn validate(&self) -> Result<(), RiskError> {
        for (name, bps) in [
            ("loan_to_value_bips", self.loan_to_value_bips),
            ("liquidation_threshold_bips", self.liquidation_threshold_bips),
            ("reserve_factor_bips", self.reserve_factor_bips),
        ] {
            if bps > MAX_BPS {
                return Err(RiskError::InvalidReserve {
                    reason: format!("{name} ({bps}) exceeds {MAX_BPS}"),
                });
            }
        }
        Ok(())
    }
}

/// Kinked utilization curve for one reserve, all figures in percent.
///
/// Invariants (checked on construction and deserialization):
/// `0 <= min <= optimal <= max` and `0 < optimal_utilization_pct < 100`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CurveParams")]
pub struct InterestRateCurveConfig {
    #[serde(with = "rust_decimal::serde::str")]
    pub min_borrow_rate_pct: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub optimal_borrow_rate_pct: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub max_borrow_rate_pct: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub optimal_utilization_pct: Decimal,
}

impl InterestRateCurveConfig {
    pub fn new(
        min_borrow_rate_pct: Decimal,
        optimal_borrow_rate_pct: Decimal,
        max_borrow_rate_pct: Decimal,
        optimal_utilization_pct: Decimal,
    ) -> Result<Self, RiskError> {
        let curve = Self {
            min_borrow_rate_pct,
            optimal_borrow_rate_pct,
            max_borrow_rate_pct,
            optimal_utilization_pct,
        };
        curve.validate()?;
        Ok(curve)
    }

    pub fn validate(&self) -> Result<(), RiskError> {
        let invalid = |reason: String| -> Result<(), RiskError> {
            Err(RiskError::InvalidCurve { reason })
        };

        if self.min_borrow_rate_pct.is_sign_negative() {
            return invalid(format!(
                "min_borrow_rate_pct ({}) must be >= 0",
                self.min_borrow_rate_pct
            ));
        }
        if self.min_borrow_rate_pct > self.optimal_borrow_rate_pct {
            return invalid(format!(
                "min_borrow_rate_pct ({}) must be <= optimal_borrow_rate_pct ({})",
                self.min_borrow_rate_pct, self.optimal_borrow_rate_pct
            ));
        }
        if self.optimal_borrow_rate_pct > self.max_borrow_rate_pct {
            return invalid(format!(
                "optimal_borrow_rate_pct ({}) must be <= max_borrow_rate_pct ({})",
                self.optimal_borrow_rate_pct, self.max_borrow_rate_pct
            ));
        }
        if self.optimal_utilization_pct <= Decimal::ZERO
            || self.optimal_utilization_pct >= ONE_HUNDRED
        {
            return invalid(format!(
                "optimal_utilization_pct ({}) must be in (0, 100)",
                self.optimal_utilization_pct
            ));
        }
        Ok(())
    }
}

/// Wire form of [`InterestRateCurveConfig`] before its invariants are checked.
#[derive(Deserialize)]
struct CurveParams {
    #[serde(with = "rust_decimal::serde::str")]
    min_borrow_rate_pct: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    optimal_borrow_rate_pct: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    max_borrow_rate_pct: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    optimal_utilization_pct: Decimal,
}

impl TryFrom<CurveParams> for InterestRateCurveConfig {
    type Error = RiskError;

    fn try_from(p: CurveParams) -> Result<Self, Self::Error> {
        Self::new(
            p.min_borrow_rate_pct,
            p.optimal_borrow_rate_pct,
            p.max_borrow_rate_pct,
            p.optimal_utilization_pct,
        )
    }
}

/// Everything the engine needs to know about one reserve, as fetched by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveSnapshot {
    /// Asset identifier, matched against [`super::AssetPosition::asset`].
    pub asset: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price_usd: Decimal,
    pub risk: ReserveRiskParameters,
    pub curve: InterestRateCurveConfig,
    #[serde(default)]
    pub total_borrowed_base_units: u128,
    #[serde(default)]
    pub total_cash_base_units: u128,
}

impl ReserveSnapshot {
    /// Parse a reserve record from JSON and check it.
    pub fn from_json(raw: &str) -> Result<Self, RiskError> {
        let reserve: Self = serde_json::from_str(raw)?;
        reserve.validate()?;
        Ok(reserve)
    }

    /// Check data handed over by collaborators before it reaches the engine.
    pub fn validate(&self) -> Result<(), RiskError> {
        if self.price_usd.is_sign_negative() {
            return Err(RiskError::InvalidReserve {
                reason: format!("{}: price_usd ({}) must be >= 0", self.asset, self.price_usd),
            });
        }
        self.risk.validate()?;
        self.curve.validate()
    }

    pub fn total_supply_base_units(&self) -> u128 {
        self.total_borrowed_base_units
            .saturating_add(self.total_cash_base_units)
    }

    pub fn total_supply_display(&self) -> Decimal {
        to_display_units(self.total_supply_base_units(), self.risk.decimals)
    }

    pub fn total_borrowed_display(&self) -> Decimal {
        to_display_units(self.total_borrowed_base_units, self.risk.decimals)
    }

    /// Current utilization and APRs for this reserve.
    pub fn rates(&self) -> RateSnapshot {
        compute_rates(
            &self.curve,
            self.risk.reserve_factor_bips,
            self.total_borrowed_base_units,
            self.total_cash_base_units,
        )
    }
}
