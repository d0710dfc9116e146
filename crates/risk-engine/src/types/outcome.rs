use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use super::action::ActionKind;
use super::health::{HealthBand, HealthFactor, SafetyTier};

/// Utilization and APRs derived from a reserve's curve, all in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateSnapshot {
    #[serde(with = "rust_decimal::serde::str")]
    pub utilization_pct: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub borrow_apr_pct: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub supply_apr_pct: Decimal,
}

impl RateSnapshot {
    pub const ZERO: RateSnapshot = RateSnapshot {
        utilization_pct: Decimal::ZERO,
        borrow_apr_pct: Decimal::ZERO,
        supply_apr_pct: Decimal::ZERO,
    };
}

/// Borrowing capacity implied by a loan-to-value ratio, in USD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BorrowingPower {
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub used: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub available: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub utilization_pct: Decimal,
}

/// How far a position is from liquidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LiquidationDistance {
    /// Collateral headroom in USD; `None` means infinite (nothing borrowed).
    #[serde(with = "rust_decimal::serde::str_option")]
    pub distance_usd: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str")]
    pub percent_to_liquidation: Decimal,
    pub is_at_risk: bool,
}

/// Projected state of a portfolio after a hypothetical action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationResult {
    pub kind: ActionKind,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount_usd: Decimal,
    pub current_health_factor: HealthFactor,
    pub projected_health_factor: HealthFactor,
    #[serde(with = "rust_decimal::serde::str")]
    pub projected_collateral_value_usd: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub projected_borrow_value_usd: Decimal,
    pub safety_tier: SafetyTier,
    pub band: HealthBand,
    /// Asset price at which the projected position hits HF = 1 (Borrow/Withdraw).
    #[serde(with = "rust_decimal::serde::str_option")]
    pub estimated_liquidation_price: Option<Decimal>,
    /// Arithmetic could not complete; the result is a fail-closed Danger verdict.
    pub degenerate: bool,
}

/// Why an action was refused. The `Display` text is what a caller shows.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Rejection {
    #[error("amount must be positive")]
    NonPositiveAmount,

    #[error("insufficient balance: {amount} requested, {balance} available")]
    InsufficientBalance { amount: Decimal, balance: Decimal },

    #[error("amount {amount} is below minimum of {minimum}")]
    BelowMinimum { amount: Decimal, minimum: Decimal },

    #[error("exceeds protocol deposit limit: {remaining} remaining")]
    DepositLimitExceeded { remaining: Decimal },

    #[error("collateral required: supply assets before borrowing")]
    CollateralRequired,

    #[error("insufficient liquidity: {amount} requested, {available} available in pool")]
    InsufficientLiquidity { amount: Decimal, available: Decimal },

    #[error("exceeds borrowing power: ${requested_usd:.2} requested, ${available_usd:.2} available")]
    ExceedsBorrowingPower {
        requested_usd: Decimal,
        available_usd: Decimal,
    },

    #[error("exceeds protocol borrow limit: {remaining} remaining")]
    BorrowLimitExceeded { remaining: Decimal },

    #[error("health factor too low: projected {projected:.2}, minimum {floor}")]
    HealthFactorTooLow {
        projected: HealthFactor,
        floor: Decimal,
    },

    #[error("health factor would drop below {floor} (projected {projected:.2})")]
    WouldBeLiquidatable {
        projected: HealthFactor,
        floor: Decimal,
    },

    #[error("nothing borrowed: no outstanding debt to repay")]
    NothingBorrowed,

    #[error("exceeds supplied amount: {amount} requested, {supplied} supplied")]
    ExceedsSupplied { amount: Decimal, supplied: Decimal },
}

/// Advisory attached to an accepted action; callers should ask for confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Caution {
    LowHealthFactor {
        projected: HealthFactor,
        threshold: Decimal,
    },
    RepayClamped {
        requested: Decimal,
        outstanding: Decimal,
    },
}

impl fmt::Display for Caution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowHealthFactor {
                projected,
                threshold,
            } => write!(
                f,
                "projected health factor {projected:.2} is below {threshold}; position will be close to liquidation"
            ),
            Self::RepayClamped {
                requested,
                outstanding,
            } => write!(
                f,
                "{requested} exceeds outstanding debt; only {outstanding} will be repaid"
            ),
        }
    }
}

/// Verdict of a pre-flight check.
///
/// A rejection is present iff the action is not accepted; a caution only ever
/// accompanies an accepted action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    accepted: bool,
    rejection: Option<Rejection>,
    caution: Option<Caution>,
}

impl ValidationResult {
    pub fn accept() -> Self {
        Self {
            accepted: true,
            rejection: None,
            caution: None,
        }
    }

    pub fn accept_with_caution(caution: Caution) -> Self {
        Self {
            accepted: true,
            rejection: None,
            caution: Some(caution),
        }
    }

    pub fn reject(rejection: Rejection) -> Self {
        Self {
            accepted: false,
            rejection: Some(rejection),
            caution: None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        self.rejection.as_ref()
    }

    pub fn caution(&self) -> Option<&Caution> {
        self.caution.as_ref()
    }

    pub fn rejection_reason(&self) -> Option<String> {
        self.rejection.as_ref().map(ToString::to_string)
    }

    pub fn caution_note(&self) -> Option<String> {
        self.caution.as_ref().map(ToString::to_string)
    }

    /// Accepted, but the user should confirm first.
    pub fn needs_confirmation(&self) -> bool {
        self.accepted && self.caution.is_some()
    }
}
