pub mod action;
pub mod health;
pub mod outcome;
pub mod portfolio;
pub mod reserve;
pub mod units;

pub use action::{ActionKind, ActionRequest};
pub use health::{HealthBand, HealthFactor, SafetyTier};
pub use outcome::{
    BorrowingPower, Caution, LiquidationDistance, RateSnapshot, Rejection, SimulationResult,
    ValidationResult,
};
pub use portfolio::{AssetPosition, PortfolioSnapshot};
pub use reserve::{InterestRateCurveConfig, ReserveRiskParameters, ReserveSnapshot};
