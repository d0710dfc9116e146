use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BORROW_FLOOR, DEFAULT_CAUTION_HEALTH_FACTOR, DEFAULT_MIN_ACTION_AMOUNT,
    DEFAULT_SAFE_HEALTH_FACTOR, DEFAULT_STRONG_HEALTH_FACTOR, DEFAULT_WITHDRAW_FLOOR,
};
use crate::types::{HealthBand, HealthFactor};

// ---------------------------------------------------------------------------
// Top-level aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub app: AppConfig,
    pub policy: RiskPolicy,
}

// ---------------------------------------------------------------------------
// app.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Directory for the rolling JSON log. `None` logs to stderr only.
    #[serde(default)]
    pub log_dir: Option<String>,
    #[serde(default = "default_log_filter")]
    pub default_filter: String,
}

fn default_log_filter() -> String {
    "risk_engine=info,warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            default_filter: default_log_filter(),
        }
    }
}

// ---------------------------------------------------------------------------
// policy.json
// ---------------------------------------------------------------------------

/// Health-factor band boundaries shared by the simulator, the validator and
/// any caller labelling a health factor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthThresholds {
    /// At or above: Safe (strong).
    #[serde(with = "rust_decimal::serde::str")]
    pub strong: Decimal,
    /// At or above: Safe (moderate). Below: at risk.
    #[serde(with = "rust_decimal::serde::str")]
    pub safe: Decimal,
    /// At or above: Caution. Below: Danger.
    #[serde(with = "rust_decimal::serde::str")]
    pub caution: Decimal,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            strong: DEFAULT_STRONG_HEALTH_FACTOR,
            safe: DEFAULT_SAFE_HEALTH_FACTOR,
            caution: DEFAULT_CAUTION_HEALTH_FACTOR,
        }
    }
}

impl HealthThresholds {
    /// Classify a health factor into a band. Lower bounds are inclusive.
    pub fn classify(&self, hf: HealthFactor) -> HealthBand {
        let value = match hf {
            HealthFactor::Infinite => return HealthBand::Strong,
            HealthFactor::Finite(v) => v,
        };
        if value >= self.strong {
            HealthBand::Strong
        } else if value >= self.safe {
            HealthBand::Moderate
        } else if value >= self.caution {
            HealthBand::Caution
        } else {
            HealthBand::Danger
        }
    }

    /// Below the safe line.
    pub fn is_at_risk(&self, hf: HealthFactor) -> bool {
        hf.is_below(self.safe)
    }
}

/// How the simulator weights collateral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMode {
    /// Per-asset liquidation thresholds, summed.
    #[default]
    Aggregated,
    /// Whole portfolio weighted by the acted-on reserve's threshold. An approximation.
    SingleReserve,
}

impl FromStr for SimulationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aggregated" => Ok(Self::Aggregated),
            "single_reserve" | "single-reserve" => Ok(Self::SingleReserve),
            other => Err(format!("unknown simulation mode '{other}'")),
        }
    }
}

/// Every risk threshold the engine applies, in one place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskPolicy {
    #[serde(default)]
    pub thresholds: HealthThresholds,
    /// Borrows projected below this are rejected.
    #[serde(with = "rust_decimal::serde::str")]
    pub borrow_floor: Decimal,
    /// Withdrawals projected below this are rejected as liquidatable.
    #[serde(with = "rust_decimal::serde::str")]
    pub withdraw_floor: Decimal,
    /// Smallest supply/borrow accepted, in display units.
    #[serde(with = "rust_decimal::serde::str")]
    pub min_action_amount: Decimal,
    #[serde(default)]
    pub simulation_mode: SimulationMode,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            thresholds: HealthThresholds::default(),
            borrow_floor: DEFAULT_BORROW_FLOOR,
            withdraw_floor: DEFAULT_WITHDRAW_FLOOR,
            min_action_amount: DEFAULT_MIN_ACTION_AMOUNT,
            simulation_mode: SimulationMode::default(),
        }
    }
}
