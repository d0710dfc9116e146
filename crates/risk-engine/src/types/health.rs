use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Risk-weighted collateral over debt.
///
/// `Infinite` is a legitimate value (nothing borrowed), not an error. Ordering
/// puts every finite value below `Infinite`. Serialized as a decimal string,
/// or `"inf"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum HealthFactor {
    Finite(Decimal),
    Infinite,
}

impl HealthFactor {
    pub const ZERO: HealthFactor = HealthFactor::Finite(Decimal::ZERO);

    pub fn is_infinite(&self) -> bool {
        matches!(self, Self::Infinite)
    }

    /// The finite value, or `None` for an infinite health factor.
    pub fn value(&self) -> Option<Decimal> {
        match self {
            Self::Finite(v) => Some(*v),
            Self::Infinite => None,
        }
    }

    /// Strictly below `threshold`. Infinite is never below anything.
    pub fn is_below(&self, threshold: Decimal) -> bool {
        matches!(self, Self::Finite(v) if *v < threshold)
    }
}

impl fmt::Display for HealthFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(v) => fmt::Display::fmt(v, f),
            Self::Infinite => f.write_str("inf"),
        }
    }
}

impl From<HealthFactor> for String {
    fn from(hf: HealthFactor) -> Self {
        match hf {
            HealthFactor::Finite(v) => v.normalize().to_string(),
            HealthFactor::Infinite => "inf".to_string(),
        }
    }
}

impl TryFrom<String> for HealthFactor {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl FromStr for HealthFactor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("inf") || trimmed.eq_ignore_ascii_case("infinity") {
            return Ok(Self::Infinite);
        }
        let v = Decimal::from_str(trimmed)
            .map_err(|e| format!("invalid health factor '{s}': {e}"))?;
        if v.is_sign_negative() {
            return Err(format!("health factor must not be negative, got {s}"));
        }
        Ok(Self::Finite(v))
    }
}

/// Coarse classification used for gating and UI colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyTier {
    Safe,
    Caution,
    Danger,
}

impl SafetyTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Caution => "caution",
            Self::Danger => "danger",
        }
    }
}

/// Finer classification: the two Safe sub-bands plus Caution and Danger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthBand {
    /// HF >= 2.0 (default policy).
    Strong,
    /// 1.5 <= HF < 2.0.
    Moderate,
    /// 1.2 <= HF < 1.5.
    Caution,
    /// HF < 1.2.
    Danger,
}

impl HealthBand {
    pub fn tier(&self) -> SafetyTier {
        match self {
            Self::Strong | Self::Moderate => SafetyTier::Safe,
            Self::Caution => SafetyTier::Caution,
            Self::Danger => SafetyTier::Danger,
        }
    }

    /// Short label for display next to a health factor.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Strong => "Very safe",
            Self::Moderate => "Safe",
            Self::Caution => "Caution",
            Self::Danger => "Liquidation risk",
        }
    }
}
