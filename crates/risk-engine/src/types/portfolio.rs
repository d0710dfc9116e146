use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::DEBT_EPSILON_USD;
use crate::core::health::{aggregate_collateral_value, health_factor};

use super::health::HealthFactor;

/// One asset's slice of a user's position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPosition {
    pub asset: String,
    #[serde(default, with = "rust_decimal::serde::str")]
    pub supplied_usd: Decimal,
    #[serde(default, with = "rust_decimal::serde::str")]
    pub borrowed_usd: Decimal,
    /// Threshold of the reserve this asset is supplied to.
    pub liquidation_threshold_bips: u32,
}

/// A user's aggregate position at one point in time.
///
/// Rebuilt from fresh position data on every query and never mutated:
/// simulations produce new projected values instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    #[serde(with = "rust_decimal::serde::str")]
    pub total_supplied_usd: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_borrowed_usd: Decimal,
    /// Health factor as reported by the protocol.
    pub health_factor: HealthFactor,
    /// Per-asset breakdown. Empty when the caller only has totals.
    #[serde(default)]
    pub positions: Vec<AssetPosition>,
}

impl PortfolioSnapshot {
    /// Totals-only snapshot.
    pub fn new(
        total_supplied_usd: Decimal,
        total_borrowed_usd: Decimal,
        health_factor: HealthFactor,
    ) -> Self {
        Self {
            total_supplied_usd,
            total_borrowed_usd,
            health_factor,
            positions: Vec::new(),
        }
    }

    /// Build totals and health factor from per-asset positions, weighting each
    /// asset's collateral by its own liquidation threshold.
    pub fn from_positions(positions: Vec<AssetPosition>) -> Self {
        let total_supplied_usd = saturating_sum(positions.iter().map(|p| p.supplied_usd));
        let total_borrowed_usd = saturating_sum(positions.iter().map(|p| p.borrowed_usd));
        let collateral = aggregate_collateral_value(
            positions
                .iter()
                .map(|p| (p.supplied_usd, p.liquidation_threshold_bips)),
        );

        Self {
            total_supplied_usd,
            total_borrowed_usd,
            health_factor: health_factor(collateral, total_borrowed_usd),
            positions,
        }
    }

    pub fn net_balance_usd(&self) -> Decimal {
        self.total_supplied_usd.saturating_sub(self.total_borrowed_usd)
    }

    pub fn has_debt(&self) -> bool {
        self.total_borrowed_usd >= DEBT_EPSILON_USD
    }

    pub fn position(&self, asset: &str) -> Option<&AssetPosition> {
        self.positions.iter().find(|p| p.asset == asset)
    }
}

fn saturating_sum(values: impl Iterator<Item = Decimal>) -> Decimal {
    values.fold(Decimal::ZERO, Decimal::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn position(asset: &str, supplied: Decimal, borrowed: Decimal, lt: u32) -> AssetPosition {
        AssetPosition {
            asset: asset.into(),
            supplied_usd: supplied,
            borrowed_usd: borrowed,
            liquidation_threshold_bips: lt,
        }
    }

    #[test]
    fn test_net_balance() {
        let p = PortfolioSnapshot::new(dec!(1000), dec!(300), HealthFactor::Finite(dec!(2.0)));
        assert_eq!(p.net_balance_usd(), dec!(700));
        assert!(p.has_debt());
    }

    #[test]
    fn test_from_positions_weights_each_asset() {
        // APT: 1000 * 0.75 = 750, USDC: 500 * 0.85 = 425 -> collateral 1175
        let p = PortfolioSnapshot::from_positions(vec![
            position("APT", dec!(1000), Decimal::ZERO, 7500),
            position("USDC", dec!(500), dec!(470), 8500),
        ]);
        assert_eq!(p.total_supplied_usd, dec!(1500));
        assert_eq!(p.total_borrowed_usd, dec!(470));
        assert_eq!(p.health_factor, HealthFactor::Finite(dec!(2.5)));
        assert_eq!(p.position("USDC").unwrap().liquidation_threshold_bips, 8500);
        assert!(p.position("BTC").is_none());
    }

    #[test]
    fn test_from_positions_without_debt_is_infinite() {
        let p = PortfolioSnapshot::from_positions(vec![position(
            "APT",
            dec!(1000),
            Decimal::ZERO,
            7500,
        )]);
        assert!(p.health_factor.is_infinite());
        assert!(!p.has_debt());
    }

    #[test]
    fn test_from_positions_saturates_totals() {
        let p = PortfolioSnapshot::from_positions(vec![
            position("APT", Decimal::MAX, Decimal::MAX, 7500),
            position("USDC", Decimal::MAX, Decimal::MAX, 8500),
        ]);
        assert_eq!(p.total_supplied_usd, Decimal::MAX);
        assert_eq!(p.total_borrowed_usd, Decimal::MAX);
        assert_eq!(p.net_balance_usd(), Decimal::ZERO);
    }

    #[test]
    fn test_deserialize_totals_only() {
        let p: PortfolioSnapshot = serde_json::from_str(
            r#"{ "total_supplied_usd": "1000", "total_borrowed_usd": "0", "health_factor": "inf" }"#,
        )
        .unwrap();
        assert!(p.positions.is_empty());
        assert!(p.health_factor.is_infinite());
    }
}
