use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The four lending actions a user can take against a reserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Supply,
    Borrow,
    Repay,
    Withdraw,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Supply => "supply",
            Self::Borrow => "borrow",
            Self::Repay => "repay",
            Self::Withdraw => "withdraw",
        }
    }

    /// Actions that shrink the safety margin and can carry a liquidation price.
    pub fn reduces_margin(&self) -> bool {
        matches!(self, Self::Borrow | Self::Withdraw)
    }
}

/// An action the user intends to take, with the caller-side context the
/// validator needs. All amounts are display units of the reserve's asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub kind: ActionKind,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    /// Wallet balance the user can spend (Supply, Repay).
    #[serde(default, with = "rust_decimal::serde::str")]
    pub spendable_balance: Decimal,
    /// Liquidity currently available in the pool (Borrow).
    #[serde(default, with = "rust_decimal::serde::str")]
    pub available_liquidity: Decimal,
    /// The user's supplied amount of this asset (Withdraw).
    #[serde(default)]
    pub asset_supplied_base_units: u128,
    /// The user's outstanding debt in this asset (Repay).
    #[serde(default)]
    pub asset_borrowed_base_units: u128,
}

impl ActionRequest {
    pub fn new(kind: ActionKind, amount: Decimal) -> Self {
        Self {
            kind,
            amount,
            spendable_balance: Decimal::ZERO,
            available_liquidity: Decimal::ZERO,
            asset_supplied_base_units: 0,
            asset_borrowed_base_units: 0,
        }
    }

    pub fn with_balance(mut self, spendable_balance: Decimal) -> Self {
        self.spendable_balance = spendable_balance;
        self
    }

    pub fn with_liquidity(mut self, available_liquidity: Decimal) -> Self {
        self.available_liquidity = available_liquidity;
        self
    }

    pub fn with_position(mut self, supplied_base_units: u128, borrowed_base_units: u128) -> Self {
        self.asset_supplied_base_units = supplied_base_units;
        self.asset_borrowed_base_units = borrowed_base_units;
        self
    }
}
