use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ---------------------------------------------------------------------------
// Numeric Constants
// ---------------------------------------------------------------------------

/// 10_000 basis points = 100%.
pub const BPS_DENOMINATOR: Decimal = dec!(10_000);

/// Percent scale.
pub const ONE_HUNDRED: Decimal = dec!(100);

/// Borrow values below this are treated as fully repaid (health factor = infinite).
pub const DEBT_EPSILON_USD: Decimal = dec!(0.000000001);

/// Seconds in a non-leap year.
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Largest integer `Decimal` can hold without losing digits (2^96 - 1).
pub const MAX_DECIMAL_MANTISSA: u128 = 79_228_162_514_264_337_593_543_950_335;

// ---------------------------------------------------------------------------
// Default Risk Policy
// ---------------------------------------------------------------------------

/// At or above: Safe (strong).
pub const DEFAULT_STRONG_HEALTH_FACTOR: Decimal = dec!(2.0);

/// At or above: Safe (moderate). Below: at risk, caution notes attached.
pub const DEFAULT_SAFE_HEALTH_FACTOR: Decimal = dec!(1.5);

/// At or above: Caution. Below: Danger. Withdrawals are rejected below this line.
pub const DEFAULT_CAUTION_HEALTH_FACTOR: Decimal = dec!(1.2);

/// Borrows projected below this are rejected outright.
pub const DEFAULT_BORROW_FLOOR: Decimal = dec!(1.1);

/// Withdrawals may never leave a position underwater.
pub const DEFAULT_WITHDRAW_FLOOR: Decimal = dec!(1.0);

/// Smallest supply/borrow the protocol accepts, in display units.
pub const DEFAULT_MIN_ACTION_AMOUNT: Decimal = dec!(0.001);
