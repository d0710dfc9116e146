use anyhow::{bail, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::types::{EngineConfig, LoggingConfig, RiskPolicy};

/// Validate invariants across the merged config that serde alone cannot enforce.
///
/// Every problem is collected so one run reports them all. Called
/// automatically by [`super::load_config`].
pub fn validate_config(config: &EngineConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    validate_logging_config(&config.app.logging, &mut errors);
    validate_policy(&config.policy, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        let msg = format!(
            "Configuration validation failed ({} error{}):\n  - {}",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" },
            errors.join("\n  - ")
        );
        bail!("{msg}");
    }
}

// ---------------------------------------------------------------------------
// Logging config
// ---------------------------------------------------------------------------

fn validate_logging_config(logging: &LoggingConfig, errors: &mut Vec<String>) {
    if logging.log_dir.as_deref().is_some_and(str::is_empty) {
        errors.push("app.logging: log_dir is set but empty (omit it to disable file logs)".into());
    }
    if logging.default_filter.trim().is_empty() {
        errors.push("app.logging: default_filter is empty".into());
    }
}

// ---------------------------------------------------------------------------
// Risk policy
// ---------------------------------------------------------------------------

/// Public so hosts that build a policy in code can check it too.
pub fn validate_policy(policy: &RiskPolicy, errors: &mut Vec<String>) {
    let t = &policy.thresholds;

    // Bands must be ordered: caution < safe < strong.
    if t.caution >= t.safe {
        errors.push(format!(
            "policy.thresholds: caution ({}) must be < safe ({})",
            t.caution, t.safe
        ));
    }
    if t.safe >= t.strong {
        errors.push(format!(
            "policy.thresholds: safe ({}) must be < strong ({})",
            t.safe, t.strong
        ));
    }

    // Below 1.0 a position is liquidatable; no floor may sit there.
    if policy.withdraw_floor < dec!(1) || policy.withdraw_floor > t.caution {
        errors.push(format!(
            "policy: withdraw_floor ({}) must be in [1.0, caution ({})]",
            policy.withdraw_floor, t.caution
        ));
    }
    if policy.borrow_floor < dec!(1) || policy.borrow_floor > t.safe {
        errors.push(format!(
            "policy: borrow_floor ({}) must be in [1.0, safe ({})]",
            policy.borrow_floor, t.safe
        ));
    }

    if policy.min_action_amount <= Decimal::ZERO {
        errors.push(format!(
            "policy: min_action_amount ({}) must be > 0",
            policy.min_action_amount
        ));
    }
}
