pub mod types;
pub mod validate;

pub use types::*;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Load `app.json` and `policy.json` into a single [`EngineConfig`], then
/// apply environment variable overrides and validate.
///
/// Expected directory layout:
/// ```text
/// config/
///   app.json
///   policy.json
/// ```
///
/// # Environment variable overrides
///
/// | Env Var                  | Config Field                |
/// |--------------------------|-----------------------------|
/// | `RISK_LOG_DIR`           | `app.logging.log_dir`       |
/// | `RISK_BORROW_FLOOR`      | `policy.borrow_floor`       |
/// | `RISK_WITHDRAW_FLOOR`    | `policy.withdraw_floor`     |
/// | `RISK_MIN_ACTION_AMOUNT` | `policy.min_action_amount`  |
/// | `RISK_SIMULATION_MODE`   | `policy.simulation_mode`    |
pub fn load_config(config_dir: &Path) -> Result<EngineConfig> {
    let read = |name: &str| -> Result<String> {
        let path = config_dir.join(name);
        std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))
    };

    let app: AppConfig =
        serde_json::from_str(&read("app.json")?).context("parsing app.json")?;

    let policy: RiskPolicy =
        serde_json::from_str(&read("policy.json")?).context("parsing policy.json")?;

    let mut config = EngineConfig { app, policy };

    apply_env_overrides(&mut config);
    validate::validate_config(&config)?;

    Ok(config)
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Only non-empty env vars take effect. Parse failures are skipped and the
/// JSON value remains.
fn apply_env_overrides(config: &mut EngineConfig) {
    if let Some(val) = env_string("RISK_LOG_DIR") {
        info!(log_dir = %val, "env override: RISK_LOG_DIR");
        config.app.logging.log_dir = Some(val);
    }

    // -- Policy --------------------------------------------------------------
    if let Some(val) = env_decimal("RISK_BORROW_FLOOR") {
        info!(%val, "env override: RISK_BORROW_FLOOR");
        config.policy.borrow_floor = val;
    }

    if let Some(val) = env_decimal("RISK_WITHDRAW_FLOOR") {
        info!(%val, "env override: RISK_WITHDRAW_FLOOR");
        config.policy.withdraw_floor = val;
    }

    if let Some(val) = env_decimal("RISK_MIN_ACTION_AMOUNT") {
        info!(%val, "env override: RISK_MIN_ACTION_AMOUNT");
        config.policy.min_action_amount = val;
    }

    if let Some(val) = env_parse::<SimulationMode>("RISK_SIMULATION_MODE") {
        info!(mode = ?val, "env override: RISK_SIMULATION_MODE");
        config.policy.simulation_mode = val;
    }
}

/// Read a non-empty env var as a `String`.
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Read a non-empty env var and parse it as `T`.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse().ok())
}

/// Read a non-empty env var and parse it as `Decimal`.
fn env_decimal(key: &str) -> Option<Decimal> {
    env_string(key).and_then(|v| Decimal::from_str(&v).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serial_test::serial;
    use std::path::PathBuf;

    fn project_config_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
    }

    fn write_test_configs(dir: &Path) {
        std::fs::write(
            dir.join("app.json"),
            r#"{ "logging": { "default_filter": "risk_engine=debug" } }"#,
        )
        .unwrap();

        std::fs::write(
            dir.join("policy.json"),
            r#"{
                "thresholds": { "strong": "2.0", "safe": "1.5", "caution": "1.2" },
                "borrow_floor": "1.1",
                "withdraw_floor": "1.0",
                "min_action_amount": "0.001",
                "simulation_mode": "aggregated"
            }"#,
        )
        .unwrap();
    }

    /// Remove every override so tests don't see each other's env.
    fn clean_risk_env() {
        for key in [
            "RISK_LOG_DIR",
            "RISK_BORROW_FLOOR",
            "RISK_WITHDRAW_FLOOR",
            "RISK_MIN_ACTION_AMOUNT",
            "RISK_SIMULATION_MODE",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_load_real_configs() {
        clean_risk_env();
        let dir = project_config_dir();
        if !dir.exists() {
            eprintln!("skipping: config dir not found at {}", dir.display());
            return;
        }
        let config = load_config(&dir).expect("config should load and validate");
        assert_eq!(config.policy, RiskPolicy::default());
    }

    #[test]
    #[serial]
    fn test_load_test_configs() {
        clean_risk_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());
        let config = load_config(tmp.path()).expect("test config should load");
        assert_eq!(config.app.logging.default_filter, "risk_engine=debug");
        assert!(config.app.logging.log_dir.is_none());
        assert_eq!(config.policy.borrow_floor, dec!(1.1));
    }

    #[test]
    #[serial]
    fn test_missing_config_file_errors() {
        clean_risk_env();
        let tmp = tempfile::tempdir().unwrap();
        let err = load_config(tmp.path()).unwrap_err();
        assert!(
            err.to_string().contains("failed to read config file"),
            "expected file-not-found error, got: {err}"
        );
    }

    #[test]
    #[serial]
    fn test_malformed_policy_errors() {
        clean_risk_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());
        let truncated = r#"{ "borrow_floor": "1.1", "withdraw_floor": "#;
        std::fs::write(tmp.path().join("policy.json"), truncated).unwrap();
        let err = load_config(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("parsing policy.json"), "got: {err}");
    }

    #[test]
    #[serial]
    fn test_env_override_floors_and_mode() {
        clean_risk_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("RISK_BORROW_FLOOR", "1.25");
        std::env::set_var("RISK_WITHDRAW_FLOOR", "1.05");
        std::env::set_var("RISK_SIMULATION_MODE", "single_reserve");
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.policy.borrow_floor, dec!(1.25));
        assert_eq!(config.policy.withdraw_floor, dec!(1.05));
        assert_eq!(config.policy.simulation_mode, SimulationMode::SingleReserve);
        clean_risk_env();
    }

    #[test]
    #[serial]
    fn test_env_override_log_dir() {
        clean_risk_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("RISK_LOG_DIR", "/var/log/risk");
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.app.logging.log_dir.as_deref(), Some("/var/log/risk"));
        clean_risk_env();
    }

    #[test]
    #[serial]
    fn test_env_override_empty_string_ignored() {
        clean_risk_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("RISK_MIN_ACTION_AMOUNT", "");
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.policy.min_action_amount, dec!(0.001));
        clean_risk_env();
    }

    #[test]
    #[serial]
    fn test_env_override_invalid_parse_ignored() {
        clean_risk_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("RISK_BORROW_FLOOR", "not_a_number");
        std::env::set_var("RISK_SIMULATION_MODE", "optimistic");
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.policy.borrow_floor, dec!(1.1));
        assert_eq!(config.policy.simulation_mode, SimulationMode::Aggregated);
        clean_risk_env();
    }

    #[test]
    #[serial]
    fn test_env_override_still_validated() {
        clean_risk_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("RISK_BORROW_FLOOR", "0.8");
        let err = load_config(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("borrow_floor"), "got: {err}");
        clean_risk_env();
    }
}
