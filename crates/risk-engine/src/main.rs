use std::path::PathBuf;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use risk_engine::config;
use risk_engine::core::health::{borrowing_power, liquidation_distance};
use risk_engine::core::limits::{max_borrow_amount, max_withdraw_amount};
use risk_engine::logging;
use risk_engine::types::units::to_display_units;
use risk_engine::types::{
    ActionRequest, BorrowingPower, LiquidationDistance, PortfolioSnapshot, RateSnapshot,
    ReserveSnapshot, SimulationResult, ValidationResult,
};
use risk_engine::Validator;

/// One what-if question: an action against a reserve for a given portfolio.
#[derive(Debug, Deserialize)]
struct Scenario {
    reserve: ReserveSnapshot,
    portfolio: PortfolioSnapshot,
    request: ActionRequest,
}

#[derive(Debug, Serialize)]
struct Report {
    asset: String,
    rates: RateSnapshot,
    borrowing_power: BorrowingPower,
    liquidation_distance: LiquidationDistance,
    simulation: SimulationResult,
    validation: ValidationResult,
    #[serde(with = "rust_decimal::serde::str")]
    max_borrow: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    max_withdraw: Decimal,
}

fn main() -> Result<()> {
    // Load .env file (ignore if missing).
    let _ = dotenvy::dotenv();

    let scenario_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: risk-engine <scenario.json>")?;

    let config_dir = std::env::var("RISK_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"));

    let config = config::load_config(&config_dir)?;

    // Hold the guard for the process lifetime so file logs are flushed.
    let _guard = logging::init_tracing(&config.app.logging)?;

    info!(
        config_dir = %config_dir.display(),
        mode = ?config.policy.simulation_mode,
        borrow_floor = %config.policy.borrow_floor,
        "risk engine starting"
    );

    let raw = std::fs::read_to_string(&scenario_path)
        .with_context(|| format!("failed to read scenario: {}", scenario_path.display()))?;
    let scenario: Scenario = serde_json::from_str(&raw)
        .with_context(|| format!("parsing scenario: {}", scenario_path.display()))?;
    scenario
        .reserve
        .validate()
        .context("reserve snapshot rejected")?;

    let report = evaluate(&Validator::new(config.policy), &scenario);

    info!(
        action = scenario.request.kind.as_str(),
        asset = %report.asset,
        accepted = report.validation.is_accepted(),
        projected_hf = %report.simulation.projected_health_factor,
        "scenario evaluated"
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn evaluate(validator: &Validator, scenario: &Scenario) -> Report {
    let Scenario {
        reserve,
        portfolio,
        request,
    } = scenario;
    let simulator = validator.simulator();
    let policy = validator.policy();

    let asset_supplied = to_display_units(request.asset_supplied_base_units, reserve.risk.decimals);

    Report {
        asset: reserve.asset.clone(),
        rates: reserve.rates(),
        borrowing_power: borrowing_power(portfolio, reserve.risk.loan_to_value_bips),
        liquidation_distance: liquidation_distance(
            portfolio,
            reserve.risk.liquidation_threshold_bips,
            &policy.thresholds,
        ),
        simulation: simulator.simulate(portfolio, request.kind, reserve, request.amount),
        validation: validator.validate(request, reserve, portfolio),
        max_borrow: max_borrow_amount(simulator, portfolio, reserve, request.available_liquidity),
        max_withdraw: max_withdraw_amount(simulator, portfolio, reserve, asset_supplied),
    }
}
