use thiserror::Error;

/// Typed error hierarchy for the risk engine.
///
/// Only construction and ingestion fail with these. Validation and simulation
/// outcomes are values (`ValidationResult`, `SimulationResult`), never errors.
/// Application code wraps with `anyhow::Context` for propagation.
#[derive(Error, Debug)]
pub enum RiskError {
    // -- Reserve data -------------------------------------------------------
    #[error("invalid interest rate curve: {reason}")]
    InvalidCurve { reason: String },

    #[error("invalid reserve parameters: {reason}")]
    InvalidReserve { reason: String },

    // -- Ingestion ----------------------------------------------------------
    #[error("amount is not a finite number: {value}")]
    InvalidAmount { value: f64 },

    // -- Forwarded errors ---------------------------------------------------
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}
