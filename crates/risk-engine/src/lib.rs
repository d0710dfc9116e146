//! Health-factor and action-risk engine for a lending protocol front-end.
//!
//! Pure and synchronous: callers hand in reserve and portfolio snapshots and
//! get back rates, projections and validation verdicts. The only I/O is
//! [`config::load_config`] and [`logging::init_tracing`], called once by the host.

pub mod config;
pub mod constants;
pub mod core;
pub mod errors;
pub mod logging;
pub mod types;

pub use crate::core::simulator::Simulator;
pub use crate::core::validator::Validator;
pub use errors::RiskError;
