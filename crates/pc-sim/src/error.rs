//! Error types for simulation operations.

use pc_core::PcError;
use thiserror::Error;

/// Errors encountered during time stepping.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-physical condition: {what}")]
    NonPhysical { what: &'static str },

    /// Recoverable failure; the runner retries the step with a smaller dt.
    #[error("Retryable step failure: {message} (residual={residual:e})")]
    Retryable { message: String, residual: f64 },

    /// Retry budget exhausted.
    #[error("Convergence failed: {what} at step {step}, t={time_s} s (residual={residual:e})")]
    ConvergenceFailed {
        what: String,
        step: usize,
        time_s: f64,
        residual: f64,
    },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<PcError> for SimError {
    fn from(e: PcError) -> Self {
        match e {
            PcError::NoConvergence { residual, .. } => SimError::Retryable {
                message: e.to_string(),
                residual,
            },
            PcError::NonFinite { what, .. } | PcError::Invariant { what } => {
                SimError::NonPhysical { what }
            }
            PcError::InvalidArg { what } => SimError::InvalidArg { what },
            PcError::NotBracketed { .. } => SimError::Backend {
                message: e.to_string(),
            },
        }
    }
}
