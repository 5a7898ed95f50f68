//! Error types for dispersion models.

use pc_core::PcError;
use pc_met::MetError;
use pc_sim::SimError;
use thiserror::Error;

pub type DispersionResult<T> = Result<T, DispersionError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispersionError {
    #[error("Input validation failed: {what} ({value})")]
    InputValidation { what: &'static str, value: String },

    #[error("Convergence failed: {what} at step {step}, x={distance_m} m (residual={residual:e})")]
    Convergence {
        what: String,
        step: usize,
        distance_m: f64,
        residual: f64,
    },

    #[error("Non-physical value: {what}")]
    NonPhysical { what: &'static str },

    #[error("Integration error: {message}")]
    Integration { message: String },
}

impl DispersionError {
    pub(crate) fn invalid(what: &'static str, value: impl ToString) -> Self {
        DispersionError::InputValidation {
            what,
            value: value.to_string(),
        }
    }
}

impl From<SimError> for DispersionError {
    fn from(e: SimError) -> Self {
        match e {
            SimError::ConvergenceFailed {
                what,
                step,
                time_s,
                residual,
            } => DispersionError::Convergence {
                what,
                step,
                distance_m: time_s,
                residual,
            },
            SimError::InvalidArg { what } => DispersionError::InputValidation {
                what,
                value: String::new(),
            },
            SimError::NonPhysical { what } => DispersionError::NonPhysical { what },
            other => DispersionError::Integration {
                message: other.to_string(),
            },
        }
    }
}

impl From<MetError> for DispersionError {
    fn from(e: MetError) -> Self {
        match e {
            MetError::InvalidMeteorologyInput { what, value } => {
                DispersionError::InputValidation { what, value }
            }
        }
    }
}

impl From<PcError> for DispersionError {
    fn from(e: PcError) -> Self {
        match e {
            PcError::InvalidArg { what } => DispersionError::InputValidation {
                what,
                value: String::new(),
            },
            PcError::NonFinite { what, .. } | PcError::Invariant { what } => {
                DispersionError::NonPhysical { what }
            }
            other => DispersionError::Integration {
                message: other.to_string(),
            },
        }
    }
}

/// Reject non-finite or non-positive values.
pub(crate) fn require_positive(value: f64, what: &'static str) -> DispersionResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(DispersionError::invalid(what, value))
    }
}

/// Reject non-finite or negative values.
pub(crate) fn require_non_negative(value: f64, what: &'static str) -> DispersionResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(DispersionError::invalid(what, value))
    }
}
