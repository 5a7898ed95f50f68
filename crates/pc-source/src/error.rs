//! Error types for source-term models.

use pc_met::MetError;
use pc_sim::SimError;
use thiserror::Error;

pub type SourceResult<T> = Result<T, SourceError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    /// Unphysical or malformed input, rejected before any stepping.
    #[error("Input validation failed: {what} ({value})")]
    InputValidation { what: &'static str, value: String },

    /// A sub-solve kept failing after the retry budget was spent.
    #[error("Convergence failed: {what} at step {step}, t={time_s} s (residual={residual:e})")]
    Convergence {
        what: String,
        step: usize,
        time_s: f64,
        residual: f64,
    },

    #[error("Non-physical value: {what}")]
    NonPhysical { what: &'static str },

    #[error("Simulation error: {message}")]
    Sim { message: String },
}

impl SourceError {
    pub(crate) fn invalid(what: &'static str, value: impl ToString) -> Self {
        SourceError::InputValidation {
            what,
            value: value.to_string(),
        }
    }
}

impl From<SimError> for SourceError {
    fn from(e: SimError) -> Self {
        match e {
            SimError::ConvergenceFailed {
                what,
                step,
                time_s,
                residual,
            } => SourceError::Convergence {
                what,
                step,
                time_s,
                residual,
            },
            SimError::InvalidArg { what } => SourceError::InputValidation {
                what,
                value: String::new(),
            },
            SimError::NonPhysical { what } => SourceError::NonPhysical { what },
            other => SourceError::Sim {
                message: other.to_string(),
            },
        }
    }
}

impl From<MetError> for SourceError {
    fn from(e: MetError) -> Self {
        match e {
            MetError::InvalidMeteorologyInput { what, value } => {
                SourceError::InputValidation { what, value }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_retries_become_convergence_errors() {
        let e: SourceError = SimError::ConvergenceFailed {
            what: "flash temperature".into(),
            step: 12,
            time_s: 6.0,
            residual: 2e-3,
        }
        .into();
        match e {
            SourceError::Convergence { step, residual, .. } => {
                assert_eq!(step, 12);
                assert_eq!(residual, 2e-3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn error_display() {
        let err = SourceError::invalid("hole diameter must be positive", -1.0);
        assert!(err.to_string().contains("hole diameter"));
    }
}
