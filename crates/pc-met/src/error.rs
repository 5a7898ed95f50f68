//! Meteorology errors.

use thiserror::Error;

pub type MetResult<T> = Result<T, MetError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetError {
    /// Non-positive wind speed, unrecognized stability class, out-of-range
    /// humidity and similar bad inputs.
    #[error("Invalid meteorology input: {what} ({value})")]
    InvalidMeteorologyInput { what: &'static str, value: String },
}

impl MetError {
    pub(crate) fn invalid(what: &'static str, value: impl ToString) -> Self {
        MetError::InvalidMeteorologyInput {
            what,
            value: value.to_string(),
        }
    }
}

/// Reject non-finite or non-positive values.
pub(crate) fn require_positive(value: f64, what: &'static str) -> MetResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(MetError::invalid(what, value))
    }
}
