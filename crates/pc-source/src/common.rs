//! Shared helpers for source-term calculations.

use crate::error::{SourceError, SourceResult};
use pc_core::numeric::ensure_finite;
use pc_sim::{SimError, SimResult};

/// Pressure differences below this drive no flow (Pa).
pub const EPSILON_PRESSURE: f64 = 1e-3;

/// Inventories below this are treated as exhausted (kg).
pub const EPSILON_MASS: f64 = 1e-9;

/// Slack added to the critical pressure ratio when deciding choking.
pub const CHOKE_TOLERANCE: f64 = 1e-9;

/// Ensure a value computed during a step is finite.
pub fn check_finite(value: f64, what: &'static str) -> SimResult<f64> {
    ensure_finite(value, what).map_err(|_| SimError::NonPhysical { what })
}

pub fn require_positive(value: f64, what: &'static str) -> SourceResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SourceError::invalid(what, value))
    }
}

pub fn require_non_negative(value: f64, what: &'static str) -> SourceResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(SourceError::invalid(what, value))
    }
}

/// Cross-section of a vertical cylinder of diameter `d`.
pub fn disc_area(diameter_m: f64) -> f64 {
    0.25 * std::f64::consts::PI * diameter_m * diameter_m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_finite() {
        assert!(check_finite(1.0, "test").is_ok());
        assert!(check_finite(f64::INFINITY, "test").is_err());
        assert!(check_finite(f64::NAN, "test").is_err());
    }

    #[test]
    fn test_require_positive() {
        assert!(require_positive(2.0, "x").is_ok());
        assert!(require_positive(0.0, "x").is_err());
        assert!(require_non_negative(0.0, "x").is_ok());
        assert!(require_non_negative(-1e-3, "x").is_err());
    }
}
