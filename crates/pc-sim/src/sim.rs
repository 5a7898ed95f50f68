//! Step control options shared by every stepped model.

use crate::error::{SimError, SimResult};

/// Options for simulation runs.
#[derive(Clone, Debug)]
pub struct SimOptions {
    /// Nominal step (seconds, or metres for distance-marching models)
    pub dt: f64,
    /// Final value of the independent variable
    pub t_end: f64,
    /// Maximum number of steps (safety limit)
    pub max_steps: usize,
    /// Smallest step a cut-back may produce
    pub min_dt: f64,
    /// Retries per step before giving up
    pub max_retries: usize,
    /// Step multiplier applied on each retry (0 < f < 1)
    pub cutback_factor: f64,
    /// Step multiplier applied after a successful step, capped at `dt`
    pub grow_factor: f64,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            dt: 1e-3,
            t_end: 1.0,
            max_steps: 100_000,
            min_dt: 1e-4,
            max_retries: 6,
            cutback_factor: 0.5,
            grow_factor: 2.0,
        }
    }
}

impl SimOptions {
    pub fn validate(&self) -> SimResult<()> {
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "dt must be positive",
            });
        }
        if !(self.t_end >= 0.0) {
            return Err(SimError::InvalidArg {
                what: "t_end must be non-negative",
            });
        }
        if self.max_steps == 0 {
            return Err(SimError::InvalidArg {
                what: "max_steps must be positive",
            });
        }
        if !(self.cutback_factor > 0.0 && self.cutback_factor < 1.0) {
            return Err(SimError::InvalidArg {
                what: "cutback_factor must lie in (0, 1)",
            });
        }
        if !(self.grow_factor >= 1.0) {
            return Err(SimError::InvalidArg {
                what: "grow_factor must be at least 1",
            });
        }
        if !(self.min_dt > 0.0 && self.min_dt <= self.dt) {
            return Err(SimError::InvalidArg {
                what: "min_dt must lie in (0, dt]",
            });
        }
        Ok(())
    }

    /// Remaining span below which the run is considered complete.
    pub(crate) fn end_slack(&self) -> f64 {
        1e-12 * self.t_end.abs().max(1.0)
    }

    /// Step to attempt after a success with step `used`.
    pub(crate) fn next_dt(&self, used: f64) -> f64 {
        (used * self.grow_factor).min(self.dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_options_defaults() {
        let opts = SimOptions::default();
        assert_eq!(opts.dt, 1e-3);
        assert_eq!(opts.t_end, 1.0);
        assert_eq!(opts.max_steps, 100_000);
        assert_eq!(opts.max_retries, 6);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn sim_options_invalid() {
        let opts = SimOptions {
            dt: 0.0,
            ..SimOptions::default()
        };
        assert!(matches!(opts.validate(), Err(SimError::InvalidArg { .. })));

        let opts = SimOptions {
            cutback_factor: 1.5,
            ..SimOptions::default()
        };
        assert!(opts.validate().is_err());
    }
}
