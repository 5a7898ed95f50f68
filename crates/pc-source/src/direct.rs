//! User-specified constant-rate release.

use crate::common::{EPSILON_MASS, require_positive};
use crate::error::SourceResult;
use pc_met::MeteorologicalState;
use pc_sim::{SimResult, StepModel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectSpec {
    pub rate_kg_s: f64,
    pub duration_s: f64,
    /// Release temperature; defaults to ambient.
    pub temperature_k: Option<f64>,
}

impl Default for DirectSpec {
    fn default() -> Self {
        Self {
            rate_kg_s: 1.0,
            duration_s: 600.0,
            temperature_k: None,
        }
    }
}

impl DirectSpec {
    pub fn validate(&self) -> SourceResult<()> {
        require_positive(self.rate_kg_s, "release rate must be positive")?;
        require_positive(self.duration_s, "release duration must be positive")?;
        if let Some(t) = self.temperature_k {
            require_positive(t, "release temperature below absolute zero")?;
        }
        Ok(())
    }

    pub fn total_mass_kg(&self) -> f64 {
        self.rate_kg_s * self.duration_s
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectState {
    pub time_s: f64,
    pub mass_flow_kg_s: f64,
    pub released_kg: f64,
}

#[derive(Debug, Clone)]
pub struct DirectRelease {
    rate_kg_s: f64,
    total_kg: f64,
    temperature_k: f64,
}

impl DirectRelease {
    pub fn new(spec: &DirectSpec, met: &MeteorologicalState) -> SourceResult<Self> {
        spec.validate()?;
        Ok(Self {
            rate_kg_s: spec.rate_kg_s,
            total_kg: spec.total_mass_kg(),
            temperature_k: spec.temperature_k.unwrap_or(met.ambient_temperature_k()),
        })
    }

    pub fn total_mass_kg(&self) -> f64 {
        self.total_kg
    }

    pub fn temperature_k(&self) -> f64 {
        self.temperature_k
    }
}

impl StepModel for DirectRelease {
    type State = DirectState;

    fn initial_state(&self) -> DirectState {
        DirectState {
            time_s: 0.0,
            mass_flow_kg_s: self.rate_kg_s,
            released_kg: 0.0,
        }
    }

    fn advance(&self, state: &DirectState, dt: f64) -> SimResult<DirectState> {
        let remaining = (self.total_kg - state.released_kg).max(0.0);
        let released = (self.rate_kg_s * dt).min(remaining);
        let released_kg = state.released_kg + released;
        let mass_flow_kg_s = if self.total_kg - released_kg > EPSILON_MASS {
            self.rate_kg_s
        } else {
            0.0
        };
        Ok(DirectState {
            time_s: state.time_s + dt,
            mass_flow_kg_s,
            released_kg,
        })
    }

    fn is_terminal(&self, state: &DirectState) -> bool {
        self.total_kg - state.released_kg <= EPSILON_MASS
    }
}
