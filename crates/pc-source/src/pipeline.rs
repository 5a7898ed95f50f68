//! Pipeline leak: Wilson blowdown capped by the orifice.
//!
//! The Wilson correlation gives the release as a double exponential whose
//! integral equals the initial line inventory. Each step releases the
//! analytic Wilson mass over the step, limited by what the hole can pass at
//! the current line pressure and by the mass above the ambient floor. Line
//! temperature follows a Joule-Thomson correction from the initial state.

use crate::common::{EPSILON_MASS, check_finite, disc_area, require_non_negative, require_positive};
use crate::error::{SourceError, SourceResult};
use crate::orifice::Orifice;
use pc_chem::Chemical;
use pc_core::units::m;
use pc_met::MeteorologicalState;
use pc_sim::{SimResult, StepModel};
use serde::{Deserialize, Serialize};

/// Pressure margin over ambient at which the line is considered empty.
const PRESSURE_FLOOR_MARGIN: f64 = 1e-3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSpec {
    pub length_m: f64,
    pub diameter_m: f64,
    /// Absolute wall roughness.
    pub roughness_m: f64,
    pub hole_diameter_m: f64,
    pub discharge_coefficient: f64,
    pub initial_pressure_pa: f64,
    /// Defaults to the ambient temperature.
    pub initial_temperature_k: Option<f64>,
}

impl Default for PipelineSpec {
    fn default() -> Self {
        Self {
            length_m: 1000.0,
            diameter_m: 0.3,
            roughness_m: 4.5e-5,
            hole_diameter_m: 0.05,
            discharge_coefficient: 0.62,
            initial_pressure_pa: 50e5,
            initial_temperature_k: None,
        }
    }
}

impl PipelineSpec {
    pub fn validate(&self) -> SourceResult<()> {
        require_positive(self.length_m, "pipeline length must be positive")?;
        require_positive(self.diameter_m, "pipeline diameter must be positive")?;
        require_non_negative(self.roughness_m, "pipe roughness must be non-negative")?;
        require_positive(self.hole_diameter_m, "hole diameter must be positive")?;
        if self.hole_diameter_m > self.diameter_m {
            return Err(SourceError::invalid(
                "hole diameter exceeds pipeline diameter",
                self.hole_diameter_m,
            ));
        }
        if !(self.discharge_coefficient > 0.0 && self.discharge_coefficient <= 1.0) {
            return Err(SourceError::invalid(
                "discharge coefficient must lie in (0, 1]",
                self.discharge_coefficient,
            ));
        }
        require_positive(self.initial_pressure_pa, "pipeline pressure must be positive")?;
        if let Some(t) = self.initial_temperature_k {
            require_positive(t, "pipeline temperature below absolute zero")?;
        }
        Ok(())
    }
}

/// Darcy friction factor for fully rough turbulent flow.
pub fn rough_pipe_friction_factor(roughness_m: f64, diameter_m: f64) -> f64 {
    // A smooth wall would give log10(0); cap at a realistic relative roughness.
    let relative = (roughness_m / diameter_m).max(1e-7);
    0.25 / (0.75 - relative.log10()).powi(2)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineState {
    pub time_s: f64,
    pub pressure_pa: f64,
    pub temperature_k: f64,
    pub inventory_kg: f64,
    pub released_kg: f64,
    pub mass_flow_kg_s: f64,
    pub choked: bool,
}

#[derive(Debug, Clone)]
pub struct PipelineLeak {
    hole: Orifice,
    gamma: f64,
    gas_constant: f64,
    joule_thomson_k_per_pa: f64,
    min_temperature_k: f64,
    volume_m3: f64,
    ambient_pressure_pa: f64,
    initial_pressure_pa: f64,
    initial_temperature_k: f64,
    /// Wilson initial rate, kg/s.
    q0: f64,
    /// Wilson time constant, s.
    beta: f64,
    /// Wilson inventory ratio M0 / (beta Q0).
    alpha: f64,
    initial: PipelineState,
}

impl PipelineLeak {
    pub fn new(spec: &PipelineSpec, chemical: &Chemical, met: &MeteorologicalState) -> SourceResult<Self> {
        spec.validate()?;
        let p_amb = met.ambient_pressure_pa();
        if spec.initial_pressure_pa <= p_amb {
            return Err(SourceError::invalid(
                "pipeline pressure must exceed ambient",
                spec.initial_pressure_pa,
            ));
        }
        let t0 = spec.initial_temperature_k.unwrap_or(met.ambient_temperature_k());
        let gamma = chemical.heat_capacity_ratio;
        let rs = chemical.specific_gas_constant();

        let pipe_area = disc_area(spec.diameter_m);
        let hole_area = disc_area(spec.hole_diameter_m);
        let volume_m3 = pipe_area * spec.length_m;
        let m0 = spec.initial_pressure_pa * volume_m3 / (rs * t0);

        let hole = Orifice::from_diameter(spec.discharge_coefficient, m(spec.hole_diameter_m));
        let rho0 = spec.initial_pressure_pa / (rs * t0);
        let flow0 = hole.gas_flow(spec.initial_pressure_pa, rho0, p_amb, gamma)?;
        let q0 = flow0.mass_flow.value;
        if q0 <= 0.0 {
            return Err(SourceError::NonPhysical {
                what: "initial pipeline release rate",
            });
        }

        let big_gamma = ((gamma + 1.0) / 2.0).powf((gamma + 1.0) / (gamma - 1.0));
        let friction = rough_pipe_friction_factor(spec.roughness_m, spec.diameter_m);
        let sound_speed = (gamma * rs * t0).sqrt();
        let kf = spec.diameter_m / (gamma * friction * spec.length_m);
        let kh = hole_area / pipe_area;
        let tau_p = spec.length_m / sound_speed;
        let beta = (2.0 / 3.0)
            * tau_p
            * kf
            * big_gamma.powf(1.5)
            * kh.powi(-3)
            * ((1.0 + kh * kh / (kf * big_gamma)).powf(1.5) - 1.0);
        let beta = check_finite(beta, "Wilson time constant")?;
        let alpha = m0 / (beta * q0);

        tracing::debug!(m0, q0, beta, alpha, "pipeline blowdown constants");

        let initial = PipelineState {
            time_s: 0.0,
            pressure_pa: spec.initial_pressure_pa,
            temperature_k: t0,
            inventory_kg: m0,
            released_kg: 0.0,
            mass_flow_kg_s: q0,
            choked: flow0.choked,
        };
        Ok(Self {
            hole,
            gamma,
            gas_constant: rs,
            joule_thomson_k_per_pa: chemical.joule_thomson_k_per_pa,
            min_temperature_k: chemical.boiling_point_k,
            volume_m3,
            ambient_pressure_pa: p_amb,
            initial_pressure_pa: spec.initial_pressure_pa,
            initial_temperature_k: t0,
            q0,
            beta,
            alpha,
            initial,
        })
    }

    /// Wilson time constant, s.
    pub fn time_constant_s(&self) -> f64 {
        self.beta
    }

    pub fn initial_inventory_kg(&self) -> f64 {
        self.initial.inventory_kg
    }

    /// Wilson release rate at time `t`.
    pub fn wilson_rate(&self, t: f64) -> f64 {
        let (a, b) = (self.alpha, self.beta);
        self.q0 / (1.0 + a) * ((-t / (a * a * b)).exp() + a * (-t / b).exp())
    }

    /// Wilson mass released between `t0` and `t1`.
    fn wilson_mass(&self, t0: f64, t1: f64) -> f64 {
        let (a, b) = (self.alpha, self.beta);
        let fast = a * a * b;
        self.q0 / (1.0 + a)
            * (fast * ((-t0 / fast).exp() - (-t1 / fast).exp())
                + a * b * ((-t0 / b).exp() - (-t1 / b).exp()))
    }

    fn floor_mass(&self, temperature_k: f64) -> f64 {
        self.ambient_pressure_pa * self.volume_m3 / (self.gas_constant * temperature_k)
    }

    fn temperature_at(&self, pressure_pa: f64) -> f64 {
        let cooled = self.initial_temperature_k
            - self.joule_thomson_k_per_pa * (self.initial_pressure_pa - pressure_pa);
        cooled.max(self.min_temperature_k)
    }
}

impl StepModel for PipelineLeak {
    type State = PipelineState;

    fn initial_state(&self) -> PipelineState {
        self.initial.clone()
    }

    fn advance(&self, state: &PipelineState, dt: f64) -> SimResult<PipelineState> {
        let t1 = state.time_s + dt;
        let wilson = self.wilson_mass(state.time_s, t1);
        let orifice_cap = state.mass_flow_kg_s.max(0.0) * dt;
        let above_floor = (state.inventory_kg - self.floor_mass(state.temperature_k)).max(0.0);
        let released = wilson.min(orifice_cap).min(above_floor);

        let inventory = state.inventory_kg - released;
        let pressure = (inventory * self.gas_constant * state.temperature_k / self.volume_m3)
            .max(self.ambient_pressure_pa);
        let pressure = check_finite(pressure, "pipeline pressure")?;
        let temperature = self.temperature_at(pressure);

        let rho = pressure / (self.gas_constant * temperature);
        let flow = self
            .hole
            .gas_flow(pressure, rho, self.ambient_pressure_pa, self.gamma)?;
        // No re-pressurization: the rate never rises once decay has begun.
        let rate = self
            .wilson_rate(t1)
            .min(flow.mass_flow.value)
            .min(state.mass_flow_kg_s);

        Ok(PipelineState {
            time_s: t1,
            pressure_pa: pressure.min(state.pressure_pa),
            temperature_k: temperature,
            inventory_kg: inventory,
            released_kg: state.released_kg + released,
            mass_flow_kg_s: check_finite(rate, "pipeline release rate")?,
            choked: flow.choked,
        })
    }

    fn is_terminal(&self, state: &PipelineState) -> bool {
        state.pressure_pa <= self.ambient_pressure_pa * (1.0 + PRESSURE_FLOOR_MARGIN)
            || state.inventory_kg - self.floor_mass(state.temperature_k) <= EPSILON_MASS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pc_chem::{ChemicalStore, InMemoryStore};
    use pc_met::MetConditions;

    fn leak(spec: PipelineSpec) -> PipelineLeak {
        let chem = InMemoryStore::builtin().get_chemical("methane").unwrap();
        let met = MeteorologicalState::new(MetConditions::default()).unwrap();
        PipelineLeak::new(&spec, &chem, &met).unwrap()
    }

    #[test]
    fn wilson_integral_equals_inventory() {
        let model = leak(PipelineSpec::default());
        let total = model.wilson_mass(0.0, 1e9);
        let m0 = model.initial_inventory_kg();
        assert!((total - m0).abs() / m0 < 1e-9, "{total} vs {m0}");
    }

    #[test]
    fn wilson_rate_starts_at_orifice_rate() {
        let model = leak(PipelineSpec::default());
        assert!((model.wilson_rate(0.0) - model.initial_state().mass_flow_kg_s).abs() < 1e-9);
    }

    #[test]
    fn friction_factor_is_plausible() {
        let f = rough_pipe_friction_factor(4.5e-5, 0.3);
        assert!(f > 0.008 && f < 0.02, "f = {f}");
    }

    #[test]
    fn rejects_pressure_below_ambient() {
        let chem = InMemoryStore::builtin().get_chemical("methane").unwrap();
        let met = MeteorologicalState::new(MetConditions::default()).unwrap();
        let spec = PipelineSpec {
            initial_pressure_pa: 9e4,
            ..PipelineSpec::default()
        };
        assert!(matches!(
            PipelineLeak::new(&spec, &chem, &met),
            Err(SourceError::InputValidation { .. })
        ));
    }

    #[test]
    fn pressure_and_rate_never_rise() {
        let model = leak(PipelineSpec::default());
        let mut state = model.initial_state();
        for _ in 0..500 {
            let next = model.advance(&state, 5.0).unwrap();
            assert!(next.pressure_pa <= state.pressure_pa);
            assert!(next.mass_flow_kg_s <= state.mass_flow_kg_s);
            assert!(next.released_kg <= model.initial_inventory_kg());
            state = next;
        }
    }
}
