//! Liquid draining from a vertical cylindrical tank into a spreading puddle.
//!
//! Discharge is Bernoulli flow driven by headspace overpressure plus the
//! liquid head above the hole. A hole that is only partly submerged passes
//! flow through the wetted fraction of its diameter. Everything discharged
//! lands in the puddle, whose evaporation is the airborne source.

use crate::common::{EPSILON_MASS, check_finite, disc_area, require_non_negative, require_positive};
use crate::error::{SourceError, SourceResult};
use crate::orifice::Orifice;
use crate::puddle::{PuddleEvaporation, PuddleState, PuddleSurface};
use pc_chem::Chemical;
use pc_core::units::constants::G0_MPS2;
use pc_core::units::m;
use pc_met::MeteorologicalState;
use pc_sim::{SimResult, StepModel};
use serde::{Deserialize, Serialize};

/// Remaining head below which the tank is considered drained to the hole (m).
const DRAINED_HEAD_M: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TankLiquidSpec {
    pub tank_diameter_m: f64,
    pub liquid_height_m: f64,
    pub hole_diameter_m: f64,
    /// Height of the hole centre above the tank floor.
    pub hole_height_m: f64,
    pub discharge_coefficient: f64,
    /// Defaults to the ambient temperature.
    pub liquid_temperature_k: Option<f64>,
    /// Headspace pressure; defaults to ambient.
    pub pad_pressure_pa: Option<f64>,
    pub wall_heat_transfer_w_m2_k: f64,
    pub puddle: PuddleSurface,
}

impl Default for TankLiquidSpec {
    fn default() -> Self {
        Self {
            tank_diameter_m: 3.0,
            liquid_height_m: 3.0,
            hole_diameter_m: 0.05,
            hole_height_m: 0.0,
            discharge_coefficient: 0.62,
            liquid_temperature_k: None,
            pad_pressure_pa: None,
            wall_heat_transfer_w_m2_k: 20.0,
            puddle: PuddleSurface::default(),
        }
    }
}

impl TankLiquidSpec {
    pub fn validate(&self) -> SourceResult<()> {
        require_positive(self.tank_diameter_m, "tank diameter must be positive")?;
        require_positive(self.liquid_height_m, "liquid height must be positive")?;
        require_positive(self.hole_diameter_m, "hole diameter must be positive")?;
        require_non_negative(self.hole_height_m, "hole height must be non-negative")?;
        if self.hole_height_m >= self.liquid_height_m {
            return Err(SourceError::invalid(
                "hole must lie below the liquid surface",
                self.hole_height_m,
            ));
        }
        if !(self.discharge_coefficient > 0.0 && self.discharge_coefficient <= 1.0) {
            return Err(SourceError::invalid(
                "discharge coefficient must lie in (0, 1]",
                self.discharge_coefficient,
            ));
        }
        if let Some(t) = self.liquid_temperature_k {
            require_positive(t, "liquid temperature below absolute zero")?;
        }
        if let Some(p) = self.pad_pressure_pa {
            require_positive(p, "pad pressure must be positive")?;
        }
        require_non_negative(
            self.wall_heat_transfer_w_m2_k,
            "wall heat transfer coefficient must be non-negative",
        )?;
        self.puddle.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TankLiquidState {
    pub time_s: f64,
    pub liquid_mass_kg: f64,
    pub liquid_level_m: f64,
    pub liquid_temperature_k: f64,
    pub discharge_kg_s: f64,
    pub released_kg: f64,
    pub puddle: PuddleState,
}

#[derive(Debug, Clone)]
pub struct TankLiquidRelease {
    chemical: Chemical,
    hole: Orifice,
    hole_diameter_m: f64,
    hole_height_m: f64,
    tank_diameter_m: f64,
    tank_area_m2: f64,
    pad_pressure_pa: f64,
    ambient_pressure_pa: f64,
    ambient_temperature_k: f64,
    wall_heat_transfer_w_m2_k: f64,
    puddle: PuddleEvaporation,
    initial: TankLiquidState,
}

impl TankLiquidRelease {
    pub fn new(spec: &TankLiquidSpec, chemical: &Chemical, met: &MeteorologicalState) -> SourceResult<Self> {
        spec.validate()?;
        let t_liquid = spec
            .liquid_temperature_k
            .unwrap_or(met.ambient_temperature_k());
        let p_amb = met.ambient_pressure_pa();
        let tank_area = disc_area(spec.tank_diameter_m);
        let mass = chemical.liquid_density_kg_m3 * tank_area * spec.liquid_height_m;
        let puddle = PuddleEvaporation::empty(&spec.puddle, chemical, met, t_liquid)?;

        let mut model = Self {
            chemical: chemical.clone(),
            hole: Orifice::from_diameter(spec.discharge_coefficient, m(spec.hole_diameter_m)),
            hole_diameter_m: spec.hole_diameter_m,
            hole_height_m: spec.hole_height_m,
            tank_diameter_m: spec.tank_diameter_m,
            tank_area_m2: tank_area,
            pad_pressure_pa: spec.pad_pressure_pa.unwrap_or(p_amb),
            ambient_pressure_pa: p_amb,
            ambient_temperature_k: met.ambient_temperature_k(),
            wall_heat_transfer_w_m2_k: spec.wall_heat_transfer_w_m2_k,
            initial: TankLiquidState {
                time_s: 0.0,
                liquid_mass_kg: mass,
                liquid_level_m: spec.liquid_height_m,
                liquid_temperature_k: t_liquid,
                discharge_kg_s: 0.0,
                released_kg: 0.0,
                puddle: puddle.initial_state(),
            },
            puddle,
        };
        model.initial.discharge_kg_s = model.discharge_rate(spec.liquid_height_m, t_liquid)?;
        Ok(model)
    }

    pub fn initial_mass_kg(&self) -> f64 {
        self.initial.liquid_mass_kg
    }

    /// Instantaneous discharge at a given level and liquid temperature.
    fn discharge_rate(&self, level_m: f64, temperature_k: f64) -> SimResult<f64> {
        let head = level_m - self.hole_height_m;
        if head <= 0.0 {
            return Ok(0.0);
        }
        let rho = self.chemical.liquid_density_kg_m3;
        let headspace = self
            .pad_pressure_pa
            .max(self.chemical.vapor_pressure_pa(temperature_k))
            .max(self.ambient_pressure_pa);
        let dp = headspace - self.ambient_pressure_pa + rho * G0_MPS2 * head;
        let open_fraction = (head / self.hole_diameter_m).min(1.0);
        Ok(self.hole.liquid_flow(rho, dp, open_fraction)?.value)
    }

    /// Liquid mass that can still leave through the hole.
    fn mass_above_hole(&self, state: &TankLiquidState) -> f64 {
        let head = (state.liquid_level_m - self.hole_height_m).max(0.0);
        (self.chemical.liquid_density_kg_m3 * self.tank_area_m2 * head).min(state.liquid_mass_kg)
    }
}

impl StepModel for TankLiquidRelease {
    type State = TankLiquidState;

    fn initial_state(&self) -> TankLiquidState {
        self.initial.clone()
    }

    fn advance(&self, state: &TankLiquidState, dt: f64) -> SimResult<TankLiquidState> {
        let chem = &self.chemical;
        let rho = chem.liquid_density_kg_m3;
        let t = state.liquid_temperature_k;

        // Vapor generated in the tank to fill the volume the liquid vacated.
        let rho_vapor = chem.vapor_density_kg_m3(t, chem.vapor_pressure_pa(t));
        let vapor_ratio = (rho_vapor / (rho - rho_vapor)).max(0.0);
        let discharged =
            (state.discharge_kg_s * dt).min(self.mass_above_hole(state) / (1.0 + vapor_ratio));
        let boil_off = discharged * vapor_ratio;
        let wetted_wall = std::f64::consts::PI * self.tank_diameter_m * state.liquid_level_m
            + self.tank_area_m2;
        let wall_heat =
            self.wall_heat_transfer_w_m2_k * wetted_wall * (self.ambient_temperature_k - t);

        let mass = (state.liquid_mass_kg - discharged - boil_off).max(0.0);
        let temperature = if mass > EPSILON_MASS {
            t + (wall_heat * dt - boil_off * chem.latent_heat_at(t)) / (mass * chem.liquid_cp_j_kg_k)
        } else {
            t
        };
        let temperature = check_finite(temperature, "tank liquid temperature")?;
        let level = mass / (rho * self.tank_area_m2);

        let puddle = self.puddle.step(&state.puddle, dt, discharged, t)?;
        let discharge = self.discharge_rate(level, temperature)?;

        Ok(TankLiquidState {
            time_s: state.time_s + dt,
            liquid_mass_kg: mass,
            liquid_level_m: level,
            liquid_temperature_k: temperature,
            discharge_kg_s: discharge,
            released_kg: state.released_kg + discharged,
            puddle,
        })
    }

    fn is_terminal(&self, state: &TankLiquidState) -> bool {
        state.liquid_level_m - self.hole_height_m <= DRAINED_HEAD_M
            || state.liquid_mass_kg <= EPSILON_MASS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pc_chem::{ChemicalStore, InMemoryStore};
    use pc_met::MetConditions;

    fn tank(spec: TankLiquidSpec) -> TankLiquidRelease {
        let chem = InMemoryStore::builtin().get_chemical("toluene").unwrap();
        let met = MeteorologicalState::new(MetConditions::default()).unwrap();
        TankLiquidRelease::new(&spec, &chem, &met).unwrap()
    }

    #[test]
    fn torricelli_rate_at_start() {
        let spec = TankLiquidSpec::default();
        let model = tank(spec.clone());
        let rho = model.chemical.liquid_density_kg_m3;
        let area = disc_area(spec.hole_diameter_m);
        let expected = spec.discharge_coefficient * area * rho * (2.0 * G0_MPS2 * 3.0).sqrt();
        let got = model.initial_state().discharge_kg_s;
        assert!((got - expected).abs() / expected < 1e-9, "{got} vs {expected}");
    }

    #[test]
    fn pad_pressure_raises_discharge() {
        let base = tank(TankLiquidSpec::default()).initial_state().discharge_kg_s;
        let padded = tank(TankLiquidSpec {
            pad_pressure_pa: Some(3e5),
            ..TankLiquidSpec::default()
        })
        .initial_state()
        .discharge_kg_s;
        assert!(padded > base);
    }

    #[test]
    fn drains_to_hole_and_feeds_puddle() {
        let spec = TankLiquidSpec {
            tank_diameter_m: 1.0,
            liquid_height_m: 1.0,
            hole_height_m: 0.2,
            ..TankLiquidSpec::default()
        };
        let model = tank(spec);
        let mut state = model.initial_state();
        let m0 = model.initial_mass_kg();
        for _ in 0..5_000 {
            if model.is_terminal(&state) {
                break;
            }
            let next = model.advance(&state, 1.0).unwrap();
            assert!(next.released_kg <= m0);
            assert!(next.liquid_level_m >= 0.2 - 1e-9);
            assert!(next.discharge_kg_s <= state.discharge_kg_s);
            state = next;
        }
        assert!(state.released_kg > 0.0);
        assert!(state.puddle.mass_kg + state.puddle.evaporated_kg <= state.released_kg + 1e-6);
        assert!(state.puddle.radius_m > 0.0);
    }
}
