//! Superheated liquid flashing through a hole in a tank.
//!
//! The jet density is the homogeneous mixture of the flashed vapor and the
//! remaining liquid. The liquid left in the tank cools as vapor boils off to
//! fill the volume the discharge vacates, and warms through the wetted wall.
//! That temperature is found implicitly each step.

use crate::common::{EPSILON_MASS, check_finite, disc_area, require_non_negative, require_positive};
use crate::error::{SourceError, SourceResult};
use crate::orifice::Orifice;
use crate::series::PhaseSplit;
use pc_chem::Chemical;
use pc_core::PcError;
use pc_core::numeric::closure_residual;
use pc_core::roots::{RootOptions, bisect};
use pc_core::units::constants::G0_MPS2;
use pc_core::units::m;
use pc_met::MeteorologicalState;
use pc_sim::{SimError, SimResult, StepModel};
use serde::{Deserialize, Serialize};

/// Relative residual at which the implicit temperature solve stops.
pub const TEMPERATURE_REL_TOL: f64 = 1e-10;
const TEMPERATURE_MAX_ITER: usize = 100;
/// Half-width of the bracket searched for the new temperature, K.
const TEMPERATURE_BRACKET_K: f64 = 25.0;
/// Relative tolerance on the tank energy balance.
pub const ENERGY_CLOSURE_TOLERANCE: f64 = 1e-6;
const DRAINED_HEAD_M: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwoPhaseSpec {
    pub tank_diameter_m: f64,
    pub liquid_height_m: f64,
    pub hole_diameter_m: f64,
    pub hole_height_m: f64,
    pub discharge_coefficient: f64,
    /// Must exceed the normal boiling point; defaults to ambient.
    pub initial_temperature_k: Option<f64>,
    pub wall_heat_transfer_w_m2_k: f64,
}

impl Default for TwoPhaseSpec {
    fn default() -> Self {
        Self {
            tank_diameter_m: 2.5,
            liquid_height_m: 2.0,
            hole_diameter_m: 0.05,
            hole_height_m: 0.0,
            discharge_coefficient: 0.6,
            initial_temperature_k: None,
            wall_heat_transfer_w_m2_k: 20.0,
        }
    }
}

impl TwoPhaseSpec {
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
        if let Some(t) = self.initial_temperature_k {
            require_positive(t, "liquid temperature below absolute zero")?;
        }
        require_non_negative(
            self.wall_heat_transfer_w_m2_k,
            "wall heat transfer coefficient must be non-negative",
        )?;
        Ok(())
    }
}

/// Fraction of a liquid at `temperature_k` that flashes at its normal
/// boiling point, clamped to `[0, 1]`.
pub fn flash_fraction(chemical: &Chemical, temperature_k: f64) -> f64 {
    let latent = chemical.latent_heat_at(temperature_k);
    if latent <= 0.0 {
        return 1.0;
    }
    (chemical.liquid_cp_j_kg_k * (temperature_k - chemical.boiling_point_k) / latent).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TwoPhaseState {
    pub time_s: f64,
    pub temperature_k: f64,
    pub liquid_mass_kg: f64,
    pub liquid_level_m: f64,
    pub flash_fraction: f64,
    pub phase: PhaseSplit,
    pub mass_flow_kg_s: f64,
    pub released_kg: f64,
    /// Relative closure of the last step's tank energy balance.
    pub closure_residual: f64,
}

#[derive(Debug, Clone)]
pub struct TwoPhaseRelease {
    chemical: Chemical,
    hole: Orifice,
    hole_diameter_m: f64,
    hole_height_m: f64,
    tank_diameter_m: f64,
    tank_area_m2: f64,
    ambient_pressure_pa: f64,
    ambient_temperature_k: f64,
    wall_heat_transfer_w_m2_k: f64,
    temperature_rel_tol: f64,
    /// Density of the flashed vapor at the boiling point and ambient pressure.
    flashed_vapor_density: f64,
    initial: TwoPhaseState,
}

impl TwoPhaseRelease {
    pub fn new(spec: &TwoPhaseSpec, chemical: &Chemical, met: &MeteorologicalState) -> SourceResult<Self> {
        spec.validate()?;
        let t0 = spec.initial_temperature_k.unwrap_or(met.ambient_temperature_k());
        if t0 <= chemical.boiling_point_k {
            return Err(SourceError::invalid(
                "two-phase release needs liquid above its boiling point",
                t0,
            ));
        }
        if t0 >= chemical.critical_temperature_k {
            return Err(SourceError::invalid(
                "liquid temperature at or above the critical point",
                t0,
            ));
        }
        let p_amb = met.ambient_pressure_pa();
        let tank_area = disc_area(spec.tank_diameter_m);
        let mass = chemical.liquid_density_kg_m3 * tank_area * spec.liquid_height_m;

        let mut model = Self {
            chemical: chemical.clone(),
            hole: Orifice::from_diameter(spec.discharge_coefficient, m(spec.hole_diameter_m)),
            hole_diameter_m: spec.hole_diameter_m,
            hole_height_m: spec.hole_height_m,
            tank_diameter_m: spec.tank_diameter_m,
            tank_area_m2: tank_area,
            ambient_pressure_pa: p_amb,
            ambient_temperature_k: met.ambient_temperature_k(),
            wall_heat_transfer_w_m2_k: spec.wall_heat_transfer_w_m2_k,
            temperature_rel_tol: TEMPERATURE_REL_TOL,
            flashed_vapor_density: chemical.vapor_density_kg_m3(chemical.boiling_point_k, p_amb),
            initial: TwoPhaseState {
                time_s: 0.0,
                temperature_k: t0,
                liquid_mass_kg: mass,
                liquid_level_m: spec.liquid_height_m,
                flash_fraction: 0.0,
                phase: PhaseSplit::LIQUID,
                mass_flow_kg_s: 0.0,
                released_kg: 0.0,
                closure_residual: 0.0,
            },
        };
        let chi = flash_fraction(chemical, t0);
        model.initial.flash_fraction = chi;
        model.initial.phase = PhaseSplit::from_flash_fraction(chi);
        model.initial.mass_flow_kg_s = model.discharge_rate(t0, spec.liquid_height_m, chi)?;
        Ok(model)
    }

    /// Stop the tank temperature solve once its residual falls below
    /// `rel_tol` of the heat exchanged over the step.
    pub fn with_temperature_tolerance(mut self, rel_tol: f64) -> Self {
        self.temperature_rel_tol = rel_tol;
        self
    }

    pub fn initial_mass_kg(&self) -> f64 {
        self.initial.liquid_mass_kg
    }

    /// Temperature of the flashed jet once it reaches ambient pressure.
    pub fn jet_temperature_k(&self) -> f64 {
        self.chemical.boiling_point_k
    }

    /// Tank pressure: saturated vapor (at least ambient) plus liquid head.
    pub fn tank_pressure_pa(&self, temperature_k: f64, level_m: f64) -> f64 {
        let head = (level_m - self.hole_height_m).max(0.0);
        self.chemical
            .vapor_pressure_pa(temperature_k)
            .max(self.ambient_pressure_pa)
            + self.chemical.liquid_density_kg_m3 * G0_MPS2 * head
    }

    fn discharge_rate(&self, temperature_k: f64, level_m: f64, chi: f64) -> SimResult<f64> {
        let head = level_m - self.hole_height_m;
        if head <= 0.0 {
            return Ok(0.0);
        }
        let rho_l = self.chemical.liquid_density_kg_m3;
        let rho_eff = 1.0 / (chi / self.flashed_vapor_density + (1.0 - chi) / rho_l);
        let dp = self.tank_pressure_pa(temperature_k, level_m) - self.ambient_pressure_pa;
        let open_fraction = (head / self.hole_diameter_m).min(1.0);
        Ok(self.hole.liquid_flow(rho_eff, dp, open_fraction)?.value)
    }

    fn mass_above_hole(&self, state: &TwoPhaseState) -> f64 {
        let head = (state.liquid_level_m - self.hole_height_m).max(0.0);
        (self.chemical.liquid_density_kg_m3 * self.tank_area_m2 * head).min(state.liquid_mass_kg)
    }

    /// Wall heat gain and boil-off cooling (both W) at tank temperature `t`.
    fn heat_terms(&self, t: f64, level_m: f64, discharge_kg_s: f64) -> (f64, f64) {
        let chem = &self.chemical;
        let wetted = std::f64::consts::PI * self.tank_diameter_m * level_m + self.tank_area_m2;
        let wall = self.wall_heat_transfer_w_m2_k * wetted * (self.ambient_temperature_k - t);
        let rho_v = chem.vapor_density_kg_m3(t, chem.vapor_pressure_pa(t));
        let rho_l = chem.liquid_density_kg_m3;
        let boil_off = (discharge_kg_s * rho_v / (rho_l - rho_v)).max(0.0);
        (wall, boil_off * chem.latent_heat_at(t))
    }
}

impl StepModel for TwoPhaseRelease {
    type State = TwoPhaseState;

    fn initial_state(&self) -> TwoPhaseState {
        self.initial.clone()
    }

    fn advance(&self, state: &TwoPhaseState, dt: f64) -> SimResult<TwoPhaseState> {
        let chem = &self.chemical;
        let t = state.temperature_k;
        let released = (state.mass_flow_kg_s * dt).min(self.mass_above_hole(state));
        let discharge = released / dt;
        let mass = state.liquid_mass_kg - released;
        let level = state.liquid_level_m;
        let heat_capacity = mass * chem.liquid_cp_j_kg_k;

        let (t_next, closure) = if mass > EPSILON_MASS {
            let residual = |tn: f64| {
                let (wall, cooling) = self.heat_terms(tn, level, discharge);
                heat_capacity * (tn - t) - dt * (wall - cooling)
            };
            let (wall0, cooling0) = self.heat_terms(t, level, discharge);
            let opts = RootOptions {
                max_iter: TEMPERATURE_MAX_ITER,
                x_tol: 4.0 * f64::EPSILON * t,
                f_tol: self.temperature_rel_tol * dt * (wall0.abs() + cooling0.abs()),
            };
            let root = bisect(
                residual,
                t - TEMPERATURE_BRACKET_K,
                t + TEMPERATURE_BRACKET_K,
                opts,
                "flash temperature",
            )
            .map_err(|e| match e {
                PcError::NotBracketed { f_lo, f_hi, .. } => SimError::Retryable {
                    message: e.to_string(),
                    residual: f_lo.abs().min(f_hi.abs()),
                },
                other => SimError::from(other),
            })?
            .root;
            // C (T' - T) = dt (wall(T') - cooling(T')) at the accepted root.
            let (wall, cooling) = self.heat_terms(root, level, discharge);
            let stored = heat_capacity * (root - t) / dt;
            (root, closure_residual(stored, &[wall, -cooling]))
        } else {
            (t, 0.0)
        };
        if closure > ENERGY_CLOSURE_TOLERANCE {
            return Err(SimError::Retryable {
                message: "tank energy balance does not close".into(),
                residual: closure,
            });
        }

        let rho_v = chem.vapor_density_kg_m3(t_next, chem.vapor_pressure_pa(t_next));
        let rho_l = chem.liquid_density_kg_m3;
        let boil_off = (released * rho_v / (rho_l - rho_v)).max(0.0);
        let mass = (mass - boil_off).max(0.0);
        let level = mass / (rho_l * self.tank_area_m2);
        let temperature = check_finite(t_next.max(chem.boiling_point_k), "tank temperature")?;

        let chi = flash_fraction(chem, temperature);
        let rate = self.discharge_rate(temperature, level, chi)?;

        Ok(TwoPhaseState {
            time_s: state.time_s + dt,
            temperature_k: temperature,
            liquid_mass_kg: mass,
            liquid_level_m: level,
            flash_fraction: chi,
            phase: PhaseSplit::from_flash_fraction(chi),
            mass_flow_kg_s: rate,
            released_kg: state.released_kg + released,
            closure_residual: closure,
        })
    }

    fn is_terminal(&self, state: &TwoPhaseState) -> bool {
        state.temperature_k <= self.chemical.boiling_point_k
            || state.liquid_mass_kg <= EPSILON_MASS
            || state.liquid_level_m - self.hole_height_m <= DRAINED_HEAD_M
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pc_chem::{ChemicalStore, InMemoryStore};
    use pc_met::MetConditions;
    use proptest::prelude::*;

    fn ammonia() -> Chemical {
        InMemoryStore::builtin().get_chemical("ammonia").unwrap()
    }

    fn met() -> MeteorologicalState {
        MeteorologicalState::new(MetConditions::default()).unwrap()
    }

    #[test]
    fn ammonia_flashes_about_a_fifth() {
        let chi = flash_fraction(&ammonia(), 298.15);
        assert!(chi > 0.12 && chi < 0.3, "chi = {chi}");
    }

    #[test]
    fn subcooled_liquid_is_rejected() {
        let spec = TwoPhaseSpec {
            initial_temperature_k: Some(230.0),
            ..TwoPhaseSpec::default()
        };
        let err = TwoPhaseRelease::new(&spec, &ammonia(), &met()).unwrap_err();
        assert!(matches!(err, SourceError::InputValidation { .. }));
    }

    #[test]
    fn steps_close_energy_and_keep_inventory() {
        let model = TwoPhaseRelease::new(&TwoPhaseSpec::default(), &ammonia(), &met()).unwrap();
        let m0 = model.initial_mass_kg();
        let mut state = model.initial_state();
        for _ in 0..300 {
            if model.is_terminal(&state) {
                break;
            }
            let next = model.advance(&state, 1.0).unwrap();
            assert!(next.closure_residual < ENERGY_CLOSURE_TOLERANCE);
            assert!((0.0..=1.0).contains(&next.flash_fraction));
            assert!(next.released_kg <= m0);
            assert!(next.temperature_k <= state.temperature_k + 1e-9);
            state = next;
        }
        assert!(state.released_kg > 0.0);
    }

    #[test]
    fn loose_temperature_solve_fails_closure() {
        let model = TwoPhaseRelease::new(&TwoPhaseSpec::default(), &ammonia(), &met())
            .unwrap()
            .with_temperature_tolerance(10.0);
        let err = model.advance(&model.initial_state(), 1.0).unwrap_err();
        match err {
            SimError::Retryable { residual, .. } => assert!(residual > ENERGY_CLOSURE_TOLERANCE),
            other => panic!("unexpected error {other}"),
        }
    }

    proptest! {
        #[test]
        fn flash_fraction_bounded(t in 150.0f64..400.0) {
            let chi = flash_fraction(&ammonia(), t);
            prop_assert!((0.0..=1.0).contains(&chi));
        }
    }
}
