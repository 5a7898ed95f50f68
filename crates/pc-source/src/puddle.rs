//! Puddle evaporation driven by a six-term surface energy balance.
//!
//! Fluxes are W/m² and positive into the puddle. Evaporation uses the
//! Brighton mass-transfer coefficient for a pool of downwind length equal to
//! its diameter. Once the puddle reaches its boiling point the temperature
//! is held there and the net non-evaporative heat boils liquid off instead.

use crate::common::{EPSILON_MASS, check_finite, require_positive};
use crate::error::SourceResult;
use pc_chem::Chemical;
use pc_core::numeric::{clamp_non_negative, closure_residual};
use pc_core::units::constants::{G0_MPS2, MW_AIR, R_UNIVERSAL, STEFAN_BOLTZMANN, VON_KARMAN};
use pc_met::{MeteorologicalState, power_law_exponent};
use pc_sim::{SimError, SimResult, StepModel};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Relative tolerance on `net = sum(components)`.
pub const ENERGY_CLOSURE_TOLERANCE: f64 = 1e-6;

const EMISSIVITY: f64 = 0.97;
const ATMOSPHERIC_ALBEDO: f64 = 0.03;
const TURBULENT_SCHMIDT: f64 = 0.85;
const EULER_GAMMA: f64 = 0.577_215_664_9;
const CP_AIR: f64 = 1004.0;
const MW_WATER: f64 = 18.015;
/// Diffusivity of water vapor in air, m²/s.
const WATER_VAPOR_DIFFUSIVITY: f64 = 2.39e-5;
const AIR_KINEMATIC_VISCOSITY: f64 = 1.5e-5;
const AIR_THERMAL_DIFFUSIVITY: f64 = 2.12e-5;
const AIR_MASS_DIFFUSIVITY: f64 = 2.1e-5;
/// Heat transfer coefficient from a water body, W/(m² K).
const WATER_SUBSTRATE_COEFFICIENT: f64 = 500.0;
const MIN_CONTACT_TIME_S: f64 = 1.0;
const MIN_DOWNWIND_LENGTH_M: f64 = 1e-3;
/// Largest puddle temperature change accepted in one step before cutting back.
const MAX_TEMPERATURE_STEP_K: f64 = 10.0;

/// Atmospheric emissivity coefficients `a + b·e_w` by cloud cover (tenths).
const CLOUD_A: [f64; 11] = [
    0.740, 0.750, 0.760, 0.770, 0.783, 0.793, 0.800, 0.810, 0.820, 0.840, 0.870,
];
const CLOUD_B: [f64; 11] = [
    44.3e-6, 44.3e-6, 44.3e-6, 44.2e-6, 40.7e-6, 40.5e-6, 39.9e-6, 38.4e-6, 35.4e-6, 31.0e-6,
    26.6e-6,
];

/// Ground under the spill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Substrate {
    #[default]
    DefaultSoil,
    DrySandySoil,
    MoistSandySoil,
    Concrete,
    Water,
}

impl Substrate {
    /// Thermal conductivity W/(m K) and diffusivity m²/s; `None` for water.
    pub fn conduction_properties(&self) -> Option<(f64, f64)> {
        match self {
            Substrate::DefaultSoil => Some((8.64, 4.13e-6)),
            Substrate::DrySandySoil => Some((2.34, 1.74e-6)),
            Substrate::MoistSandySoil => Some((5.31, 3.74e-6)),
            Substrate::Concrete => Some((8.28, 3.74e-6)),
            Substrate::Water => None,
        }
    }
}

/// One term of the surface energy balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FluxTerm {
    Solar,
    LongwaveDown,
    LongwaveUp,
    Sensible,
    Evaporative,
    Substrate,
}

/// Surface energy balance, W/m², positive into the puddle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnergyFluxes {
    pub solar: f64,
    pub longwave_down: f64,
    pub longwave_up: f64,
    pub sensible: f64,
    pub evaporative: f64,
    pub substrate: f64,
    pub net: f64,
}

impl EnergyFluxes {
    /// Instantaneous balance with `net` taken as the sum of the terms.
    fn from_components(c: [f64; 6]) -> Self {
        Self {
            solar: c[0],
            longwave_down: c[1],
            longwave_up: c[2],
            sensible: c[3],
            evaporative: c[4],
            substrate: c[5],
            net: c.iter().sum(),
        }
    }

    pub fn components(&self) -> [f64; 6] {
        [
            self.solar,
            self.longwave_down,
            self.longwave_up,
            self.sensible,
            self.evaporative,
            self.substrate,
        ]
    }

    /// `|net - sum| / sum|c|`. After a step, `net` is the stored-heat rate
    /// `m cp dT / (A dt)` of the pool.
    pub fn closure_residual(&self) -> f64 {
        closure_residual(self.net, &self.components())
    }
}

/// Where and how the liquid lies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PuddleSurface {
    pub substrate: Substrate,
    /// Defaults to the ambient air temperature.
    pub substrate_temperature_k: Option<f64>,
    /// Spreading stops once the puddle is this thin.
    pub min_depth_m: f64,
    /// Dike or bund radius.
    pub max_radius_m: Option<f64>,
    /// Terms forced to zero.
    pub disabled_fluxes: Vec<FluxTerm>,
}

impl Default for PuddleSurface {
    fn default() -> Self {
        Self {
            substrate: Substrate::default(),
            substrate_temperature_k: None,
            min_depth_m: 0.005,
            max_radius_m: None,
            disabled_fluxes: Vec::new(),
        }
    }
}

impl PuddleSurface {
    pub fn validate(&self) -> SourceResult<()> {
        require_positive(self.min_depth_m, "minimum puddle depth must be positive")?;
        if let Some(r) = self.max_radius_m {
            require_positive(r, "dike radius must be positive")?;
        }
        if let Some(t) = self.substrate_temperature_k {
            require_positive(t, "substrate temperature below absolute zero")?;
        }
        Ok(())
    }

    fn enabled(&self, term: FluxTerm) -> bool {
        !self.disabled_fluxes.contains(&term)
    }
}

/// Standalone spill of known size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PuddleSpec {
    pub mass_kg: f64,
    pub area_m2: f64,
    /// Defaults to the ambient air temperature.
    pub temperature_k: Option<f64>,
    pub surface: PuddleSurface,
}

impl Default for PuddleSpec {
    fn default() -> Self {
        Self {
            mass_kg: 100.0,
            area_m2: 10.0,
            temperature_k: None,
            surface: PuddleSurface::default(),
        }
    }
}

/// Annulus of ground first wetted at `wetted_at_s`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WettedRing {
    pub outer_radius_m: f64,
    pub wetted_at_s: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PuddleState {
    pub time_s: f64,
    pub temperature_k: f64,
    pub radius_m: f64,
    pub mass_kg: f64,
    /// Rate of mass leaving the puddle as vapor over the last step.
    pub evaporation_kg_s: f64,
    pub evaporated_kg: f64,
    pub boiling: bool,
    pub fluxes: EnergyFluxes,
    pub closure_residual: f64,
    pub rings: Vec<WettedRing>,
}

impl PuddleState {
    pub fn area_m2(&self) -> f64 {
        PI * self.radius_m * self.radius_m
    }

    fn empty(temperature_k: f64) -> Self {
        Self {
            time_s: 0.0,
            temperature_k,
            radius_m: 0.0,
            mass_kg: 0.0,
            evaporation_kg_s: 0.0,
            evaporated_kg: 0.0,
            boiling: false,
            fluxes: EnergyFluxes::default(),
            closure_residual: 0.0,
            rings: Vec::new(),
        }
    }
}

/// Balance evaluated at one puddle temperature.
struct SurfaceBalance {
    fluxes: EnergyFluxes,
    /// kg/(m² s)
    evaporation_flux: f64,
    boiling: bool,
}

/// Evaporating pool on the ground.
#[derive(Debug, Clone)]
pub struct PuddleEvaporation {
    chemical: Chemical,
    met: MeteorologicalState,
    surface: PuddleSurface,
    substrate_temperature_k: f64,
    friction_velocity: f64,
    longwave_down: f64,
    initial: PuddleState,
}

impl PuddleEvaporation {
    /// Spill of `spec.mass_kg` already spread over `spec.area_m2`.
    pub fn new(spec: &PuddleSpec, chemical: &Chemical, met: &MeteorologicalState) -> SourceResult<Self> {
        require_positive(spec.mass_kg, "puddle mass must be positive")?;
        require_positive(spec.area_m2, "puddle area must be positive")?;
        let temperature_k = spec.temperature_k.unwrap_or(met.ambient_temperature_k());
        require_positive(temperature_k, "puddle temperature below absolute zero")?;

        let mut model = Self::empty(&spec.surface, chemical, met, temperature_k)?;
        let radius_m = (spec.area_m2 / PI).sqrt();
        let mut state = PuddleState::empty(temperature_k.min(chemical.boiling_point_k));
        state.radius_m = radius_m;
        state.mass_kg = spec.mass_kg;
        state.rings.push(WettedRing {
            outer_radius_m: radius_m,
            wetted_at_s: 0.0,
        });
        let balance = model.balance(&state, state.temperature_k);
        state.evaporation_kg_s = balance.evaporation_flux * state.area_m2();
        state.boiling = balance.boiling;
        state.closure_residual = balance.fluxes.closure_residual();
        state.fluxes = balance.fluxes;
        model.initial = state;
        Ok(model)
    }

    /// Dry ground, to be fed by a discharge.
    pub fn empty(
        surface: &PuddleSurface,
        chemical: &Chemical,
        met: &MeteorologicalState,
        temperature_k: f64,
    ) -> SourceResult<Self> {
        surface.validate()?;
        let substrate_temperature_k = surface
            .substrate_temperature_k
            .unwrap_or(met.ambient_temperature_k());
        let friction_velocity = met.friction_velocity()?;
        let longwave_down = if surface.enabled(FluxTerm::LongwaveDown) {
            atmospheric_longwave(
                met.ambient_temperature_k(),
                met.relative_humidity(),
                met.cloud_cover_tenths(),
            )
        } else {
            0.0
        };
        Ok(Self {
            chemical: chemical.clone(),
            met: met.clone(),
            surface: surface.clone(),
            substrate_temperature_k,
            friction_velocity,
            longwave_down,
            initial: PuddleState::empty(temperature_k),
        })
    }

    pub fn chemical(&self) -> &Chemical {
        &self.chemical
    }

    /// Brighton mean mass-transfer coefficient for a pool of this downwind length.
    fn mass_transfer_coefficient(&self, downwind_length_m: f64) -> f64 {
        let n = power_law_exponent(self.met.stability());
        let z0 = self.met.roughness_length_m();
        let u_star = self.friction_velocity;
        let k = VON_KARMAN;

        let diffusivity =
            WATER_VAPOR_DIFFUSIVITY * (MW_WATER / self.chemical.molecular_weight_g_mol).sqrt();
        let sc = AIR_KINEMATIC_VISCOSITY / diffusivity;
        let re0 = u_star * z0 / AIR_KINEMATIC_VISCOSITY;

        let smooth = (3.85 * sc.cbrt() - 1.3).powi(2) + (TURBULENT_SCHMIDT / k) * (0.13 * sc).ln();
        let rough = |re: f64| 7.3 * re.powf(0.25) * sc.sqrt() - 5.0 * TURBULENT_SCHMIDT;
        let f_sc = if re0 < 0.13 {
            smooth
        } else if re0 > 2.0 {
            rough(re0)
        } else {
            smooth + (rough(2.0) - smooth) * (re0 - 0.13) / (2.0 - 0.13)
        };

        let lambda = 1.0 / n + 1.0 + 2.0 * (1.0 + n).ln() - 2.0 * EULER_GAMMA
            + (k / TURBULENT_SCHMIDT) * (1.0 + n) * f_sc;
        let x1 = n * k * k * downwind_length_m.max(MIN_DOWNWIND_LENGTH_M)
            / (TURBULENT_SCHMIDT * z0 * (1.0 / n).exp());
        let l = lambda + x1.ln();
        let denom = l * l + PI * PI;
        let jbar = (k / TURBULENT_SCHMIDT)
            * (1.0 + n)
            * (0.5 - (l / PI).atan() / PI
                + (1.0 - EULER_GAMMA) / denom
                + (1.0 + (1.0 - EULER_GAMMA).powi(2) + PI * PI / 6.0) * l / (denom * denom));
        jbar.max(0.0)
    }

    /// Conduction from the ground, summed ring by ring from wetting time.
    fn substrate_flux(&self, state: &PuddleState, temperature_k: f64) -> f64 {
        let dt_ground = self.substrate_temperature_k - temperature_k;
        let Some((conductivity, diffusivity)) = self.surface.substrate.conduction_properties()
        else {
            return WATER_SUBSTRATE_COEFFICIENT * dt_ground.max(0.0);
        };
        let area = state.area_m2();
        if area <= 0.0 {
            return 0.0;
        }
        let mut inner = 0.0_f64;
        let mut weighted = 0.0;
        for ring in &state.rings {
            let outer = ring.outer_radius_m.min(state.radius_m);
            if outer > inner {
                let ring_area = PI * (outer * outer - inner * inner);
                let contact = (state.time_s - ring.wetted_at_s).max(MIN_CONTACT_TIME_S);
                weighted += ring_area / (PI * diffusivity * contact).sqrt();
            }
            inner = inner.max(outer);
        }
        conductivity * dt_ground * weighted / area
    }

    fn balance(&self, state: &PuddleState, temperature_k: f64) -> SurfaceBalance {
        let chem = &self.chemical;
        let on = |term| self.surface.enabled(term);
        let t_boil = chem.boiling_point_k;
        let boiling = temperature_k >= t_boil;
        let t = temperature_k.min(t_boil);
        let p_amb = self.met.ambient_pressure_pa();
        let t_air = self.met.ambient_temperature_k();

        let jbar = self.mass_transfer_coefficient(2.0 * state.radius_m);
        let jc = if boiling {
            jbar
        } else {
            let x = (chem.vapor_pressure_pa(t) / p_amb).min(0.999);
            if x > 0.0 { -jbar * (1.0 - x).ln() / x } else { jbar }
        };

        let solar = if on(FluxTerm::Solar) {
            self.met.insolation_w_m2()
        } else {
            0.0
        };
        let longwave_up = if on(FluxTerm::LongwaveUp) {
            -EMISSIVITY * STEFAN_BOLTZMANN * t.powi(4)
        } else {
            0.0
        };
        let sensible = if on(FluxTerm::Sensible) {
            let rho_air = p_amb * MW_AIR * 1e-3 / (R_UNIVERSAL * t_air);
            rho_air
                * CP_AIR
                * jc
                * (AIR_THERMAL_DIFFUSIVITY / AIR_MASS_DIFFUSIVITY).powf(2.0 / 3.0)
                * self.friction_velocity
                * (t_air - t)
        } else {
            0.0
        };
        let substrate = if on(FluxTerm::Substrate) {
            self.substrate_flux(state, t)
        } else {
            0.0
        };
        let latent = chem.latent_heat_at(t);

        let (evaporative, evaporation_flux) = if !on(FluxTerm::Evaporative) {
            (0.0, 0.0)
        } else if boiling {
            let heat = solar + self.longwave_down + longwave_up + sensible + substrate;
            if heat > 0.0 && latent > 0.0 {
                (-heat, heat / latent)
            } else {
                (0.0, 0.0)
            }
        } else {
            let pv = chem.vapor_pressure_pa(t);
            let saturation = chem.molecular_weight_g_mol * 1e-3 * pv / (R_UNIVERSAL * t);
            let flux = clamp_non_negative(saturation * self.friction_velocity * jc, "evaporation flux");
            (-flux * latent, flux)
        };

        SurfaceBalance {
            fluxes: EnergyFluxes::from_components([
                solar,
                self.longwave_down,
                longwave_up,
                sensible,
                evaporative,
                substrate,
            ]),
            evaporation_flux,
            boiling,
        }
    }

    /// Advance the puddle by `dt`, first mixing in `inflow_kg` of liquid at
    /// `inflow_temperature_k`.
    pub(crate) fn step(
        &self,
        state: &PuddleState,
        dt: f64,
        inflow_kg: f64,
        inflow_temperature_k: f64,
    ) -> SimResult<PuddleState> {
        let chem = &self.chemical;
        let rho = chem.liquid_density_kg_m3;
        let t_boil = chem.boiling_point_k;

        let mass = state.mass_kg + inflow_kg;
        if mass <= EPSILON_MASS {
            let mut next = PuddleState::empty(state.temperature_k);
            next.time_s = state.time_s + dt;
            next.evaporated_kg = state.evaporated_kg;
            next.rings = state.rings.clone();
            return Ok(next);
        }
        let mut temperature = if inflow_kg > 0.0 {
            (state.mass_kg * state.temperature_k + inflow_kg * inflow_temperature_k) / mass
        } else {
            state.temperature_k
        };

        // Superheated inflow flashes on contact.
        let mut flashed = 0.0;
        if temperature > t_boil {
            let latent = chem.latent_heat_at(t_boil);
            if latent > 0.0 {
                flashed = (mass * chem.liquid_cp_j_kg_k * (temperature - t_boil) / latent).min(mass);
            }
            temperature = t_boil;
        }
        let mass = mass - flashed;

        let depth_cap = (mass / (PI * rho * self.surface.min_depth_m)).sqrt();
        let cap = match self.surface.max_radius_m {
            Some(r) => depth_cap.min(r),
            None => depth_cap,
        };
        let spreading = inflow_kg / dt > state.evaporation_kg_s;
        let radius = if spreading {
            let grown = if state.radius_m > 0.0 {
                state.radius_m + (2.0 * G0_MPS2 * mass / (PI * rho)).sqrt() / state.radius_m * dt
            } else {
                (mass / (PI * rho)).cbrt()
            };
            grown.min(cap).max(state.radius_m)
        } else {
            state.radius_m.min(cap)
        };
        let radius = check_finite(radius, "puddle radius")?;

        let mut trial = state.clone();
        trial.radius_m = radius;
        let wetted_edge = trial.rings.last().map_or(0.0, |r| r.outer_radius_m);
        if radius > wetted_edge {
            trial.rings.push(WettedRing {
                outer_radius_m: radius,
                wetted_at_s: state.time_s,
            });
        }

        let balance = self.balance(&trial, temperature);
        let area = trial.area_m2();
        let latent = chem.latent_heat_at(temperature.min(t_boil));
        let heat_capacity = mass * chem.liquid_cp_j_kg_k / area.max(f64::MIN_POSITIVE);
        let demand = balance.fluxes;
        let heat_in = demand.solar + demand.longwave_down + demand.longwave_up + demand.sensible + demand.substrate;

        let mut evaporated = (balance.evaporation_flux * area * dt).min(mass);
        let mut next_temperature = if balance.boiling && balance.evaporation_flux > 0.0 {
            t_boil
        } else {
            let evaporative = -evaporated * latent / (area * dt);
            let dtemp = (heat_in + evaporative) * dt / heat_capacity;
            if dtemp.abs() > MAX_TEMPERATURE_STEP_K {
                return Err(SimError::Retryable {
                    message: "puddle temperature step too large".into(),
                    residual: dtemp.abs(),
                });
            }
            temperature + dtemp
        };
        // Heat carrying the pool past its boiling point boils liquid off.
        if next_temperature > t_boil && latent > 0.0 {
            let excess_j = (next_temperature - t_boil) * heat_capacity * area;
            evaporated = (evaporated + excess_j / latent).min(mass);
            next_temperature = t_boil;
        }
        if next_temperature < chem.freezing_point_k {
            return Err(SimError::NonPhysical {
                what: "puddle cooled below its freezing point",
            });
        }
        let remaining = clamp_non_negative(mass - evaporated, "puddle mass");

        // Net is what the state update stored; the components are what it spent.
        let fluxes = EnergyFluxes {
            evaporative: -evaporated * latent / (area * dt),
            net: heat_capacity * (next_temperature - temperature) / dt,
            ..demand
        };
        let closure = fluxes.closure_residual();
        if remaining > EPSILON_MASS && closure > ENERGY_CLOSURE_TOLERANCE {
            return Err(SimError::NonPhysical {
                what: "puddle energy balance does not close",
            });
        }

        trial.time_s = state.time_s + dt;
        trial.temperature_k = check_finite(next_temperature, "puddle temperature")?;
        trial.mass_kg = remaining;
        trial.evaporation_kg_s = (evaporated + flashed) / dt;
        trial.evaporated_kg = state.evaporated_kg + evaporated + flashed;
        trial.boiling = balance.boiling || next_temperature >= t_boil;
        trial.fluxes = fluxes;
        trial.closure_residual = closure;
        if trial.mass_kg <= EPSILON_MASS {
            trial.mass_kg = 0.0;
            trial.radius_m = 0.0;
        }
        Ok(trial)
    }
}

impl StepModel for PuddleEvaporation {
    type State = PuddleState;

    fn initial_state(&self) -> PuddleState {
        self.initial.clone()
    }

    fn advance(&self, state: &PuddleState, dt: f64) -> SimResult<PuddleState> {
        self.step(state, dt, 0.0, state.temperature_k)
    }

    fn is_terminal(&self, state: &PuddleState) -> bool {
        state.mass_kg <= EPSILON_MASS
    }
}

/// Downward longwave radiation from the atmosphere, W/m².
pub fn atmospheric_longwave(air_temperature_k: f64, relative_humidity: f64, cloud_tenths: f64) -> f64 {
    let vapor_pressure_pa = 99.89 * relative_humidity * (21.66 - 5431.3 / air_temperature_k).exp();
    let idx = cloud_tenths.round().clamp(0.0, 10.0) as usize;
    let emissivity = CLOUD_A[idx] + CLOUD_B[idx] * vapor_pressure_pa;
    (1.0 - ATMOSPHERIC_ALBEDO) * STEFAN_BOLTZMANN * air_temperature_k.powi(4) * emissivity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use pc_chem::{ChemicalStore, InMemoryStore};
    use pc_met::MetConditions;

    fn met() -> MeteorologicalState {
        MeteorologicalState::new(MetConditions {
            insolation_w_m2: 400.0,
            ..MetConditions::default()
        })
        .unwrap()
    }

    fn chemical(name: &str) -> Chemical {
        InMemoryStore::builtin().get_chemical(name).unwrap()
    }

    #[test]
    fn clear_sky_longwave_is_plausible() {
        let lw = atmospheric_longwave(298.15, 0.5, 0.0);
        assert!(lw > 300.0 && lw < 450.0, "lw = {lw}");
        assert!(atmospheric_longwave(298.15, 0.5, 10.0) > lw);
    }

    #[test]
    fn toluene_puddle_evaporates_and_closes() {
        let spec = PuddleSpec {
            mass_kg: 500.0,
            area_m2: 50.0,
            ..PuddleSpec::default()
        };
        let model = PuddleEvaporation::new(&spec, &chemical("toluene"), &met()).unwrap();
        let mut state = model.initial_state();
        assert!(state.evaporation_kg_s > 0.0);
        for _ in 0..120 {
            state = model.advance(&state, 1.0).unwrap();
            assert!(state.fluxes.closure_residual() < ENERGY_CLOSURE_TOLERANCE);
            assert!(state.mass_kg + state.evaporated_kg <= 500.0 + 1e-9);
        }
        assert!(state.evaporated_kg > 0.0);
        assert!(!state.boiling);
    }

    #[test]
    fn net_flux_is_the_stored_heat_of_the_step() {
        let spec = PuddleSpec {
            mass_kg: 500.0,
            area_m2: 50.0,
            ..PuddleSpec::default()
        };
        let chem = chemical("toluene");
        let model = PuddleEvaporation::new(&spec, &chem, &met()).unwrap();
        let before = model.initial_state();
        let dt = 2.0;
        let after = model.advance(&before, dt).unwrap();

        let stored = before.mass_kg * chem.liquid_cp_j_kg_k * (after.temperature_k - before.temperature_k)
            / (after.area_m2() * dt);
        assert!(stored.abs() > 1e-3, "stored = {stored}");
        assert!((after.fluxes.net - stored).abs() <= 1e-9 * stored.abs());
        assert!(after.closure_residual < ENERGY_CLOSURE_TOLERANCE);

        let mut leaky = after.fluxes;
        leaky.net += 1e-3 * leaky.components().iter().map(|c| c.abs()).sum::<f64>();
        assert!(leaky.closure_residual() > ENERGY_CLOSURE_TOLERANCE);
    }

    #[test]
    fn cold_ammonia_puddle_boils() {
        let chem = chemical("ammonia");
        let spec = PuddleSpec {
            mass_kg: 200.0,
            area_m2: 20.0,
            temperature_k: Some(chem.boiling_point_k),
            ..PuddleSpec::default()
        };
        let model = PuddleEvaporation::new(&spec, &chem, &met()).unwrap();
        let state = model.advance(&model.initial_state(), 1.0).unwrap();
        assert!(state.boiling);
        assert_eq!(state.temperature_k, chem.boiling_point_k);
        assert!(state.fluxes.net.abs() < 1e-6);
        assert!(state.evaporation_kg_s > 0.0);
    }

    #[test]
    fn disabled_terms_are_zero() {
        let spec = PuddleSpec {
            surface: PuddleSurface {
                disabled_fluxes: vec![FluxTerm::Solar, FluxTerm::Substrate],
                ..PuddleSurface::default()
            },
            ..PuddleSpec::default()
        };
        let model = PuddleEvaporation::new(&spec, &chemical("methanol"), &met()).unwrap();
        let state = model.advance(&model.initial_state(), 1.0).unwrap();
        assert_eq!(state.fluxes.solar, 0.0);
        assert_eq!(state.fluxes.substrate, 0.0);
        assert!(state.fluxes.longwave_down > 0.0);
    }

    #[test]
    fn older_rings_conduct_less() {
        let spec = PuddleSpec::default();
        let model = PuddleEvaporation::new(&spec, &chemical("acetone"), &met()).unwrap();
        let mut early = model.initial_state();
        early.time_s = 10.0;
        let mut late = early.clone();
        late.time_s = 1000.0;
        let t = 280.0;
        assert!(model.substrate_flux(&early, t) > model.substrate_flux(&late, t));
        assert!(model.substrate_flux(&late, t) > 0.0);
    }

    #[test]
    fn water_substrate_only_heats() {
        let spec = PuddleSpec {
            surface: PuddleSurface {
                substrate: Substrate::Water,
                ..PuddleSurface::default()
            },
            ..PuddleSpec::default()
        };
        let model = PuddleEvaporation::new(&spec, &chemical("benzene"), &met()).unwrap();
        let state = model.initial_state();
        assert!(model.substrate_flux(&state, 280.0) > 0.0);
        assert_eq!(model.substrate_flux(&state, 310.0), 0.0);
    }

    #[test]
    fn radius_grows_while_fed_and_never_grows_after() {
        let chem = chemical("toluene");
        let model =
            PuddleEvaporation::empty(&PuddleSurface::default(), &chem, &met(), 298.15).unwrap();
        let mut state = model.initial_state();
        for _ in 0..200 {
            let next = model.step(&state, 1.0, 2.0, 298.15).unwrap();
            assert!(next.radius_m >= state.radius_m);
            state = next;
        }
        assert!(state.rings.len() > 1);
        let depth = state.mass_kg / (chem.liquid_density_kg_m3 * state.area_m2());
        assert!(depth > 0.0049, "depth = {depth}");
        for _ in 0..200 {
            let next = model.advance(&state, 1.0).unwrap();
            assert!(next.radius_m <= state.radius_m);
            state = next;
        }
    }

    #[test]
    fn dike_caps_radius() {
        let surface = PuddleSurface {
            max_radius_m: Some(2.0),
            ..PuddleSurface::default()
        };
        let model = PuddleEvaporation::empty(&surface, &chemical("toluene"), &met(), 298.15).unwrap();
        let mut state = model.initial_state();
        for _ in 0..100 {
            state = model.step(&state, 1.0, 20.0, 298.15).unwrap();
        }
        assert!(state.radius_m <= 2.0 + 1e-12);
    }

    #[test]
    fn rejects_negative_mass() {
        let spec = PuddleSpec {
            mass_kg: -1.0,
            ..PuddleSpec::default()
        };
        let err = PuddleEvaporation::new(&spec, &chemical("toluene"), &met()).unwrap_err();
        assert!(matches!(err, SourceError::InputValidation { .. }));
    }
}
