//! Dense-gas cloud dispersion after Britter and McQuaid.
//!
//! The cloud is marched downwind from a secondary source. Its state is the
//! vertical scale `sigma_z`, the effective half-width, the cloud temperature
//! and the total mass flux (chemical plus entrained air). Gravity slumping
//! widens the cloud while the bulk Richardson number is above one; turbulent
//! entrainment dilutes and warms it until it behaves like a passive plume.
//!
//! The reported centerline concentration blends the dense-cloud estimate
//! with the passive Gaussian plume, weighted by how far the Richardson
//! number has fallen below one.

use crate::error::{DispersionError, DispersionResult, require_positive};
use crate::gaussian::GaussianModel;
use crate::grid::ConcentrationField;
use crate::sigma::sigma_y_slope;
use pc_chem::Chemical;
use pc_core::gamma;
use pc_core::units::constants::{MW_AIR, R_UNIVERSAL};
use pc_met::{MeteorologicalState, StabilityClass, power_law_exponent};
use pc_sim::{Integrator, RK4, SimError, SimOptions, SimResult, StepModel, Stepper, TransientModel};
use serde::{Deserialize, Serialize};

/// Von Karman constant used by the entrainment correlations.
const KAPPA: f64 = 0.41;
const G: f64 = 9.81;
/// Gravity-spreading coefficient.
const CE: f64 = 1.15;
/// Ground-to-cloud heat transfer, W/(m² K).
const GROUND_HEAT_TRANSFER: f64 = 20.0;
/// Heat capacity of the cloud mixture, J/(kg K).
const CLOUD_CP: f64 = 480.0;
/// Floors applied inside the derivative evaluation.
const MIN_SCALE_M: f64 = 0.1;
const MIN_MASS_FLUX: f64 = 1e-6;
const MIN_EROSION_FLUX: f64 = 1e-6;
/// Largest `step * stiffness` accepted per RK4 step.
const STIFFNESS_LIMIT: f64 = 1.0;

/// Richardson number above which the cloud slumps under gravity.
pub const DENSE_RICHARDSON: f64 = 1.0;
/// Richardson number below which the cloud is tagged passive.
pub const PASSIVE_RICHARDSON: f64 = 0.1;
pub const DEFAULT_MAX_DISTANCE_M: f64 = 12_000.0;

/// Shape of the secondary source the cloud starts from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceGeometry {
    /// Jet or vent; size set by the erosion balance.
    #[default]
    Continuous,
    /// Evaporating pool of known diameter.
    Puddle { diameter_m: f64 },
    /// Initial cloud of known volume and footprint.
    Instantaneous { volume_m3: f64, area_m2: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeavyGasConfig {
    pub rate_kg_s: f64,
    /// Temperature of the vapor as it leaves the source; defaults to the
    /// normal boiling point.
    pub release_temperature_k: Option<f64>,
    pub geometry: SourceGeometry,
    pub max_distance_m: f64,
    /// Nominal march step.
    pub step_m: f64,
}

impl Default for HeavyGasConfig {
    fn default() -> Self {
        Self {
            rate_kg_s: 1.0,
            release_temperature_k: None,
            geometry: SourceGeometry::Continuous,
            max_distance_m: DEFAULT_MAX_DISTANCE_M,
            step_m: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    Dense,
    Transitional,
    Passive,
}

impl Regime {
    pub fn from_richardson(ri: f64) -> Self {
        if ri > DENSE_RICHARDSON {
            Regime::Dense
        } else if ri > PASSIVE_RICHARDSON {
            Regime::Transitional
        } else {
            Regime::Passive
        }
    }
}

/// Weight of the passive plume in the blended concentration.
pub fn passive_weight(richardson: f64) -> f64 {
    1.0 - (richardson.max(0.0) / DENSE_RICHARDSON).min(1.0)
}

/// Ideal-gas density at `pressure_pa`.
fn density(temperature_k: f64, molecular_weight: f64, pressure_pa: f64) -> f64 {
    pressure_pa * molecular_weight * 1e-3 / (R_UNIVERSAL * temperature_k)
}

/// Entrainment suppression by stratification.
fn phi(ri_prime: f64) -> f64 {
    if ri_prime < 0.0 {
        1.0
    } else {
        0.88 + 0.099 * ri_prime.powf(1.04) + 1.4e-25 * ri_prime.powf(5.7)
    }
}

/// Cloud state marched along the downwind distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CloudState {
    pub distance_m: f64,
    pub sigma_z_m: f64,
    pub half_width_m: f64,
    pub temperature_k: f64,
    /// Chemical plus entrained air, kg/s.
    pub mass_flux_kg_s: f64,
}

/// Derived quantities at one cloud state.
#[derive(Debug, Clone, Copy)]
struct Local {
    sigma_z: f64,
    half_width: f64,
    effective_height: f64,
    advection_speed: f64,
    mass_fraction: f64,
    richardson: f64,
    richardson_prime: f64,
    sigma_w: f64,
    phi: f64,
    g_prime: f64,
}

/// One recorded point of the cloud trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CloudPoint {
    pub distance_m: f64,
    pub half_width_m: f64,
    pub sigma_z_m: f64,
    pub effective_height_m: f64,
    pub temperature_k: f64,
    pub mass_fraction: f64,
    pub richardson: f64,
    pub passive_weight: f64,
    pub regime: Regime,
    /// Dense-cloud centerline estimate, kg/m³.
    pub dense_kg_m3: f64,
    /// Passive Gaussian centerline at ground level, kg/m³.
    pub passive_kg_m3: f64,
    /// Blended centerline, kg/m³.
    pub centerline_kg_m3: f64,
}

#[derive(Debug, Clone)]
pub struct HeavyGasModel {
    rate_kg_s: f64,
    gas_mw: f64,
    ambient_temperature_k: f64,
    ambient_pressure_pa: f64,
    rho_air: f64,
    u_ref: f64,
    z_ref: f64,
    u_star: f64,
    n: f64,
    gamma_term: f64,
    stability: StabilityClass,
    max_distance_m: f64,
    step_m: f64,
    passive: GaussianModel,
    initial: CloudState,
}

impl HeavyGasModel {
    pub fn new(config: &HeavyGasConfig, chemical: &Chemical, met: &MeteorologicalState) -> DispersionResult<Self> {
        let q = require_positive(config.rate_kg_s, "heavy-gas release rate must be positive")?;
        require_positive(config.step_m, "heavy-gas step must be positive")?;
        let t_src = config.release_temperature_k.unwrap_or(chemical.boiling_point_k);
        require_positive(t_src, "release temperature below absolute zero")?;

        let stability = met.stability();
        let n = power_law_exponent(stability);
        let gamma_term = gamma(1.0 / (1.0 + n));
        let t_amb = met.ambient_temperature_k();
        let p_amb = met.ambient_pressure_pa();
        let u_ref = met.wind_speed_m_s();
        let z_ref = met.reference_height_m();
        let u_star = met.friction_velocity()?;
        let rho_air = density(t_amb, MW_AIR, p_amb);
        let rho_src = density(t_src, chemical.molecular_weight_g_mol, p_amb);

        let (rb, hb) = secondary_source(
            q,
            config.geometry,
            SecondaryInputs {
                rho_src,
                rho_air,
                t_src,
                t_amb,
                u_star,
                u_ref,
                z_ref,
                n,
            },
        )?;
        if config.max_distance_m <= rb {
            return Err(DispersionError::invalid(
                "heavy-gas march must extend past the source radius",
                config.max_distance_m,
            ));
        }
        tracing::debug!(rb, hb, u_star, n, "heavy-gas secondary source");

        Ok(Self {
            rate_kg_s: q,
            gas_mw: chemical.molecular_weight_g_mol,
            ambient_temperature_k: t_amb,
            ambient_pressure_pa: p_amb,
            rho_air,
            u_ref,
            z_ref,
            u_star,
            n,
            gamma_term,
            stability,
            max_distance_m: config.max_distance_m,
            step_m: config.step_m,
            passive: GaussianModel::continuous(met, q, 0.0)?,
            initial: CloudState {
                distance_m: rb,
                sigma_z_m: hb * (1.0 + n) / gamma_term,
                half_width_m: rb,
                temperature_k: t_src.min(t_amb),
                mass_flux_kg_s: q,
            },
        })
    }

    pub fn source_radius_m(&self) -> f64 {
        self.initial.distance_m
    }

    fn local(&self, s: &CloudState) -> Local {
        let n = self.n;
        let sigma_z = s.sigma_z_m.max(MIN_SCALE_M);
        let half_width = s.half_width_m.max(MIN_SCALE_M);
        let tc = s.temperature_k.min(self.ambient_temperature_k);
        let flux = s.mass_flux_kg_s.max(MIN_MASS_FLUX);

        let mass_fraction = (self.rate_kg_s / flux).min(1.0);
        let mw_mix = 1.0 / (mass_fraction / self.gas_mw + (1.0 - mass_fraction) / MW_AIR);
        let rho_cloud = density(tc, mw_mix, self.ambient_pressure_pa);
        let effective_height = sigma_z / (1.0 + n) * self.gamma_term;
        let g_prime = G * (rho_cloud - self.rho_air) / self.rho_air;
        let advection_speed = self.u_ref / self.gamma_term * (sigma_z / self.z_ref).powf(n);
        let richardson = g_prime * effective_height / (self.u_star * self.u_star);

        let thermal = ((self.ambient_temperature_k - tc) / tc).max(0.0);
        let ri_t = G * thermal * (effective_height / (self.u_star * self.u_ref))
            * (self.z_ref / effective_height).powf(n);
        let sigma_w = self.u_star * (1.0 + ri_t.powf(2.0 / 3.0)).sqrt();
        let richardson_prime = richardson * (self.u_star / sigma_w).powi(2);

        Local {
            sigma_z,
            half_width,
            effective_height,
            advection_speed,
            mass_fraction,
            richardson,
            richardson_prime,
            sigma_w,
            phi: phi(richardson_prime.max(0.0)),
            g_prime,
        }
    }

    fn derivatives(&self, s: &CloudState) -> CloudState {
        let n = self.n;
        let l = self.local(s);
        let tc = s.temperature_k.min(self.ambient_temperature_k);
        let flux = s.mass_flux_kg_s.max(MIN_MASS_FLUX);

        let d_sigma_z =
            (1.0 + n) / self.gamma_term * KAPPA * self.u_star / (l.advection_speed * l.phi);
        let gravity = if l.g_prime > 0.0 && l.richardson_prime > DENSE_RICHARDSON {
            CE * self.gamma_term
                * (self.z_ref / l.sigma_z).powf(n)
                * (l.g_prime * l.effective_height).sqrt()
                / self.u_ref
        } else {
            0.0
        };
        let passive = std::f64::consts::PI.sqrt() / 2.0 * sigma_y_slope(s.distance_m, self.stability);
        let entrainment = self.rho_air * KAPPA * l.sigma_w * (1.0 + n) / l.phi;
        let d_flux = entrainment * 2.0 * l.half_width;
        let ground_heat = GROUND_HEAT_TRANSFER * (self.ambient_temperature_k - tc);
        let d_temperature = d_flux / flux * (self.ambient_temperature_k - tc)
            + ground_heat * 2.0 * l.half_width / (flux * CLOUD_CP);

        CloudState {
            distance_m: 1.0,
            sigma_z_m: d_sigma_z,
            half_width_m: gravity + passive,
            temperature_k: d_temperature,
            mass_flux_kg_s: d_flux,
        }
    }

    /// Fastest relaxation rate (1/m) of the temperature and flux equations.
    fn stiffness(&self, s: &CloudState) -> f64 {
        let l = self.local(s);
        let flux = s.mass_flux_kg_s.max(MIN_MASS_FLUX);
        let entrainment = self.rho_air * KAPPA * l.sigma_w * (1.0 + self.n) / l.phi;
        (entrainment * 2.0 * l.half_width + GROUND_HEAT_TRANSFER * 2.0 * l.half_width / CLOUD_CP)
            / flux
    }

    fn point(&self, s: &CloudState) -> CloudPoint {
        let l = self.local(s);
        let dense = self.rate_kg_s / (2.0 * l.half_width * l.effective_height * l.advection_speed);
        let passive = self.passive.concentration(s.distance_m, 0.0, 0.0, 0.0);
        let w = passive_weight(l.richardson);
        CloudPoint {
            distance_m: s.distance_m,
            half_width_m: l.half_width,
            sigma_z_m: l.sigma_z,
            effective_height_m: l.effective_height,
            temperature_k: s.temperature_k,
            mass_fraction: l.mass_fraction,
            richardson: l.richardson,
            passive_weight: w,
            regime: Regime::from_richardson(l.richardson),
            dense_kg_m3: dense,
            passive_kg_m3: passive,
            centerline_kg_m3: w * passive + (1.0 - w) * dense,
        }
    }

    /// March the cloud to `max_distance_m` and record every accepted step.
    pub fn run(&self) -> DispersionResult<HeavyGasTrajectory> {
        let opts = SimOptions {
            dt: self.step_m,
            t_end: self.max_distance_m - self.initial.distance_m,
            max_steps: 1_000_000,
            min_dt: 1e-6,
            max_retries: 30,
            ..SimOptions::default()
        };
        let mut points = vec![self.point(&self.initial)];
        for record in Stepper::new(self, opts)? {
            points.push(self.point(&record?.state));
        }
        let trajectory = HeavyGasTrajectory {
            rate_kg_s: self.rate_kg_s,
            profile_exponent: 1.0 + self.n,
            points,
        };
        if let Some(last) = trajectory.points.last() {
            tracing::info!(
                steps = trajectory.points.len(),
                distance_m = last.distance_m,
                final_regime = ?last.regime,
                "heavy-gas march complete"
            );
        }
        Ok(trajectory)
    }
}

/// Derivatives of the cloud state with respect to distance.
struct CloudOde<'a> {
    model: &'a HeavyGasModel,
}

impl TransientModel for CloudOde<'_> {
    type State = CloudState;

    fn initial_state(&self) -> CloudState {
        self.model.initial
    }

    fn rhs(&mut self, _t: f64, x: &CloudState) -> SimResult<CloudState> {
        let d = self.model.derivatives(x);
        let finite = [d.sigma_z_m, d.half_width_m, d.temperature_k, d.mass_flux_kg_s]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(SimError::Retryable {
                message: "non-finite cloud derivative".into(),
                residual: f64::NAN,
            });
        }
        Ok(d)
    }

    fn add(&self, a: &CloudState, b: &CloudState) -> CloudState {
        CloudState {
            distance_m: a.distance_m + b.distance_m,
            sigma_z_m: a.sigma_z_m + b.sigma_z_m,
            half_width_m: a.half_width_m + b.half_width_m,
            temperature_k: a.temperature_k + b.temperature_k,
            mass_flux_kg_s: a.mass_flux_kg_s + b.mass_flux_kg_s,
        }
    }

    fn scale(&self, a: &CloudState, k: f64) -> CloudState {
        CloudState {
            distance_m: a.distance_m * k,
            sigma_z_m: a.sigma_z_m * k,
            half_width_m: a.half_width_m * k,
            temperature_k: a.temperature_k * k,
            mass_flux_kg_s: a.mass_flux_kg_s * k,
        }
    }
}

impl StepModel for HeavyGasModel {
    type State = CloudState;

    fn initial_state(&self) -> CloudState {
        self.initial
    }

    /// One RK4 step of `dx` metres; too large a step for the local
    /// relaxation rate is refused so the stepper cuts it back.
    fn advance(&self, state: &CloudState, dx: f64) -> SimResult<CloudState> {
        let stiffness = self.stiffness(state);
        if dx * stiffness > STIFFNESS_LIMIT {
            return Err(SimError::Retryable {
                message: "heavy-gas step exceeds the relaxation length".into(),
                residual: dx * stiffness,
            });
        }
        let mut ode = CloudOde { model: self };
        RK4.step(&mut ode, state.distance_m, state, dx)
    }

    fn is_terminal(&self, state: &CloudState) -> bool {
        state.distance_m >= self.max_distance_m
    }
}

struct SecondaryInputs {
    rho_src: f64,
    rho_air: f64,
    t_src: f64,
    t_amb: f64,
    u_star: f64,
    u_ref: f64,
    z_ref: f64,
    n: f64,
}

/// Radius and depth (m) of the secondary source.
fn secondary_source(q: f64, geometry: SourceGeometry, p: SecondaryInputs) -> DispersionResult<(f64, f64)> {
    let g_prime = G * (p.rho_src - p.rho_air) / p.rho_air;
    let u10 = p.u_ref * (10.0 / p.z_ref).powf(p.n);

    let (mut rb, hb) = match geometry {
        SourceGeometry::Instantaneous { volume_m3, area_m2 } => {
            require_positive(volume_m3, "initial cloud volume must be positive")?;
            require_positive(area_m2, "initial cloud area must be positive")?;
            ((area_m2 / std::f64::consts::PI).sqrt(), volume_m3 / area_m2)
        }
        SourceGeometry::Puddle { diameter_m } => {
            require_positive(diameter_m, "puddle diameter must be positive")?;
            (diameter_m / 2.0, q / (p.rho_src * u10 * diameter_m))
        }
        SourceGeometry::Continuous => (0.0, (q * std::f64::consts::PI / (4.0 * p.rho_src * u10)).sqrt()),
    };
    let hb = hb.max(MIN_SCALE_M);

    let richardson = g_prime * hb / (p.u_star * p.u_star);
    let thermal = ((p.t_amb - p.t_src) / p.t_src).max(0.0);
    let ri_t = G * thermal * (hb / (p.u_star * p.u_ref)) * (p.z_ref / hb).powf(p.n);
    let sigma_w = p.u_star * (1.0 + ri_t.powf(2.0 / 3.0)).sqrt();
    let ri_prime = richardson * (p.u_star / sigma_w).powi(2);
    let erosion = p.rho_air * KAPPA * sigma_w * (1.0 + p.n) / phi(ri_prime);

    match geometry {
        SourceGeometry::Continuous => {
            rb = if erosion <= MIN_EROSION_FLUX {
                50.0
            } else {
                (q / erosion / std::f64::consts::PI).sqrt()
            };
        }
        SourceGeometry::Puddle { .. } if erosion > MIN_EROSION_FLUX => {
            let eroded_area = q / erosion;
            if eroded_area > std::f64::consts::PI * rb * rb {
                rb = (eroded_area / std::f64::consts::PI).sqrt();
            }
        }
        _ => {}
    }
    if !(rb.is_finite() && hb.is_finite()) {
        return Err(DispersionError::NonPhysical {
            what: "heavy-gas secondary source",
        });
    }
    Ok((rb.max(MIN_SCALE_M), hb))
}

/// Recorded cloud trajectory; serves as a steady concentration field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeavyGasTrajectory {
    pub rate_kg_s: f64,
    /// Shape exponent `1 + n` of the vertical profile.
    pub profile_exponent: f64,
    pub points: Vec<CloudPoint>,
}

/// Interpolated cloud section.
#[derive(Debug, Clone, Copy)]
struct Section {
    centerline: f64,
    half_width: f64,
    sigma_z: f64,
}

impl Section {
    fn of(p: &CloudPoint) -> Self {
        Self {
            centerline: p.centerline_kg_m3,
            half_width: p.half_width_m,
            sigma_z: p.sigma_z_m,
        }
    }

    fn lerp(a: &CloudPoint, b: &CloudPoint, f: f64) -> Self {
        let mix = |u: f64, v: f64| u + f * (v - u);
        Self {
            centerline: mix(a.centerline_kg_m3, b.centerline_kg_m3),
            half_width: mix(a.half_width_m, b.half_width_m),
            sigma_z: mix(a.sigma_z_m, b.sigma_z_m),
        }
    }
}

impl HeavyGasTrajectory {
    /// Blended centerline at `distance_m`, interpolated between points.
    ///
    /// Inside the source radius the first point applies; past the last
    /// point the cloud is not resolved and zero is returned.
    pub fn centerline_kg_m3(&self, distance_m: f64) -> f64 {
        self.section(distance_m).map_or(0.0, |s| s.centerline)
    }

    fn section(&self, x: f64) -> Option<Section> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        if x < first.distance_m {
            return (x.abs() <= first.distance_m).then(|| Section::of(first));
        }
        if x > last.distance_m {
            return None;
        }
        let j = self.points.partition_point(|p| p.distance_m < x);
        if j == 0 {
            return Some(Section::of(first));
        }
        let (a, b) = (&self.points[j - 1], &self.points[j]);
        let span = b.distance_m - a.distance_m;
        let f = if span > 0.0 { (x - a.distance_m) / span } else { 1.0 };
        Some(Section::lerp(a, b, f))
    }

    /// Farthest recorded distance at which the centerline reaches `level_kg_m3`.
    pub fn threat_distance_m(&self, level_kg_m3: f64) -> Option<f64> {
        self.points
            .iter()
            .rev()
            .find(|p| p.centerline_kg_m3 >= level_kg_m3)
            .map(|p| p.distance_m)
    }

    pub fn final_regime(&self) -> Option<Regime> {
        self.points.last().map(|p| p.regime)
    }
}

impl ConcentrationField for HeavyGasTrajectory {
    /// Gaussian crosswind profile with the half-width as its scale and a
    /// stretched-exponential vertical profile.
    fn concentration(&self, x: f64, y: f64, z: f64, _t: f64) -> f64 {
        let Some(s) = self.section(x) else {
            return 0.0;
        };
        let width = s.half_width.max(MIN_SCALE_M);
        let height = s.sigma_z.max(MIN_SCALE_M);
        let crosswind = (-0.5 * (y / width).powi(2)).exp();
        let vertical = (-(z.max(0.0) / height).powf(self.profile_exponent)).exp();
        s.centerline * crosswind * vertical
    }

    fn label(&self) -> &'static str {
        "heavy_gas"
    }
}
