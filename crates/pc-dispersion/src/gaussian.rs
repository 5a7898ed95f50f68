//! Gaussian plume and puff dispersion with ground reflection.
//!
//! Several point sources can share one grid. Each source may carry its own
//! wind; its contribution is computed in its own wind-aligned frame and
//! superposed in the grid frame.

use crate::error::{DispersionError, DispersionResult, require_non_negative, require_positive};
use crate::grid::ConcentrationField;
use crate::sigma::{Sigmas, sigmas};
use pc_core::erf;
use pc_met::{MeteorologicalState, StabilityClass, SurfaceRoughness};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, SQRT_2};

/// How the released mass enters the atmosphere.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReleaseMode {
    /// Steady plume; source strength in kg/s.
    #[default]
    Continuous,
    /// Constant rate (kg/s) for `duration_s`, then nothing.
    Puff { duration_s: f64 },
    /// All mass (kg) at once.
    Instantaneous,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PointSource {
    /// Position in the grid frame.
    pub x_m: f64,
    pub y_m: f64,
    pub height_m: f64,
    /// kg/s, or kg for an instantaneous release.
    pub strength: f64,
    /// Overrides the transport speed derived from the meteorology.
    pub wind_speed_m_s: Option<f64>,
    /// Overrides the grid wind direction for this source.
    pub wind_direction_deg: Option<f64>,
}

impl PointSource {
    pub fn at_origin(strength: f64) -> Self {
        Self {
            strength,
            ..Self::default()
        }
    }
}

/// Unit vector (east, north) the wind blows towards.
pub(crate) fn downwind_unit(direction_from_deg: f64) -> (f64, f64) {
    let from = direction_from_deg.to_radians();
    (-from.sin(), -from.cos())
}

/// Source with its frame rotation and transport speed resolved.
#[derive(Debug, Clone, PartialEq)]
struct ResolvedSource {
    x0: f64,
    y0: f64,
    height_m: f64,
    strength: f64,
    speed: f64,
    /// Grid-frame to source-frame rotation: `[[a, b], [c, e]]`.
    rotation: [f64; 4],
}

impl ResolvedSource {
    fn to_local(&self, x: f64, y: f64) -> (f64, f64) {
        let (dx, dy) = (x - self.x0, y - self.y0);
        let [a, b, c, e] = self.rotation;
        (a * dx + b * dy, c * dx + e * dy)
    }
}

/// Crosswind kernel, 1/m.
fn gy(y: f64, sigma_y: f64) -> f64 {
    (-y * y / (2.0 * sigma_y * sigma_y)).exp() / ((2.0 * PI).sqrt() * sigma_y)
}

/// Vertical kernel with the ground image source, 1/m.
fn gz(z: f64, sigma_z: f64, h: f64) -> f64 {
    let two_s2 = 2.0 * sigma_z * sigma_z;
    ((-(z - h).powi(2) / two_s2).exp() + (-(z + h).powi(2) / two_s2).exp())
        / ((2.0 * PI).sqrt() * sigma_z)
}

#[derive(Debug, Clone, PartialEq)]
pub struct GaussianModel {
    stability: StabilityClass,
    roughness: SurfaceRoughness,
    mode: ReleaseMode,
    sources: Vec<ResolvedSource>,
}

impl GaussianModel {
    pub fn new(
        met: &MeteorologicalState,
        mode: ReleaseMode,
        sources: Vec<PointSource>,
    ) -> DispersionResult<Self> {
        if sources.is_empty() {
            return Err(DispersionError::invalid("at least one source is required", 0));
        }
        if let ReleaseMode::Puff { duration_s } = mode {
            require_positive(duration_s, "puff duration must be positive")?;
        }
        let grid_dir = met.wind_direction_deg();
        let (gd_e, gd_n) = downwind_unit(grid_dir);
        let (gl_e, gl_n) = (-gd_n, gd_e);

        let resolved = sources
            .into_iter()
            .map(|s| {
                require_non_negative(s.strength, "source strength must be non-negative")?;
                require_non_negative(s.height_m, "source height must be non-negative")?;
                if !(s.x_m.is_finite() && s.y_m.is_finite()) {
                    return Err(DispersionError::invalid("source position must be finite", s.x_m));
                }
                let speed = match s.wind_speed_m_s {
                    Some(u) => require_positive(u, "source wind speed must be positive")?,
                    None => met.wind_speed_at(s.height_m.max(met.reference_height_m()))?,
                };
                let (sd_e, sd_n) = downwind_unit(s.wind_direction_deg.unwrap_or(grid_dir));
                let (sl_e, sl_n) = (-sd_n, sd_e);
                Ok(ResolvedSource {
                    x0: s.x_m,
                    y0: s.y_m,
                    height_m: s.height_m,
                    strength: s.strength,
                    speed,
                    rotation: [
                        gd_e * sd_e + gd_n * sd_n,
                        gl_e * sd_e + gl_n * sd_n,
                        gd_e * sl_e + gd_n * sl_n,
                        gl_e * sl_e + gl_n * sl_n,
                    ],
                })
            })
            .collect::<DispersionResult<Vec<_>>>()?;

        Ok(Self {
            stability: met.stability(),
            roughness: met.roughness(),
            mode,
            sources: resolved,
        })
    }

    /// Single continuous source at the origin.
    pub fn continuous(met: &MeteorologicalState, rate_kg_s: f64, height_m: f64) -> DispersionResult<Self> {
        Self::new(
            met,
            ReleaseMode::Continuous,
            vec![PointSource {
                height_m,
                ..PointSource::at_origin(rate_kg_s)
            }],
        )
    }

    pub fn mode(&self) -> ReleaseMode {
        self.mode
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Transport speed of the first source.
    pub fn transport_speed(&self) -> f64 {
        self.sources.first().map_or(0.0, |s| s.speed)
    }

    fn sigmas_at(&self, distance_m: f64) -> Sigmas {
        sigmas(distance_m, self.stability, self.roughness)
    }

    fn contribution(&self, s: &ResolvedSource, x: f64, y: f64, z: f64, t: f64) -> f64 {
        let (xs, ys) = s.to_local(x, y);
        let u = s.speed;
        match self.mode {
            ReleaseMode::Continuous => {
                if xs <= 0.0 {
                    return 0.0;
                }
                let sig = self.sigmas_at(xs);
                s.strength / u * gy(ys, sig.y) * gz(z, sig.z, s.height_m)
            }
            ReleaseMode::Puff { duration_s } => {
                if xs <= 0.0 || t <= 0.0 {
                    return 0.0;
                }
                let sig = self.sigmas_at(xs);
                let plume = s.strength / u * gy(ys, sig.y) * gz(z, sig.z, s.height_m);
                let d = SQRT_2 * sig.x;
                let window = if t <= duration_s {
                    erf(xs / d) - erf((xs - u * t) / d)
                } else {
                    erf((xs - u * (t - duration_s)) / d) - erf((xs - u * t) / d)
                };
                0.5 * plume * window.max(0.0)
            }
            ReleaseMode::Instantaneous => {
                if t <= 0.0 {
                    return 0.0;
                }
                let travelled = u * t;
                let sig = self.sigmas_at(travelled);
                let along = xs - travelled;
                let gx = (-along * along / (2.0 * sig.x * sig.x)).exp() / ((2.0 * PI).sqrt() * sig.x);
                s.strength * gx * gy(ys, sig.y) * gz(z, sig.z, s.height_m)
            }
        }
    }
}

impl ConcentrationField for GaussianModel {
    fn concentration(&self, x: f64, y: f64, z: f64, t: f64) -> f64 {
        self.sources
            .iter()
            .map(|s| self.contribution(s, x, y, z, t))
            .sum()
    }

    fn label(&self) -> &'static str {
        match self.mode {
            ReleaseMode::Continuous => "gaussian_plume",
            ReleaseMode::Puff { .. } => "gaussian_puff",
            ReleaseMode::Instantaneous => "gaussian_instantaneous",
        }
    }
}
