//! Centerline profiles and threat distances.

use crate::error::{ConsequenceError, ConsequenceResult};
use pc_core::PpmConverter;
use pc_dispersion::{ConcentrationField, GridField};
use serde::{Deserialize, Serialize};

/// Concentration (ppm) along `y = 0` at increasing downwind distances.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Centerline {
    pub distances_m: Vec<f64>,
    pub ppm: Vec<f64>,
}

impl Centerline {
    /// Sample `field` every `step_m` from `step_m` to `x_max_m`.
    pub fn sample<F>(
        field: &F,
        ppm: &PpmConverter,
        x_max_m: f64,
        step_m: f64,
        z_m: f64,
        t_s: f64,
    ) -> ConsequenceResult<Self>
    where
        F: ConcentrationField + ?Sized,
    {
        if !(step_m.is_finite() && step_m > 0.0) {
            return Err(ConsequenceError::invalid("centerline step must be positive", step_m));
        }
        if !(x_max_m.is_finite() && x_max_m >= step_m) {
            return Err(ConsequenceError::invalid("centerline range must cover one step", x_max_m));
        }
        let n = (x_max_m / step_m).floor() as usize;
        let distances_m: Vec<f64> = (1..=n).map(|k| k as f64 * step_m).collect();
        let ppm = distances_m
            .iter()
            .map(|&x| ppm.to_ppm(field.concentration(x, 0.0, z_m, t_s)).max(0.0))
            .collect();
        Ok(Self { distances_m, ppm })
    }

    /// The grid row nearest `y = 0`, downwind part only.
    pub fn from_grid(field: &GridField) -> Self {
        let spec = &field.spec;
        let j = ((-spec.y_min_m / spec.dy()).round().max(0.0) as usize).min(spec.ny - 1);
        let (distances_m, ppm) = (0..spec.nx)
            .filter(|&i| spec.x(i) > 0.0)
            .map(|i| (spec.x(i), field.value(i, j)))
            .unzip();
        Self { distances_m, ppm }
    }
}

/// Farthest sampled distance where the centerline is at or above
/// `level_ppm`; 0 when it never is.
pub fn centerline_threat_distance(centerline: &Centerline, level_ppm: f64) -> f64 {
    centerline
        .distances_m
        .iter()
        .zip(&centerline.ppm)
        .rev()
        .find(|(_, c)| **c >= level_ppm)
        .map_or(0.0, |(x, _)| *x)
}
