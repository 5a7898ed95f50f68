//! Evaluation grids and the concentration fields sampled on them.
//!
//! The grid frame has its origin at the primary source, `x` along the mean
//! wind and `y` to the left of it.

use crate::error::{DispersionError, DispersionResult, require_non_negative};
use pc_core::{PpmConverter, clamp_non_negative};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    pub x_min_m: f64,
    pub x_max_m: f64,
    pub y_min_m: f64,
    pub y_max_m: f64,
    pub nx: usize,
    pub ny: usize,
    /// Receptor height.
    pub z_m: f64,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            x_min_m: -100.0,
            x_max_m: 3000.0,
            y_min_m: -500.0,
            y_max_m: 500.0,
            nx: 311,
            ny: 101,
            z_m: 1.5,
        }
    }
}

impl GridSpec {
    pub fn validate(&self) -> DispersionResult<()> {
        let finite = [self.x_min_m, self.x_max_m, self.y_min_m, self.y_max_m]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.x_min_m >= self.x_max_m {
            return Err(DispersionError::invalid(
                "grid x extent must be finite with x_min < x_max",
                format!("{}..{}", self.x_min_m, self.x_max_m),
            ));
        }
        if self.y_min_m >= self.y_max_m {
            return Err(DispersionError::invalid(
                "grid y extent must satisfy y_min < y_max",
                format!("{}..{}", self.y_min_m, self.y_max_m),
            ));
        }
        if self.nx < 2 || self.ny < 2 {
            return Err(DispersionError::invalid(
                "grid needs at least two points per axis",
                format!("{}x{}", self.nx, self.ny),
            ));
        }
        require_non_negative(self.z_m, "receptor height must be non-negative")?;
        Ok(())
    }

    pub fn dx(&self) -> f64 {
        (self.x_max_m - self.x_min_m) / (self.nx - 1) as f64
    }

    pub fn dy(&self) -> f64 {
        (self.y_max_m - self.y_min_m) / (self.ny - 1) as f64
    }

    pub fn x(&self, i: usize) -> f64 {
        self.x_min_m + i as f64 * self.dx()
    }

    pub fn y(&self, j: usize) -> f64 {
        self.y_min_m + j as f64 * self.dy()
    }

    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A point-wise concentration model.
///
/// Implementations return kg/m³ at grid-frame coordinates `(x, y, z)` and
/// `t` seconds after the release began. Values are never negative.
pub trait ConcentrationField: Sync {
    fn concentration(&self, x: f64, y: f64, z: f64, t: f64) -> f64;

    /// Short model name for logs and artifacts.
    fn label(&self) -> &'static str;
}

/// Concentration (ppm) sampled on a [`GridSpec`], row-major in `y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridField {
    pub spec: GridSpec,
    pub time_s: f64,
    /// `values[j * nx + i]` at `(x(i), y(j))`.
    pub values: Vec<f64>,
}

impl GridField {
    pub fn value(&self, i: usize, j: usize) -> f64 {
        self.values[j * self.spec.nx + i]
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// Farthest downwind grid column on the `y = 0` row at or above `level`.
    pub fn centerline_extent(&self, level: f64) -> Option<f64> {
        let j = (((0.0 - self.spec.y_min_m) / self.spec.dy()).round() as isize)
            .clamp(0, self.spec.ny as isize - 1) as usize;
        (0..self.spec.nx)
            .rev()
            .find(|&i| self.value(i, j) >= level)
            .map(|i| self.spec.x(i))
    }
}

/// Sample `field` over `grid` at time `t`, converting to ppm.
///
/// Rows are evaluated in parallel; the result does not depend on thread
/// scheduling.
pub fn evaluate_grid<F>(field: &F, grid: &GridSpec, t: f64, ppm: &PpmConverter) -> DispersionResult<GridField>
where
    F: ConcentrationField + ?Sized,
{
    grid.validate()?;
    let nx = grid.nx;
    let mut values = vec![0.0; grid.len()];
    values
        .par_chunks_mut(nx)
        .enumerate()
        .for_each(|(j, row)| {
            let y = grid.y(j);
            for (i, cell) in row.iter_mut().enumerate() {
                let c = field.concentration(grid.x(i), y, grid.z_m, t);
                *cell = clamp_non_negative(ppm.to_ppm(c), "grid concentration");
            }
        });

    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        tracing::error!(model = field.label(), value = bad, "non-finite concentration on grid");
        return Err(DispersionError::NonPhysical {
            what: "grid concentration",
        });
    }
    tracing::debug!(
        model = field.label(),
        nx,
        ny = grid.ny,
        max_ppm = values.iter().copied().fold(0.0, f64::max),
        "grid evaluated"
    );
    Ok(GridField {
        spec: grid.clone(),
        time_s: t,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ramp;

    impl ConcentrationField for Ramp {
        fn concentration(&self, x: f64, _y: f64, _z: f64, _t: f64) -> f64 {
            (1e-3 * (100.0 - x)).max(0.0)
        }

        fn label(&self) -> &'static str {
            "ramp"
        }
    }

    fn grid() -> GridSpec {
        GridSpec {
            x_min_m: 0.0,
            x_max_m: 200.0,
            y_min_m: -10.0,
            y_max_m: 10.0,
            nx: 21,
            ny: 3,
            z_m: 0.0,
        }
    }

    #[test]
    fn coordinates_span_the_extent() {
        let g = grid();
        assert_eq!(g.x(0), 0.0);
        assert_eq!(g.x(20), 200.0);
        assert_eq!(g.y(1), 0.0);
        assert_eq!(g.len(), 63);
    }

    #[test]
    fn rejects_degenerate_grids() {
        let mut g = grid();
        g.nx = 1;
        assert!(g.validate().is_err());
        let mut g = grid();
        g.x_max_m = -1.0;
        assert!(g.validate().is_err());
    }

    #[test]
    fn evaluation_is_row_major_and_in_ppm() {
        let ppm = PpmConverter::new(17.031, 298.15, 101_325.0).unwrap();
        let field = evaluate_grid(&Ramp, &grid(), 0.0, &ppm).unwrap();
        assert_eq!(field.values.len(), 63);
        assert!((field.value(0, 1) - ppm.to_ppm(0.1)).abs() < 1e-9);
        assert_eq!(field.value(20, 2), 0.0);
        assert_eq!(field.centerline_extent(ppm.to_ppm(0.045)), Some(50.0));
    }
}
