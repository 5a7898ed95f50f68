//! Dispersion model choice and construction.

use crate::error::DispersionResult;
use crate::gaussian::{GaussianModel, PointSource, ReleaseMode};
use crate::grid::ConcentrationField;
use crate::heavy_gas::{HeavyGasConfig, HeavyGasModel, HeavyGasTrajectory, SourceGeometry};
use pc_chem::Chemical;
use pc_met::MeteorologicalState;
use serde::{Deserialize, Serialize};

/// Vapor-to-air density ratio above which `auto` picks the heavy-gas model.
pub const DEFAULT_DENSE_GAS_RATIO: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelChoice {
    #[default]
    Auto,
    Gaussian,
    HeavyGas,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Gaussian,
    HeavyGas,
}

impl ModelKind {
    pub fn label(&self) -> &'static str {
        match self {
            ModelKind::Gaussian => "gaussian",
            ModelKind::HeavyGas => "heavy_gas",
        }
    }
}

/// Resolve `auto` by comparing the released vapor's density with air.
pub fn resolve_model(
    choice: ModelChoice,
    chemical: &Chemical,
    release_temperature_k: f64,
    met: &MeteorologicalState,
    dense_ratio: f64,
) -> ModelKind {
    match choice {
        ModelChoice::Gaussian => ModelKind::Gaussian,
        ModelChoice::HeavyGas => ModelKind::HeavyGas,
        ModelChoice::Auto => {
            let ratio = chemical.vapor_density_ratio(release_temperature_k, met.ambient_temperature_k());
            let kind = if ratio > dense_ratio {
                ModelKind::HeavyGas
            } else {
                ModelKind::Gaussian
            };
            tracing::debug!(chemical = %chemical.name, ratio, dense_ratio, model = kind.label(), "dispersion model chosen");
            kind
        }
    }
}

/// What a dispersion run needs from the source term.
#[derive(Debug, Clone, PartialEq)]
pub struct DispersionInput {
    /// kg/s, or kg for an instantaneous Gaussian release.
    pub strength: f64,
    pub release_temperature_k: f64,
    pub height_m: f64,
    pub mode: ReleaseMode,
    pub geometry: SourceGeometry,
    pub max_distance_m: f64,
}

/// A concentration field from either model.
#[derive(Debug, Clone)]
pub enum DispersionField {
    Gaussian(GaussianModel),
    HeavyGas(HeavyGasTrajectory),
}

impl DispersionField {
    pub fn build(
        kind: ModelKind,
        input: &DispersionInput,
        chemical: &Chemical,
        met: &MeteorologicalState,
    ) -> DispersionResult<Self> {
        match kind {
            ModelKind::Gaussian => {
                let source = PointSource {
                    height_m: input.height_m,
                    ..PointSource::at_origin(input.strength)
                };
                Ok(Self::Gaussian(GaussianModel::new(met, input.mode, vec![source])?))
            }
            ModelKind::HeavyGas => {
                let config = HeavyGasConfig {
                    rate_kg_s: input.strength,
                    release_temperature_k: Some(input.release_temperature_k),
                    geometry: input.geometry,
                    max_distance_m: input.max_distance_m,
                    ..HeavyGasConfig::default()
                };
                let trajectory = HeavyGasModel::new(&config, chemical, met)?.run()?;
                Ok(Self::HeavyGas(trajectory))
            }
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Gaussian(_) => ModelKind::Gaussian,
            Self::HeavyGas(_) => ModelKind::HeavyGas,
        }
    }
}

impl ConcentrationField for DispersionField {
    fn concentration(&self, x: f64, y: f64, z: f64, t: f64) -> f64 {
        match self {
            Self::Gaussian(m) => m.concentration(x, y, z, t),
            Self::HeavyGas(m) => m.concentration(x, y, z, t),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Gaussian(m) => m.label(),
            Self::HeavyGas(m) => m.label(),
        }
    }
}
