//! Dispersion models: turn a release rate into a concentration field.
//!
//! Provides:
//! - Pasquill-Gifford spreads with urban and rural vertical sets
//! - Gaussian plume, finite puff and instantaneous puff with ground reflection
//! - Multi-source superposition in a shared grid frame
//! - A Britter-McQuaid dense-gas cloud marched downwind and blended into the
//!   passive plume as it dilutes
//! - Grid evaluation in ppm behind the [`ConcentrationField`] trait

pub mod error;
pub mod gaussian;
pub mod grid;
pub mod heavy_gas;
pub mod select;
pub mod sigma;

pub use error::{DispersionError, DispersionResult};
pub use gaussian::{GaussianModel, PointSource, ReleaseMode};
pub use grid::{ConcentrationField, GridField, GridSpec, evaluate_grid};
pub use heavy_gas::{
    CloudPoint, CloudState, HeavyGasConfig, HeavyGasModel, HeavyGasTrajectory, Regime, SourceGeometry,
    passive_weight,
};
pub use select::{
    DEFAULT_DENSE_GAS_RATIO, DispersionField, DispersionInput, ModelChoice, ModelKind, resolve_model,
};
pub use sigma::{NEAR_FIELD_M, Sigmas, sigma_y, sigmas};
