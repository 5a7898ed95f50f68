//! Meteorology engine: stability classification, wind profiles, solar geometry.
//!
//! Every function here is pure. [`MeteorologicalState`] is validated once per
//! scenario and read-only afterwards.

pub mod error;
pub mod solar;
pub mod stability;
pub mod state;
pub mod wind_profile;

pub use error::{MetError, MetResult};
pub use solar::{SolarPosition, cloud_corrected_insolation, solar_position};
pub use stability::{
    InsolationCategory, SkyCondition, StabilityClass, TimeOfDay, classify_stability,
    stability_from_conditions,
};
pub use state::{MetConditions, MeteorologicalState, SurfaceRoughness};
pub use wind_profile::{
    WindProfileMethod, friction_velocity, obukhov_length, power_law_exponent, wind_profile,
};
