//! Validated meteorological state for one scenario.

use crate::error::{MetError, MetResult, require_positive};
use crate::stability::StabilityClass;
use crate::wind_profile::{WindProfileMethod, friction_velocity, wind_profile};
use pc_core::units::constants::{P_ATM_PA, T_STANDARD_K};
use serde::{Deserialize, Serialize};

/// Surface roughness category; selects dispersion coefficients and z0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceRoughness {
    #[default]
    Urban,
    Rural,
}

impl SurfaceRoughness {
    /// Representative aerodynamic roughness length, m.
    pub fn default_length_m(&self) -> f64 {
        match self {
            SurfaceRoughness::Urban => 1.0,
            SurfaceRoughness::Rural => 0.03,
        }
    }
}

/// Raw meteorological inputs; see [`MeteorologicalState::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetConditions {
    pub wind_speed_m_s: f64,
    /// Direction the wind blows from, degrees clockwise from north.
    pub wind_direction_deg: f64,
    pub reference_height_m: f64,
    pub stability: StabilityClass,
    pub ambient_temperature_k: f64,
    pub ambient_pressure_pa: f64,
    /// Fraction 0..1.
    pub relative_humidity: f64,
    pub insolation_w_m2: f64,
    pub cloud_cover_tenths: f64,
    pub roughness: SurfaceRoughness,
    pub roughness_length_m: Option<f64>,
    pub wind_profile: WindProfileMethod,
}

impl Default for MetConditions {
    fn default() -> Self {
        Self {
            wind_speed_m_s: 5.0,
            wind_direction_deg: 270.0,
            reference_height_m: 10.0,
            stability: StabilityClass::D,
            ambient_temperature_k: T_STANDARD_K,
            ambient_pressure_pa: P_ATM_PA,
            relative_humidity: 0.5,
            insolation_w_m2: 0.0,
            cloud_cover_tenths: 5.0,
            roughness: SurfaceRoughness::default(),
            roughness_length_m: None,
            wind_profile: WindProfileMethod::default(),
        }
    }
}

/// Read-only atmosphere for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeteorologicalState {
    conditions: MetConditions,
    roughness_length_m: f64,
}

impl MeteorologicalState {
    pub fn new(conditions: MetConditions) -> MetResult<Self> {
        let c = &conditions;
        require_positive(c.wind_speed_m_s, "wind speed must be positive")?;
        if !c.wind_direction_deg.is_finite() {
            return Err(MetError::invalid("wind direction", c.wind_direction_deg));
        }
        require_positive(c.reference_height_m, "reference height must be positive")?;
        require_positive(c.ambient_temperature_k, "ambient temperature below absolute zero")?;
        require_positive(c.ambient_pressure_pa, "ambient pressure must be positive")?;
        if !(0.0..=1.0).contains(&c.relative_humidity) {
            return Err(MetError::invalid(
                "relative humidity must be 0-1",
                c.relative_humidity,
            ));
        }
        if !(c.insolation_w_m2.is_finite() && c.insolation_w_m2 >= 0.0) {
            return Err(MetError::invalid(
                "insolation must be non-negative",
                c.insolation_w_m2,
            ));
        }
        if !(0.0..=10.0).contains(&c.cloud_cover_tenths) {
            return Err(MetError::invalid(
                "cloud cover must be 0-10 tenths",
                c.cloud_cover_tenths,
            ));
        }
        let roughness_length_m = match c.roughness_length_m {
            Some(z0) => require_positive(z0, "roughness length must be positive")?,
            None => c.roughness.default_length_m(),
        };
        tracing::debug!(
            wind_m_s = c.wind_speed_m_s,
            stability = ?c.stability,
            z0_m = roughness_length_m,
            "meteorology validated"
        );
        Ok(Self {
            conditions,
            roughness_length_m,
        })
    }

    pub fn conditions(&self) -> &MetConditions {
        &self.conditions
    }

    pub fn wind_speed_m_s(&self) -> f64 {
        self.conditions.wind_speed_m_s
    }

    pub fn wind_direction_deg(&self) -> f64 {
        self.conditions.wind_direction_deg
    }

    pub fn reference_height_m(&self) -> f64 {
        self.conditions.reference_height_m
    }

    pub fn stability(&self) -> StabilityClass {
        self.conditions.stability
    }

    pub fn ambient_temperature_k(&self) -> f64 {
        self.conditions.ambient_temperature_k
    }

    pub fn ambient_pressure_pa(&self) -> f64 {
        self.conditions.ambient_pressure_pa
    }

    pub fn relative_humidity(&self) -> f64 {
        self.conditions.relative_humidity
    }

    pub fn insolation_w_m2(&self) -> f64 {
        self.conditions.insolation_w_m2
    }

    pub fn cloud_cover_tenths(&self) -> f64 {
        self.conditions.cloud_cover_tenths
    }

    pub fn roughness(&self) -> SurfaceRoughness {
        self.conditions.roughness
    }

    pub fn roughness_length_m(&self) -> f64 {
        self.roughness_length_m
    }

    /// Wind speed at `height_m` using the configured profile.
    pub fn wind_speed_at(&self, height_m: f64) -> MetResult<f64> {
        wind_profile(
            self.conditions.wind_speed_m_s,
            self.conditions.reference_height_m,
            height_m,
            self.roughness_length_m,
            self.conditions.stability,
            self.conditions.wind_profile,
        )
    }

    pub fn friction_velocity(&self) -> MetResult<f64> {
        friction_velocity(
            self.conditions.wind_speed_m_s,
            self.conditions.reference_height_m,
            self.roughness_length_m,
            self.conditions.stability,
        )
    }

    /// Unit vector (east, north) of the direction the wind blows towards.
    pub fn downwind_unit(&self) -> (f64, f64) {
        let from = self.conditions.wind_direction_deg.to_radians();
        (-from.sin(), -from.cos())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_conditions_are_valid() {
        let met = MeteorologicalState::new(MetConditions::default()).unwrap();
        assert_eq!(met.stability(), StabilityClass::D);
        assert_eq!(met.roughness_length_m(), 1.0);
    }

    #[test]
    fn rejects_calm_wind() {
        let err = MeteorologicalState::new(MetConditions {
            wind_speed_m_s: 0.0,
            ..MetConditions::default()
        })
        .unwrap_err();
        assert!(matches!(err, MetError::InvalidMeteorologyInput { .. }));
    }

    #[test]
    fn rejects_bad_humidity_and_temperature() {
        assert!(MeteorologicalState::new(MetConditions {
            relative_humidity: 1.5,
            ..MetConditions::default()
        })
        .is_err());
        assert!(MeteorologicalState::new(MetConditions {
            ambient_temperature_k: -5.0,
            ..MetConditions::default()
        })
        .is_err());
    }

    #[test]
    fn westerly_blows_east() {
        let met = MeteorologicalState::new(MetConditions::default()).unwrap();
        let (e, n) = met.downwind_unit();
        assert!((e - 1.0).abs() < 1e-12);
        assert!(n.abs() < 1e-12);
    }

    #[test]
    fn explicit_roughness_overrides_category() {
        let met = MeteorologicalState::new(MetConditions {
            roughness: SurfaceRoughness::Rural,
            roughness_length_m: Some(0.2),
            ..MetConditions::default()
        })
        .unwrap();
        assert_eq!(met.roughness_length_m(), 0.2);
    }
}
