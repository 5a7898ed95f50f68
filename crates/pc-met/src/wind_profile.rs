//! Vertical wind speed profiles.

use crate::error::{MetResult, require_positive};
use crate::stability::StabilityClass;
use pc_core::units::constants::VON_KARMAN;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindProfileMethod {
    #[default]
    PowerLaw,
    MoninObukhov,
}

/// Power-law exponent by stability class.
pub fn power_law_exponent(stability: StabilityClass) -> f64 {
    match stability {
        StabilityClass::A => 0.108,
        StabilityClass::B => 0.112,
        StabilityClass::C => 0.120,
        StabilityClass::D => 0.142,
        StabilityClass::E => 0.203,
        StabilityClass::F => 0.253,
    }
}

/// Monin-Obukhov length (m) from stability class and roughness (Golder).
///
/// Infinite for neutral (D) conditions.
pub fn obukhov_length(stability: StabilityClass, roughness_length_m: f64) -> f64 {
    let z0 = roughness_length_m;
    match stability {
        StabilityClass::A => -11.4 * z0.powf(0.10),
        StabilityClass::B => -26.0 * z0.powf(0.17),
        StabilityClass::C => -123.0 * z0.powf(0.30),
        StabilityClass::D => f64::INFINITY,
        StabilityClass::E => 123.0 * z0.powf(0.30),
        StabilityClass::F => 26.0 * z0.powf(0.17),
    }
}

/// Businger-Dyer momentum stability correction psi_m(z/L).
fn psi_m(zeta: f64) -> f64 {
    if zeta > 0.0 {
        -4.7 * zeta
    } else if zeta < 0.0 {
        let x = (1.0 - 15.0 * zeta).powf(0.25);
        2.0 * ((1.0 + x) / 2.0).ln() + ((1.0 + x * x) / 2.0).ln() - 2.0 * x.atan()
            + std::f64::consts::FRAC_PI_2
    } else {
        0.0
    }
}

/// Dimensionless similarity profile; `u(z) = u*/k * shape(z)`.
fn similarity_shape(height_m: f64, roughness_length_m: f64, obukhov_m: f64) -> f64 {
    let z0 = roughness_length_m;
    ((height_m + z0) / z0).ln() - psi_m(height_m / obukhov_m)
}

/// Friction velocity implied by a reference wind observation.
pub fn friction_velocity(
    reference_speed: f64,
    reference_height_m: f64,
    roughness_length_m: f64,
    stability: StabilityClass,
) -> MetResult<f64> {
    let u_ref = require_positive(reference_speed, "wind speed must be positive")?;
    let z_ref = require_positive(reference_height_m, "reference height must be positive")?;
    let z0 = require_positive(roughness_length_m, "roughness length must be positive")?;
    let l = obukhov_length(stability, z0);
    Ok(VON_KARMAN * u_ref / similarity_shape(z_ref, z0, l))
}

/// Wind speed at `target_height_m` given the reference observation.
pub fn wind_profile(
    reference_speed: f64,
    reference_height_m: f64,
    target_height_m: f64,
    roughness_length_m: f64,
    stability: StabilityClass,
    method: WindProfileMethod,
) -> MetResult<f64> {
    let u_ref = require_positive(reference_speed, "wind speed must be positive")?;
    let z_ref = require_positive(reference_height_m, "reference height must be positive")?;
    let z = require_positive(target_height_m, "target height must be positive")?;
    let z0 = require_positive(roughness_length_m, "roughness length must be positive")?;

    let speed = match method {
        WindProfileMethod::PowerLaw => u_ref * (z / z_ref).powf(power_law_exponent(stability)),
        WindProfileMethod::MoninObukhov => {
            let l = obukhov_length(stability, z0);
            u_ref * similarity_shape(z, z0, l) / similarity_shape(z_ref, z0, l)
        }
    };
    Ok(speed.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_height_returns_reference_speed() {
        for stability in StabilityClass::ALL {
            for method in [WindProfileMethod::PowerLaw, WindProfileMethod::MoninObukhov] {
                let u = wind_profile(5.0, 10.0, 10.0, 0.1, stability, method).unwrap();
                assert!((u - 5.0).abs() < 1e-12, "{stability} {method:?}: {u}");
            }
        }
    }

    #[test]
    fn power_law_matches_closed_form() {
        let u = wind_profile(4.0, 10.0, 40.0, 0.03, StabilityClass::F, WindProfileMethod::PowerLaw)
            .unwrap();
        assert!((u - 4.0 * 4f64.powf(0.253)).abs() < 1e-12);
    }

    #[test]
    fn neutral_log_law() {
        let u = wind_profile(5.0, 10.0, 2.0, 0.1, StabilityClass::D, WindProfileMethod::MoninObukhov)
            .unwrap();
        let expected = 5.0 * (2.1f64 / 0.1).ln() / (10.1f64 / 0.1).ln();
        assert!((u - expected).abs() < 1e-12);
    }

    #[test]
    fn stable_shear_exceeds_unstable_shear() {
        let at = |s| {
            wind_profile(5.0, 10.0, 50.0, 0.1, s, WindProfileMethod::MoninObukhov).unwrap()
        };
        assert!(at(StabilityClass::F) > at(StabilityClass::D));
        assert!(at(StabilityClass::D) > at(StabilityClass::A));
    }

    #[test]
    fn friction_velocity_neutral() {
        let us = friction_velocity(5.0, 10.0, 0.1, StabilityClass::D).unwrap();
        assert!((us - 0.4 * 5.0 / (10.1f64 / 0.1).ln()).abs() < 1e-12);
    }

    #[test]
    fn rejects_zero_speed() {
        assert!(wind_profile(0.0, 10.0, 2.0, 0.1, StabilityClass::D, WindProfileMethod::PowerLaw).is_err());
        assert!(friction_velocity(-1.0, 10.0, 0.1, StabilityClass::D).is_err());
    }

    mod proptests {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn power_law_increases_with_height(z in 0.5_f64..200.0, dz in 0.1_f64..50.0, idx in 0usize..6) {
                let s = StabilityClass::ALL[idx];
                let lo = wind_profile(5.0, 10.0, z, 0.1, s, WindProfileMethod::PowerLaw).unwrap();
                let hi = wind_profile(5.0, 10.0, z + dz, 0.1, s, WindProfileMethod::PowerLaw).unwrap();
                prop_assert!(hi > lo);
            }
        }
    }
}
