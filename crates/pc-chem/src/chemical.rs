//! Strongly typed chemical property record.

use crate::error::{ChemError, ChemResult};
use crate::thresholds::{ExposureThresholds, ThresholdKind};
use pc_core::units::constants::{MW_AIR, R_UNIVERSAL};
use serde::{Deserialize, Serialize};

const MMHG_TO_PA: f64 = 133.322;
const KELVIN_OFFSET: f64 = 273.15;
/// Watson correlation exponent.
const WATSON_EXPONENT: f64 = 0.38;

/// Antoine equation `log10(P[mmHg]) = A - B / (C + T[degC])`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AntoineCoefficients {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl AntoineCoefficients {
    pub fn vapor_pressure_pa(&self, temperature_k: f64) -> f64 {
        let t_c = temperature_k - KELVIN_OFFSET;
        10f64.powf(self.a - self.b / (self.c + t_c)) * MMHG_TO_PA
    }

    /// Temperature at which the vapor pressure equals `pressure_pa`.
    pub fn saturation_temperature_k(&self, pressure_pa: f64) -> f64 {
        let log_p = (pressure_pa / MMHG_TO_PA).log10();
        self.b / (self.a - log_p) - self.c + KELVIN_OFFSET
    }
}

/// Immutable property record, populated once at lookup time.
///
/// Liquid properties are taken as constant at their normal-boiling-point
/// values; latent heat is corrected with the Watson relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chemical {
    pub name: String,
    pub cas: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    pub molecular_weight_g_mol: f64,
    pub antoine: AntoineCoefficients,
    pub boiling_point_k: f64,
    pub freezing_point_k: f64,
    pub liquid_density_kg_m3: f64,
    pub liquid_cp_j_kg_k: f64,
    /// Latent heat of vaporization at the normal boiling point.
    pub latent_heat_j_kg: f64,
    /// Ideal-gas cp/cv.
    pub heat_capacity_ratio: f64,
    pub critical_temperature_k: f64,
    pub critical_pressure_pa: f64,
    #[serde(default)]
    pub joule_thomson_k_per_pa: f64,
    #[serde(default)]
    pub thresholds: ExposureThresholds,
}

impl Chemical {
    pub fn validate(&self) -> ChemResult<()> {
        if self.name.trim().is_empty() {
            return Err(ChemError::InvalidArg {
                what: "chemical name must not be empty",
            });
        }
        let positive = [
            (self.molecular_weight_g_mol, "molecular weight"),
            (self.boiling_point_k, "boiling point"),
            (self.freezing_point_k, "freezing point"),
            (self.liquid_density_kg_m3, "liquid density"),
            (self.liquid_cp_j_kg_k, "liquid heat capacity"),
            (self.latent_heat_j_kg, "latent heat"),
            (self.critical_temperature_k, "critical temperature"),
            (self.critical_pressure_pa, "critical pressure"),
        ];
        for (value, what) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ChemError::NonPhysical { what });
            }
        }
        if !(self.heat_capacity_ratio.is_finite() && self.heat_capacity_ratio > 1.0) {
            return Err(ChemError::NonPhysical {
                what: "heat capacity ratio must exceed 1",
            });
        }
        if self.boiling_point_k >= self.critical_temperature_k {
            return Err(ChemError::NonPhysical {
                what: "boiling point must lie below the critical temperature",
            });
        }
        if !self.joule_thomson_k_per_pa.is_finite() {
            return Err(ChemError::NonPhysical {
                what: "Joule-Thomson coefficient",
            });
        }
        self.thresholds.validate()
    }

    /// Copy with an overridden molecular weight.
    pub fn with_molecular_weight(mut self, molecular_weight_g_mol: f64) -> ChemResult<Self> {
        if !(molecular_weight_g_mol.is_finite() && molecular_weight_g_mol > 0.0) {
            return Err(ChemError::NonPhysical {
                what: "molecular weight override",
            });
        }
        self.molecular_weight_g_mol = molecular_weight_g_mol;
        Ok(self)
    }

    /// Case-insensitive name/alias match, or exact CAS match.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.trim();
        self.cas == q
            || self.name.eq_ignore_ascii_case(q)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(q))
    }

    pub fn vapor_pressure_pa(&self, temperature_k: f64) -> f64 {
        self.antoine.vapor_pressure_pa(temperature_k)
    }

    /// Specific gas constant, J/(kg K).
    pub fn specific_gas_constant(&self) -> f64 {
        R_UNIVERSAL / (self.molecular_weight_g_mol * 1e-3)
    }

    /// Ideal-gas vapor density, kg/m^3.
    pub fn vapor_density_kg_m3(&self, temperature_k: f64, pressure_pa: f64) -> f64 {
        pressure_pa / (self.specific_gas_constant() * temperature_k)
    }

    /// Latent heat at `temperature_k` (Watson); zero at or above the critical point.
    pub fn latent_heat_at(&self, temperature_k: f64) -> f64 {
        let tc = self.critical_temperature_k;
        if temperature_k >= tc {
            return 0.0;
        }
        let ratio = (tc - temperature_k) / (tc - self.boiling_point_k);
        self.latent_heat_j_kg * ratio.powf(WATSON_EXPONENT)
    }

    /// Vapor-to-air density ratio at the given vapor and ambient temperatures.
    pub fn vapor_density_ratio(&self, vapor_temperature_k: f64, ambient_temperature_k: f64) -> f64 {
        (self.molecular_weight_g_mol / MW_AIR) * (ambient_temperature_k / vapor_temperature_k)
    }

    pub fn threshold(&self, kind: ThresholdKind) -> ChemResult<f64> {
        self.thresholds
            .get(kind)
            .ok_or_else(|| ChemError::ThresholdNotAvailable {
                chemical: self.name.clone(),
                kind: kind.label().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin_chemicals;

    fn ammonia() -> Chemical {
        builtin_chemicals()
            .into_iter()
            .find(|c| c.name == "Ammonia")
            .unwrap()
    }

    #[test]
    fn antoine_round_trips_through_saturation_temperature() {
        let nh3 = ammonia();
        let p = nh3.vapor_pressure_pa(nh3.boiling_point_k);
        assert!((p - 101_325.0).abs() / 101_325.0 < 0.05, "p = {p}");
        let t = nh3.antoine.saturation_temperature_k(p);
        assert!((t - nh3.boiling_point_k).abs() < 1e-9);
    }

    #[test]
    fn watson_latent_heat_falls_towards_critical_point() {
        let nh3 = ammonia();
        assert!((nh3.latent_heat_at(nh3.boiling_point_k) - nh3.latent_heat_j_kg).abs() < 1e-9);
        assert!(nh3.latent_heat_at(300.0) < nh3.latent_heat_j_kg);
        assert_eq!(nh3.latent_heat_at(nh3.critical_temperature_k + 1.0), 0.0);
    }

    #[test]
    fn missing_threshold_is_an_error() {
        let methane = builtin_chemicals()
            .into_iter()
            .find(|c| c.cas == "74-82-8")
            .unwrap();
        let err = methane.threshold(ThresholdKind::Aegl2).unwrap_err();
        assert!(matches!(err, ChemError::ThresholdNotAvailable { .. }));
    }

    #[test]
    fn molecular_weight_override() {
        let nh3 = ammonia().with_molecular_weight(18.0).unwrap();
        assert_eq!(nh3.molecular_weight_g_mol, 18.0);
        assert!(ammonia().with_molecular_weight(-1.0).is_err());
    }

    mod proptests {
        use crate::catalog::builtin_chemicals;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn vapor_pressure_increases_with_temperature(t in 150.0_f64..400.0, dt in 0.1_f64..20.0) {
                for chem in builtin_chemicals() {
                    prop_assert!(chem.vapor_pressure_pa(t + dt) > chem.vapor_pressure_pa(t));
                }
            }
        }
    }
}
