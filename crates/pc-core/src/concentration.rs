//! Mass concentration <-> volumetric mixing ratio (ppm).

use crate::units::constants::R_UNIVERSAL;
use crate::{PcError, PcResult};

/// Ideal-gas conversion between kg/m^3 of a species and ppm(v) in air.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PpmConverter {
    pub molecular_weight_g_mol: f64,
    pub temperature_k: f64,
    pub pressure_pa: f64,
}

impl PpmConverter {
    pub fn new(molecular_weight_g_mol: f64, temperature_k: f64, pressure_pa: f64) -> PcResult<Self> {
        if !(molecular_weight_g_mol.is_finite() && molecular_weight_g_mol > 0.0) {
            return Err(PcError::InvalidArg {
                what: "molecular weight must be positive",
            });
        }
        if !(temperature_k.is_finite() && temperature_k > 0.0) {
            return Err(PcError::InvalidArg {
                what: "temperature must be above absolute zero",
            });
        }
        if !(pressure_pa.is_finite() && pressure_pa > 0.0) {
            return Err(PcError::InvalidArg {
                what: "pressure must be positive",
            });
        }
        Ok(Self {
            molecular_weight_g_mol,
            temperature_k,
            pressure_pa,
        })
    }

    /// Molar volume of the carrier air, m^3/mol.
    #[inline]
    fn molar_volume(&self) -> f64 {
        R_UNIVERSAL * self.temperature_k / self.pressure_pa
    }

    pub fn to_ppm(&self, kg_per_m3: f64) -> f64 {
        kg_per_m3 / (self.molecular_weight_g_mol * 1e-3) * self.molar_volume() * 1e6
    }

    pub fn to_kg_per_m3(&self, ppm: f64) -> f64 {
        ppm * 1e-6 / self.molar_volume() * self.molecular_weight_g_mol * 1e-3
    }
}
