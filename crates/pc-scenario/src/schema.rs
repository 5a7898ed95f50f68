//! Scenario document schema.
//!
//! Every section except `source` and `chemical` may be omitted; missing
//! fields take the physical defaults of the owning crate (standard
//! atmosphere, stability D, urban roughness, 1.5 m receptors).

use pc_chem::ThresholdKind;
use pc_dispersion::{DEFAULT_DENSE_GAS_RATIO, GridSpec, ModelChoice, ReleaseMode, SourceGeometry};
use pc_met::MetConditions;
use pc_source::SourceSpec;
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

fn default_version() -> u32 {
    SCHEMA_VERSION
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub source: SourceDef,
    pub chemical: ChemicalDef,
    #[serde(default)]
    pub meteorology: MetConditions,
    #[serde(default)]
    pub grid: GridSpec,
    #[serde(default)]
    pub dispersion: DispersionDef,
    #[serde(default)]
    pub simulation: SimulationDef,
    #[serde(default)]
    pub consequence: ConsequenceDef,
}

/// Either a plain release rate or a full source-term model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SourceDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationDef>,
    /// Release height above ground.
    #[serde(default)]
    pub height_m: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_kg_s: Option<f64>,
    /// Duration of a plain-rate release; defaults to the simulation length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_k: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<SourceSpec>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LocationDef {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChemicalDef {
    /// Name, alias or CAS number.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub molecular_weight_g_mol: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DispersionDef {
    pub model: ModelChoice,
    pub release_mode: ReleaseMode,
    /// Vapor-to-air density ratio above which `auto` picks heavy gas.
    pub dense_gas_ratio: f64,
    /// Heavy-gas secondary source; derived from the source when absent.
    pub geometry: Option<SourceGeometry>,
    pub heavy_gas_max_distance_m: f64,
    /// Window for the running-average airborne rate used as source strength.
    pub averaging_window_s: f64,
    /// Time after release start at which time-dependent fields are sampled.
    pub evaluation_time_s: Option<f64>,
}

impl Default for DispersionDef {
    fn default() -> Self {
        Self {
            model: ModelChoice::Auto,
            release_mode: ReleaseMode::Continuous,
            dense_gas_ratio: DEFAULT_DENSE_GAS_RATIO,
            geometry: None,
            heavy_gas_max_distance_m: pc_dispersion::heavy_gas::DEFAULT_MAX_DISTANCE_M,
            averaging_window_s: 60.0,
            evaluation_time_s: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationDef {
    pub dt_s: f64,
    pub duration_s: f64,
    pub max_steps: usize,
}

impl Default for SimulationDef {
    fn default() -> Self {
        Self {
            dt_s: 1.0,
            duration_s: 3600.0,
            max_steps: 500_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ConsequenceDef {
    /// Thresholds to contour; empty means the recommended family.
    pub thresholds: Vec<ThresholdKind>,
}
