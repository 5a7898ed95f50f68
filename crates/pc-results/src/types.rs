//! Result data types.

use pc_consequence::{Centerline, GeoPolygon, ThreatZone};
use pc_dispersion::{GridField, HeavyGasTrajectory, ModelKind};
use pc_source::ReleaseTimeSeries;
use serde::{Deserialize, Serialize};

pub type RunId = String;

/// Current UTC time in RFC 3339, as stored in manifests.
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub scenario_id: String,
    pub chemical: String,
    /// RFC 3339; the only field that differs between identical runs.
    pub timestamp: String,
    pub source_kind: String,
    pub dispersion_model: ModelKind,
    pub solver_version: String,
    pub summary: RunSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_released_kg: f64,
    pub peak_rate_kg_s: f64,
    /// Source strength handed to the dispersion model.
    pub dispersion_strength: f64,
    pub max_concentration_ppm: f64,
    pub zones: Vec<ZoneSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSummary {
    pub kind: String,
    pub level_ppm: f64,
    pub area_m2: f64,
    pub max_downwind_m: f64,
}

impl ZoneSummary {
    pub fn of(zone: &ThreatZone) -> Self {
        Self {
            kind: zone.kind.label().to_string(),
            level_ppm: zone.level_ppm,
            area_m2: zone.area_m2,
            max_downwind_m: zone.max_downwind_m,
        }
    }
}

/// The concentration field as stored: the sampled grid, plus the cloud
/// trajectory when the heavy-gas model produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationArtifact {
    pub model: ModelKind,
    pub grid: GridField,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trajectory: Option<HeavyGasTrajectory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneArtifact {
    pub zone: ThreatZone,
    /// Present when the scenario places the source on the map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geographic: Option<Vec<GeoPolygon>>,
}

/// Everything a run produces besides its manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunArtifacts {
    pub release: ReleaseTimeSeries,
    pub concentration: ConcentrationArtifact,
    pub centerline: Centerline,
    pub zones: Vec<ZoneArtifact>,
}
