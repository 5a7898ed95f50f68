//! Read-side views over run artifacts.

use pc_consequence::centerline_threat_distance;
use pc_results::RunArtifacts;

/// Per-threshold figures shown after a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneReport {
    pub kind: &'static str,
    pub level_ppm: f64,
    pub polygons: usize,
    pub area_m2: f64,
    pub max_downwind_m: f64,
    /// Reach along the plume axis; can be shorter than `max_downwind_m`
    /// when the contour is widest off-axis.
    pub centerline_distance_m: f64,
}

pub fn zone_reports(artifacts: &RunArtifacts) -> Vec<ZoneReport> {
    artifacts
        .zones
        .iter()
        .map(|z| ZoneReport {
            kind: z.zone.kind.label(),
            level_ppm: z.zone.level_ppm,
            polygons: z.zone.polygons.len(),
            area_m2: z.zone.area_m2,
            max_downwind_m: z.zone.max_downwind_m,
            centerline_distance_m: centerline_threat_distance(&artifacts.centerline, z.zone.level_ppm),
        })
        .collect()
}
