//! Threshold lookup and threat-zone extraction.

use crate::contour::{contour_rings, rings_to_polygons};
use crate::error::{ConsequenceError, ConsequenceResult};
use crate::polygon::{GeoPolygon, LocalFrame, Point, Polygon};
use pc_chem::{Chemical, ThresholdFamily, ThresholdKind};
use pc_dispersion::GridField;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Published toxic thresholds (ppm) of one chemical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSet {
    pub chemical: String,
    pub values: BTreeMap<ThresholdKind, f64>,
}

impl ThresholdSet {
    pub fn get(&self, kind: ThresholdKind) -> ConsequenceResult<f64> {
        self.values
            .get(&kind)
            .copied()
            .ok_or_else(|| ConsequenceError::ThresholdNotAvailable {
                chemical: self.chemical.clone(),
                kind: kind.label().to_string(),
            })
    }

    /// Tiers of the first family in `preference` with any data, 1 to 3.
    pub fn recommended(&self, preference: &[ThresholdFamily]) -> Vec<(ThresholdKind, f64)> {
        preference
            .iter()
            .map(|family| {
                family
                    .kinds()
                    .into_iter()
                    .filter_map(|k| self.values.get(&k).map(|v| (k, *v)))
                    .collect::<Vec<_>>()
            })
            .find(|tiers| !tiers.is_empty())
            .unwrap_or_default()
    }
}

/// AEGL, ERPG, IDLH and PAC values the chemical record publishes.
pub fn lookup_thresholds(chemical: &Chemical) -> ThresholdSet {
    let values = ThresholdKind::TOXIC
        .into_iter()
        .filter_map(|k| chemical.thresholds.get(k).map(|v| (k, v)))
        .collect();
    ThresholdSet {
        chemical: chemical.name.clone(),
        values,
    }
}

/// Footprint of the field at or above one threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatZone {
    pub kind: ThresholdKind,
    pub level_ppm: f64,
    pub chemical: String,
    pub polygons: Vec<Polygon>,
    pub area_m2: f64,
    /// Farthest downwind `x` reached by any polygon; 0 when empty.
    pub max_downwind_m: f64,
    /// Farthest vertex from the source; 0 when empty.
    pub max_distance_m: f64,
}

impl ThreatZone {
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn to_geographic(&self, frame: &LocalFrame) -> Vec<GeoPolygon> {
        self.polygons.iter().map(|p| p.to_geographic(frame)).collect()
    }
}

/// Contour `field` (ppm) at `level_ppm` into a polygon set.
///
/// Empty when the field never reaches the level.
pub fn extract_threat_zone(field: &GridField, level_ppm: f64) -> ConsequenceResult<Vec<Polygon>> {
    if !(level_ppm.is_finite() && level_ppm > 0.0) {
        return Err(ConsequenceError::invalid("threshold must be positive", level_ppm));
    }
    let peak = field.max();
    if level_ppm > peak {
        tracing::debug!(level_ppm, peak, "threshold above field maximum");
        return Ok(Vec::new());
    }
    let polygons = rings_to_polygons(contour_rings(field, level_ppm));
    tracing::debug!(level_ppm, polygons = polygons.len(), "threat zone contoured");
    Ok(polygons)
}

/// Contour one named threshold and attach its metadata.
pub fn threat_zone(
    field: &GridField,
    thresholds: &ThresholdSet,
    kind: ThresholdKind,
) -> ConsequenceResult<ThreatZone> {
    let level_ppm = thresholds.get(kind)?;
    let polygons = extract_threat_zone(field, level_ppm)?;
    let origin: Point = [0.0, 0.0];
    let area_m2 = polygons.iter().map(Polygon::area).sum();
    let max_downwind_m = polygons.iter().map(Polygon::max_x).fold(0.0, f64::max);
    let max_distance_m = polygons
        .iter()
        .map(|p| p.max_distance_from(origin))
        .fold(0.0, f64::max);
    Ok(ThreatZone {
        kind,
        level_ppm,
        chemical: thresholds.chemical.clone(),
        polygons,
        area_m2,
        max_downwind_m,
        max_distance_m,
    })
}

/// Zones for each requested kind; fails on the first missing threshold.
pub fn threat_zones(
    field: &GridField,
    thresholds: &ThresholdSet,
    kinds: &[ThresholdKind],
) -> ConsequenceResult<Vec<ThreatZone>> {
    let zones = kinds
        .iter()
        .map(|&k| threat_zone(field, thresholds, k))
        .collect::<ConsequenceResult<Vec<_>>>()?;
    tracing::info!(
        chemical = %thresholds.chemical,
        zones = zones.len(),
        non_empty = zones.iter().filter(|z| !z.is_empty()).count(),
        "threat zones extracted"
    );
    Ok(zones)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pc_chem::{ChemicalStore, InMemoryStore};

    #[test]
    fn ammonia_publishes_all_aegl_tiers() {
        let ammonia = InMemoryStore::builtin().get_chemical("ammonia").unwrap();
        let set = lookup_thresholds(&ammonia);
        assert_eq!(set.get(ThresholdKind::Aegl2).unwrap(), 160.0);
        let tiers = set.recommended(&ThresholdFamily::DEFAULT_PREFERENCE);
        assert_eq!(tiers.len(), 3);
        assert_eq!(tiers[0].0, ThresholdKind::Aegl1);
        assert!(!set.values.contains_key(&ThresholdKind::Lel));
    }

    #[test]
    fn missing_threshold_is_an_error() {
        let set = ThresholdSet {
            chemical: "x".into(),
            values: BTreeMap::new(),
        };
        assert!(matches!(
            set.get(ThresholdKind::Idlh),
            Err(ConsequenceError::ThresholdNotAvailable { .. })
        ));
    }
}
