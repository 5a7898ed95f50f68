//! Consequence engine: from a concentration field to threat zones.
//!
//! Provides:
//! - Threshold lookup over the chemical record (AEGL, ERPG, IDLH, PAC)
//! - Marching-squares contouring of gridded fields into polygons
//! - Threat zones with area and extent metadata
//! - Centerline threat distances
//! - Local grid frame to latitude/longitude projection

pub mod centerline;
pub mod contour;
pub mod error;
pub mod polygon;
pub mod threat;

pub use centerline::{Centerline, centerline_threat_distance};
pub use contour::{contour_rings, rings_to_polygons};
pub use error::{ConsequenceError, ConsequenceResult};
pub use polygon::{GeoPoint, GeoPolygon, LocalFrame, Point, Polygon};
pub use threat::{
    ThreatZone, ThresholdSet, extract_threat_zone, lookup_thresholds, threat_zone, threat_zones,
};
