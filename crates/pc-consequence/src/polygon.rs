//! Planar polygons in the local grid frame and their geographic projection.

use pc_core::units::constants::METERS_PER_DEG_LAT;
use serde::{Deserialize, Serialize};

/// `[x, y]` in metres, grid frame.
pub type Point = [f64; 2];

/// Distance below which a point counts as lying on an edge.
const ON_EDGE_TOL_M: f64 = 1e-9;

/// A simple polygon with optional holes. Rings are implicitly closed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    pub exterior: Vec<Point>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<Vec<Point>>,
}

/// Shoelace signed area; positive for counter-clockwise rings.
pub fn signed_area(ring: &[Point]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for k in 0..n {
        let [x0, y0] = ring[k];
        let [x1, y1] = ring[(k + 1) % n];
        twice += x0 * y1 - x1 * y0;
    }
    0.5 * twice
}

fn on_segment(p: Point, a: Point, b: Point) -> bool {
    let (dx, dy) = (b[0] - a[0], b[1] - a[1]);
    let len2 = dx * dx + dy * dy;
    let t = if len2 > 0.0 {
        (((p[0] - a[0]) * dx + (p[1] - a[1]) * dy) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (qx, qy) = (a[0] + t * dx, a[1] + t * dy);
    ((p[0] - qx).powi(2) + (p[1] - qy).powi(2)).sqrt() <= ON_EDGE_TOL_M
}

fn on_ring(p: Point, ring: &[Point]) -> bool {
    let n = ring.len();
    (0..n).any(|k| on_segment(p, ring[k], ring[(k + 1) % n]))
}

/// Even-odd ray cast; points on the boundary are not reported inside.
pub fn ring_contains(ring: &[Point], p: Point) -> bool {
    let n = ring.len();
    let mut inside = false;
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if (yi > p[1]) != (yj > p[1]) && p[0] < (xj - xi) * (p[1] - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

impl Polygon {
    pub fn new(exterior: Vec<Point>) -> Self {
        Self {
            exterior,
            holes: Vec::new(),
        }
    }

    /// Enclosed area (m²) net of holes.
    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|h| signed_area(h).abs()).sum();
        (signed_area(&self.exterior).abs() - holes).max(0.0)
    }

    /// Strictly inside the exterior and outside every hole.
    pub fn contains_point(&self, p: Point) -> bool {
        ring_contains(&self.exterior, p) && !self.holes.iter().any(|h| ring_contains(h, p))
    }

    /// Inside or on the boundary.
    pub fn covers_point(&self, p: Point) -> bool {
        if on_ring(p, &self.exterior) || self.holes.iter().any(|h| on_ring(p, h)) {
            return true;
        }
        self.contains_point(p)
    }

    /// Every vertex of `other` lies inside or on this polygon.
    pub fn contains_polygon(&self, other: &Polygon) -> bool {
        other.exterior.iter().all(|&p| self.covers_point(p))
    }

    /// Largest `x` over the exterior, i.e. the downwind reach.
    pub fn max_x(&self) -> f64 {
        self.exterior
            .iter()
            .map(|p| p[0])
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn max_distance_from(&self, origin: Point) -> f64 {
        self.exterior
            .iter()
            .map(|p| (p[0] - origin[0]).hypot(p[1] - origin[1]))
            .fold(0.0, f64::max)
    }

    /// `(min, max)` corners of the exterior.
    pub fn bounds(&self) -> Option<(Point, Point)> {
        let first = *self.exterior.first()?;
        Some(self.exterior.iter().fold((first, first), |(lo, hi), p| {
            ([lo[0].min(p[0]), lo[1].min(p[1])], [hi[0].max(p[0]), hi[1].max(p[1])])
        }))
    }

    pub fn to_geographic(&self, frame: &LocalFrame) -> GeoPolygon {
        let project = |ring: &[Point]| ring.iter().map(|&p| frame.to_geographic(p)).collect();
        GeoPolygon {
            exterior: project(&self.exterior),
            holes: self.holes.iter().map(|h| project(h)).collect(),
        }
    }
}

/// `[longitude, latitude]` in degrees.
pub type GeoPoint = [f64; 2];

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPolygon {
    pub exterior: Vec<GeoPoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<Vec<GeoPoint>>,
}

/// Places the grid frame on the map: origin at the source, `x` along the
/// wind, `y` to its left. Equirectangular, adequate within ~100 km.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalFrame {
    pub origin_lat_deg: f64,
    pub origin_lon_deg: f64,
    /// Direction the wind blows from, degrees clockwise from north.
    pub wind_direction_deg: f64,
}

impl LocalFrame {
    /// (east, north) unit vectors of the grid `x` and `y` axes.
    fn axes(&self) -> ([f64; 2], [f64; 2]) {
        let from = self.wind_direction_deg.to_radians();
        let down = [-from.sin(), -from.cos()];
        let left = [-down[1], down[0]];
        (down, left)
    }

    fn meters_per_deg_lon(&self) -> f64 {
        METERS_PER_DEG_LAT * self.origin_lat_deg.to_radians().cos()
    }

    pub fn to_geographic(&self, p: Point) -> GeoPoint {
        let (down, left) = self.axes();
        let east = p[0] * down[0] + p[1] * left[0];
        let north = p[0] * down[1] + p[1] * left[1];
        [
            self.origin_lon_deg + east / self.meters_per_deg_lon(),
            self.origin_lat_deg + north / METERS_PER_DEG_LAT,
        ]
    }

    pub fn to_local(&self, g: GeoPoint) -> Point {
        let (down, left) = self.axes();
        let east = (g[0] - self.origin_lon_deg) * self.meters_per_deg_lon();
        let north = (g[1] - self.origin_lat_deg) * METERS_PER_DEG_LAT;
        [east * down[0] + north * down[1], east * left[0] + north * left[1]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(half: f64) -> Polygon {
        Polygon::new(vec![[-half, -half], [half, -half], [half, half], [-half, half]])
    }

    #[test]
    fn area_and_membership() {
        let mut p = square(2.0);
        assert!((p.area() - 16.0).abs() < 1e-12);
        assert!(p.contains_point([0.0, 0.0]));
        assert!(!p.contains_point([3.0, 0.0]));
        p.holes.push(square(1.0).exterior);
        assert!((p.area() - 12.0).abs() < 1e-12);
        assert!(!p.contains_point([0.0, 0.0]));
        assert!(p.covers_point([2.0, 0.5]));
    }

    #[test]
    fn nested_squares() {
        assert!(square(2.0).contains_polygon(&square(1.0)));
        assert!(!square(1.0).contains_polygon(&square(2.0)));
        assert!(square(2.0).contains_polygon(&square(2.0)));
    }

    #[test]
    fn extents() {
        let p = Polygon::new(vec![[0.0, -1.0], [10.0, 0.0], [0.0, 1.0]]);
        assert_eq!(p.max_x(), 10.0);
        assert_eq!(p.max_distance_from([0.0, 0.0]), 10.0);
        assert_eq!(p.bounds(), Some(([0.0, -1.0], [10.0, 1.0])));
    }

    #[test]
    fn westerly_wind_carries_the_plume_east() {
        let frame = LocalFrame {
            origin_lat_deg: 0.0,
            origin_lon_deg: 10.0,
            wind_direction_deg: 270.0,
        };
        let [lon, lat] = frame.to_geographic([METERS_PER_DEG_LAT, 0.0]);
        assert!((lon - 11.0).abs() < 1e-9);
        assert!(lat.abs() < 1e-9);
        let back = frame.to_local([lon, lat]);
        assert!((back[0] - METERS_PER_DEG_LAT).abs() < 1e-6);
        assert!(back[1].abs() < 1e-6);
    }

    #[test]
    fn left_of_a_northerly_wind_is_east() {
        let frame = LocalFrame {
            origin_lat_deg: 45.0,
            origin_lon_deg: 0.0,
            wind_direction_deg: 0.0,
        };
        let [lon, lat] = frame.to_geographic([0.0, 1000.0]);
        assert!(lon > frame.origin_lon_deg);
        assert!((lat - frame.origin_lat_deg).abs() < 1e-9);
    }
}
