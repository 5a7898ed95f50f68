//! Marching-squares iso-contours of a gridded concentration field.
//!
//! The grid is padded with a ring of zeros placed on the border coordinates,
//! so every contour closes and regions that run off the grid are cut along
//! its edge. Saddle cells are resolved with the cell-centre average.

use crate::polygon::{Point, Polygon, ring_contains, signed_area};
use pc_dispersion::GridField;
use std::collections::HashMap;

/// `(vertical, i, j)`: the edge from node `(i, j)` to `(i + 1, j)` when
/// horizontal, or to `(i, j + 1)` when vertical. Padded indices.
type EdgeKey = (bool, usize, usize);

struct Padded<'a> {
    field: &'a GridField,
    nx: usize,
    ny: usize,
}

impl Padded<'_> {
    fn value(&self, i: usize, j: usize) -> f64 {
        if i == 0 || j == 0 || i == self.nx - 1 || j == self.ny - 1 {
            0.0
        } else {
            self.field.value(i - 1, j - 1)
        }
    }

    fn position(&self, i: usize, j: usize) -> Point {
        let spec = &self.field.spec;
        let gi = i.saturating_sub(1).min(spec.nx - 1);
        let gj = j.saturating_sub(1).min(spec.ny - 1);
        [spec.x(gi), spec.y(gj)]
    }

    fn crossing(&self, key: EdgeKey, level: f64) -> Point {
        let (vertical, i, j) = key;
        let (i1, j1) = if vertical { (i, j + 1) } else { (i + 1, j) };
        let (va, vb) = (self.value(i, j), self.value(i1, j1));
        let (pa, pb) = (self.position(i, j), self.position(i1, j1));
        let t = if vb != va { ((level - va) / (vb - va)).clamp(0.0, 1.0) } else { 0.5 };
        [pa[0] + t * (pb[0] - pa[0]), pa[1] + t * (pb[1] - pa[1])]
    }
}

fn cell_segments(p: &Padded<'_>, i: usize, j: usize, level: f64, out: &mut Vec<(EdgeKey, EdgeKey)>) {
    let v = [
        p.value(i, j),
        p.value(i + 1, j),
        p.value(i + 1, j + 1),
        p.value(i, j + 1),
    ];
    let inside = v.map(|c| c >= level);
    let edges: [EdgeKey; 4] = [(false, i, j), (true, i + 1, j), (false, i, j + 1), (true, i, j)];
    // Edge k joins corners k and (k + 1) % 4.
    let crossed: Vec<usize> = (0..4).filter(|&k| inside[k] != inside[(k + 1) % 4]).collect();
    match crossed.len() {
        2 => out.push((edges[crossed[0]], edges[crossed[1]])),
        4 => {
            let centre_inside = v.iter().sum::<f64>() / 4.0 >= level;
            // Pair edges around corners 1 and 3, or around corners 0 and 2.
            let around_odd = inside[0] == centre_inside;
            if around_odd {
                out.push((edges[0], edges[1]));
                out.push((edges[2], edges[3]));
            } else {
                out.push((edges[3], edges[0]));
                out.push((edges[1], edges[2]));
            }
        }
        _ => {}
    }
}

/// Closed rings where the field crosses `level`; `level` must be positive.
pub fn contour_rings(field: &GridField, level: f64) -> Vec<Vec<Point>> {
    let padded = Padded {
        field,
        nx: field.spec.nx + 2,
        ny: field.spec.ny + 2,
    };
    let mut segments = Vec::new();
    for j in 0..padded.ny - 1 {
        for i in 0..padded.nx - 1 {
            cell_segments(&padded, i, j, level, &mut segments);
        }
    }

    let mut by_edge: HashMap<EdgeKey, Vec<usize>> = HashMap::new();
    for (s, (a, b)) in segments.iter().enumerate() {
        by_edge.entry(*a).or_default().push(s);
        by_edge.entry(*b).or_default().push(s);
    }

    let mut used = vec![false; segments.len()];
    let mut rings = Vec::new();
    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let (first, mut key) = segments[start];
        let mut ring = vec![padded.crossing(first, level)];
        while key != first {
            let point = padded.crossing(key, level);
            if ring.last() != Some(&point) {
                ring.push(point);
            }
            let next = by_edge
                .get(&key)
                .and_then(|list| list.iter().copied().find(|&s| !used[s]));
            let Some(s) = next else {
                tracing::warn!(level, "open contour discarded");
                ring.clear();
                break;
            };
            used[s] = true;
            let (a, b) = segments[s];
            key = if a == key { b } else { a };
        }
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        if ring.len() >= 3 && signed_area(&ring) != 0.0 {
            rings.push(ring);
        }
    }
    rings
}

/// Group rings into polygons: a ring inside an odd number of others is a
/// hole of the smallest exterior containing it. Largest polygon first.
pub fn rings_to_polygons(rings: Vec<Vec<Point>>) -> Vec<Polygon> {
    let depth: Vec<usize> = rings
        .iter()
        .enumerate()
        .map(|(r, ring)| {
            rings
                .iter()
                .enumerate()
                .filter(|(o, other)| *o != r && ring_contains(other, ring[0]))
                .count()
        })
        .collect();

    let mut polygons: Vec<(usize, Polygon)> = Vec::new();
    let mut holes = Vec::new();
    for (r, ring) in rings.into_iter().enumerate() {
        if depth[r] % 2 == 0 {
            polygons.push((r, Polygon::new(ring)));
        } else {
            holes.push(ring);
        }
    }
    for hole in holes {
        let owner = polygons
            .iter_mut()
            .filter(|(_, p)| ring_contains(&p.exterior, hole[0]))
            .min_by(|a, b| a.1.area().total_cmp(&b.1.area()));
        if let Some((_, p)) = owner {
            p.holes.push(hole);
        }
    }
    let mut out: Vec<Polygon> = polygons.into_iter().map(|(_, p)| p).collect();
    out.sort_by(|a, b| b.area().total_cmp(&a.area()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pc_dispersion::GridSpec;

    fn field(nx: usize, ny: usize, f: impl Fn(f64, f64) -> f64) -> GridField {
        let spec = GridSpec {
            x_min_m: -10.0,
            x_max_m: 10.0,
            y_min_m: -10.0,
            y_max_m: 10.0,
            nx,
            ny,
            z_m: 0.0,
        };
        let mut values = Vec::with_capacity(nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                values.push(f(spec.x(i), spec.y(j)));
            }
        }
        GridField {
            spec,
            time_s: 0.0,
            values,
        }
    }

    #[test]
    fn cone_gives_one_ring_close_to_a_circle() {
        let f = field(81, 81, |x, y| 10.0 - x.hypot(y));
        let polys = rings_to_polygons(contour_rings(&f, 5.0));
        assert_eq!(polys.len(), 1);
        let area = polys[0].area();
        let circle = std::f64::consts::PI * 25.0;
        assert!((area - circle).abs() / circle < 0.01, "area {area}");
        assert!(polys[0].contains_point([0.0, 0.0]));
    }

    #[test]
    fn region_touching_the_border_is_closed_on_the_edge() {
        let f = field(21, 21, |x, _| x + 10.0);
        let polys = rings_to_polygons(contour_rings(&f, 15.0));
        assert_eq!(polys.len(), 1);
        let (lo, hi) = polys[0].bounds().unwrap();
        assert!((lo[0] - 5.0).abs() < 1e-9);
        assert!((hi[0] - 10.0).abs() < 1e-9);
        assert!((polys[0].area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn ring_shaped_region_has_a_hole() {
        let f = field(81, 81, |x, y| {
            let r = x.hypot(y);
            if (3.0..=7.0).contains(&r) { 1.0 } else { 0.0 }
        });
        let polys = rings_to_polygons(contour_rings(&f, 0.5));
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].holes.len(), 1);
        assert!(!polys[0].contains_point([0.0, 0.0]));
        assert!(polys[0].contains_point([5.0, 0.0]));
    }

    #[test]
    fn two_peaks_give_two_polygons() {
        let f = field(81, 81, |x, y| {
            let a = 4.0 - (x - 5.0).hypot(y);
            let b = 4.0 - (x + 5.0).hypot(y);
            a.max(b).max(0.0)
        });
        let polys = rings_to_polygons(contour_rings(&f, 1.0));
        assert_eq!(polys.len(), 2);
    }

    #[test]
    fn nothing_above_level() {
        let f = field(11, 11, |_, _| 1.0);
        assert!(contour_rings(&f, 2.0).is_empty());
    }
}
