//! Pasquill-Gifford dispersion coefficients.
//!
//! Along-wind and crosswind spreads share one table; the vertical spread has
//! separate urban and rural sets.

use pc_met::{StabilityClass, SurfaceRoughness};
use serde::Serialize;

/// Sigmas are evaluated no closer than this to the source (m).
pub const NEAR_FIELD_M: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Lateral {
    sx1: f64,
    sx2: f64,
    sy1: f64,
    sy2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Vertical {
    sz1: f64,
    sz2: f64,
    sz3: f64,
}

const fn lateral(sx1: f64, sx2: f64, sy1: f64) -> Lateral {
    Lateral {
        sx1,
        sx2,
        sy1,
        sy2: 1e-4,
    }
}

const fn vertical(sz1: f64, sz2: f64, sz3: f64) -> Vertical {
    Vertical { sz1, sz2, sz3 }
}

fn lateral_for(stability: StabilityClass) -> Lateral {
    match stability {
        StabilityClass::A => lateral(0.02, 1.22, 0.22),
        StabilityClass::B => lateral(0.02, 1.22, 0.16),
        StabilityClass::C => lateral(0.02, 1.22, 0.11),
        StabilityClass::D => lateral(0.04, 1.14, 0.08),
        StabilityClass::E => lateral(0.17, 0.97, 0.06),
        StabilityClass::F => lateral(0.17, 0.97, 0.04),
    }
}

fn vertical_for(stability: StabilityClass, roughness: SurfaceRoughness) -> Vertical {
    use StabilityClass::*;
    match (roughness, stability) {
        (SurfaceRoughness::Rural, A) => vertical(0.2, 0.0, 0.0),
        (SurfaceRoughness::Rural, B) => vertical(0.12, 0.0, 0.0),
        (SurfaceRoughness::Rural, C) => vertical(0.08, 0.0002, -0.5),
        (SurfaceRoughness::Rural, D) => vertical(0.06, 0.0015, -0.5),
        (SurfaceRoughness::Rural, E) => vertical(0.03, 0.0003, -1.0),
        (SurfaceRoughness::Rural, F) => vertical(0.016, 0.0003, -1.0),
        (SurfaceRoughness::Urban, A | B) => vertical(0.24, 0.001, 0.5),
        (SurfaceRoughness::Urban, C) => vertical(0.2, 0.0, 0.0),
        (SurfaceRoughness::Urban, D) => vertical(0.14, 0.0003, -0.5),
        (SurfaceRoughness::Urban, E | F) => vertical(0.08, 0.0015, -0.5),
    }
}

/// Spreads (m) at one downwind distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sigmas {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Pasquill-Gifford spreads at `distance_m`, clamped to the near field.
pub fn sigmas(distance_m: f64, stability: StabilityClass, roughness: SurfaceRoughness) -> Sigmas {
    let x = distance_m.max(NEAR_FIELD_M);
    let l = lateral_for(stability);
    let v = vertical_for(stability, roughness);
    Sigmas {
        x: l.sx1 * x.powf(l.sx2),
        y: l.sy1 * x / (1.0 + l.sy2 * x).sqrt(),
        z: v.sz1 * x * (1.0 + v.sz2 * x).powf(v.sz3),
    }
}

/// Crosswind spread alone.
pub fn sigma_y(distance_m: f64, stability: StabilityClass) -> f64 {
    let x = distance_m.max(NEAR_FIELD_M);
    let l = lateral_for(stability);
    l.sy1 * x / (1.0 + l.sy2 * x).sqrt()
}

/// d(sigma_y)/dx, used by the heavy-gas passive spreading term.
pub fn sigma_y_slope(distance_m: f64, stability: StabilityClass) -> f64 {
    let x = distance_m.max(NEAR_FIELD_M);
    let l = lateral_for(stability);
    let root = (1.0 + l.sy2 * x).sqrt();
    l.sy1 / root - l.sy1 * l.sy2 * x / (2.0 * root.powi(3))
}
