//! Contours of a plume at lower thresholds enclose those at higher ones.

use pc_consequence::{Centerline, centerline_threat_distance, extract_threat_zone};
use pc_core::PpmConverter;
use pc_dispersion::{GaussianModel, GridField, GridSpec, evaluate_grid};
use pc_met::{MetConditions, MeteorologicalState};
use proptest::prelude::*;
use std::sync::OnceLock;

fn plume_field() -> &'static GridField {
    static FIELD: OnceLock<GridField> = OnceLock::new();
    FIELD.get_or_init(|| {
        let met = MeteorologicalState::new(MetConditions::default()).unwrap();
        let model = GaussianModel::continuous(&met, 1.0, 0.0).unwrap();
        let ppm = PpmConverter::new(17.031, 298.15, 101_325.0).unwrap();
        let grid = GridSpec {
            x_min_m: -50.0,
            x_max_m: 2_000.0,
            y_min_m: -300.0,
            y_max_m: 300.0,
            nx: 206,
            ny: 61,
            z_m: 1.5,
        };
        evaluate_grid(&model, &grid, 0.0, &ppm).unwrap()
    })
}

fn assert_nested(low: f64, high: f64) {
    let field = plume_field();
    let outer = extract_threat_zone(field, low).unwrap();
    let inner = extract_threat_zone(field, high).unwrap();
    for poly in &inner {
        assert!(
            outer.iter().any(|o| o.contains_polygon(poly)),
            "{high} ppm contour escapes the {low} ppm contour"
        );
    }
    let outer_area: f64 = outer.iter().map(|p| p.area()).sum();
    let inner_area: f64 = inner.iter().map(|p| p.area()).sum();
    if !inner.is_empty() {
        assert!(outer_area > inner_area);
    }
}

#[test]
fn aegl_tiers_are_nested() {
    assert_nested(30.0, 160.0);
    assert_nested(160.0, 1_100.0);
}

#[test]
fn zone_reach_matches_the_centerline() {
    let field = plume_field();
    let zone = extract_threat_zone(field, 160.0).unwrap();
    assert_eq!(zone.len(), 1);
    let reach = zone[0].max_x();
    let line = Centerline::from_grid(field);
    let along = centerline_threat_distance(&line, 160.0);
    let dx = field.spec.dx();
    assert!(reach >= along && reach <= along + dx, "reach {reach} vs centerline {along}");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn any_pair_of_levels_is_nested(low in 5.0f64..500.0, ratio in 1.2f64..20.0) {
        assert_nested(low, low * ratio);
    }
}
