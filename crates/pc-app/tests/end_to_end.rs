//! Whole-pipeline runs of the bundled scenarios.

use std::path::PathBuf;
use std::sync::OnceLock;

use pc_app::{AppError, ScenarioOutput, load_scenario, run_scenario};
use pc_chem::{InMemoryStore, ThresholdKind};
use pc_dispersion::ModelKind;
use pc_scenario::from_yaml_str;

fn scenario_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../scenarios").join(name)
}

fn ammonia() -> &'static ScenarioOutput {
    static OUTPUT: OnceLock<ScenarioOutput> = OnceLock::new();
    OUTPUT.get_or_init(|| {
        let scenario = load_scenario(&scenario_path("ammonia_continuous.yaml")).unwrap();
        run_scenario(&scenario, &InMemoryStore::builtin()).unwrap()
    })
}

#[test]
fn ammonia_aegl2_distance_is_plausible() {
    let out = ammonia();
    assert_eq!(out.manifest.dispersion_model, ModelKind::Gaussian);
    assert!(out.artifacts.concentration.trajectory.is_none());

    let d = out.threat_distance_m(ThresholdKind::Aegl2).unwrap();
    assert!((150.0..=400.0).contains(&d), "AEGL-2 distance {d} m");

    let zone = out.zone(ThresholdKind::Aegl2).unwrap();
    assert_eq!(zone.level_ppm, 160.0);
    assert_eq!(zone.chemical, "Ammonia");
    assert!((zone.max_downwind_m - d).abs() <= 20.0, "{} vs {d}", zone.max_downwind_m);
}

#[test]
fn ammonia_tiers_shrink_with_severity() {
    let out = ammonia();
    let area = |k| out.zone(k).unwrap().area_m2;
    assert!(area(ThresholdKind::Aegl1) > area(ThresholdKind::Aegl2));
    assert!(area(ThresholdKind::Aegl2) > area(ThresholdKind::Aegl3));
    assert!(area(ThresholdKind::Aegl3) > 0.0);
}

#[test]
fn located_scenarios_get_geographic_zones() {
    let out = ammonia();
    for z in &out.artifacts.zones {
        let geo = z.geographic.as_ref().unwrap();
        assert_eq!(geo.len(), z.zone.polygons.len());
    }
    // Wind from the west: the AEGL-1 footprint lies east of the source.
    let geo = out.artifacts.zones[0].geographic.as_ref().unwrap();
    let max_lon = geo[0].exterior.iter().map(|p| p[0]).fold(f64::MIN, f64::max);
    assert!(max_lon > 74.082);
}

#[test]
fn identical_inputs_give_identical_outputs() {
    let scenario = load_scenario(&scenario_path("ammonia_continuous.yaml")).unwrap();
    let store = InMemoryStore::builtin();
    let a = run_scenario(&scenario, &store).unwrap();
    let b = run_scenario(&scenario, &store).unwrap();
    assert_eq!(a.artifacts, b.artifacts);
    assert_eq!(a.manifest.run_id, b.manifest.run_id);
    assert_eq!(a.manifest.summary, b.manifest.summary);
}

#[test]
fn methane_pipeline_blows_down() {
    let scenario = load_scenario(&scenario_path("methane_pipeline.yaml")).unwrap();
    let out = run_scenario(&scenario, &InMemoryStore::builtin()).unwrap();
    assert_eq!(out.manifest.source_kind, "pipeline");

    let samples = &out.artifacts.release.samples;
    let initial = samples[0].mass_flow_kg_s;
    for pair in samples.windows(2) {
        assert!(pair[1].mass_flow_kg_s <= pair[0].mass_flow_kg_s);
    }
    let last = samples.last().unwrap();
    assert!(last.mass_flow_kg_s < 1e-2 * initial);
    assert!(out.manifest.summary.total_released_kg > 0.0);
    assert_eq!(out.artifacts.zones.len(), 3);
}

#[test]
fn chlorine_flash_release_runs_heavy_gas() {
    let scenario = load_scenario(&scenario_path("chlorine_two_phase.yaml")).unwrap();
    let out = run_scenario(&scenario, &InMemoryStore::builtin()).unwrap();
    assert_eq!(out.manifest.dispersion_model, ModelKind::HeavyGas);
    let trajectory = out.artifacts.concentration.trajectory.as_ref().unwrap();
    assert!(!trajectory.points.is_empty());

    // No explicit thresholds: the AEGL family is contoured.
    let kinds: Vec<_> = out.artifacts.zones.iter().map(|z| z.zone.kind).collect();
    assert_eq!(kinds, ThresholdKind::Aegl1.family().unwrap().kinds().to_vec());
    assert!(!out.zone(ThresholdKind::Aegl1).unwrap().is_empty());
}

#[test]
fn unknown_chemical_names_the_scenario() {
    let scenario = from_yaml_str("id: mystery\nsource:\n  rate_kg_s: 1.0\nchemical:\n  name: unobtainium\n").unwrap();
    let err = run_scenario(&scenario, &InMemoryStore::builtin()).unwrap_err();
    match err {
        AppError::ChemicalNotFound { scenario_id, query } => {
            assert_eq!(scenario_id, "mystery");
            assert_eq!(query, "unobtainium");
        }
        other => panic!("unexpected {other}"),
    }
}

#[test]
fn missing_threshold_is_not_substituted() {
    let scenario = from_yaml_str(
        "id: methane-aegl\nsource:\n  rate_kg_s: 1.0\n  duration_s: 60.0\nchemical:\n  name: methane\n\
         consequence:\n  thresholds: [AEGL-2]\n",
    )
    .unwrap();
    let err = run_scenario(&scenario, &InMemoryStore::builtin()).unwrap_err();
    assert!(matches!(err, AppError::ThresholdNotAvailable { ref kind, .. } if kind == "AEGL-2"), "{err}");
    assert_eq!(err.scenario_id(), Some("methane-aegl"));
}
