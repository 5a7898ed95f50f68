use pc_dispersion::ModelChoice;
use pc_met::StabilityClass;
use pc_scenario::{ScenarioError, ValidationError, from_yaml_str, load, load_yaml, save_yaml};
use pc_source::SourceSpec;
use std::path::PathBuf;

fn scenarios_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../scenarios")
}

#[test]
fn bundled_scenarios_load() {
    let mut count = 0;
    for entry in std::fs::read_dir(scenarios_dir()).unwrap() {
        let path = entry.unwrap().path();
        let ext = path.extension().and_then(|e| e.to_str());
        if !matches!(ext, Some("yaml" | "yml" | "json")) {
            continue;
        }
        let scenario = load(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()));
        assert!(!scenario.id().is_empty());
        count += 1;
    }
    assert!(count >= 4);
}

#[test]
fn plain_rate_becomes_a_direct_release() {
    let scenario = load_yaml(&scenarios_dir().join("ammonia_continuous.yaml")).unwrap();
    match scenario.source() {
        SourceSpec::Direct(d) => {
            assert_eq!(d.rate_kg_s, 1.0);
            assert_eq!(d.duration_s, 3600.0);
        }
        other => panic!("unexpected source {}", other.kind()),
    }
    assert_eq!(scenario.meteorology().stability, StabilityClass::D);
    assert_eq!(scenario.dispersion().model, ModelChoice::Auto);
    assert_eq!(scenario.sim_options().dt, 10.0);
}

#[test]
fn missing_sections_take_defaults() {
    let scenario = from_yaml_str(
        "id: minimal\nsource:\n  rate_kg_s: 2.0\nchemical:\n  name: chlorine\n",
    )
    .unwrap();
    assert_eq!(scenario.meteorology().ambient_pressure_pa, 101_325.0);
    assert_eq!(scenario.grid().z_m, 1.5);
    assert_eq!(scenario.dispersion().heavy_gas_max_distance_m, 12_000.0);
}

#[test]
fn rate_and_model_together_are_rejected() {
    let err = from_yaml_str(
        "id: both\nsource:\n  rate_kg_s: 2.0\n  model:\n    kind: direct\nchemical:\n  name: chlorine\n",
    )
    .unwrap_err();
    assert!(matches!(err, ScenarioError::Validation(ValidationError::Conflict { .. })));
}

#[test]
fn unphysical_values_are_rejected_before_simulation() {
    for doc in [
        "id: a\nsource:\n  rate_kg_s: -1.0\nchemical:\n  name: ammonia\n",
        "id: b\nsource:\n  rate_kg_s: 1.0\nchemical:\n  name: ammonia\nmeteorology:\n  wind_speed_m_s: 0.0\n",
        "id: c\nsource:\n  rate_kg_s: 1.0\nchemical:\n  name: ammonia\ngrid:\n  nx: 1\n",
        "id: d\nsource:\n  model:\n    kind: pipeline\n    initial_pressure_pa: -5.0\nchemical:\n  name: methane\n",
        "id: ''\nsource:\n  rate_kg_s: 1.0\nchemical:\n  name: ammonia\n",
    ] {
        let err = from_yaml_str(doc).unwrap_err();
        assert!(matches!(err, ScenarioError::Validation(_)), "{doc}: {err}");
    }
}

#[test]
fn unknown_stability_is_a_parse_error() {
    let err = from_yaml_str(
        "id: x\nsource:\n  rate_kg_s: 1.0\nchemical:\n  name: ammonia\nmeteorology:\n  stability: G\n",
    )
    .unwrap_err();
    assert!(matches!(err, ScenarioError::Yaml(_)));
}

#[test]
fn yaml_roundtrip_preserves_the_scenario() {
    let original = load_yaml(&scenarios_dir().join("chlorine_two_phase.yaml")).unwrap();
    let path = std::env::temp_dir().join("pc_scenario_roundtrip.yaml");
    save_yaml(&path, &original).unwrap();
    let loaded = load_yaml(&path).unwrap();
    assert_eq!(original, loaded);
}

proptest::proptest! {
    #[test]
    fn physical_rates_and_winds_validate(rate in 1e-3f64..1e3, wind in 0.5f64..30.0) {
        let doc = format!(
            "id: p\nsource:\n  rate_kg_s: {rate}\nchemical:\n  name: ammonia\nmeteorology:\n  wind_speed_m_s: {wind}\n"
        );
        let scenario = from_yaml_str(&doc).unwrap();
        proptest::prop_assert_eq!(scenario.meteorology().wind_speed_m_s, wind);
    }

    #[test]
    fn non_positive_rates_never_validate(rate in -1e3f64..=0.0) {
        let doc = format!("id: n\nsource:\n  rate_kg_s: {rate}\nchemical:\n  name: ammonia\n");
        let err = from_yaml_str(&doc).unwrap_err();
        let is_validation = matches!(err, ScenarioError::Validation(_));
        proptest::prop_assert!(is_validation);
    }
}
