use pc_app::{run_batch, run_scenario, what_if};
use pc_chem::{InMemoryStore, ThresholdKind};
use pc_met::MetConditions;
use pc_scenario::{Scenario, from_yaml_str};

fn small(id: &str, chemical: &str, rate: f64) -> Scenario {
    from_yaml_str(&format!(
        "id: {id}\nsource:\n  rate_kg_s: {rate}\n  duration_s: 600.0\nchemical:\n  name: {chemical}\n\
         meteorology:\n  wind_speed_m_s: 4.0\n  stability: D\n\
         dispersion:\n  model: gaussian\n\
         grid:\n  x_min_m: -50.0\n  x_max_m: 1500.0\n  y_min_m: -200.0\n  y_max_m: 200.0\n  nx: 156\n  ny: 41\n\
         simulation:\n  dt_s: 10.0\n  duration_s: 600.0\n"
    ))
    .unwrap()
}

#[test]
fn batch_matches_sequential_runs_in_order() {
    let store = InMemoryStore::builtin();
    let scenarios = vec![
        small("a", "ammonia", 0.5),
        small("b", "chlorine", 0.2),
        small("c", "ammonia", 2.0),
        small("d", "methane", 5.0),
    ];
    let batch = run_batch(&scenarios, &store);
    assert_eq!(batch.len(), scenarios.len());
    for (scenario, result) in scenarios.iter().zip(&batch) {
        let out = result.as_ref().unwrap();
        assert_eq!(out.manifest.scenario_id, scenario.id());
        let sequential = run_scenario(scenario, &store).unwrap();
        assert_eq!(out.artifacts, sequential.artifacts);
    }
}

#[test]
fn one_failure_does_not_sink_the_batch() {
    let store = InMemoryStore::builtin();
    let scenarios = vec![small("ok", "ammonia", 1.0), small("bad", "unobtainium", 1.0)];
    let batch = run_batch(&scenarios, &store);
    assert!(batch[0].is_ok());
    assert_eq!(batch[1].as_ref().unwrap_err().scenario_id(), Some("bad"));
}

#[test]
fn stronger_wind_shortens_the_zone() {
    let store = InMemoryStore::builtin();
    let base = small("sweep", "ammonia", 1.0);
    let conditions: Vec<MetConditions> = [2.0, 4.0, 8.0]
        .iter()
        .map(|&u| MetConditions {
            wind_speed_m_s: u,
            ..base.meteorology().clone()
        })
        .collect();
    let runs = what_if(&base, &conditions, &store).unwrap();
    let distances: Vec<f64> = runs
        .iter()
        .map(|r| r.as_ref().unwrap().threat_distance_m(ThresholdKind::Aegl2).unwrap())
        .collect();
    assert_eq!(runs[1].as_ref().unwrap().manifest.scenario_id, "sweep-1");
    assert!(distances[0] >= distances[1], "{distances:?}");
    assert!(distances[1] >= distances[2], "{distances:?}");
    assert!(distances[0] > distances[2], "{distances:?}");
}

#[test]
fn sweep_rejects_unphysical_conditions() {
    let base = small("sweep", "ammonia", 1.0);
    let calm = MetConditions {
        wind_speed_m_s: 0.0,
        ..base.meteorology().clone()
    };
    let err = what_if(&base, &[calm], &InMemoryStore::builtin()).unwrap_err();
    assert_eq!(err.scenario_id(), Some("sweep-0"));
}
