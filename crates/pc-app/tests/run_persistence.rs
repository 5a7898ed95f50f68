use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use pc_app::{RunOptions, RunRequest, RunStage, ensure_run, ensure_run_with_progress};
use pc_chem::InMemoryStore;

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

const SCENARIO: &str = "\
id: cached-ammonia
source:
  rate_kg_s: 0.5
  duration_s: 300.0
chemical:
  name: ammonia
grid:
  x_min_m: -20.0
  x_max_m: 800.0
  y_min_m: -100.0
  y_max_m: 100.0
  nx: 83
  ny: 21
simulation:
  dt_s: 10.0
  duration_s: 300.0
";

#[test]
fn second_run_comes_from_the_cache() {
    let dir = unique_temp_dir("pc_app_cache");
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    let path = dir.join("ammonia.yaml");
    fs::write(&path, SCENARIO).expect("failed to write scenario");
    let store = InMemoryStore::builtin();

    let request = RunRequest {
        scenario_path: &path,
        options: RunOptions::default(),
    };
    let first = ensure_run(&request, &store).expect("first run failed");
    assert!(!first.loaded_from_cache);
    assert!(dir.join(".plumecast/runs").join(&first.run_id).join("manifest.json").exists());

    let second = ensure_run(&request, &store).expect("second run failed");
    assert!(second.loaded_from_cache);
    assert_eq!(second.run_id, first.run_id);
    assert_eq!(second.manifest, first.manifest);
    assert_eq!(second.artifacts.zones.len(), first.artifacts.zones.len());
    assert_eq!(second.release().samples.len(), first.release().samples.len());
    let (a, b) = (
        first.manifest.summary.max_concentration_ppm,
        second.artifacts.concentration.grid.max(),
    );
    assert!((a - b).abs() <= 1e-9 * a, "{a} vs {b}");
}

#[test]
fn progress_walks_every_stage() {
    let dir = unique_temp_dir("pc_app_progress");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("ammonia.yaml");
    fs::write(&path, SCENARIO).unwrap();

    let request = RunRequest {
        scenario_path: &path,
        options: RunOptions {
            use_cache: false,
            store_dir: Some(dir.join("runs")),
        },
    };
    let mut stages = Vec::new();
    let mut record = |e: pc_app::RunProgressEvent| stages.push(e.stage);
    ensure_run_with_progress(&request, &InMemoryStore::builtin(), Some(&mut record)).unwrap();

    assert_eq!(
        stages,
        vec![
            RunStage::LoadingScenario,
            RunStage::CheckingCache,
            RunStage::SourceTerm,
            RunStage::Dispersion,
            RunStage::Consequence,
            RunStage::SavingResults,
            RunStage::Completed,
        ]
    );
}

#[test]
fn broken_scenario_file_reports_its_path() {
    let dir = unique_temp_dir("pc_app_broken");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("broken.yaml");
    fs::write(&path, "id: [unterminated\n").unwrap();
    let request = RunRequest {
        scenario_path: &path,
        options: RunOptions::default(),
    };
    let err = ensure_run(&request, &InMemoryStore::builtin()).unwrap_err();
    assert!(err.to_string().contains("broken.yaml"), "{err}");
}
