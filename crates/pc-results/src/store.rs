//! Run storage API.
//!
//! One directory per run under the store root:
//!
//! ```text
//! <run_id>/manifest.json
//! <run_id>/release.jsonl
//! <run_id>/concentration.json
//! <run_id>/centerline.json
//! <run_id>/zones.json
//! ```

use crate::types::{ConcentrationArtifact, RunArtifacts, RunManifest, ZoneArtifact};
use crate::{ResultsError, ResultsResult};
use pc_consequence::Centerline;
use pc_source::{ReleaseSample, ReleaseTimeSeries};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

const MANIFEST: &str = "manifest.json";
const RELEASE: &str = "release.jsonl";
const CONCENTRATION: &str = "concentration.json";
const CENTERLINE: &str = "centerline.json";
const ZONES: &str = "zones.json";

#[derive(Debug, Clone)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// Store next to a scenario file, in `.plumecast/runs`.
    pub fn for_scenario_file(scenario_path: &Path) -> ResultsResult<Self> {
        let scenario_dir = scenario_path
            .parent()
            .ok_or_else(|| ResultsError::InvalidPath {
                message: "scenario path has no parent directory".to_string(),
            })?;
        Self::new(scenario_dir.join(".plumecast").join("runs"))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join(MANIFEST).exists()
    }

    pub fn save_run(&self, manifest: &RunManifest, artifacts: &RunArtifacts) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;

        let mut release = String::new();
        for sample in &artifacts.release.samples {
            release.push_str(&serde_json::to_string(sample)?);
            release.push('\n');
        }
        fs::write(run_dir.join(RELEASE), release)?;

        fs::write(run_dir.join(CONCENTRATION), serde_json::to_string(&artifacts.concentration)?)?;
        fs::write(run_dir.join(CENTERLINE), serde_json::to_string_pretty(&artifacts.centerline)?)?;
        fs::write(run_dir.join(ZONES), serde_json::to_string_pretty(&artifacts.zones)?)?;

        // Written last so a partial run never reports as present.
        fs::write(run_dir.join(MANIFEST), serde_json::to_string_pretty(manifest)?)?;
        tracing::debug!(run_id = %manifest.run_id, dir = %run_dir.display(), "run saved");
        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        self.read_json(run_id, MANIFEST)
    }

    pub fn load_release(&self, run_id: &str) -> ResultsResult<ReleaseTimeSeries> {
        let content = self.read(run_id, RELEASE)?;
        let mut samples = Vec::new();
        for line in content.lines() {
            if !line.trim().is_empty() {
                let sample: ReleaseSample = serde_json::from_str(line)?;
                samples.push(sample);
            }
        }
        Ok(ReleaseTimeSeries::new(samples))
    }

    pub fn load_artifacts(&self, run_id: &str) -> ResultsResult<RunArtifacts> {
        let concentration: ConcentrationArtifact = self.read_json(run_id, CONCENTRATION)?;
        let centerline: Centerline = self.read_json(run_id, CENTERLINE)?;
        let zones: Vec<ZoneArtifact> = self.read_json(run_id, ZONES)?;
        Ok(RunArtifacts {
            release: self.load_release(run_id)?,
            concentration,
            centerline,
            zones,
        })
    }

    /// Manifests of every stored run of `scenario_id`, oldest first.
    pub fn list_runs(&self, scenario_id: &str) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();

        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&run_id)
                    && manifest.scenario_id == scenario_id
                {
                    runs.push(manifest);
                }
            }
        }

        runs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.run_id.cmp(&b.run_id)));
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }

    fn read(&self, run_id: &str, file: &str) -> ResultsResult<String> {
        let path = self.run_dir(run_id).join(file);
        if !path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        Ok(fs::read_to_string(path)?)
    }

    fn read_json<T: DeserializeOwned>(&self, run_id: &str, file: &str) -> ResultsResult<T> {
        let content = self.read(run_id, file)?;
        Ok(serde_json::from_str(&content)?)
    }
}
