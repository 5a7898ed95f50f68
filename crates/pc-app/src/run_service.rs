//! Scenario execution, caching and batch sweeps.

use std::path::{Path, PathBuf};
use std::time::Instant;

use pc_chem::{Chemical, ChemicalStore, ThresholdFamily, ThresholdKind};
use pc_consequence::{
    Centerline, LocalFrame, ThreatZone, ThresholdSet, centerline_threat_distance, lookup_thresholds,
    threat_zones,
};
use pc_core::PpmConverter;
use pc_dispersion::{
    DispersionField, DispersionInput, GridSpec, ReleaseMode, SourceGeometry, evaluate_grid, resolve_model,
};
use pc_met::{MetConditions, MeteorologicalState};
use pc_results::{
    ConcentrationArtifact, RunArtifacts, RunManifest, RunStore, RunSummary, ZoneArtifact, ZoneSummary,
    compute_run_id, timestamp_now,
};
use pc_scenario::Scenario;
use pc_source::{ReleaseTimeSeries, SourceSpec, collect_series};
use rayon::prelude::*;

use crate::error::{AppError, AppResult};
use crate::progress::{RunProgressEvent, RunStage};
use crate::scenario_service;

pub const SOLVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything one scenario run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutput {
    pub manifest: RunManifest,
    pub artifacts: RunArtifacts,
}

impl ScenarioOutput {
    pub fn zone(&self, kind: ThresholdKind) -> Option<&ThreatZone> {
        self.artifacts.zones.iter().map(|z| &z.zone).find(|z| z.kind == kind)
    }

    /// Centerline reach of a contoured threshold; `None` if it was not
    /// requested.
    pub fn threat_distance_m(&self, kind: ThresholdKind) -> Option<f64> {
        self.zone(kind)
            .map(|z| centerline_threat_distance(&self.artifacts.centerline, z.level_ppm))
    }
}

/// Content hash of the scenario and the chemical record it runs with.
pub fn run_id_for(scenario: &Scenario, chemical: &Chemical) -> AppResult<String> {
    Ok(compute_run_id(&(scenario, chemical), SOLVER_VERSION)?)
}

/// Run one scenario end to end: source term, dispersion, threat zones.
pub fn run_scenario(scenario: &Scenario, store: &dyn ChemicalStore) -> AppResult<ScenarioOutput> {
    run_stages(scenario, store, &mut |_| {})
}

fn run_stages(
    scenario: &Scenario,
    store: &dyn ChemicalStore,
    on_stage: &mut dyn FnMut(RunStage),
) -> AppResult<ScenarioOutput> {
    let id = scenario.id();
    let chemical = scenario_service::resolve_chemical(scenario, store)?;
    let met = MeteorologicalState::new(scenario.meteorology().clone()).map_err(|e| AppError::from_met(id, e))?;

    on_stage(RunStage::SourceTerm);
    let model = scenario
        .source()
        .build(&chemical, &met)
        .map_err(|e| AppError::from_source(id, e))?;
    let release = collect_series(&model, scenario.sim_options()).map_err(|e| AppError::from_source(id, e))?;

    on_stage(RunStage::Dispersion);
    let dispersion = scenario.dispersion();
    let strength = match dispersion.release_mode {
        ReleaseMode::Instantaneous => release.total_airborne_kg(),
        _ => release.max_average_airborne_kg_s(dispersion.averaging_window_s),
    };
    let release_temperature_k = scenario
        .release_temperature_k()
        .or_else(|| release.mean_airborne_temperature_k())
        .unwrap_or(met.ambient_temperature_k());

    let mut kind = resolve_model(
        dispersion.model,
        &chemical,
        release_temperature_k,
        &met,
        dispersion.dense_gas_ratio,
    );
    if strength <= 0.0 && kind == pc_dispersion::ModelKind::HeavyGas {
        tracing::warn!(scenario = id, "no airborne mass; skipping the heavy-gas march");
        kind = pc_dispersion::ModelKind::Gaussian;
    }

    let input = DispersionInput {
        strength,
        release_temperature_k,
        height_m: scenario.source_height_m(),
        mode: dispersion.release_mode,
        geometry: dispersion
            .geometry
            .unwrap_or_else(|| default_geometry(scenario.source())),
        max_distance_m: dispersion.heavy_gas_max_distance_m,
    };
    let field = DispersionField::build(kind, &input, &chemical, &met).map_err(|e| AppError::from_dispersion(id, e))?;

    let grid = scenario.grid();
    let time_s = dispersion
        .evaluation_time_s
        .unwrap_or_else(|| default_evaluation_time(&field, grid));
    let ppm = PpmConverter::new(
        chemical.molecular_weight_g_mol,
        met.ambient_temperature_k(),
        met.ambient_pressure_pa(),
    )
    .map_err(|e| AppError::from_core(id, e))?;
    let gridded = evaluate_grid(&field, grid, time_s, &ppm).map_err(|e| AppError::from_dispersion(id, e))?;
    tracing::info!(
        scenario = id,
        model = kind.label(),
        strength,
        release_temperature_k,
        max_ppm = gridded.max(),
        "concentration field evaluated"
    );

    on_stage(RunStage::Consequence);
    let centerline = if grid.x_max_m >= grid.dx() {
        Centerline::sample(&field, &ppm, grid.x_max_m, grid.dx(), grid.z_m, time_s)
            .map_err(|e| AppError::from_consequence(id, e))?
    } else {
        Centerline::default()
    };
    let thresholds = lookup_thresholds(&chemical);
    let kinds = requested_thresholds(scenario, &thresholds);
    let zones = threat_zones(&gridded, &thresholds, &kinds).map_err(|e| AppError::from_consequence(id, e))?;

    let frame = scenario.location().map(|loc| LocalFrame {
        origin_lat_deg: loc.latitude_deg,
        origin_lon_deg: loc.longitude_deg,
        wind_direction_deg: met.wind_direction_deg(),
    });
    let zones: Vec<ZoneArtifact> = zones
        .into_iter()
        .map(|zone| ZoneArtifact {
            geographic: frame.as_ref().map(|f| zone.to_geographic(f)),
            zone,
        })
        .collect();

    let manifest = RunManifest {
        run_id: run_id_for(scenario, &chemical)?,
        scenario_id: id.to_string(),
        chemical: chemical.name.clone(),
        timestamp: timestamp_now(),
        source_kind: model.kind().to_string(),
        dispersion_model: kind,
        solver_version: SOLVER_VERSION.to_string(),
        summary: RunSummary {
            total_released_kg: release.total_released_kg(),
            peak_rate_kg_s: release.peak_rate_kg_s(),
            dispersion_strength: strength,
            max_concentration_ppm: gridded.max(),
            zones: zones.iter().map(|z| ZoneSummary::of(&z.zone)).collect(),
        },
    };
    let trajectory = match field {
        DispersionField::HeavyGas(t) => Some(t),
        DispersionField::Gaussian(_) => None,
    };

    Ok(ScenarioOutput {
        manifest,
        artifacts: RunArtifacts {
            release,
            concentration: ConcentrationArtifact {
                model: kind,
                grid: gridded,
                trajectory,
            },
            centerline,
            zones,
        },
    })
}

/// Explicit thresholds, else the first published family in AEGL, ERPG, PAC
/// order.
fn requested_thresholds(scenario: &Scenario, thresholds: &ThresholdSet) -> Vec<ThresholdKind> {
    let explicit = &scenario.consequence().thresholds;
    if !explicit.is_empty() {
        return explicit.clone();
    }
    let recommended: Vec<ThresholdKind> = thresholds
        .recommended(&ThresholdFamily::DEFAULT_PREFERENCE)
        .into_iter()
        .map(|(kind, _)| kind)
        .collect();
    if recommended.is_empty() {
        tracing::warn!(scenario = scenario.id(), chemical = %thresholds.chemical, "no threshold family published");
    }
    recommended
}

fn default_geometry(source: &SourceSpec) -> SourceGeometry {
    match source {
        SourceSpec::Puddle(p) => SourceGeometry::Puddle {
            diameter_m: (4.0 * p.area_m2 / std::f64::consts::PI).sqrt(),
        },
        _ => SourceGeometry::Continuous,
    }
}

/// Steady fields are sampled at release start; puffs when their centre is
/// half way down the grid.
fn default_evaluation_time(field: &DispersionField, grid: &GridSpec) -> f64 {
    match field {
        DispersionField::Gaussian(m) if m.mode() != ReleaseMode::Continuous && m.transport_speed() > 0.0 => {
            0.5 * grid.x_max_m.max(0.0) / m.transport_speed()
        }
        _ => 0.0,
    }
}

/// Run independent scenarios on the rayon pool. Results keep input order.
pub fn run_batch(scenarios: &[Scenario], store: &dyn ChemicalStore) -> Vec<AppResult<ScenarioOutput>> {
    tracing::info!(scenarios = scenarios.len(), "batch started");
    scenarios.par_iter().map(|s| run_scenario(s, store)).collect()
}

/// Re-run `base` under each set of meteorological conditions.
///
/// Variant ids are `<base id>-<index>`.
pub fn what_if(
    base: &Scenario,
    conditions: &[MetConditions],
    store: &dyn ChemicalStore,
) -> AppResult<Vec<AppResult<ScenarioOutput>>> {
    let variants = conditions
        .iter()
        .enumerate()
        .map(|(i, met)| {
            let id = format!("{}-{}", base.id(), i);
            base.with_meteorology(id.clone(), met.clone())
                .map_err(|e| AppError::from_validation(&id, e))
        })
        .collect::<AppResult<Vec<_>>>()?;
    Ok(run_batch(&variants, store))
}

/// Options for [`ensure_run`].
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    /// Run store root; defaults to `.plumecast/runs` beside the scenario.
    pub store_dir: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            store_dir: None,
        }
    }
}

pub struct RunRequest<'a> {
    pub scenario_path: &'a Path,
    pub options: RunOptions,
}

#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub artifacts: RunArtifacts,
    pub loaded_from_cache: bool,
    pub elapsed_wall_s: f64,
}

impl RunResponse {
    pub fn release(&self) -> &ReleaseTimeSeries {
        &self.artifacts.release
    }
}

fn open_store(scenario_path: &Path, store_dir: Option<&Path>) -> AppResult<RunStore> {
    Ok(match store_dir {
        Some(dir) => RunStore::new(dir.to_path_buf())?,
        None => RunStore::for_scenario_file(scenario_path)?,
    })
}

/// Stored runs of the scenario in `scenario_path`, oldest first.
pub fn list_runs(scenario_path: &Path, store_dir: Option<&Path>) -> AppResult<Vec<RunManifest>> {
    let scenario = scenario_service::load_scenario(scenario_path)?;
    Ok(open_store(scenario_path, store_dir)?.list_runs(scenario.id())?)
}

pub fn load_run(scenario_path: &Path, store_dir: Option<&Path>, run_id: &str) -> AppResult<(RunManifest, RunArtifacts)> {
    let store = open_store(scenario_path, store_dir)?;
    Ok((store.load_manifest(run_id)?, store.load_artifacts(run_id)?))
}

/// Load a scenario file, then reuse its stored run or compute and store it.
pub fn ensure_run(request: &RunRequest, store: &dyn ChemicalStore) -> AppResult<RunResponse> {
    ensure_run_with_progress(request, store, None)
}

pub fn ensure_run_with_progress(
    request: &RunRequest,
    chemicals: &dyn ChemicalStore,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    let mut scenario_id = String::new();
    let mut emit = |scenario_id: &str, stage: RunStage, message: Option<String>| {
        if let Some(cb) = progress_cb.as_deref_mut() {
            cb(RunProgressEvent {
                scenario_id: scenario_id.to_string(),
                stage,
                elapsed_wall_s: started.elapsed().as_secs_f64(),
                message,
            });
        }
    };

    emit(&scenario_id, RunStage::LoadingScenario, Some("Loading scenario".to_string()));
    let scenario = scenario_service::load_scenario(request.scenario_path)?;
    scenario_id.push_str(scenario.id());

    emit(&scenario_id, RunStage::CheckingCache, Some("Checking run cache".to_string()));
    let chemical = scenario_service::resolve_chemical(&scenario, chemicals)?;
    let run_id = run_id_for(&scenario, &chemical)?;
    let store = open_store(request.scenario_path, request.options.store_dir.as_deref())?;

    if request.options.use_cache && store.has_run(&run_id) {
        emit(&scenario_id, RunStage::LoadingCachedResult, Some("Loading cached run".to_string()));
        let manifest = store.load_manifest(&run_id)?;
        let artifacts = store.load_artifacts(&run_id)?;
        emit(&scenario_id, RunStage::Completed, None);
        tracing::info!(scenario = %scenario_id, run_id = %run_id, "run loaded from cache");
        return Ok(RunResponse {
            run_id,
            manifest,
            artifacts,
            loaded_from_cache: true,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
        });
    }

    let output = run_stages(&scenario, chemicals, &mut |stage| emit(&scenario_id, stage, None))?;

    emit(&scenario_id, RunStage::SavingResults, Some("Saving results".to_string()));
    store.save_run(&output.manifest, &output.artifacts)?;
    emit(&scenario_id, RunStage::Completed, None);

    Ok(RunResponse {
        run_id: output.manifest.run_id.clone(),
        manifest: output.manifest,
        artifacts: output.artifacts,
        loaded_from_cache: false,
        elapsed_wall_s: started.elapsed().as_secs_f64(),
    })
}
