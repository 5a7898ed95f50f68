//! Shared application service layer for plumecast.
//!
//! Compiles validated scenarios into source-term and dispersion models, runs
//! them, and hands the results to the CLI. Everything here is a pure
//! function of the scenario and the chemical store passed in.

pub mod error;
pub mod progress;
pub mod query;
pub mod run_service;
pub mod scenario_service;

pub use error::{AppError, AppResult};
pub use progress::{RunProgressEvent, RunStage};
pub use query::{ZoneReport, zone_reports};
pub use run_service::{
    RunOptions, RunRequest, RunResponse, SOLVER_VERSION, ScenarioOutput, ensure_run,
    ensure_run_with_progress, list_runs, load_run, run_batch, run_id_for, run_scenario, what_if,
};
pub use scenario_service::{
    ScenarioSummary, load_scenario, lookup_chemical, open_chemical_store, resolve_chemical, summarize,
};
