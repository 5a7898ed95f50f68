//! Error types for the pc-app service layer.
//!
//! Failures raised while running a scenario carry its id, and convergence
//! failures also carry the failing step, so a run can be reproduced from the
//! message alone.

use pc_chem::ChemError;
use pc_consequence::ConsequenceError;
use pc_core::PcError;
use pc_dispersion::DispersionError;
use pc_met::MetError;
use pc_scenario::{ScenarioError, ValidationError};
use pc_source::SourceError;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to read scenario file: {path}")]
    ScenarioFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse scenario file {path}: {message}")]
    ScenarioParse { path: PathBuf, message: String },

    #[error("[{scenario_id}] input validation failed: {what} ({value})")]
    InputValidation {
        scenario_id: String,
        what: String,
        value: String,
    },

    #[error("[{scenario_id}] convergence failed: {what} at step {step}, t={time_s} s (residual={residual:e})")]
    Convergence {
        scenario_id: String,
        what: String,
        step: usize,
        time_s: f64,
        residual: f64,
    },

    #[error("[{scenario_id}] dispersion march failed: {what} at step {step}, x={distance_m} m (residual={residual:e})")]
    DispersionConvergence {
        scenario_id: String,
        what: String,
        step: usize,
        distance_m: f64,
        residual: f64,
    },

    #[error("[{scenario_id}] chemical not found: {query}")]
    ChemicalNotFound { scenario_id: String, query: String },

    #[error("[{scenario_id}] threshold {kind} not available for {chemical}")]
    ThresholdNotAvailable {
        scenario_id: String,
        chemical: String,
        kind: String,
    },

    #[error("[{scenario_id}] non-physical value: {what}")]
    NonPhysical { scenario_id: String, what: String },

    #[error("[{scenario_id}] simulation error: {message}")]
    Simulation { scenario_id: String, message: String },

    #[error("Results error: {0}")]
    Results(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Chemical data error: {0}")]
    Chemical(#[from] ChemError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Scenario the failure belongs to, when it was raised inside a run.
    pub fn scenario_id(&self) -> Option<&str> {
        match self {
            AppError::InputValidation { scenario_id, .. }
            | AppError::Convergence { scenario_id, .. }
            | AppError::DispersionConvergence { scenario_id, .. }
            | AppError::ChemicalNotFound { scenario_id, .. }
            | AppError::ThresholdNotAvailable { scenario_id, .. }
            | AppError::NonPhysical { scenario_id, .. }
            | AppError::Simulation { scenario_id, .. } => Some(scenario_id),
            _ => None,
        }
    }

    pub fn from_scenario_file(path: &Path, err: ScenarioError) -> Self {
        match err {
            ScenarioError::Io(source) => AppError::ScenarioFileRead {
                path: path.to_path_buf(),
                source,
            },
            ScenarioError::Validation(v) => {
                let scenario_id = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                AppError::from_validation(&scenario_id, v)
            }
            other => AppError::ScenarioParse {
                path: path.to_path_buf(),
                message: other.to_string(),
            },
        }
    }

    pub fn from_validation(scenario_id: &str, err: ValidationError) -> Self {
        let (what, value) = match err {
            ValidationError::InvalidValue { field, value, reason } => (format!("{field}: {reason}"), value),
            other => (other.to_string(), String::new()),
        };
        AppError::InputValidation {
            scenario_id: scenario_id.to_string(),
            what,
            value,
        }
    }

    pub fn from_source(scenario_id: &str, err: SourceError) -> Self {
        let scenario_id = scenario_id.to_string();
        match err {
            SourceError::InputValidation { what, value } => AppError::InputValidation {
                scenario_id,
                what: what.to_string(),
                value,
            },
            SourceError::Convergence {
                what,
                step,
                time_s,
                residual,
            } => AppError::Convergence {
                scenario_id,
                what,
                step,
                time_s,
                residual,
            },
            SourceError::NonPhysical { what } => AppError::NonPhysical {
                scenario_id,
                what: what.to_string(),
            },
            SourceError::Sim { message } => AppError::Simulation { scenario_id, message },
        }
    }

    pub fn from_dispersion(scenario_id: &str, err: DispersionError) -> Self {
        let scenario_id = scenario_id.to_string();
        match err {
            DispersionError::InputValidation { what, value } => AppError::InputValidation {
                scenario_id,
                what: what.to_string(),
                value,
            },
            DispersionError::Convergence {
                what,
                step,
                distance_m,
                residual,
            } => AppError::DispersionConvergence {
                scenario_id,
                what,
                step,
                distance_m,
                residual,
            },
            DispersionError::NonPhysical { what } => AppError::NonPhysical {
                scenario_id,
                what: what.to_string(),
            },
            DispersionError::Integration { message } => AppError::Simulation { scenario_id, message },
        }
    }

    pub fn from_chem(scenario_id: &str, err: ChemError) -> Self {
        let scenario_id = scenario_id.to_string();
        match err {
            ChemError::ChemicalNotFound { query } => AppError::ChemicalNotFound { scenario_id, query },
            ChemError::ThresholdNotAvailable { chemical, kind } => AppError::ThresholdNotAvailable {
                scenario_id,
                chemical,
                kind,
            },
            ChemError::NonPhysical { what } | ChemError::InvalidArg { what } => AppError::InputValidation {
                scenario_id,
                what: what.to_string(),
                value: String::new(),
            },
            ChemError::Parse { message } => AppError::Simulation { scenario_id, message },
        }
    }

    pub fn from_consequence(scenario_id: &str, err: ConsequenceError) -> Self {
        match err {
            ConsequenceError::ThresholdNotAvailable { chemical, kind } => AppError::ThresholdNotAvailable {
                scenario_id: scenario_id.to_string(),
                chemical,
                kind,
            },
            ConsequenceError::InputValidation { what, value } => AppError::InputValidation {
                scenario_id: scenario_id.to_string(),
                what: what.to_string(),
                value,
            },
            ConsequenceError::Chemical(e) => AppError::from_chem(scenario_id, e),
        }
    }

    pub fn from_met(scenario_id: &str, err: MetError) -> Self {
        match err {
            MetError::InvalidMeteorologyInput { what, value } => AppError::InputValidation {
                scenario_id: scenario_id.to_string(),
                what: what.to_string(),
                value,
            },
        }
    }

    pub fn from_core(scenario_id: &str, err: PcError) -> Self {
        AppError::NonPhysical {
            scenario_id: scenario_id.to_string(),
            what: err.to_string(),
        }
    }
}

impl From<pc_results::ResultsError> for AppError {
    fn from(err: pc_results::ResultsError) -> Self {
        match err {
            pc_results::ResultsError::RunNotFound { run_id } => AppError::RunNotFound(run_id),
            other => AppError::Results(other.to_string()),
        }
    }
}
