//! Chemical property errors.

use pc_core::PcError;
use thiserror::Error;

/// Result type for chemical property operations.
pub type ChemResult<T> = Result<T, ChemError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChemError {
    /// No record for the requested name or CAS number.
    #[error("Chemical not found: {query}")]
    ChemicalNotFound { query: String },

    /// The chemical exists but has no value for the requested threshold.
    #[error("Threshold {kind} not available for {chemical}")]
    ThresholdNotAvailable { chemical: String, kind: String },

    /// Non-physical values (negative density, pressure, etc.).
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Malformed external property data.
    #[error("Property data parse error: {message}")]
    Parse { message: String },
}

impl From<PcError> for ChemError {
    fn from(e: PcError) -> Self {
        match e {
            PcError::InvalidArg { what } => ChemError::InvalidArg { what },
            PcError::NonFinite { what, .. } => ChemError::NonPhysical { what },
            other => ChemError::Parse {
                message: other.to_string(),
            },
        }
    }
}

impl From<serde_yaml::Error> for ChemError {
    fn from(e: serde_yaml::Error) -> Self {
        ChemError::Parse {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for ChemError {
    fn from(e: serde_json::Error) -> Self {
        ChemError::Parse {
            message: e.to_string(),
        }
    }
}
