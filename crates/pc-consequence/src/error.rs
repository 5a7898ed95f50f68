//! Consequence engine errors.

use pc_chem::ChemError;
use thiserror::Error;

pub type ConsequenceResult<T> = Result<T, ConsequenceError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConsequenceError {
    /// The chemical has no published value for the requested threshold.
    #[error("Threshold {kind} not available for {chemical}")]
    ThresholdNotAvailable { chemical: String, kind: String },

    #[error("Input validation failed: {what} ({value})")]
    InputValidation { what: &'static str, value: String },

    #[error("Chemical data error: {0}")]
    Chemical(ChemError),
}

impl ConsequenceError {
    pub(crate) fn invalid(what: &'static str, value: impl ToString) -> Self {
        ConsequenceError::InputValidation {
            what,
            value: value.to_string(),
        }
    }
}

impl From<ChemError> for ConsequenceError {
    fn from(e: ChemError) -> Self {
        match e {
            ChemError::ThresholdNotAvailable { chemical, kind } => {
                ConsequenceError::ThresholdNotAvailable { chemical, kind }
            }
            other => ConsequenceError::Chemical(other),
        }
    }
}
