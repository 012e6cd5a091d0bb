//! Error types for engine operations.

use thiserror::Error;
use wf_core::{ModelError, WfError};
use wf_farm::FarmError;
use wf_results::ResultsError;

/// Errors that abort a whole engine run.
///
/// Every variant except `Invariant` is a configuration error and is raised
/// before any state is computed. Evaluation errors inside one state are not
/// reported here; they become a [`crate::StateFailure`].
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {what}")]
    Configuration { what: String },

    #[error("Farm error: {0}")]
    Farm(#[from] FarmError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Results error: {0}")]
    Results(#[from] ResultsError),

    #[error("Invariant violated: {what}")]
    Invariant { what: String },
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn configuration(what: impl Into<String>) -> Self {
        EngineError::Configuration { what: what.into() }
    }

    /// True for errors detected while validating inputs.
    pub fn is_configuration(&self) -> bool {
        match self {
            EngineError::Configuration { .. } | EngineError::Farm(_) => true,
            EngineError::Model(e) => !e.is_evaluation_error(),
            EngineError::Results(_) | EngineError::Invariant { .. } => false,
        }
    }
}

impl From<EngineError> for WfError {
    fn from(e: EngineError) -> Self {
        WfError::Invariant {
            what: e.to_string(),
        }
    }
}
