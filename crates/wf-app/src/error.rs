//! Error types for the wf-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the backend crates and
/// gives the CLI a single error to report.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Failed to read project file: {path}: {message}")]
    ProjectFileRead { path: PathBuf, message: String },

    #[error("Project validation failed: {0}")]
    Validation(String),

    #[error("Farm not found: {0}")]
    FarmNotFound(String),

    #[error("Compilation failed: {0}")]
    Compile(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for wf-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<wf_project::ProjectError> for AppError {
    fn from(err: wf_project::ProjectError) -> Self {
        match err {
            wf_project::ProjectError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Project(other.to_string()),
        }
    }
}

impl From<wf_core::ModelError> for AppError {
    fn from(err: wf_core::ModelError) -> Self {
        AppError::Compile(err.to_string())
    }
}

impl From<wf_farm::FarmError> for AppError {
    fn from(err: wf_farm::FarmError) -> Self {
        AppError::Compile(err.to_string())
    }
}

impl From<wf_engine::EngineError> for AppError {
    fn from(err: wf_engine::EngineError) -> Self {
        AppError::Engine(err.to_string())
    }
}

impl From<wf_results::ResultsError> for AppError {
    fn from(err: wf_results::ResultsError) -> Self {
        match err {
            wf_results::ResultsError::RunNotFound { run_id } => AppError::RunNotFound(run_id),
            other => AppError::Results(other.to_string()),
        }
    }
}
