//! Shared application service layer for wakeflow.
//!
//! This crate sits between project files and the engine: it loads and
//! validates projects, compiles a farm definition into engine inputs through
//! the model registry, runs the engine with result caching, and answers
//! queries on stored runs. The CLI is a thin layer over it.

pub mod compile;
pub mod error;
pub mod progress;
pub mod project_service;
pub mod query;
pub mod run_service;

// Re-export key types for convenience
pub use compile::{FarmRuntime, compile_farm};
pub use error::{AppError, AppResult};
pub use progress::{RunProgressEvent, RunStage, StateProgress};
pub use project_service::{
    FarmSummary, get_farm, list_farms, load_project, save_project, validate_project,
};
pub use query::{RunSummary, TurbineSummary, export_csv, get_run_summary, turbine_summaries};
pub use run_service::{
    RunOptions, RunRequest, RunResponse, RunTimingSummary, ensure_run, ensure_run_with_progress,
    delete_run, list_runs, load_run,
};
