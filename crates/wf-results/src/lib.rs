//! wf-results: per-cell farm results, aggregation and the run cache.

pub mod eval;
pub mod hash;
pub mod store;
pub mod types;

pub use eval::{FarmResultsEval, Reduction};
pub use hash::{compute_run_id, is_valid_run_id};
pub use store::RunStore;
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },

    #[error("Cell ({state}, {turbine}) out of range for {n_states} states x {n_turbines} turbines")]
    IndexOutOfRange {
        state: usize,
        turbine: usize,
        n_states: usize,
        n_turbines: usize,
    },

    #[error("Cell ({state}, {turbine}) was already written")]
    CellAlreadyWritten { state: usize, turbine: usize },

    #[error("Results are incomplete: state {state}, turbine {turbine} has no value")]
    Incomplete { state: usize, turbine: usize },

    #[error("Results hold no states or no turbines")]
    Empty,

    #[error("Ambient farm power is zero")]
    ZeroAmbientPower,
}
