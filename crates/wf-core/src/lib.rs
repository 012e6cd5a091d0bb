//! wf-core: stable foundation for wakeflow.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (Real + tolerances + float helpers)
//! - ids (compact IDs for turbines and atmospheric states)
//! - variables (tracked flow/performance variables and dense maps over them)
//! - error (shared error types, including the model evaluation error)
//! - timing (wall-clock timers for run summaries)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod timing;
pub mod units;
pub mod variables;

// Re-exports: nice ergonomics for downstream crates
pub use error::{ModelError, ModelResult, WfError, WfResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
pub use variables::{VarMap, Variable};
