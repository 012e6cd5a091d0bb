//! Farm construction and validation errors.

use thiserror::Error;
use wf_core::{TurbineId, WfError};

/// Errors raised while building a layout, a state set or a turbine order.
///
/// All variants are configuration errors: they are reported before any
/// wake computation starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FarmError {
    #[error("Farm layout has no turbines")]
    EmptyLayout,

    #[error("Duplicate turbine name '{name}'")]
    DuplicateName { name: String },

    #[error("Turbines '{first}' and '{second}' share the same position")]
    CoincidentTurbines { first: String, second: String },

    #[error("Invalid geometry for turbine '{turbine}': {what}")]
    InvalidGeometry { turbine: String, what: &'static str },

    #[error("Invalid turbine type '{name}': {what}")]
    InvalidTurbineType { name: String, what: String },

    #[error("Invalid power/ct curve: {what}")]
    InvalidCurve { what: &'static str },

    #[error("State set is empty")]
    EmptyStates,

    #[error("Invalid atmospheric state {index}: {what}")]
    InvalidState { index: usize, what: String },

    #[error("State weights sum to {sum}, expected {expected} (tolerance {tolerance})")]
    WeightSum {
        sum: f64,
        expected: f64,
        tolerance: f64,
    },

    #[error("Fixed turbine order has {len} entries, layout has {expected} turbines")]
    OrderLength { len: usize, expected: usize },

    #[error("Fixed turbine order lists turbine {turbine} more than once or out of range")]
    OrderNotPermutation { turbine: TurbineId },

    #[error(
        "Turbine order for wind direction {wd_deg} places {downstream} before its upstream emitter {upstream}"
    )]
    OrderViolation {
        wd_deg: f64,
        upstream: TurbineId,
        downstream: TurbineId,
    },

    #[error("Wake dependency graph for wind direction {wd_deg} contains a cycle")]
    DependencyCycle { wd_deg: f64 },

    #[error("Unknown turbine: {what}")]
    UnknownTurbine { what: String },
}

pub type FarmResult<T> = Result<T, FarmError>;

impl From<FarmError> for WfError {
    fn from(err: FarmError) -> Self {
        WfError::Invariant {
            what: err.to_string(),
        }
    }
}
