//! Non-fatal numerical diagnostics.

use std::fmt;

use wf_core::Variable;

/// A waked value that left its physical range and was clamped.
#[derive(Clone, Debug, PartialEq)]
pub struct NumericalWarning {
    pub state: usize,
    pub turbine: String,
    pub variable: Variable,
    /// Value produced by superposition.
    pub raw: f64,
    /// Value stored in the results.
    pub clamped: f64,
}

impl fmt::Display for NumericalWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "state {}, turbine {}: waked {} = {} clamped to {}",
            self.state, self.turbine, self.variable, self.raw, self.clamped
        )
    }
}
