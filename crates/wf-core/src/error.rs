use thiserror::Error;

pub type WfResult<T> = Result<T, WfError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WfError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Value out of range for {what}: {value}")]
    OutOfRange { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Invariant violated: {what}")]
    Invariant { what: String },
}

pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building or evaluating a pluggable model.
///
/// `UnknownModel`, `InvalidParameter`, `MissingParameter` and `Incompatible`
/// are configuration errors and surface before any state is computed.
/// `Unrecoverable` is raised during evaluation and aborts only the
/// atmospheric state in which it occurred.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Unknown {kind} '{name}' (available: {available})")]
    UnknownModel {
        kind: &'static str,
        name: String,
        available: String,
    },

    #[error("Invalid parameter '{param}' for model '{model}': {reason}")]
    InvalidParameter {
        model: String,
        param: String,
        reason: String,
    },

    #[error("Missing required parameter '{param}' for model '{model}'")]
    MissingParameter { model: String, param: String },

    #[error("Incompatible model configuration: {what}")]
    Incompatible { what: String },

    #[error("Model '{model}' cannot be evaluated: {what}")]
    Unrecoverable { model: String, what: String },
}

impl ModelError {
    pub fn unrecoverable(model: &str, what: impl Into<String>) -> Self {
        ModelError::Unrecoverable {
            model: model.to_string(),
            what: what.into(),
        }
    }

    pub fn invalid_param(model: &str, param: &str, reason: impl Into<String>) -> Self {
        ModelError::InvalidParameter {
            model: model.to_string(),
            param: param.to_string(),
            reason: reason.into(),
        }
    }

    /// True when the error stems from evaluation rather than configuration.
    pub fn is_evaluation_error(&self) -> bool {
        matches!(self, ModelError::Unrecoverable { .. })
    }
}

impl From<ModelError> for WfError {
    fn from(err: ModelError) -> Self {
        WfError::Invariant {
            what: err.to_string(),
        }
    }
}
