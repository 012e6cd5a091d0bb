//! wf-wakes: wake physics for wakeflow.
//!
//! Provides:
//! - Wake models (`Jensen`, `Bastankhah2014`, `CrespoHernandez`)
//! - Rotor sampling models (centre point, disk grid)
//! - Partial wake models (rotor-point averaging, top-hat overlap)
//! - Superposition laws for combining wakes of several emitters
//! - `ModelBook`, the registry that builds all of the above by name
//!
//! All models are deterministic functions of their inputs and hold no
//! mutable state, so one instance is shared by every worker thread.
//!
//! # Example
//!
//! ```
//! use wf_farm::WakeOffset;
//! use wf_wakes::{EmitterState, ModelBook, ModelSpec};
//!
//! let book = ModelBook::new();
//! let wake = book.wake_model(&ModelSpec::new("Jensen").with("k", 0.05)).unwrap();
//! let emitter = EmitterState {
//!     diameter: 100.0,
//!     ws: 8.0,
//!     amb_ws: 8.0,
//!     ti: 0.05,
//!     amb_ti: 0.05,
//!     ct: 0.75,
//!     k: 0.0,
//! };
//! let delta = wake
//!     .evaluate(&emitter, &WakeOffset { x: 500.0, y: 0.0, z: 0.0 })
//!     .unwrap();
//! assert!(delta < 0.0);
//! ```

pub mod bastankhah;
pub mod book;
pub mod common;
pub mod crespo_hernandez;
pub mod induction;
pub mod jensen;
pub mod partial;
pub mod rotor;
pub mod superposition;
pub mod traits;

// Re-exports
pub use bastankhah::Bastankhah2014;
pub use book::{ModelBook, ModelInfo, ModelKind, ModelSpec, ParamDefault, ParamSpec};
pub use crespo_hernandez::CrespoHernandez;
pub use induction::Induction;
pub use jensen::Jensen;
pub use partial::{RotorAveraged, TopHatPartial};
pub use rotor::{CentreRotor, GridRotor};
pub use superposition::{Applied, ApplyRule, CombinationLaw, Superposition};
pub use traits::{
    EmitterState, PartialWakeModel, RotorModel, RotorPoint, ScaleSpeed, TopHatProfile, WakeModel,
};
