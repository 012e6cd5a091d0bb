//! wf-engine: wake propagation over a farm layout and a set of states.
//!
//! The engine resolves a turbine order per state, then folds over that
//! order computing each turbine's ambient and waked effective state.
//! States are independent and run on the rayon thread pool; results are
//! collected in state order, so parallel and sequential runs agree bit for
//! bit.
//!
//! Model evaluation errors abort only the state they occur in and are
//! reported as [`StateFailure`]s. Everything else is checked before the
//! first state is computed.

pub mod cell;
pub mod config;
pub mod engine;
pub mod error;
pub mod field;
pub mod warnings;

pub use cell::{CellPhase, StateCells};
pub use config::{EngineConfig, WakeSetup};
pub use engine::{EngineOutput, Progress, StateFailure, WakeEngine};
pub use error::{EngineError, EngineResult};
pub use field::{FieldSample, FlowField};
pub use warnings::NumericalWarning;

/// Version string recorded with every stored run.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
