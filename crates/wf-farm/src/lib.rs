//! wf-farm: wind farm description layer for wakeflow.
//!
//! Provides:
//! - Atmospheric state sets (wind rose states with statistical weights)
//! - Turbine types with power/thrust curves and attached behaviour models
//! - Farm layout with an incremental, validating builder
//! - Wake-frame geometry for a given wind direction
//! - Per-state downwind ordering and the wake-dependency DAG
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use wf_core::units::m;
//! use wf_farm::{LayoutBuilder, PowerCtCurve, TurbineOrdering, TurbineType};
//!
//! let curve = PowerCtCurve::new(vec![(3.0, 0.0, 0.9), (12.0, 5.0e6, 0.8), (25.0, 5.0e6, 0.2)]).unwrap();
//! let ttype = Arc::new(TurbineType::new("T5", m(120.0), m(100.0), curve).unwrap());
//!
//! let mut builder = LayoutBuilder::new();
//! builder.add_turbine("T0", 0.0, 0.0, ttype.clone(), vec![]);
//! builder.add_turbine("T1", 600.0, 0.0, ttype, vec![]);
//! let layout = builder.build().unwrap();
//!
//! // Wind from the west: T0 is upstream of T1.
//! let order = TurbineOrdering::Downwind.resolve(&layout, 270.0).unwrap();
//! assert_eq!(order.ids()[0].index(), 0);
//! ```

pub mod builder;
pub mod error;
pub mod frame;
pub mod layout;
pub mod models;
pub mod order;
pub mod states;
pub mod turbine_type;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::LayoutBuilder;
pub use error::{FarmError, FarmResult};
pub use frame::{WakeFrame, WakeOffset};
pub use layout::{FarmLayout, Turbine};
pub use models::{FixedK, KSource, KTi, TurbineModel};
pub use order::{
    DOWNWIND_TOLERANCE, DownwindOrder, TurbineOrdering, WakeDependencyGraph, WakeReach,
};
pub use states::{AtmosphericState, StateSet, WindProfile};
pub use turbine_type::{PowerCtCurve, TurbineType};
