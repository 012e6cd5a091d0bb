//! Capability interfaces for wake, rotor and partial-wake models.

use std::fmt::Debug;

use wf_core::{ModelResult, VarMap, Variable};
use wf_farm::{Turbine, WakeFrame, WakeOffset};

/// The effective state of a wake-emitting turbine in one atmospheric state.
///
/// Wake models only ever see this snapshot: it is taken after the emitter's
/// cell is finished and never changes afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EmitterState {
    /// Rotor diameter (m).
    pub diameter: f64,
    /// Rotor-effective waked wind speed (m/s).
    pub ws: f64,
    /// Rotor-effective ambient wind speed (m/s).
    pub amb_ws: f64,
    /// Rotor-effective waked turbulence intensity.
    pub ti: f64,
    /// Ambient turbulence intensity.
    pub amb_ti: f64,
    /// Thrust coefficient.
    pub ct: f64,
    /// Wake growth coefficient, as computed by the turbine's models.
    pub k: f64,
}

impl EmitterState {
    pub fn from_vars(diameter: f64, ambient: &VarMap, waked: &VarMap) -> Self {
        Self {
            diameter,
            ws: waked[Variable::WindSpeed],
            amb_ws: ambient[Variable::WindSpeed],
            ti: waked[Variable::TurbulenceIntensity],
            amb_ti: ambient[Variable::TurbulenceIntensity],
            ct: waked[Variable::ThrustCoefficient],
            k: waked[Variable::WakeGrowth],
        }
    }
}

/// Wind speed that scales a velocity deficit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ScaleSpeed {
    /// The emitter's rotor-effective waked wind speed.
    #[default]
    Waked,
    /// The emitter's ambient wind speed.
    Ambient,
}

impl ScaleSpeed {
    pub fn from_flag(ambient: bool) -> Self {
        if ambient {
            ScaleSpeed::Ambient
        } else {
            ScaleSpeed::Waked
        }
    }

    pub fn of(self, e: &EmitterState) -> f64 {
        match self {
            ScaleSpeed::Waked => e.ws,
            ScaleSpeed::Ambient => e.amb_ws,
        }
    }
}

/// Radius and uniform in-wake delta of a top-hat wake at some downwind distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TopHatProfile {
    pub radius: f64,
    pub centre_delta: f64,
}

/// A wake model for one affected variable.
///
/// `evaluate` returns the delta a single emitter causes at a point. It must
/// be zero for points with `offset.x <= 0` and tend to zero far downstream.
pub trait WakeModel: Send + Sync + Debug {
    fn name(&self) -> &str;

    /// The variable this model changes.
    fn variable(&self) -> Variable;

    /// True when the model reads the emitter's `K` instead of a fixed parameter.
    fn needs_k(&self) -> bool;

    fn evaluate(&self, emitter: &EmitterState, offset: &WakeOffset) -> ModelResult<f64>;

    /// Top-hat description at downwind distance `x`, for models that have one.
    ///
    /// Returns `Ok(None)` when the model is not top-hat shaped or when there
    /// is no wake at `x`.
    fn top_hat(&self, _emitter: &EmitterState, _x: f64) -> ModelResult<Option<TopHatProfile>> {
        Ok(None)
    }

    fn is_top_hat(&self) -> bool {
        false
    }
}

/// A point on a rotor disk, in coordinates normalised by the rotor radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotorPoint {
    /// Cross-wind coordinate in `[-1, 1]`.
    pub y: f64,
    /// Vertical coordinate in `[-1, 1]`.
    pub z: f64,
    pub weight: f64,
}

/// Maps a field sampled on rotor points to one rotor-effective value.
pub trait RotorModel: Send + Sync + Debug {
    fn name(&self) -> &str;

    /// Sample points, with weights summing to one.
    fn points(&self) -> &[RotorPoint];

    /// Weighted average of `values`, one per point.
    fn reduce(&self, values: &[f64]) -> f64 {
        self.points()
            .iter()
            .zip(values)
            .map(|(p, v)| p.weight * v)
            .sum()
    }
}

/// Reduces one emitter's wake field over a receiving rotor.
pub trait PartialWakeModel: Send + Sync + Debug {
    fn name(&self) -> &str;

    /// Whether this partial wake can be used with `wake`.
    fn supports(&self, _wake: &dyn WakeModel) -> bool {
        true
    }

    /// Rotor-effective delta of `wake` from `emitter` on `receiver`.
    ///
    /// Depends only on its arguments, so calls for different
    /// (emitter, receiver, variable) triples can run in any order.
    fn rotor_delta(
        &self,
        wake: &dyn WakeModel,
        frame: &WakeFrame,
        emitter: &Turbine,
        state: &EmitterState,
        receiver: &Turbine,
    ) -> ModelResult<f64>;
}
