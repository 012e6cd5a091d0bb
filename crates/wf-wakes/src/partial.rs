//! Partial wake models: one emitter's wake reduced over a receiving rotor.

use std::f64::consts::PI;
use std::sync::Arc;

use wf_core::{ModelError, ModelResult};
use wf_farm::{Turbine, WakeFrame};

use crate::common::circle_overlap;
use crate::traits::{EmitterState, PartialWakeModel, RotorModel, WakeModel};

/// Evaluates the wake at the points of a rotor model and averages them.
///
/// Used for the `rotor_points`, `centre` and `grid` partial wakes, which
/// differ only in the rotor model they sample with.
#[derive(Clone, Debug)]
pub struct RotorAveraged {
    name: &'static str,
    rotor: Arc<dyn RotorModel>,
}

impl RotorAveraged {
    pub fn new(name: &'static str, rotor: Arc<dyn RotorModel>) -> Self {
        Self { name, rotor }
    }

    pub fn rotor(&self) -> &Arc<dyn RotorModel> {
        &self.rotor
    }
}

impl PartialWakeModel for RotorAveraged {
    fn name(&self) -> &str {
        self.name
    }

    fn rotor_delta(
        &self,
        wake: &dyn WakeModel,
        frame: &WakeFrame,
        emitter: &Turbine,
        state: &EmitterState,
        receiver: &Turbine,
    ) -> ModelResult<f64> {
        let radius = 0.5 * receiver.diameter();
        let mut values = Vec::with_capacity(self.rotor.points().len());
        for p in self.rotor.points() {
            let point = frame.rotor_point(receiver, p.y * radius, p.z * radius);
            let offset = frame.offset(emitter, &point);
            values.push(wake.evaluate(state, &offset)?);
        }
        Ok(self.rotor.reduce(&values))
    }
}

/// Exact overlap of a top-hat wake disk with the receiving rotor disk.
///
/// The rotor-effective delta is the wake's centre delta times the fraction
/// of the rotor area inside the wake. The fraction varies continuously with
/// lateral offset, so the delta fades smoothly to zero at the wake edge.
#[derive(Clone, Copy, Debug, Default)]
pub struct TopHatPartial;

impl PartialWakeModel for TopHatPartial {
    fn name(&self) -> &str {
        "top_hat"
    }

    fn supports(&self, wake: &dyn WakeModel) -> bool {
        wake.is_top_hat()
    }

    fn rotor_delta(
        &self,
        wake: &dyn WakeModel,
        frame: &WakeFrame,
        emitter: &Turbine,
        state: &EmitterState,
        receiver: &Turbine,
    ) -> ModelResult<f64> {
        if !wake.is_top_hat() {
            return Err(ModelError::Incompatible {
                what: format!("partial wake 'top_hat' needs a top-hat wake model, got '{}'", wake.name()),
            });
        }
        let offset = frame.offset(emitter, &receiver.hub());
        let Some(profile) = wake.top_hat(state, offset.x)? else {
            return Ok(0.0);
        };
        let r_rotor = 0.5 * receiver.diameter();
        let area = circle_overlap(r_rotor, profile.radius, offset.radial());
        let fraction = (area / (PI * r_rotor * r_rotor)).clamp(0.0, 1.0);
        Ok(fraction * profile.centre_delta)
    }
}
