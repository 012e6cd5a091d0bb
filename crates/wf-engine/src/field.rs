//! Flow field reconstruction at arbitrary points.

use nalgebra::Vector3;
use wf_core::Variable;
use wf_farm::{StateSet, WakeFrame, WindProfile};
use wf_results::{FarmResults, ResultsError};
use wf_wakes::EmitterState;

use crate::engine::WakeEngine;
use crate::error::{EngineError, EngineResult};

/// Waked flow at one point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldSample {
    pub ws: f64,
    pub ti: f64,
}

/// Re-evaluates the wake models at world points, using the stored
/// effective states of a finished run as emitters.
pub struct FlowField<'a> {
    engine: &'a WakeEngine,
    states: &'a StateSet,
    results: &'a FarmResults,
}

impl<'a> FlowField<'a> {
    pub fn new(engine: &'a WakeEngine, states: &'a StateSet, results: &'a FarmResults) -> EngineResult<Self> {
        if results.n_states() != states.len() || results.n_turbines() != engine.layout().len() {
            return Err(EngineError::configuration(format!(
                "results of {} states x {} turbines do not match {} states x {} turbines",
                results.n_states(),
                results.n_turbines(),
                states.len(),
                engine.layout().len()
            )));
        }
        Ok(Self {
            engine,
            states,
            results,
        })
    }

    /// Waked wind speed and turbulence intensity at `points` (x east,
    /// y north, z above ground) for state `state_index`.
    pub fn evaluate(&self, points: &[Vector3<f64>], state_index: usize) -> EngineResult<Vec<FieldSample>> {
        let state = self.states.get(state_index).ok_or_else(|| {
            EngineError::configuration(format!("state {state_index} out of range"))
        })?;
        let frame = WakeFrame::from_direction(state.wd_deg);
        let layout = self.engine.layout();
        let config = self.engine.config();
        let profile = self.states.profile();

        let mut emitters = Vec::with_capacity(layout.len());
        for (t, turbine) in layout.turbines().iter().enumerate() {
            let cell = self
                .results
                .get(state_index, t)
                .ok_or(ResultsError::Incomplete {
                    state: state_index,
                    turbine: t,
                })?;
            emitters.push((
                turbine,
                EmitterState::from_vars(turbine.diameter(), &cell.ambient, &cell.waked),
            ));
        }

        let mut samples = Vec::with_capacity(points.len());
        for p in points {
            let ws = match profile {
                WindProfile::Uniform => state.ws,
                _ => profile.speed_at(state.ws, p.z),
            };
            let mut values = [(Variable::WindSpeed, ws), (Variable::TurbulenceIntensity, state.ti)];
            for (var, value) in values.iter_mut() {
                let Some(sup) = config.superposition_for(*var) else {
                    continue;
                };
                let mut deltas = Vec::new();
                for (turbine, es) in &emitters {
                    let off = frame.offset(turbine, p);
                    if !config.reach.reaches(off.x, off.y, turbine.diameter(), 0.0) {
                        continue;
                    }
                    for w in self.engine.wakes().iter().filter(|w| w.model.variable() == *var) {
                        deltas.push(w.model.evaluate(es, &off)?);
                    }
                }
                *value = sup.superpose(*value, &deltas).value;
            }
            samples.push(FieldSample {
                ws: values[0].1,
                ti: values[1].1,
            });
        }
        Ok(samples)
    }
}
