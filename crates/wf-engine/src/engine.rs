//! The wake propagation engine.
//!
//! States are independent and are mapped in parallel. Within a state the
//! turbines are folded in their resolved order: each turbine gathers the
//! rotor-effective deltas of every finished emitter that reaches it,
//! superposes them per variable, evaluates its own models on the waked
//! inflow and then becomes an emitter for the turbines after it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};
use wf_core::timing::{AccumulatingTimer, Timer};
use wf_core::{ModelError, ModelResult, TurbineId, VarMap, Variable};
use wf_farm::{
    AtmosphericState, DownwindOrder, FarmLayout, StateSet, Turbine, WakeFrame, WindProfile,
};
use wf_results::{EffectiveState, FarmResults, StateRecord};
use wf_wakes::{EmitterState, PartialWakeModel, RotorAveraged, WakeModel};

use crate::cell::StateCells;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::warnings::NumericalWarning;

/// A state that could not be computed. Its cells stay empty.
#[derive(Clone, Debug, PartialEq)]
pub struct StateFailure {
    pub state: usize,
    pub wd_deg: f64,
    pub turbine: String,
    pub error: ModelError,
}

impl fmt::Display for StateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "state {} (wd {}) failed at turbine {}: {}",
            self.state, self.wd_deg, self.turbine, self.error
        )
    }
}

/// Everything a run produces.
#[derive(Clone, Debug)]
pub struct EngineOutput {
    pub results: FarmResults,
    pub failures: Vec<StateFailure>,
    pub warnings: Vec<NumericalWarning>,
    pub elapsed_s: f64,
}

/// Progress report, sent once per finished state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

#[derive(Clone, Debug)]
pub(crate) struct ResolvedWake {
    pub model: Arc<dyn WakeModel>,
    pub partial: Arc<dyn PartialWakeModel>,
}

struct StateOutcome {
    cells: Vec<EffectiveState>,
    warnings: Vec<NumericalWarning>,
}

enum CellError {
    Failed(StateFailure),
    Fatal(EngineError),
}

impl From<EngineError> for CellError {
    fn from(e: EngineError) -> Self {
        CellError::Fatal(e)
    }
}

/// Validated engine for one farm layout.
#[derive(Debug)]
pub struct WakeEngine {
    layout: Arc<FarmLayout>,
    config: EngineConfig,
    wakes: Vec<ResolvedWake>,
}

impl WakeEngine {
    /// Check `config` against `layout`. All configuration errors that do not
    /// depend on the states are reported here.
    pub fn new(layout: Arc<FarmLayout>, config: EngineConfig) -> EngineResult<Self> {
        let weight_sum: f64 = config.rotor.points().iter().map(|p| p.weight).sum();
        if config.rotor.points().is_empty() || (weight_sum - 1.0).abs() > 1e-9 {
            return Err(EngineError::configuration(format!(
                "rotor model '{}' weights sum to {weight_sum}, expected 1",
                config.rotor.name()
            )));
        }

        let mut seen = Vec::new();
        for s in &config.superpositions {
            if seen.contains(&s.variable) {
                return Err(EngineError::configuration(format!(
                    "more than one superposition for variable {}",
                    s.variable
                )));
            }
            seen.push(s.variable);
        }

        let mut wakes = Vec::with_capacity(config.wakes.len());
        for setup in &config.wakes {
            let partial = setup.partial.clone().unwrap_or_else(|| {
                Arc::new(RotorAveraged::new("rotor_points", config.rotor.clone()))
            });
            if !partial.supports(setup.model.as_ref()) {
                return Err(ModelError::Incompatible {
                    what: format!(
                        "partial wake '{}' cannot reduce wake model '{}'",
                        partial.name(),
                        setup.model.name()
                    ),
                }
                .into());
            }
            let var = setup.model.variable();
            if config.superposition_for(var).is_none() {
                return Err(EngineError::configuration(format!(
                    "wake model '{}' affects {var} but no superposition is set for it",
                    setup.model.name()
                )));
            }
            if setup.model.needs_k()
                && let Some(t) = layout
                    .turbines()
                    .iter()
                    .find(|t| !t.provides(Variable::WakeGrowth))
            {
                return Err(EngineError::configuration(format!(
                    "wake model '{}' reads K but turbine '{}' has no model computing it",
                    setup.model.name(),
                    t.name
                )));
            }
            wakes.push(ResolvedWake {
                model: setup.model.clone(),
                partial,
            });
        }

        if let Some(expected) = config.expected_weight_sum
            && !(expected.is_finite() && expected > 0.0)
        {
            return Err(EngineError::configuration(format!(
                "expected weight sum must be positive, got {expected}"
            )));
        }
        if !(config.weight_tolerance.is_finite() && config.weight_tolerance >= 0.0) {
            return Err(EngineError::configuration(format!(
                "weight tolerance must be non-negative, got {}",
                config.weight_tolerance
            )));
        }

        Ok(Self {
            layout,
            config,
            wakes,
        })
    }

    pub fn layout(&self) -> &Arc<FarmLayout> {
        &self.layout
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn wakes(&self) -> &[ResolvedWake] {
        &self.wakes
    }

    /// Resolve the turbine order of every state, checking fixed orders.
    ///
    /// States sharing a wind direction share one resolution.
    pub fn resolve_orders(&self, states: &StateSet) -> EngineResult<Vec<DownwindOrder>> {
        let mut by_direction: HashMap<u64, DownwindOrder> = HashMap::new();
        let mut orders = Vec::with_capacity(states.len());
        for s in states.states() {
            let order = match by_direction.get(&s.wd_deg.to_bits()) {
                Some(order) => order.clone(),
                None => {
                    let order = self.config.ordering.resolve_with_reach(
                        &self.layout,
                        s.wd_deg,
                        self.config.reach,
                    )?;
                    by_direction.insert(s.wd_deg.to_bits(), order.clone());
                    order
                }
            };
            orders.push(order);
        }
        Ok(orders)
    }

    pub fn run(&self, states: &StateSet) -> EngineResult<EngineOutput> {
        self.run_with_progress(states, |_| {})
    }

    /// Run all states, calling `progress` after each finished state.
    ///
    /// `progress` may be called from several worker threads.
    pub fn run_with_progress<F>(&self, states: &StateSet, progress: F) -> EngineResult<EngineOutput>
    where
        F: Fn(Progress) + Sync,
    {
        let timer = Timer::start("wake engine run");
        states.validate(self.config.expected_weight_sum, self.config.weight_tolerance)?;
        let orders = self.resolve_orders(states)?;

        let total = states.len();
        info!(
            states = total,
            turbines = self.layout.len(),
            wakes = ?self.wakes.iter().map(|w| w.model.name()).collect::<Vec<_>>(),
            rotor = self.config.rotor.name(),
            parallel = self.config.parallel,
            "starting wake propagation"
        );

        let completed = AtomicUsize::new(0);
        let state_timer = AccumulatingTimer::new();
        let profile = states.profile();
        let evaluate = |i: usize| {
            let start = Instant::now();
            let outcome = self.compute_state(i, &states.states()[i], &orders[i], profile);
            state_timer.record(start.elapsed().as_secs_f64());
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            progress(Progress {
                completed: done,
                total,
            });
            outcome
        };
        let outcomes: Vec<Result<StateOutcome, CellError>> = if self.config.parallel {
            (0..total).into_par_iter().map(evaluate).collect()
        } else {
            (0..total).map(evaluate).collect()
        };

        let records = states
            .states()
            .iter()
            .map(|s| StateRecord {
                wd_deg: s.wd_deg,
                ws: s.ws,
                ti: s.ti,
                rho: s.rho,
                weight: s.weight,
            })
            .collect();
        let mut results = FarmResults::new(self.layout.names(), records);
        let mut failures = Vec::new();
        let mut warnings = Vec::new();
        for (i, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(o) => {
                    for (t, cell) in o.cells.into_iter().enumerate() {
                        results.set(i, t, cell)?;
                    }
                    for w in &o.warnings {
                        warn!(%w, "numerical warning");
                    }
                    warnings.extend(o.warnings);
                }
                Err(CellError::Failed(f)) => {
                    warn!(%f, "state failed");
                    failures.push(f);
                }
                Err(CellError::Fatal(e)) => return Err(e),
            }
        }

        let elapsed_s = timer.stop();
        info!(
            elapsed_s,
            mean_state_s = state_timer.average_seconds(),
            failures = failures.len(),
            warnings = warnings.len(),
            "wake propagation finished"
        );
        Ok(EngineOutput {
            results,
            failures,
            warnings,
            elapsed_s,
        })
    }

    /// Turbines whose wakes reach `receiver` in this frame, by index.
    pub(crate) fn emitters_of(&self, frame: &WakeFrame, receiver: &Turbine) -> Vec<TurbineId> {
        self.layout
            .turbines()
            .iter()
            .filter(|e| {
                if e.id == receiver.id {
                    return false;
                }
                let off = frame.offset(e, &receiver.hub());
                self.config
                    .reach
                    .reaches(off.x, off.y, e.diameter(), receiver.diameter())
            })
            .map(|e| e.id)
            .collect()
    }

    /// Rotor-effective ambient inflow of `turbine`.
    fn ambient_inflow(&self, turbine: &Turbine, state: &AtmosphericState, profile: WindProfile) -> VarMap {
        let ws = match profile {
            WindProfile::Uniform => state.ws,
            _ => {
                let radius = 0.5 * turbine.diameter();
                let rotor = &self.config.rotor;
                let values: Vec<f64> = rotor
                    .points()
                    .iter()
                    .map(|p| profile.speed_at(state.ws, turbine.hub_height() + p.z * radius))
                    .collect();
                rotor.reduce(&values)
            }
        };
        VarMap::inflow(ws, state.ti, state.rho)
    }

    fn compute_state(
        &self,
        index: usize,
        state: &AtmosphericState,
        order: &DownwindOrder,
        profile: WindProfile,
    ) -> Result<StateOutcome, CellError> {
        let layout = &*self.layout;
        let frame = WakeFrame::from_direction(state.wd_deg);
        let mut cells = StateCells::new(layout.len());
        let mut done: Vec<Option<(EffectiveState, EmitterState)>> = vec![None; layout.len()];
        let mut warnings = Vec::new();

        let fail = |turbine: &Turbine, error: ModelError| -> CellError {
            if error.is_evaluation_error() {
                CellError::Failed(StateFailure {
                    state: index,
                    wd_deg: state.wd_deg,
                    turbine: turbine.name.clone(),
                    error,
                })
            } else {
                CellError::Fatal(error.into())
            }
        };
        let checked = |turbine: &Turbine, r: ModelResult<f64>| r.map_err(|e| fail(turbine, e));

        for (pos, &id) in order.ids().iter().enumerate() {
            let receiver = turbine(layout, id)?;
            let upstream = self.emitters_of(&frame, receiver);
            cells.begin(id, &upstream)?;

            let inflow = self.ambient_inflow(receiver, state, profile);
            let mut ambient = inflow;
            receiver
                .evaluate(&inflow, &mut ambient)
                .map_err(|e| fail(receiver, e))?;

            let mut waked = inflow;
            for sup in &self.config.superpositions {
                let var = sup.variable;
                let mut deltas = Vec::new();
                for &up in &upstream {
                    let emitter = turbine(layout, up)?;
                    let Some((_, emitter_state)) = &done[up.idx()] else {
                        return Err(EngineError::Invariant {
                            what: format!("emitter {up} has no effective state"),
                        }
                        .into());
                    };
                    for w in self.wakes.iter().filter(|w| w.model.variable() == var) {
                        let delta = w.partial.rotor_delta(
                            w.model.as_ref(),
                            &frame,
                            emitter,
                            emitter_state,
                            receiver,
                        );
                        deltas.push(checked(receiver, delta)?);
                    }
                }
                let applied = sup.superpose(inflow[var], &deltas);
                if let Some(raw) = applied.clamped_from {
                    warnings.push(NumericalWarning {
                        state: index,
                        turbine: receiver.name.clone(),
                        variable: var,
                        raw,
                        clamped: applied.value,
                    });
                }
                waked[var] = applied.value;
            }
            receiver
                .evaluate(&inflow, &mut waked)
                .map_err(|e| fail(receiver, e))?;

            let emitter_state = EmitterState::from_vars(receiver.diameter(), &ambient, &waked);
            let cell = EffectiveState {
                ambient,
                waked,
                order_index: pos,
            };
            done[id.idx()] = Some((cell, emitter_state));
            cells.finish(id)?;
        }

        if !cells.all_done() {
            return Err(EngineError::Invariant {
                what: format!("state {index}: order does not cover every turbine"),
            }
            .into());
        }
        let cells = done
            .into_iter()
            .map(|c| c.map(|(cell, _)| cell))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| EngineError::Invariant {
                what: format!("state {index}: missing effective state"),
            })?;
        debug!(state = index, wd = state.wd_deg, ws = state.ws, "state done");
        Ok(StateOutcome { cells, warnings })
    }
}

fn turbine(layout: &FarmLayout, id: TurbineId) -> EngineResult<&Turbine> {
    layout.turbine(id).ok_or_else(|| EngineError::Invariant {
        what: format!("turbine {id} not in layout"),
    })
}
