//! Engine configuration.

use std::sync::Arc;

use wf_core::Variable;
use wf_farm::{TurbineOrdering, WakeReach};
use wf_wakes::{
    ApplyRule, CentreRotor, CombinationLaw, PartialWakeModel, RotorModel, Superposition, WakeModel,
};

/// A wake model and the partial wake model that reduces it over rotors.
#[derive(Clone, Debug)]
pub struct WakeSetup {
    pub model: Arc<dyn WakeModel>,
    /// `None` averages over the engine's rotor model points.
    pub partial: Option<Arc<dyn PartialWakeModel>>,
}

/// All choices the engine needs for a run.
///
/// `Default` gives a centre-point rotor, no wake models, linear wind speed
/// and quadratic turbulence superposition, downwind ordering, parallel
/// evaluation and a required weight sum of 1.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub rotor: Arc<dyn RotorModel>,
    pub wakes: Vec<WakeSetup>,
    /// At most one superposition per variable.
    pub superpositions: Vec<Superposition>,
    pub ordering: TurbineOrdering,
    /// Lateral reach used both for fixed-order checks and emitter selection.
    pub reach: WakeReach,
    /// Evaluate states on the rayon thread pool.
    pub parallel: bool,
    /// Required sum of state weights; `None` skips the check.
    pub expected_weight_sum: Option<f64>,
    pub weight_tolerance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rotor: Arc::new(CentreRotor::new()),
            wakes: Vec::new(),
            superpositions: vec![
                Superposition::new(Variable::WindSpeed, CombinationLaw::Linear, ApplyRule::Add),
                Superposition::new(
                    Variable::TurbulenceIntensity,
                    CombinationLaw::Quadratic,
                    ApplyRule::Quadratic,
                ),
            ],
            ordering: TurbineOrdering::Downwind,
            reach: WakeReach::UNBOUNDED,
            parallel: true,
            expected_weight_sum: Some(1.0),
            weight_tolerance: 1e-6,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rotor(mut self, rotor: Arc<dyn RotorModel>) -> Self {
        self.rotor = rotor;
        self
    }

    pub fn with_wake(mut self, model: Arc<dyn WakeModel>) -> Self {
        self.wakes.push(WakeSetup {
            model,
            partial: None,
        });
        self
    }

    pub fn with_wake_and_partial(
        mut self,
        model: Arc<dyn WakeModel>,
        partial: Arc<dyn PartialWakeModel>,
    ) -> Self {
        self.wakes.push(WakeSetup {
            model,
            partial: Some(partial),
        });
        self
    }

    /// Set the superposition for its variable, replacing any previous one.
    pub fn with_superposition(mut self, superposition: Superposition) -> Self {
        self.superpositions
            .retain(|s| s.variable != superposition.variable);
        self.superpositions.push(superposition);
        self
    }

    pub fn with_ordering(mut self, ordering: TurbineOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_reach(mut self, reach: WakeReach) -> Self {
        self.reach = reach;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_expected_weight_sum(mut self, expected: Option<f64>, tolerance: f64) -> Self {
        self.expected_weight_sum = expected;
        self.weight_tolerance = tolerance;
        self
    }

    pub fn superposition_for(&self, variable: Variable) -> Option<&Superposition> {
        self.superpositions.iter().find(|s| s.variable == variable)
    }
}
