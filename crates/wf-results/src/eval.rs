//! Aggregation of farm results over states and turbines.

use wf_core::Variable;
use wf_core::constants::HOURS_PER_YEAR;

use crate::types::{FarmResults, Flow};
use crate::{ResultsError, ResultsResult};

/// Reduction applied along one axis of the results table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// Σ wᵢ vᵢ over states, arithmetic mean over turbines.
    ///
    /// State weights carry their own normalisation; with weights summing to
    /// 1 this is the weighted mean.
    WeightedMean,
    Sum,
    Min,
    Max,
}

/// Read-only view that aggregates a complete [`FarmResults`].
///
/// Every operation fails with [`ResultsError::Incomplete`] when any cell is
/// missing, so a failed state never silently drops out of an average.
#[derive(Debug, Clone, Copy)]
pub struct FarmResultsEval<'a> {
    results: &'a FarmResults,
}

impl<'a> FarmResultsEval<'a> {
    pub fn new(results: &'a FarmResults) -> Self {
        Self { results }
    }

    pub fn results(&self) -> &'a FarmResults {
        self.results
    }

    pub fn weight_sum(&self) -> f64 {
        self.results.weight_sum()
    }

    fn check(&self) -> ResultsResult<()> {
        if self.results.n_states() == 0 || self.results.n_turbines() == 0 {
            return Err(ResultsError::Empty);
        }
        if let Some((state, turbine)) = self.results.first_missing() {
            return Err(ResultsError::Incomplete { state, turbine });
        }
        Ok(())
    }

    fn weights(&self) -> Vec<f64> {
        self.results.states().iter().map(|s| s.weight).collect()
    }

    /// Reduce `var` over states, one value per turbine.
    pub fn reduce_states(&self, var: Variable, flow: Flow, op: Reduction) -> ResultsResult<Vec<f64>> {
        self.check()?;
        let r = self.results;
        let weights = match op {
            Reduction::WeightedMean => Some(self.weights()),
            _ => None,
        };
        (0..r.n_turbines())
            .map(|t| {
                let values = (0..r.n_states())
                    .map(|s| r.value(s, t, var, flow))
                    .collect::<ResultsResult<Vec<_>>>()?;
                Ok(match &weights {
                    Some(w) => weighted_sum(&values, w),
                    None => reduce(&values, op),
                })
            })
            .collect()
    }

    /// Reduce `var` over turbines, one value per state.
    pub fn reduce_turbines(&self, var: Variable, flow: Flow, op: Reduction) -> ResultsResult<Vec<f64>> {
        self.check()?;
        let r = self.results;
        (0..r.n_states())
            .map(|s| {
                let values = (0..r.n_turbines())
                    .map(|t| r.value(s, t, var, flow))
                    .collect::<ResultsResult<Vec<_>>>()?;
                Ok(reduce(&values, op))
            })
            .collect()
    }

    /// Σ wᵢ Pᵢ over states of the summed farm power Pᵢ (W).
    pub fn mean_farm_power(&self, flow: Flow) -> ResultsResult<f64> {
        let per_state = self.reduce_turbines(Variable::Power, flow, Reduction::Sum)?;
        Ok(weighted_sum(&per_state, &self.weights()))
    }

    /// Waked over ambient mean farm power.
    pub fn farm_efficiency(&self) -> ResultsResult<f64> {
        let ambient = self.mean_farm_power(Flow::Ambient)?;
        if ambient == 0.0 {
            return Err(ResultsError::ZeroAmbientPower);
        }
        Ok(self.mean_farm_power(Flow::Waked)? / ambient)
    }

    /// Per-turbine efficiency; `None` for turbines with zero ambient power.
    pub fn turbine_efficiency(&self) -> ResultsResult<Vec<Option<f64>>> {
        let waked = self.reduce_states(Variable::Power, Flow::Waked, Reduction::WeightedMean)?;
        let ambient = self.reduce_states(Variable::Power, Flow::Ambient, Reduction::WeightedMean)?;
        Ok(waked
            .iter()
            .zip(&ambient)
            .map(|(w, a)| (*a != 0.0).then(|| w / a))
            .collect())
    }

    /// Per-turbine energy yield in GWh over `hours`.
    pub fn turbine_yield(&self, hours: f64, power_factor: f64, flow: Flow) -> ResultsResult<Vec<f64>> {
        let mean_power = self.reduce_states(Variable::Power, flow, Reduction::WeightedMean)?;
        Ok(mean_power.iter().map(|p| p * hours * power_factor / 1e9).collect())
    }

    /// Farm energy yield in GWh over `hours`.
    pub fn farm_yield(&self, hours: f64, power_factor: f64, flow: Flow) -> ResultsResult<f64> {
        Ok(self.turbine_yield(hours, power_factor, flow)?.iter().sum())
    }

    /// Annual farm energy yield in GWh.
    pub fn annual_farm_yield(&self, flow: Flow) -> ResultsResult<f64> {
        self.farm_yield(HOURS_PER_YEAR, 1.0, flow)
    }
}

fn weighted_sum(values: &[f64], weights: &[f64]) -> f64 {
    values.iter().zip(weights).map(|(v, w)| v * w).sum()
}

fn reduce(values: &[f64], op: Reduction) -> f64 {
    match op {
        Reduction::WeightedMean => values.iter().sum::<f64>() / values.len() as f64,
        Reduction::Sum => values.iter().sum(),
        Reduction::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        Reduction::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EffectiveState, StateRecord};
    use wf_core::VarMap;

    fn record(weight: f64) -> StateRecord {
        StateRecord {
            wd_deg: 0.0,
            ws: 8.0,
            ti: 0.06,
            rho: 1.225,
            weight,
        }
    }

    fn cell(amb_p: f64, waked_p: f64) -> EffectiveState {
        let mut ambient = VarMap::inflow(8.0, 0.06, 1.225);
        ambient.set(Variable::Power, amb_p);
        let mut waked = VarMap::inflow(7.0, 0.08, 1.225);
        waked.set(Variable::Power, waked_p);
        EffectiveState {
            ambient,
            waked,
            order_index: 0,
        }
    }

    /// Two states (weights 0.75 / 0.25), two turbines.
    fn results() -> FarmResults {
        let mut r = FarmResults::new(vec!["a".into(), "b".into()], vec![record(0.75), record(0.25)]);
        r.set(0, 0, cell(2e6, 2e6)).unwrap();
        r.set(0, 1, cell(2e6, 1e6)).unwrap();
        r.set(1, 0, cell(4e6, 4e6)).unwrap();
        r.set(1, 1, cell(0.0, 0.0)).unwrap();
        r
    }

    #[test]
    fn weighted_state_mean() {
        let r = results();
        let eval = FarmResultsEval::new(&r);
        let p = eval
            .reduce_states(Variable::Power, Flow::Waked, Reduction::WeightedMean)
            .unwrap();
        assert_eq!(p, vec![0.75 * 2e6 + 0.25 * 4e6, 0.75 * 1e6]);
        let max = eval.reduce_states(Variable::Power, Flow::Ambient, Reduction::Max).unwrap();
        assert_eq!(max, vec![4e6, 2e6]);
    }

    #[test]
    fn turbine_reductions() {
        let r = results();
        let eval = FarmResultsEval::new(&r);
        let sum = eval.reduce_turbines(Variable::Power, Flow::Waked, Reduction::Sum).unwrap();
        assert_eq!(sum, vec![3e6, 4e6]);
        let min = eval.reduce_turbines(Variable::Power, Flow::Waked, Reduction::Min).unwrap();
        assert_eq!(min, vec![1e6, 0.0]);
        let mean = eval
            .reduce_turbines(Variable::WindSpeed, Flow::Waked, Reduction::WeightedMean)
            .unwrap();
        assert_eq!(mean, vec![7.0, 7.0]);
    }

    #[test]
    fn farm_power_and_efficiency() {
        let r = results();
        let eval = FarmResultsEval::new(&r);
        let waked = eval.mean_farm_power(Flow::Waked).unwrap();
        let ambient = eval.mean_farm_power(Flow::Ambient).unwrap();
        assert!((waked - (0.75 * 3e6 + 0.25 * 4e6)).abs() < 1e-6);
        assert!((ambient - (0.75 * 4e6 + 0.25 * 4e6)).abs() < 1e-6);
        assert!((eval.farm_efficiency().unwrap() - waked / ambient).abs() < 1e-12);

        let eff = eval.turbine_efficiency().unwrap();
        assert_eq!(eff[0], Some(1.0));
        assert!((eff[1].unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn zero_ambient_turbine_has_no_efficiency() {
        let mut r = FarmResults::new(vec!["a".into()], vec![record(1.0)]);
        r.set(0, 0, cell(0.0, 0.0)).unwrap();
        let eval = FarmResultsEval::new(&r);
        assert_eq!(eval.turbine_efficiency().unwrap(), vec![None]);
        assert!(matches!(eval.farm_efficiency(), Err(ResultsError::ZeroAmbientPower)));
    }

    #[test]
    fn yields_in_gwh() {
        let mut r = FarmResults::new(vec!["a".into()], vec![record(1.0)]);
        r.set(0, 0, cell(5e6, 5e6)).unwrap();
        let eval = FarmResultsEval::new(&r);
        let y = eval.farm_yield(8760.0, 1.0, Flow::Waked).unwrap();
        assert!((y - 43.8).abs() < 1e-9);
        let half = eval.turbine_yield(8760.0, 0.5, Flow::Waked).unwrap();
        assert!((half[0] - 21.9).abs() < 1e-9);
        assert!((eval.annual_farm_yield(Flow::Ambient).unwrap() - 43.8).abs() < 1e-9);
    }

    #[test]
    fn incomplete_results_are_rejected() {
        let mut r = FarmResults::new(vec!["a".into(), "b".into()], vec![record(1.0)]);
        r.set(0, 0, cell(1.0, 1.0)).unwrap();
        let eval = FarmResultsEval::new(&r);
        assert!(matches!(
            eval.mean_farm_power(Flow::Waked),
            Err(ResultsError::Incomplete { state: 0, turbine: 1 })
        ));
    }

    #[test]
    fn unnormalised_weights_are_not_rescaled() {
        // Weights sum to 2, as when the states carry hours instead of fractions
        let mut r = FarmResults::new(vec!["a".into()], vec![record(1.5), record(0.5)]);
        r.set(0, 0, cell(2e6, 1e6)).unwrap();
        r.set(1, 0, cell(4e6, 4e6)).unwrap();
        let eval = FarmResultsEval::new(&r);
        assert_eq!(eval.weight_sum(), 2.0);
        assert_eq!(eval.mean_farm_power(Flow::Waked).unwrap(), 1.5 * 1e6 + 0.5 * 4e6);
        assert_eq!(eval.mean_farm_power(Flow::Ambient).unwrap(), 1.5 * 2e6 + 0.5 * 4e6);
        let p = eval
            .reduce_states(Variable::Power, Flow::Waked, Reduction::WeightedMean)
            .unwrap();
        assert_eq!(p, vec![3.5e6]);
        assert!((eval.farm_efficiency().unwrap() - 3.5 / 5.0).abs() < 1e-12);
    }

    #[test]
    fn zero_weights_give_zero_power() {
        let mut r = FarmResults::new(vec!["a".into()], vec![record(0.0)]);
        r.set(0, 0, cell(1.0, 1.0)).unwrap();
        let eval = FarmResultsEval::new(&r);
        assert_eq!(eval.mean_farm_power(Flow::Waked).unwrap(), 0.0);
        assert!(matches!(eval.farm_efficiency(), Err(ResultsError::ZeroAmbientPower)));
        assert_eq!(
            eval.reduce_states(Variable::Power, Flow::Waked, Reduction::Max).unwrap(),
            vec![1.0]
        );
    }

    #[test]
    fn empty_results_are_rejected() {
        let r = FarmResults::new(vec![], vec![record(1.0)]);
        assert!(matches!(
            FarmResultsEval::new(&r).reduce_turbines(Variable::Power, Flow::Waked, Reduction::Sum),
            Err(ResultsError::Empty)
        ));
    }
}
