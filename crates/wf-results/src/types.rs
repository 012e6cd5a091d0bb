//! Result data types.

use serde::{Deserialize, Serialize};
use wf_core::{VarMap, Variable};

use crate::{ResultsError, ResultsResult};

pub type RunId = String;

/// The atmospheric state a row of results was computed for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StateRecord {
    pub wd_deg: f64,
    pub ws: f64,
    pub ti: f64,
    pub rho: f64,
    pub weight: f64,
}

/// Ambient and waked variables of one turbine in one state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EffectiveState {
    pub ambient: VarMap,
    pub waked: VarMap,
    /// Position of the turbine in the state's evaluation order.
    pub order_index: usize,
}

impl EffectiveState {
    pub fn flow(&self, flow: Flow) -> &VarMap {
        match flow {
            Flow::Ambient => &self.ambient,
            Flow::Waked => &self.waked,
        }
    }
}

/// Selects the ambient or the waked half of a cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Flow {
    Ambient,
    Waked,
}

/// Dense `(state, turbine)` table of effective states.
///
/// Cells are stored state-major. Every cell is written at most once; cells
/// of states that failed stay empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FarmResults {
    turbine_names: Vec<String>,
    states: Vec<StateRecord>,
    cells: Vec<Option<EffectiveState>>,
}

impl FarmResults {
    pub fn new(turbine_names: Vec<String>, states: Vec<StateRecord>) -> Self {
        let cells = vec![None; turbine_names.len() * states.len()];
        Self {
            turbine_names,
            states,
            cells,
        }
    }

    pub fn n_states(&self) -> usize {
        self.states.len()
    }

    pub fn n_turbines(&self) -> usize {
        self.turbine_names.len()
    }

    pub fn turbine_names(&self) -> &[String] {
        &self.turbine_names
    }

    pub fn states(&self) -> &[StateRecord] {
        &self.states
    }

    pub fn weight_sum(&self) -> f64 {
        self.states.iter().map(|s| s.weight).sum()
    }

    fn index(&self, state: usize, turbine: usize) -> ResultsResult<usize> {
        if state >= self.n_states() || turbine >= self.n_turbines() {
            return Err(ResultsError::IndexOutOfRange {
                state,
                turbine,
                n_states: self.n_states(),
                n_turbines: self.n_turbines(),
            });
        }
        Ok(state * self.n_turbines() + turbine)
    }

    /// Write a cell. Writing the same cell twice is an error.
    pub fn set(&mut self, state: usize, turbine: usize, cell: EffectiveState) -> ResultsResult<()> {
        let i = self.index(state, turbine)?;
        let slot = &mut self.cells[i];
        if slot.is_some() {
            return Err(ResultsError::CellAlreadyWritten { state, turbine });
        }
        *slot = Some(cell);
        Ok(())
    }

    /// The cell at `(state, turbine)`, `None` when out of range or not written.
    pub fn get(&self, state: usize, turbine: usize) -> Option<&EffectiveState> {
        self.index(state, turbine)
            .ok()
            .and_then(|i| self.cells[i].as_ref())
    }

    pub fn value(&self, state: usize, turbine: usize, var: Variable, flow: Flow) -> ResultsResult<f64> {
        let i = self.index(state, turbine)?;
        self.cells[i]
            .as_ref()
            .map(|c| c.flow(flow).get(var))
            .ok_or(ResultsError::Incomplete { state, turbine })
    }

    pub fn is_state_complete(&self, state: usize) -> bool {
        let n = self.n_turbines();
        state < self.n_states() && self.cells[state * n..(state + 1) * n].iter().all(Option::is_some)
    }

    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// First unwritten cell in state-major order.
    pub fn first_missing(&self) -> Option<(usize, usize)> {
        let n = self.n_turbines().max(1);
        self.cells.iter().position(Option::is_none).map(|i| (i / n, i % n))
    }
}

/// A state the engine could not compute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailedState {
    pub state: usize,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub farm_id: String,
    pub timestamp: String,
    pub engine_version: String,
    pub n_states: usize,
    pub n_turbines: usize,
    #[serde(default)]
    pub elapsed_s: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_states: Vec<FailedState>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl RunManifest {
    /// A manifest stamped with the current UTC time.
    pub fn new(run_id: RunId, farm_id: &str, engine_version: &str, results: &FarmResults) -> Self {
        Self {
            run_id,
            farm_id: farm_id.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            engine_version: engine_version.to_string(),
            n_states: results.n_states(),
            n_turbines: results.n_turbines(),
            elapsed_s: 0.0,
            failed_states: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(ws: f64) -> EffectiveState {
        EffectiveState {
            ambient: VarMap::inflow(8.0, 0.06, 1.225),
            waked: VarMap::inflow(ws, 0.08, 1.225),
            order_index: 0,
        }
    }

    fn record() -> StateRecord {
        StateRecord {
            wd_deg: 270.0,
            ws: 8.0,
            ti: 0.06,
            rho: 1.225,
            weight: 0.5,
        }
    }

    #[test]
    fn write_once() {
        let mut r = FarmResults::new(vec!["a".into(), "b".into()], vec![record(), record()]);
        r.set(1, 0, cell(7.0)).unwrap();
        assert!(matches!(
            r.set(1, 0, cell(6.0)),
            Err(ResultsError::CellAlreadyWritten { state: 1, turbine: 0 })
        ));
        assert_eq!(r.value(1, 0, Variable::WindSpeed, Flow::Waked).unwrap(), 7.0);
        assert_eq!(r.value(1, 0, Variable::WindSpeed, Flow::Ambient).unwrap(), 8.0);
    }

    #[test]
    fn out_of_range_and_missing() {
        let mut r = FarmResults::new(vec!["a".into()], vec![record()]);
        assert!(matches!(r.set(0, 1, cell(7.0)), Err(ResultsError::IndexOutOfRange { .. })));
        assert!(r.get(3, 0).is_none());
        assert!(matches!(
            r.value(0, 0, Variable::Power, Flow::Waked),
            Err(ResultsError::Incomplete { .. })
        ));
        assert_eq!(r.first_missing(), Some((0, 0)));
    }

    #[test]
    fn completeness() {
        let mut r = FarmResults::new(vec!["a".into(), "b".into()], vec![record(), record()]);
        r.set(0, 0, cell(7.0)).unwrap();
        r.set(0, 1, cell(7.0)).unwrap();
        assert!(r.is_state_complete(0));
        assert!(!r.is_state_complete(1));
        assert!(!r.is_complete());
        assert_eq!(r.first_missing(), Some((1, 0)));
        r.set(1, 1, cell(7.0)).unwrap();
        r.set(1, 0, cell(7.0)).unwrap();
        assert!(r.is_complete());
        assert_eq!(r.weight_sum(), 1.0);
    }
}
