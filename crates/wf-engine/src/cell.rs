//! Per-state lifecycle of (turbine, state) cells.

use wf_core::TurbineId;

use crate::error::{EngineError, EngineResult};

/// Lifecycle phase of one (turbine, state) cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellPhase {
    Pending,
    Computing,
    Done,
}

/// Tracks the phases of all turbines within one atmospheric state.
///
/// A cell may start computing only when every emitter that reaches it is
/// done, and a done cell never changes again.
#[derive(Debug, Clone)]
pub struct StateCells {
    phases: Vec<CellPhase>,
}

impl StateCells {
    pub fn new(n_turbines: usize) -> Self {
        Self {
            phases: vec![CellPhase::Pending; n_turbines],
        }
    }

    pub fn phase(&self, id: TurbineId) -> Option<CellPhase> {
        self.phases.get(id.idx()).copied()
    }

    fn slot(&mut self, id: TurbineId) -> EngineResult<&mut CellPhase> {
        let len = self.phases.len();
        self.phases.get_mut(id.idx()).ok_or_else(|| EngineError::Invariant {
            what: format!("turbine {id} out of range for {len} cells"),
        })
    }

    /// `Pending -> Computing`, provided all `upstream` cells are done.
    pub fn begin(&mut self, id: TurbineId, upstream: &[TurbineId]) -> EngineResult<()> {
        if let Some(&up) = upstream
            .iter()
            .find(|&&u| self.phase(u) != Some(CellPhase::Done))
        {
            return Err(EngineError::Invariant {
                what: format!("turbine {id} started before its upstream emitter {up} was done"),
            });
        }
        let slot = self.slot(id)?;
        if *slot != CellPhase::Pending {
            return Err(EngineError::Invariant {
                what: format!("turbine {id} started twice"),
            });
        }
        *slot = CellPhase::Computing;
        Ok(())
    }

    /// `Computing -> Done`.
    pub fn finish(&mut self, id: TurbineId) -> EngineResult<()> {
        let slot = self.slot(id)?;
        if *slot != CellPhase::Computing {
            return Err(EngineError::Invariant {
                what: format!("turbine {id} finished without being started"),
            });
        }
        *slot = CellPhase::Done;
        Ok(())
    }

    pub fn all_done(&self) -> bool {
        self.phases.iter().all(|p| *p == CellPhase::Done)
    }
}
