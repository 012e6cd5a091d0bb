//! Query helpers for loaded runs.

use std::fmt::Write as _;

use wf_core::Variable;
use wf_results::{FarmResults, FarmResultsEval, Flow, Reduction};
use wf_wakes::{ModelBook, ModelInfo, ModelKind};

use crate::error::{AppError, AppResult};

/// Farm-level figures of a run. Aggregates are `None` when some state
/// failed, since averages over a partial table are not reported.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub n_states: usize,
    pub n_turbines: usize,
    pub weight_sum: f64,
    pub complete: bool,
    pub ambient_power_w: Option<f64>,
    pub waked_power_w: Option<f64>,
    pub farm_efficiency: Option<f64>,
    pub annual_yield_gwh: Option<f64>,
}

/// Per-turbine figures of a complete run.
#[derive(Debug, Clone)]
pub struct TurbineSummary {
    pub name: String,
    pub mean_ws: f64,
    pub mean_power_w: f64,
    pub efficiency: Option<f64>,
}

pub fn get_run_summary(results: &FarmResults) -> AppResult<RunSummary> {
    if results.n_states() == 0 || results.n_turbines() == 0 {
        return Err(AppError::InvalidInput("No states in run".to_string()));
    }
    let eval = FarmResultsEval::new(results);
    let complete = results.is_complete();
    let mut summary = RunSummary {
        n_states: results.n_states(),
        n_turbines: results.n_turbines(),
        weight_sum: eval.weight_sum(),
        complete,
        ambient_power_w: None,
        waked_power_w: None,
        farm_efficiency: None,
        annual_yield_gwh: None,
    };
    if complete {
        summary.ambient_power_w = Some(eval.mean_farm_power(Flow::Ambient)?);
        summary.waked_power_w = Some(eval.mean_farm_power(Flow::Waked)?);
        // Zero ambient power (all states outside the curve) has no efficiency
        summary.farm_efficiency = eval.farm_efficiency().ok();
        summary.annual_yield_gwh = Some(eval.annual_farm_yield(Flow::Waked)?);
    }
    Ok(summary)
}

/// Weighted per-turbine means of a complete run.
pub fn turbine_summaries(results: &FarmResults) -> AppResult<Vec<TurbineSummary>> {
    let eval = FarmResultsEval::new(results);
    let ws = eval.reduce_states(Variable::WindSpeed, Flow::Waked, Reduction::WeightedMean)?;
    let power = eval.reduce_states(Variable::Power, Flow::Waked, Reduction::WeightedMean)?;
    let efficiency = eval.turbine_efficiency()?;
    Ok(results
        .turbine_names()
        .iter()
        .enumerate()
        .map(|(t, name)| TurbineSummary {
            name: name.clone(),
            mean_ws: ws[t],
            mean_power_w: power[t],
            efficiency: efficiency[t],
        })
        .collect())
}

/// One CSV row per computed `(state, turbine)` cell, ambient and waked
/// values side by side. Cells of failed states are left out.
pub fn export_csv(results: &FarmResults) -> String {
    let mut csv = String::from("state,wd_deg,weight,turbine,order_index");
    for var in Variable::ALL {
        let _ = write!(csv, ",{var}_amb,{var}");
    }
    csv.push('\n');

    for (s, record) in results.states().iter().enumerate() {
        for (t, name) in results.turbine_names().iter().enumerate() {
            let Some(cell) = results.get(s, t) else {
                continue;
            };
            let _ = write!(
                csv,
                "{s},{},{},{name},{}",
                record.wd_deg, record.weight, cell.order_index
            );
            for var in Variable::ALL {
                let _ = write!(csv, ",{},{}", cell.ambient[var], cell.waked[var]);
            }
            csv.push('\n');
        }
    }
    csv
}

/// Registry contents, grouped by kind.
pub fn describe_models() -> Vec<(ModelKind, Vec<ModelInfo>)> {
    let book = ModelBook::new();
    ModelKind::ALL
        .iter()
        .map(|&kind| (kind, book.describe(kind)))
        .collect()
}
