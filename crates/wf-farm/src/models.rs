//! Pluggable per-turbine models, run on the rotor-effective inflow before
//! the turbine type's power/ct curve.

use std::fmt::Debug;

use wf_core::{ModelError, ModelResult, VarMap, Variable};

use crate::layout::Turbine;

/// A model attached to a turbine that derives extra variables from its inflow.
///
/// Models run in attachment order. They see the rotor-effective inflow
/// (`WS`, `TI`, `RHO`) in `vars`, the unwaked rotor state in `ambient`, and
/// may write any variable they declare in [`TurbineModel::output_vars`].
pub trait TurbineModel: Send + Sync + Debug {
    /// Registry name of the model.
    fn name(&self) -> &str;

    /// Variables written by this model.
    fn output_vars(&self) -> &'static [Variable];

    /// Update `vars` in place for `turbine`.
    fn calculate(&self, turbine: &Turbine, ambient: &VarMap, vars: &mut VarMap) -> ModelResult<()>;
}

/// Which turbulence intensity drives a `kTI` model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum KSource {
    /// The rotor-effective (waked) TI.
    #[default]
    Waked,
    /// The ambient TI of the state, before any wake effects.
    Ambient,
}

/// Wake growth from turbulence intensity: `k = k_ti * TI + k_b`.
#[derive(Clone, Debug, PartialEq)]
pub struct KTi {
    pub k_ti: f64,
    pub k_b: f64,
    pub source: KSource,
    name: &'static str,
}

impl KTi {
    pub fn new(k_ti: f64, k_b: f64, source: KSource) -> ModelResult<Self> {
        let name = match source {
            KSource::Waked => "kTI",
            KSource::Ambient => "kTI_amb",
        };
        if !k_ti.is_finite() || k_ti < 0.0 {
            return Err(ModelError::invalid_param(name, "k_ti", "must be finite and non-negative"));
        }
        if !k_b.is_finite() || k_b < 0.0 {
            return Err(ModelError::invalid_param(name, "k_b", "must be finite and non-negative"));
        }
        Ok(Self {
            k_ti,
            k_b,
            source,
            name,
        })
    }

    /// Growth coefficient for a given turbulence intensity.
    pub fn k_for(&self, ti: f64) -> f64 {
        self.k_ti * ti + self.k_b
    }
}

impl TurbineModel for KTi {
    fn name(&self) -> &str {
        self.name
    }

    fn output_vars(&self) -> &'static [Variable] {
        &[Variable::WakeGrowth]
    }

    fn calculate(&self, _turbine: &Turbine, ambient: &VarMap, vars: &mut VarMap) -> ModelResult<()> {
        let ti = match self.source {
            KSource::Waked => vars[Variable::TurbulenceIntensity],
            KSource::Ambient => ambient[Variable::TurbulenceIntensity],
        };
        if !ti.is_finite() {
            return Err(ModelError::unrecoverable(self.name, "non-finite turbulence intensity"));
        }
        vars[Variable::WakeGrowth] = self.k_for(ti);
        Ok(())
    }
}

/// A constant wake growth coefficient.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedK {
    pub k: f64,
}

impl FixedK {
    pub fn new(k: f64) -> ModelResult<Self> {
        if !k.is_finite() || k < 0.0 {
            return Err(ModelError::invalid_param("kFixed", "k", "must be finite and non-negative"));
        }
        Ok(Self { k })
    }
}

impl TurbineModel for FixedK {
    fn name(&self) -> &str {
        "kFixed"
    }

    fn output_vars(&self) -> &'static [Variable] {
        &[Variable::WakeGrowth]
    }

    fn calculate(&self, _turbine: &Turbine, _ambient: &VarMap, vars: &mut VarMap) -> ModelResult<()> {
        vars[Variable::WakeGrowth] = self.k;
        Ok(())
    }
}
