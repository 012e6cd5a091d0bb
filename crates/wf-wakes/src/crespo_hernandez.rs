//! Crespo & Hernández top-hat turbulence intensity addition.

use wf_core::{ModelResult, Variable};
use wf_farm::WakeOffset;

use crate::common::{growth, saturate_ct};
use crate::induction::Induction;
use crate::traits::{EmitterState, TopHatProfile, WakeModel};

/// Added turbulence intensity inside a top-hat wake of radius `D/2 + k x`:
///
/// `delta = 0.73 a^0.8325 ti^0.0325 (max(x, x_nw) / D)^-0.32`
///
/// where `x_nw = near_wake_d * D` caps the near-wake singularity.
#[derive(Clone, Debug, PartialEq)]
pub struct CrespoHernandez {
    pub k: Option<f64>,
    /// Use the emitter's ambient TI instead of its waked TI.
    pub use_ambient_ti: bool,
    /// Near wake length in rotor diameters.
    pub near_wake_d: f64,
    pub induction: Induction,
}

impl Default for CrespoHernandez {
    fn default() -> Self {
        Self {
            k: None,
            use_ambient_ti: false,
            near_wake_d: 2.0,
            induction: Induction::Betz,
        }
    }
}

impl CrespoHernandez {
    fn profile(&self, e: &EmitterState, x: f64) -> ModelResult<Option<TopHatProfile>> {
        let ct = saturate_ct(e.ct);
        if x <= 0.0 || ct <= 0.0 {
            return Ok(None);
        }
        let k = growth(self.name(), self.k, e)?;
        let ti = if self.use_ambient_ti { e.amb_ti } else { e.ti };
        let a = self.induction.ct2a(ct);
        let x_eff = x.max(self.near_wake_d * e.diameter);
        let centre_delta =
            0.73 * a.powf(0.8325) * ti.max(0.0).powf(0.0325) * (x_eff / e.diameter).powf(-0.32);
        Ok(Some(TopHatProfile {
            radius: 0.5 * e.diameter + k * x,
            centre_delta,
        }))
    }
}

impl WakeModel for CrespoHernandez {
    fn name(&self) -> &str {
        "CrespoHernandez"
    }

    fn variable(&self) -> Variable {
        Variable::TurbulenceIntensity
    }

    fn needs_k(&self) -> bool {
        self.k.is_none()
    }

    fn evaluate(&self, emitter: &EmitterState, offset: &WakeOffset) -> ModelResult<f64> {
        Ok(match self.profile(emitter, offset.x)? {
            Some(p) if offset.radial() < p.radius => p.centre_delta,
            _ => 0.0,
        })
    }

    fn top_hat(&self, emitter: &EmitterState, x: f64) -> ModelResult<Option<TopHatProfile>> {
        self.profile(emitter, x)
    }

    fn is_top_hat(&self) -> bool {
        true
    }
}
