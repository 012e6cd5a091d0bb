//! Bastankhah & Porté-Agel (2014) Gaussian velocity deficit.

use wf_core::{ModelResult, Variable};
use wf_farm::WakeOffset;

use crate::common::{growth, saturate_ct};
use crate::induction::Induction;
use crate::traits::{EmitterState, ScaleSpeed, WakeModel};

/// Gaussian wind speed deficit.
///
/// ```text
/// beta   = (1 - a) / (1 - 2a)
/// sigma  = k x + sbeta_factor * sqrt(beta) * D
/// ct_eff = min(ct / (8 (sigma / D)²), 1)
/// ampl   = max(-2 a(ct_eff), -1)
/// delta  = s * ampl * exp(-r² / (2 sigma²))
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Bastankhah2014 {
    pub k: Option<f64>,
    pub sbeta_factor: f64,
    pub induction: Induction,
    pub scale: ScaleSpeed,
}

impl Default for Bastankhah2014 {
    fn default() -> Self {
        Self {
            k: None,
            sbeta_factor: 0.2,
            induction: Induction::Madsen,
            scale: ScaleSpeed::Waked,
        }
    }
}

impl Bastankhah2014 {
    /// Amplitude and width of the wake at downwind distance `x > 0`.
    pub fn amplitude_sigma(&self, e: &EmitterState, x: f64) -> ModelResult<(f64, f64)> {
        let ct = saturate_ct(e.ct);
        let k = growth(self.name(), self.k, e)?;
        let a = self.induction.ct2a(ct);
        let beta = (1.0 - a) / (1.0 - 2.0 * a).max(f64::EPSILON);
        let sigma = k * x + self.sbeta_factor * beta.sqrt() * e.diameter;
        let s_d = sigma / e.diameter;
        let ct_eff = (ct / (8.0 * s_d * s_d)).min(1.0);
        let ampl = (-2.0 * self.induction.ct2a(ct_eff)).max(-1.0);
        Ok((ampl, sigma))
    }
}

impl WakeModel for Bastankhah2014 {
    fn name(&self) -> &str {
        match self.induction {
            Induction::Madsen => "Bastankhah2014",
            Induction::Betz => "Bastankhah2014_Betz",
        }
    }

    fn variable(&self) -> Variable {
        Variable::WindSpeed
    }

    fn needs_k(&self) -> bool {
        self.k.is_none()
    }

    fn evaluate(&self, emitter: &EmitterState, offset: &WakeOffset) -> ModelResult<f64> {
        if offset.x <= 0.0 || saturate_ct(emitter.ct) <= 0.0 {
            return Ok(0.0);
        }
        let (ampl, sigma) = self.amplitude_sigma(emitter, offset.x)?;
        let r = offset.radial();
        Ok(self.scale.of(emitter) * ampl * (-0.5 * (r / sigma).powi(2)).exp())
    }
}
