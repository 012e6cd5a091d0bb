//! Jensen (Park) top-hat velocity deficit.

use wf_core::{ModelResult, Variable};
use wf_farm::WakeOffset;

use crate::common::{growth, saturate_ct};
use crate::traits::{EmitterState, ScaleSpeed, TopHatProfile, WakeModel};

/// Top-hat wind speed deficit with a linearly expanding wake radius
/// `r_w = D/2 + k x`:
///
/// `delta = -s (1 - sqrt(1 - ct)) (D / (2 r_w))²` for `r < r_w`, zero outside.
#[derive(Clone, Debug, PartialEq)]
pub struct Jensen {
    /// Fixed wake growth; `None` reads the emitter's `K`.
    pub k: Option<f64>,
    pub scale: ScaleSpeed,
}

impl Jensen {
    pub fn new(k: Option<f64>, scale: ScaleSpeed) -> Self {
        Self { k, scale }
    }

    fn profile(&self, e: &EmitterState, x: f64) -> ModelResult<Option<TopHatProfile>> {
        let ct = saturate_ct(e.ct);
        if x <= 0.0 || ct <= 0.0 {
            return Ok(None);
        }
        let k = growth(self.name(), self.k, e)?;
        let radius = 0.5 * e.diameter + k * x;
        let ratio = 0.5 * e.diameter / radius;
        let centre_delta = -self.scale.of(e) * (1.0 - (1.0 - ct).sqrt()) * ratio * ratio;
        Ok(Some(TopHatProfile {
            radius,
            centre_delta,
        }))
    }
}

impl WakeModel for Jensen {
    fn name(&self) -> &str {
        "Jensen"
    }

    fn variable(&self) -> Variable {
        Variable::WindSpeed
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

#[cfg(test)]
mod tests {
    use super::*;

    fn emitter() -> EmitterState {
        EmitterState {
            diameter: 100.0,
            ws: 8.0,
            amb_ws: 9.0,
            ti: 0.05,
            amb_ti: 0.05,
            ct: 0.75,
            k: 0.05,
        }
    }

    fn at(x: f64, y: f64) -> WakeOffset {
        WakeOffset { x, y, z: 0.0 }
    }

    #[test]
    fn closed_form_on_centreline() {
        let m = Jensen::new(Some(0.025), ScaleSpeed::Waked);
        let d = m.evaluate(&emitter(), &at(500.0, 0.0)).unwrap();
        // r_w = 50 + 12.5 = 62.5; (50/62.5)² = 0.64; 1 - sqrt(0.25) = 0.5
        assert!((d - (-8.0 * 0.5 * 0.64)).abs() < 1e-12);
    }

    #[test]
    fn zero_outside_and_upstream() {
        let m = Jensen::new(Some(0.025), ScaleSpeed::Waked);
        assert_eq!(m.evaluate(&emitter(), &at(500.0, 62.5)).unwrap(), 0.0);
        assert_eq!(m.evaluate(&emitter(), &at(0.0, 0.0)).unwrap(), 0.0);
        assert_eq!(m.evaluate(&emitter(), &at(-300.0, 0.0)).unwrap(), 0.0);
    }

    #[test]
    fn reads_emitter_k_and_ambient_scale() {
        let m = Jensen::new(None, ScaleSpeed::Ambient);
        assert!(m.needs_k());
        let p = m.top_hat(&emitter(), 1000.0).unwrap().unwrap();
        assert!((p.radius - 100.0).abs() < 1e-12);
        assert!((p.centre_delta - (-9.0 * 0.5 * 0.25)).abs() < 1e-12);
    }

    #[test]
    fn vanishes_far_downstream() {
        let m = Jensen::new(Some(0.05), ScaleSpeed::Waked);
        let d = m.evaluate(&emitter(), &at(1.0e7, 0.0)).unwrap();
        assert!(d.abs() < 1e-6);
    }
}
