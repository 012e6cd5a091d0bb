//! Shared helpers for wake model evaluation.

use std::f64::consts::PI;

use wf_core::{ModelError, ModelResult};

use crate::traits::EmitterState;

/// Resolve the wake growth coefficient: the fixed parameter if given, else
/// the emitter's `K`.
pub fn growth(model: &str, fixed: Option<f64>, emitter: &EmitterState) -> ModelResult<f64> {
    let k = fixed.unwrap_or(emitter.k);
    if !(k.is_finite() && k >= 0.0) {
        return Err(ModelError::unrecoverable(
            model,
            format!("wake growth coefficient {k} is not a finite non-negative number"),
        ));
    }
    Ok(k)
}

/// Thrust coefficient saturated to `[0, 1]`.
pub fn saturate_ct(ct: f64) -> f64 {
    if ct.is_nan() { 0.0 } else { ct.clamp(0.0, 1.0) }
}

/// Area of the intersection of two circles with radii `r1`, `r2` whose
/// centres are `d` apart.
pub fn circle_overlap(r1: f64, r2: f64, d: f64) -> f64 {
    if r1 <= 0.0 || r2 <= 0.0 || d >= r1 + r2 {
        return 0.0;
    }
    if d <= (r1 - r2).abs() {
        let r = r1.min(r2);
        return PI * r * r;
    }
    let c1 = ((d * d + r1 * r1 - r2 * r2) / (2.0 * d * r1)).clamp(-1.0, 1.0);
    let c2 = ((d * d + r2 * r2 - r1 * r1) / (2.0 * d * r2)).clamp(-1.0, 1.0);
    let k = (-d + r1 + r2) * (d + r1 - r2) * (d - r1 + r2) * (d + r1 + r2);
    r1 * r1 * c1.acos() + r2 * r2 * c2.acos() - 0.5 * k.max(0.0).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_limits() {
        assert_eq!(circle_overlap(1.0, 1.0, 2.0), 0.0);
        assert_eq!(circle_overlap(1.0, 1.0, 3.0), 0.0);
        assert!((circle_overlap(1.0, 2.0, 0.5) - PI).abs() < 1e-12);
        assert!((circle_overlap(2.0, 1.0, 0.0) - PI).abs() < 1e-12);
    }

    #[test]
    fn overlap_is_continuous_at_tangency() {
        let inner = circle_overlap(1.0, 2.0, 1.0 - 1e-9);
        let just_out = circle_overlap(1.0, 2.0, 1.0 + 1e-9);
        assert!((inner - just_out).abs() < 1e-6);

        let outer = circle_overlap(1.0, 2.0, 3.0 - 1e-9);
        assert!(outer < 1e-6);
    }

    #[test]
    fn equal_circles_half_distance() {
        // Lens of two unit circles at distance 1: 2π/3 - √3/2
        let expected = 2.0 * PI / 3.0 - 3.0_f64.sqrt() / 2.0;
        assert!((circle_overlap(1.0, 1.0, 1.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn growth_prefers_fixed_parameter() {
        let e = EmitterState {
            diameter: 100.0,
            ws: 8.0,
            amb_ws: 8.0,
            ti: 0.05,
            amb_ti: 0.05,
            ct: 0.8,
            k: 0.04,
        };
        assert_eq!(growth("m", Some(0.02), &e).unwrap(), 0.02);
        assert_eq!(growth("m", None, &e).unwrap(), 0.04);
        let bad = EmitterState { k: f64::NAN, ..e };
        assert!(growth("m", None, &bad).is_err());
    }

    #[test]
    fn ct_saturation() {
        assert_eq!(saturate_ct(1.3), 1.0);
        assert_eq!(saturate_ct(-0.1), 0.0);
        assert_eq!(saturate_ct(f64::NAN), 0.0);
        assert_eq!(saturate_ct(0.7), 0.7);
    }
}
