//! Wake superposition: combining per-emitter deltas at one receiver.

use wf_core::Variable;

/// How deltas from several emitters are combined.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CombinationLaw {
    /// Sum of deltas.
    Linear,
    /// Root of the sum of squares, signed like the linear sum.
    Quadratic,
    /// The single delta of largest magnitude.
    Max,
}

/// How the combined delta is applied to the ambient value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyRule {
    /// `waked = ambient + delta`
    Add,
    /// `waked = sqrt(ambient² + delta |delta|)`, used for turbulence intensity.
    Quadratic,
}

/// Result of applying a superposition, before and after clamping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Applied {
    pub value: f64,
    /// The unclamped value when clamping changed it.
    pub clamped_from: Option<f64>,
}

/// A superposition for one variable.
#[derive(Clone, Debug, PartialEq)]
pub struct Superposition {
    name: String,
    pub variable: Variable,
    pub law: CombinationLaw,
    pub apply: ApplyRule,
}

impl Superposition {
    pub fn new(variable: Variable, law: CombinationLaw, apply: ApplyRule) -> Self {
        let prefix = variable.short_name().to_ascii_lowercase();
        let law_name = match law {
            CombinationLaw::Linear => "linear",
            CombinationLaw::Quadratic => "quadratic",
            CombinationLaw::Max => "max",
        };
        Self {
            name: format!("{prefix}_{law_name}"),
            variable,
            law,
            apply,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Combine `deltas` into one net delta. An empty slice gives zero.
    ///
    /// The deltas are sorted before reduction, so the result is bit-identical
    /// for every permutation of the input.
    pub fn combine(&self, deltas: &[f64]) -> f64 {
        if deltas.is_empty() {
            return 0.0;
        }
        let mut sorted = deltas.to_vec();
        sorted.sort_by(f64::total_cmp);

        match self.law {
            CombinationLaw::Linear => sorted.iter().sum(),
            CombinationLaw::Quadratic => {
                let sum: f64 = sorted.iter().sum();
                let norm = sorted.iter().map(|d| d * d).sum::<f64>().sqrt();
                if sum < 0.0 { -norm } else { norm }
            }
            CombinationLaw::Max => sorted
                .iter()
                .copied()
                .max_by(|a, b| a.abs().total_cmp(&b.abs()).then(a.total_cmp(b)))
                .unwrap_or(0.0),
        }
    }

    /// Apply a net delta to `ambient`, clamping to the variable's physical range.
    pub fn apply(&self, ambient: f64, net: f64) -> Applied {
        let raw = match self.apply {
            ApplyRule::Add => ambient + net,
            ApplyRule::Quadratic => (ambient * ambient + net * net.abs()).max(0.0).sqrt(),
        };
        let (lo, hi) = bounds(self.variable);
        let value = raw.clamp(lo, hi);
        Applied {
            value,
            clamped_from: (value != raw).then_some(raw),
        }
    }

    /// `apply(ambient, combine(deltas))`.
    pub fn superpose(&self, ambient: f64, deltas: &[f64]) -> Applied {
        self.apply(ambient, self.combine(deltas))
    }
}

/// Physically plausible range of a waked variable.
pub fn bounds(variable: Variable) -> (f64, f64) {
    match variable {
        Variable::WindSpeed => (0.0, f64::INFINITY),
        Variable::TurbulenceIntensity => (0.0, 1.0),
        _ => (f64::NEG_INFINITY, f64::INFINITY),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ws(law: CombinationLaw) -> Superposition {
        Superposition::new(Variable::WindSpeed, law, ApplyRule::Add)
    }

    #[test]
    fn names() {
        assert_eq!(ws(CombinationLaw::Linear).name(), "ws_linear");
        let ti = Superposition::new(
            Variable::TurbulenceIntensity,
            CombinationLaw::Quadratic,
            ApplyRule::Quadratic,
        );
        assert_eq!(ti.name(), "ti_quadratic");
    }

    #[test]
    fn empty_is_identity() {
        for law in [CombinationLaw::Linear, CombinationLaw::Quadratic, CombinationLaw::Max] {
            let s = ws(law);
            assert_eq!(s.combine(&[]), 0.0);
            assert_eq!(s.superpose(8.0, &[]).value, 8.0);
        }
    }

    #[test]
    fn laws() {
        let d = [-1.0, -2.0, -2.0];
        assert_eq!(ws(CombinationLaw::Linear).combine(&d), -5.0);
        assert_eq!(ws(CombinationLaw::Quadratic).combine(&d), -3.0);
        assert_eq!(ws(CombinationLaw::Max).combine(&d), -2.0);
        assert_eq!(ws(CombinationLaw::Max).combine(&[0.5, -0.7, 0.6]), -0.7);
    }

    #[test]
    fn ws_clamped_at_zero() {
        let a = ws(CombinationLaw::Linear).superpose(3.0, &[-2.0, -2.5]);
        assert_eq!(a.value, 0.0);
        assert_eq!(a.clamped_from, Some(-1.5));
    }

    #[test]
    fn ti_quadratic_application() {
        let s = Superposition::new(
            Variable::TurbulenceIntensity,
            CombinationLaw::Quadratic,
            ApplyRule::Quadratic,
        );
        let a = s.superpose(0.06, &[0.08]);
        assert!((a.value - 0.1).abs() < 1e-12);
        assert!(a.clamped_from.is_none());
        assert_eq!(s.superpose(0.5, &[1.0]).value, 1.0);
    }
}
