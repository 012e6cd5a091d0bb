//! Axial induction as a function of thrust coefficient.

use crate::common::saturate_ct;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Induction {
    /// Momentum theory: `a = (1 - sqrt(1 - ct)) / 2`.
    Betz,
    /// Polynomial fit `a = 0.0883 ct³ + 0.0586 ct² + 0.246 ct`.
    #[default]
    Madsen,
}

impl Induction {
    pub fn ct2a(self, ct: f64) -> f64 {
        let ct = saturate_ct(ct);
        match self {
            Induction::Betz => 0.5 * (1.0 - (1.0 - ct).sqrt()),
            Induction::Madsen => ((0.0883 * ct + 0.0586) * ct + 0.246) * ct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_thrust_no_induction() {
        assert_eq!(Induction::Betz.ct2a(0.0), 0.0);
        assert_eq!(Induction::Madsen.ct2a(0.0), 0.0);
    }

    #[test]
    fn betz_limit() {
        assert!((Induction::Betz.ct2a(1.0) - 0.5).abs() < 1e-15);
        // ct = 8/9 gives a = 1/3
        assert!((Induction::Betz.ct2a(8.0 / 9.0) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn madsen_close_to_betz_at_moderate_thrust() {
        let a_b = Induction::Betz.ct2a(0.6);
        let a_m = Induction::Madsen.ct2a(0.6);
        assert!((a_b - a_m).abs() < 0.02);
    }
}
