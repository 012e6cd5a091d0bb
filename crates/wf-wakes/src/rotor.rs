//! Rotor sampling models.

use crate::traits::{RotorModel, RotorPoint};

/// Single point at the hub with weight one.
#[derive(Clone, Debug, PartialEq)]
pub struct CentreRotor {
    points: [RotorPoint; 1],
}

impl Default for CentreRotor {
    fn default() -> Self {
        Self {
            points: [RotorPoint {
                y: 0.0,
                z: 0.0,
                weight: 1.0,
            }],
        }
    }
}

impl CentreRotor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RotorModel for CentreRotor {
    fn name(&self) -> &str {
        "centre"
    }

    fn points(&self) -> &[RotorPoint] {
        &self.points
    }

    fn reduce(&self, values: &[f64]) -> f64 {
        values.first().copied().unwrap_or(0.0)
    }
}

/// Cell centres of an `n x n` grid over the rotor's bounding square, keeping
/// those inside the disk. All kept points carry the same weight.
#[derive(Clone, Debug, PartialEq)]
pub struct GridRotor {
    n: usize,
    points: Vec<RotorPoint>,
}

impl GridRotor {
    /// `n` is clamped to at least one cell per side.
    pub fn new(n: usize) -> Self {
        let n = n.max(1);
        let step = 2.0 / n as f64;
        let mut points = Vec::with_capacity(n * n);
        for i in 0..n {
            let y = -1.0 + (i as f64 + 0.5) * step;
            for j in 0..n {
                let z = -1.0 + (j as f64 + 0.5) * step;
                if y * y + z * z <= 1.0 {
                    points.push(RotorPoint { y, z, weight: 0.0 });
                }
            }
        }
        let w = 1.0 / points.len() as f64;
        for p in &mut points {
            p.weight = w;
        }
        Self { n, points }
    }

    pub fn n(&self) -> usize {
        self.n
    }
}

impl RotorModel for GridRotor {
    fn name(&self) -> &str {
        "grid"
    }

    fn points(&self) -> &[RotorPoint] {
        &self.points
    }
}
