//! Atmospheric states: the discretised wind rose a farm is evaluated under.

use wf_core::units::{Density, Velocity};
use wf_core::{
    StateId, Tolerances, WfError, ensure_finite, ensure_in_range, ensure_positive, nearly_equal,
    wrap_degrees,
};

use crate::error::{FarmError, FarmResult};

/// One atmospheric condition with its statistical weight.
#[derive(Clone, Debug, PartialEq)]
pub struct AtmosphericState {
    pub id: StateId,
    /// Direction the wind blows from, degrees clockwise from north, in `[0, 360)`.
    pub wd_deg: f64,
    /// Wind speed at hub reference height (m/s).
    pub ws: f64,
    /// Ambient turbulence intensity (-).
    pub ti: f64,
    /// Air density (kg/m³).
    pub rho: f64,
    /// Statistical weight (frequency) of this state.
    pub weight: f64,
}

/// Vertical profile of the ambient wind speed.
///
/// `Uniform` makes every rotor point see the state's wind speed. `PowerLaw`
/// scales it with `(z / reference_height)^alpha`.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum WindProfile {
    #[default]
    Uniform,
    PowerLaw { alpha: f64, reference_height: f64 },
}

impl WindProfile {
    /// Ambient wind speed at height `z` above ground for a state with speed `ws`.
    pub fn speed_at(&self, ws: f64, z: f64) -> f64 {
        match *self {
            WindProfile::Uniform => ws,
            WindProfile::PowerLaw {
                alpha,
                reference_height,
            } => {
                if z <= 0.0 {
                    0.0
                } else {
                    ws * (z / reference_height).powf(alpha)
                }
            }
        }
    }

    fn validate(&self) -> FarmResult<()> {
        if let WindProfile::PowerLaw {
            alpha,
            reference_height,
        } = *self
        {
            if !alpha.is_finite() || !(reference_height.is_finite() && reference_height > 0.0) {
                return Err(FarmError::InvalidState {
                    index: 0,
                    what: "power-law profile needs finite alpha and positive reference height"
                        .to_string(),
                });
            }
        }
        Ok(())
    }
}

/// An ordered collection of atmospheric states.
///
/// The weights are not assumed to sum to any particular value; the sum is
/// exposed through [`StateSet::weight_sum`] and checked against an expected
/// normalisation only when one is requested.
#[derive(Clone, Debug, PartialEq)]
pub struct StateSet {
    states: Vec<AtmosphericState>,
    profile: WindProfile,
}

impl StateSet {
    /// Build from `(wd_deg, ws, ti, rho, weight)` records.
    pub fn from_records(records: &[(f64, f64, f64, f64, f64)]) -> Self {
        let states = records
            .iter()
            .enumerate()
            .map(|(i, &(wd, ws, ti, rho, weight))| AtmosphericState {
                id: StateId::from_usize(i),
                wd_deg: wrap_degrees(wd),
                ws,
                ti,
                rho,
                weight,
            })
            .collect();
        Self {
            states,
            profile: WindProfile::Uniform,
        }
    }

    /// A single state with weight 1.
    pub fn single(wd_deg: f64, ws: Velocity, ti: f64, rho: Density) -> Self {
        Self::from_records(&[(wd_deg, ws.value, ti, rho.value, 1.0)])
    }

    /// Cartesian product of directions and speeds, uniformly weighted to sum to 1.
    pub fn wind_rose_scan(wds: &[f64], wss: &[f64], ti: f64, rho: f64) -> Self {
        let n = wds.len() * wss.len();
        let weight = if n > 0 { 1.0 / n as f64 } else { 0.0 };
        let records: Vec<_> = wds
            .iter()
            .flat_map(|&wd| wss.iter().map(move |&ws| (wd, ws, ti, rho, weight)))
            .collect();
        Self::from_records(&records)
    }

    pub fn with_profile(mut self, profile: WindProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn profile(&self) -> WindProfile {
        self.profile
    }

    pub fn states(&self) -> &[AtmosphericState] {
        &self.states
    }

    pub fn get(&self, index: usize) -> Option<&AtmosphericState> {
        self.states.get(index)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Sum of all state weights, for downstream normalisation.
    pub fn weight_sum(&self) -> f64 {
        self.states.iter().map(|s| s.weight).sum()
    }

    /// Check each record and, if `expected_sum` is given, the weight normalisation.
    pub fn validate(&self, expected_sum: Option<f64>, tolerance: f64) -> FarmResult<()> {
        if self.states.is_empty() {
            return Err(FarmError::EmptyStates);
        }
        self.profile.validate()?;

        for (index, s) in self.states.iter().enumerate() {
            let invalid = |e: WfError| FarmError::InvalidState {
                index,
                what: e.to_string(),
            };
            ensure_finite(s.wd_deg, "wind direction").map_err(invalid)?;
            ensure_positive(s.ws, "wind speed").map_err(invalid)?;
            ensure_in_range(s.ti, 0.0, 1.0, "turbulence intensity").map_err(invalid)?;
            ensure_positive(s.rho, "air density").map_err(invalid)?;
            ensure_in_range(s.weight, 0.0, f64::MAX, "weight").map_err(invalid)?;
        }

        if let Some(expected) = expected_sum {
            let sum = self.weight_sum();
            let tol = Tolerances {
                abs: tolerance,
                rel: 0.0,
            };
            if !nearly_equal(sum, expected, tol) {
                return Err(FarmError::WeightSum {
                    sum,
                    expected,
                    tolerance,
                });
            }
        }
        Ok(())
    }
}
