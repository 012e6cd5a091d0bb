//! Turbine types: rotor geometry plus a tabulated power/thrust curve.

use wf_core::units::{Length, constants::RHO_STD};
use wf_core::{ModelError, ModelResult, VarMap, Variable};

use crate::error::{FarmError, FarmResult};

/// Tabulated power and thrust coefficient against rotor-effective wind speed.
///
/// Values between table points are linearly interpolated. Outside
/// `[ws_min, ws_max]` the turbine is parked: power and thrust are zero.
#[derive(Clone, Debug, PartialEq)]
pub struct PowerCtCurve {
    ws: Vec<f64>,
    power: Vec<f64>,
    ct: Vec<f64>,
}

impl PowerCtCurve {
    /// Build from `(ws [m/s], power [W], ct [-])` points sorted by wind speed.
    pub fn new(points: Vec<(f64, f64, f64)>) -> FarmResult<Self> {
        if points.len() < 2 {
            return Err(FarmError::InvalidCurve {
                what: "at least two points are required",
            });
        }
        for &(ws, p, ct) in &points {
            if !(ws.is_finite() && p.is_finite() && ct.is_finite()) {
                return Err(FarmError::InvalidCurve {
                    what: "non-finite curve value",
                });
            }
            if ws < 0.0 || p < 0.0 || ct < 0.0 {
                return Err(FarmError::InvalidCurve {
                    what: "curve values must be non-negative",
                });
            }
        }
        if points.windows(2).any(|w| w[1].0 <= w[0].0) {
            return Err(FarmError::InvalidCurve {
                what: "wind speeds must be strictly increasing",
            });
        }

        let (ws, rest): (Vec<f64>, Vec<(f64, f64)>) =
            points.into_iter().map(|(w, p, c)| (w, (p, c))).unzip();
        let (power, ct) = rest.into_iter().unzip();
        Ok(Self { ws, power, ct })
    }

    pub fn ws_min(&self) -> f64 {
        self.ws[0]
    }

    pub fn ws_max(&self) -> f64 {
        self.ws[self.ws.len() - 1]
    }

    /// Rated (maximum tabulated) power in W.
    pub fn rated_power(&self) -> f64 {
        self.power.iter().copied().fold(0.0, f64::max)
    }

    /// Interpolated `(power, ct)` at wind speed `ws`.
    pub fn lookup(&self, ws: f64) -> (f64, f64) {
        if ws < self.ws_min() || ws > self.ws_max() {
            return (0.0, 0.0);
        }
        // partition_point gives the first table speed strictly above ws
        let hi = self.ws.partition_point(|&x| x <= ws).min(self.ws.len() - 1);
        let lo = hi.saturating_sub(1);
        if hi == lo || self.ws[hi] == self.ws[lo] {
            return (self.power[lo], self.ct[lo]);
        }
        let t = (ws - self.ws[lo]) / (self.ws[hi] - self.ws[lo]);
        (
            self.power[lo] + t * (self.power[hi] - self.power[lo]),
            self.ct[lo] + t * (self.ct[hi] - self.ct[lo]),
        )
    }
}

/// A turbine design: rotor diameter, hub height and performance curve.
#[derive(Clone, Debug, PartialEq)]
pub struct TurbineType {
    pub name: String,
    pub diameter: f64,
    pub hub_height: f64,
    pub curve: PowerCtCurve,
    /// Reference density of the curve. When set, power is scaled by `rho / rho_ref`.
    pub rho_ref: Option<f64>,
}

impl TurbineType {
    pub fn new(
        name: impl Into<String>,
        diameter: Length,
        hub_height: Length,
        curve: PowerCtCurve,
    ) -> FarmResult<Self> {
        let name = name.into();
        let invalid = |what: &str| FarmError::InvalidTurbineType {
            name: name.clone(),
            what: what.to_string(),
        };
        if !(diameter.value.is_finite() && diameter.value > 0.0) {
            return Err(invalid("rotor diameter must be positive"));
        }
        if !(hub_height.value.is_finite() && hub_height.value > 0.0) {
            return Err(invalid("hub height must be positive"));
        }
        Ok(Self {
            diameter: diameter.value,
            hub_height: hub_height.value,
            curve,
            rho_ref: None,
            name,
        })
    }

    /// Enable density correction of the power curve against `rho_ref`.
    pub fn with_density_correction(mut self, rho_ref: Option<f64>) -> FarmResult<Self> {
        if let Some(r) = rho_ref {
            if !(r.is_finite() && r > 0.0) {
                return Err(FarmError::InvalidTurbineType {
                    name: self.name.clone(),
                    what: "reference density must be positive".to_string(),
                });
            }
        }
        self.rho_ref = rho_ref;
        Ok(self)
    }

    pub fn rotor_area(&self) -> f64 {
        std::f64::consts::PI * 0.25 * self.diameter * self.diameter
    }

    /// Compute `P` and `CT` from the rotor-effective `WS` and `RHO` in `vars`.
    pub fn calculate(&self, vars: &mut VarMap) -> ModelResult<()> {
        let ws = vars[Variable::WindSpeed];
        let rho = vars[Variable::AirDensity];
        if !ws.is_finite() {
            return Err(ModelError::unrecoverable(
                &self.name,
                format!("non-finite rotor wind speed {ws}"),
            ));
        }
        if !(rho.is_finite() && rho > 0.0) {
            return Err(ModelError::unrecoverable(
                &self.name,
                format!("air density {rho} is not positive"),
            ));
        }

        let (mut power, ct) = self.curve.lookup(ws);
        if let Some(rho_ref) = self.rho_ref {
            power *= rho / rho_ref;
        }
        vars[Variable::Power] = power;
        vars[Variable::ThrustCoefficient] = ct;
        Ok(())
    }
}

impl Default for TurbineType {
    /// A generic 5 MW, 126 m class machine, handy in tests and demos.
    fn default() -> Self {
        let points = vec![
            (3.0, 40.5e3, 0.88),
            (4.0, 177.7e3, 0.82),
            (5.0, 403.9e3, 0.79),
            (6.0, 737.6e3, 0.79),
            (7.0, 1187.2e3, 0.79),
            (8.0, 1771.1e3, 0.79),
            (9.0, 2518.6e3, 0.79),
            (10.0, 3448.4e3, 0.79),
            (11.0, 4562.5e3, 0.74),
            (11.4, 5000.0e3, 0.70),
            (12.0, 5000.0e3, 0.58),
            (14.0, 5000.0e3, 0.37),
            (16.0, 5000.0e3, 0.26),
            (18.0, 5000.0e3, 0.19),
            (20.0, 5000.0e3, 0.15),
            (25.0, 5000.0e3, 0.09),
        ];
        let ws = points.iter().map(|p| p.0).collect();
        let power = points.iter().map(|p| p.1).collect();
        let ct = points.iter().map(|p| p.2).collect();
        Self {
            name: "NREL5MW".to_string(),
            diameter: 126.0,
            hub_height: 90.0,
            curve: PowerCtCurve { ws, power, ct },
            rho_ref: Some(RHO_STD),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wf_core::units::m;

    fn curve() -> PowerCtCurve {
        PowerCtCurve::new(vec![(4.0, 0.0, 0.8), (8.0, 2.0e6, 0.8), (12.0, 4.0e6, 0.4)]).unwrap()
    }

    #[test]
    fn interpolates_linearly() {
        let c = curve();
        let (p, ct) = c.lookup(10.0);
        assert!((p - 3.0e6).abs() < 1e-6);
        assert!((ct - 0.6).abs() < 1e-12);
        assert_eq!(c.lookup(8.0), (2.0e6, 0.8));
        assert_eq!(c.lookup(12.0), (4.0e6, 0.4));
        assert_eq!(c.lookup(4.0), (0.0, 0.8));
    }

    #[test]
    fn outside_range_is_parked() {
        let c = curve();
        assert_eq!(c.lookup(3.9), (0.0, 0.0));
        assert_eq!(c.lookup(12.1), (0.0, 0.0));
        assert_eq!(c.lookup(0.0), (0.0, 0.0));
    }

    #[test]
    fn rejects_bad_curves() {
        assert!(PowerCtCurve::new(vec![(4.0, 0.0, 0.8)]).is_err());
        assert!(PowerCtCurve::new(vec![(8.0, 0.0, 0.8), (4.0, 1.0, 0.8)]).is_err());
        assert!(PowerCtCurve::new(vec![(4.0, -1.0, 0.8), (8.0, 1.0, 0.8)]).is_err());
        assert!(PowerCtCurve::new(vec![(4.0, f64::NAN, 0.8), (8.0, 1.0, 0.8)]).is_err());
    }

    #[test]
    fn type_geometry_is_checked() {
        assert!(TurbineType::new("bad", m(0.0), m(90.0), curve()).is_err());
        assert!(TurbineType::new("bad", m(100.0), m(-1.0), curve()).is_err());
        let t = TurbineType::new("ok", m(100.0), m(90.0), curve()).unwrap();
        assert!((t.rotor_area() - 7853.981633974483).abs() < 1e-9);
    }

    #[test]
    fn calculate_sets_power_and_ct() {
        let t = TurbineType::new("T", m(100.0), m(90.0), curve()).unwrap();
        let mut vars = VarMap::inflow(10.0, 0.05, 1.225);
        t.calculate(&mut vars).unwrap();
        assert!((vars[Variable::Power] - 3.0e6).abs() < 1e-6);
        assert!((vars[Variable::ThrustCoefficient] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn density_correction_scales_power() {
        let t = TurbineType::new("T", m(100.0), m(90.0), curve())
            .unwrap()
            .with_density_correction(Some(1.225))
            .unwrap();
        let mut vars = VarMap::inflow(8.0, 0.05, 1.225 * 0.9);
        t.calculate(&mut vars).unwrap();
        assert!((vars[Variable::Power] - 1.8e6).abs() < 1e-6);
    }

    #[test]
    fn invalid_inflow_is_unrecoverable() {
        let t = TurbineType::new("T", m(100.0), m(90.0), curve()).unwrap();
        let mut vars = VarMap::inflow(8.0, 0.05, 0.0);
        let err = t.calculate(&mut vars).unwrap_err();
        assert!(err.is_evaluation_error());

        let mut vars = VarMap::inflow(f64::NAN, 0.05, 1.225);
        assert!(t.calculate(&mut vars).is_err());
    }

    #[test]
    fn default_type_is_consistent() {
        let t = TurbineType::default();
        assert_eq!(t.curve.rated_power(), 5.0e6);
        assert_eq!(t.curve.ws_min(), 3.0);
        assert_eq!(t.curve.ws_max(), 25.0);
    }
}
