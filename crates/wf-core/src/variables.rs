//! Tracked per-turbine variables and a dense map keyed by them.

use core::fmt;
use core::ops::{Index, IndexMut};
use core::str::FromStr;

use crate::WfError;

/// A flow or performance variable tracked for every (turbine, state) cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Variable {
    /// Rotor-effective wind speed (m/s).
    #[cfg_attr(feature = "serde", serde(rename = "WS"))]
    WindSpeed,
    /// Turbulence intensity (-).
    #[cfg_attr(feature = "serde", serde(rename = "TI"))]
    TurbulenceIntensity,
    /// Air density (kg/m³).
    #[cfg_attr(feature = "serde", serde(rename = "RHO"))]
    AirDensity,
    /// Electrical power (W).
    #[cfg_attr(feature = "serde", serde(rename = "P"))]
    Power,
    /// Thrust coefficient (-).
    #[cfg_attr(feature = "serde", serde(rename = "CT"))]
    ThrustCoefficient,
    /// Wake growth coefficient (-).
    #[cfg_attr(feature = "serde", serde(rename = "K"))]
    WakeGrowth,
}

impl Variable {
    pub const COUNT: usize = 6;

    pub const ALL: [Variable; Variable::COUNT] = [
        Variable::WindSpeed,
        Variable::TurbulenceIntensity,
        Variable::AirDensity,
        Variable::Power,
        Variable::ThrustCoefficient,
        Variable::WakeGrowth,
    ];

    pub fn slot(self) -> usize {
        self as usize
    }

    /// Short name as used in project files and exports.
    pub fn short_name(self) -> &'static str {
        match self {
            Variable::WindSpeed => "WS",
            Variable::TurbulenceIntensity => "TI",
            Variable::AirDensity => "RHO",
            Variable::Power => "P",
            Variable::ThrustCoefficient => "CT",
            Variable::WakeGrowth => "K",
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for Variable {
    type Err = WfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variable::ALL
            .into_iter()
            .find(|v| v.short_name().eq_ignore_ascii_case(s))
            .ok_or(WfError::InvalidArg {
                what: "unknown variable name",
            })
    }
}

/// Dense `Variable -> f64` map. Unset variables read as zero.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VarMap {
    values: [f64; Variable::COUNT],
}

impl VarMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inflow record with the three ambient-driven variables set.
    pub fn inflow(ws: f64, ti: f64, rho: f64) -> Self {
        let mut map = Self::default();
        map[Variable::WindSpeed] = ws;
        map[Variable::TurbulenceIntensity] = ti;
        map[Variable::AirDensity] = rho;
        map
    }

    pub fn get(&self, var: Variable) -> f64 {
        self.values[var.slot()]
    }

    pub fn set(&mut self, var: Variable, value: f64) {
        self.values[var.slot()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Variable, f64)> + '_ {
        Variable::ALL.into_iter().map(|v| (v, self.get(v)))
    }
}

impl Index<Variable> for VarMap {
    type Output = f64;

    fn index(&self, var: Variable) -> &f64 {
        &self.values[var.slot()]
    }
}

impl IndexMut<Variable> for VarMap {
    fn index_mut(&mut self, var: Variable) -> &mut f64 {
        &mut self.values[var.slot()]
    }
}
