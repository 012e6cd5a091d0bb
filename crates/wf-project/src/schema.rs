//! Project schema definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub farms: Vec<FarmDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FarmDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub turbine_types: Vec<TurbineTypeDef>,
    #[serde(default)]
    pub turbines: Vec<TurbineDef>,
    pub states: StatesDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileDef>,
    #[serde(default)]
    pub models: ModelsDef,
    #[serde(default)]
    pub engine: EngineDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurbineTypeDef {
    pub id: String,
    pub rotor_diameter_m: f64,
    pub hub_height_m: f64,
    /// Reference density of the curve; enables density correction of power.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rho_ref_kgpm3: Option<f64>,
    pub curve: Vec<CurvePointDef>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CurvePointDef {
    pub ws_mps: f64,
    pub power_kw: f64,
    pub ct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurbineDef {
    pub name: String,
    pub x_m: f64,
    pub y_m: f64,
    pub turbine_type: String,
    /// Turbine behaviour models, evaluated in this order before the power curve.
    #[serde(default)]
    pub models: Vec<ModelDef>,
}

/// A registry name plus its parameter overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, f64>,
}

impl ModelDef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with(mut self, param: impl Into<String>, value: f64) -> Self {
        self.params.insert(param.into(), value);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum StatesDef {
    /// Explicit state records. `ti` and `rho_kgpm3` apply to rows that omit them.
    Table {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ti: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rho_kgpm3: Option<f64>,
        records: Vec<StateRecordDef>,
    },
    /// Cartesian product of directions and speeds with uniform weights.
    Scan {
        wd_deg: Vec<f64>,
        ws_mps: Vec<f64>,
        ti: f64,
        #[serde(default = "default_rho")]
        rho_kgpm3: f64,
    },
}

fn default_rho() -> f64 {
    1.225
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateRecordDef {
    pub wd_deg: f64,
    pub ws_mps: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ti: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rho_kgpm3: Option<f64>,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ProfileDef {
    Uniform,
    PowerLaw { alpha: f64, reference_height_m: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelsDef {
    #[serde(default = "default_rotor")]
    pub rotor: ModelDef,
    #[serde(default)]
    pub wakes: Vec<WakeDef>,
    /// Superposition registry names, at most one per variable. Variables
    /// without an entry use the engine default.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub superpositions: Vec<String>,
}

impl Default for ModelsDef {
    fn default() -> Self {
        Self {
            rotor: default_rotor(),
            wakes: Vec::new(),
            superpositions: Vec::new(),
        }
    }
}

fn default_rotor() -> ModelDef {
    ModelDef::named("centre")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WakeDef {
    pub model: ModelDef,
    /// Partial wake model; the engine default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial: Option<ModelDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineDef {
    #[serde(default)]
    pub ordering: OrderingDef,
    #[serde(default = "default_true")]
    pub parallel: bool,
    /// Required weight sum of the states; `null` disables the check.
    #[serde(default = "default_weight_sum")]
    pub expected_weight_sum: Option<f64>,
    #[serde(default = "default_weight_tolerance")]
    pub weight_tolerance: f64,
    /// Lateral spread of the wake cone used for ordering checks and
    /// emitter selection. Absent means every upstream turbine interacts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wake_reach_spread: Option<f64>,
}

impl Default for EngineDef {
    fn default() -> Self {
        Self {
            ordering: OrderingDef::default(),
            parallel: true,
            expected_weight_sum: default_weight_sum(),
            weight_tolerance: default_weight_tolerance(),
            wake_reach_spread: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_weight_sum() -> Option<f64> {
    Some(1.0)
}

fn default_weight_tolerance() -> f64 {
    1e-6
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type")]
pub enum OrderingDef {
    #[default]
    Downwind,
    /// Turbine names in evaluation order.
    Fixed { turbines: Vec<String> },
}
