//! Immutable farm layout.

use std::sync::Arc;

use nalgebra::{Vector2, Vector3};
use wf_core::{ModelResult, TurbineId, VarMap, Variable};

use crate::models::TurbineModel;
use crate::turbine_type::TurbineType;

/// A turbine placed in the farm.
#[derive(Debug, Clone)]
pub struct Turbine {
    pub id: TurbineId,
    pub name: String,
    /// Horizontal position (x east, y north) in metres.
    pub position: Vector2<f64>,
    pub turbine_type: Arc<TurbineType>,
    /// Models run before the type's power/ct curve, in this order.
    pub models: Vec<Arc<dyn TurbineModel>>,
}

impl Turbine {
    pub fn diameter(&self) -> f64 {
        self.turbine_type.diameter
    }

    pub fn hub_height(&self) -> f64 {
        self.turbine_type.hub_height
    }

    /// Hub centre in 3D.
    pub fn hub(&self) -> Vector3<f64> {
        Vector3::new(self.position.x, self.position.y, self.hub_height())
    }

    /// True if one of the attached models produces `var`.
    pub fn provides(&self, var: Variable) -> bool {
        self.models.iter().any(|m| m.output_vars().contains(&var))
    }

    /// Run the attached models and then the type curve on `vars`.
    pub fn evaluate(&self, ambient: &VarMap, vars: &mut VarMap) -> ModelResult<()> {
        for model in &self.models {
            model.calculate(self, ambient, vars)?;
        }
        self.turbine_type.calculate(vars)
    }
}

/// A validated set of turbines, indexed by [`TurbineId`].
///
/// Built through [`crate::LayoutBuilder`]; immutable afterwards so it can be
/// shared across worker threads.
#[derive(Debug, Clone)]
pub struct FarmLayout {
    pub(crate) turbines: Vec<Turbine>,
}

impl FarmLayout {
    pub fn turbines(&self) -> &[Turbine] {
        &self.turbines
    }

    pub fn turbine(&self, id: TurbineId) -> Option<&Turbine> {
        self.turbines.get(id.idx())
    }

    pub fn len(&self) -> usize {
        self.turbines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turbines.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = TurbineId> + '_ {
        self.turbines.iter().map(|t| t.id)
    }

    pub fn names(&self) -> Vec<String> {
        self.turbines.iter().map(|t| t.name.clone()).collect()
    }

    pub fn find(&self, name: &str) -> Option<&Turbine> {
        self.turbines.iter().find(|t| t.name == name)
    }

    /// Largest rotor diameter in the farm.
    pub fn max_diameter(&self) -> f64 {
        self.turbines.iter().map(Turbine::diameter).fold(0.0, f64::max)
    }
}
