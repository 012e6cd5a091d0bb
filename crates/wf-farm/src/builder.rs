//! Incremental layout builder.

use std::sync::Arc;

use nalgebra::Vector2;
use wf_core::TurbineId;

use crate::error::FarmResult;
use crate::layout::{FarmLayout, Turbine};
use crate::models::TurbineModel;
use crate::turbine_type::TurbineType;
use crate::validate;

/// Builder for a [`FarmLayout`].
///
/// Add turbines with `add_turbine`, then call `build()` to validate and
/// freeze the layout.
#[derive(Debug, Default)]
pub struct LayoutBuilder {
    turbines: Vec<Turbine>,
}

impl LayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a turbine at `(x, y)` metres and return its ID.
    pub fn add_turbine(
        &mut self,
        name: impl Into<String>,
        x: f64,
        y: f64,
        turbine_type: Arc<TurbineType>,
        models: Vec<Arc<dyn TurbineModel>>,
    ) -> TurbineId {
        let id = TurbineId::from_usize(self.turbines.len());
        self.turbines.push(Turbine {
            id,
            name: name.into(),
            position: Vector2::new(x, y),
            turbine_type,
            models,
        });
        id
    }

    /// Add `count` turbines along a straight line starting at `origin`,
    /// spaced by `step`. Names are `{prefix}{index}`.
    pub fn add_row(
        &mut self,
        prefix: &str,
        origin: (f64, f64),
        step: (f64, f64),
        count: usize,
        turbine_type: Arc<TurbineType>,
        models: Vec<Arc<dyn TurbineModel>>,
    ) -> Vec<TurbineId> {
        (0..count)
            .map(|i| {
                let name = format!("{prefix}{}", self.turbines.len());
                let f = i as f64;
                self.add_turbine(
                    name,
                    origin.0 + f * step.0,
                    origin.1 + f * step.1,
                    turbine_type.clone(),
                    models.clone(),
                )
            })
            .collect()
    }

    /// Attach an extra model to an already added turbine.
    pub fn attach_model(&mut self, id: TurbineId, model: Arc<dyn TurbineModel>) {
        if let Some(t) = self.turbines.get_mut(id.idx()) {
            t.models.push(model);
        }
    }

    pub fn len(&self) -> usize {
        self.turbines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turbines.is_empty()
    }

    /// Validate and return an immutable layout.
    pub fn build(self) -> FarmResult<FarmLayout> {
        validate::validate_layout(&self.turbines)?;
        Ok(FarmLayout {
            turbines: self.turbines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FarmError;

    fn ttype() -> Arc<TurbineType> {
        Arc::new(TurbineType::default())
    }

    #[test]
    fn builder_basic() {
        let mut b = LayoutBuilder::new();
        let a = b.add_turbine("A", 0.0, 0.0, ttype(), vec![]);
        let c = b.add_turbine("B", 500.0, 0.0, ttype(), vec![]);
        assert_eq!(a.index(), 0);
        assert_eq!(c.index(), 1);
        let layout = b.build().unwrap();
        assert_eq!(layout.len(), 2);
        assert_eq!(layout.find("B").map(|t| t.id), Some(c));
        assert_eq!(layout.max_diameter(), 126.0);
    }

    #[test]
    fn add_row_spaces_turbines() {
        let mut b = LayoutBuilder::new();
        let ids = b.add_row("WT", (0.0, 0.0), (630.0, 0.0), 4, ttype(), vec![]);
        assert_eq!(ids.len(), 4);
        let layout = b.build().unwrap();
        assert_eq!(layout.turbines()[3].position.x, 1890.0);
        assert_eq!(layout.names(), vec!["WT0", "WT1", "WT2", "WT3"]);
    }

    #[test]
    fn empty_layout_is_rejected() {
        assert_eq!(LayoutBuilder::new().build().unwrap_err(), FarmError::EmptyLayout);
    }
}
