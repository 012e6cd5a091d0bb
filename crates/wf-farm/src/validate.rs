//! Layout validation logic.

use std::collections::HashSet;

use crate::error::{FarmError, FarmResult};
use crate::layout::Turbine;

/// Positions closer than this (metres) count as coincident.
const MIN_SEPARATION: f64 = 1e-6;

/// Validate a turbine list: non-empty, finite geometry, unique names and
/// no two turbines at the same spot.
pub(crate) fn validate_layout(turbines: &[Turbine]) -> FarmResult<()> {
    if turbines.is_empty() {
        return Err(FarmError::EmptyLayout);
    }

    let mut names = HashSet::with_capacity(turbines.len());
    for t in turbines {
        if !names.insert(t.name.as_str()) {
            return Err(FarmError::DuplicateName {
                name: t.name.clone(),
            });
        }
        if !(t.position.x.is_finite() && t.position.y.is_finite()) {
            return Err(FarmError::InvalidGeometry {
                turbine: t.name.clone(),
                what: "position must be finite",
            });
        }
        if !(t.diameter().is_finite() && t.diameter() > 0.0) {
            return Err(FarmError::InvalidGeometry {
                turbine: t.name.clone(),
                what: "rotor diameter must be positive",
            });
        }
        if !(t.hub_height().is_finite() && t.hub_height() > 0.0) {
            return Err(FarmError::InvalidGeometry {
                turbine: t.name.clone(),
                what: "hub height must be positive",
            });
        }
    }

    // Pairwise check; layouts are at most a few hundred turbines.
    for (i, a) in turbines.iter().enumerate() {
        for b in &turbines[i + 1..] {
            if (a.position - b.position).norm() < MIN_SEPARATION {
                return Err(FarmError::CoincidentTurbines {
                    first: a.name.clone(),
                    second: b.name.clone(),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LayoutBuilder;
    use crate::turbine_type::TurbineType;
    use std::sync::Arc;

    #[test]
    fn rejects_duplicate_names() {
        let t = Arc::new(TurbineType::default());
        let mut b = LayoutBuilder::new();
        b.add_turbine("A", 0.0, 0.0, t.clone(), vec![]);
        b.add_turbine("A", 100.0, 0.0, t, vec![]);
        assert!(matches!(b.build(), Err(FarmError::DuplicateName { .. })));
    }

    #[test]
    fn rejects_coincident_positions() {
        let t = Arc::new(TurbineType::default());
        let mut b = LayoutBuilder::new();
        b.add_turbine("A", 10.0, 10.0, t.clone(), vec![]);
        b.add_turbine("B", 10.0, 10.0, t, vec![]);
        assert!(matches!(b.build(), Err(FarmError::CoincidentTurbines { .. })));
    }

    #[test]
    fn rejects_non_finite_position() {
        let t = Arc::new(TurbineType::default());
        let mut b = LayoutBuilder::new();
        b.add_turbine("A", f64::INFINITY, 0.0, t, vec![]);
        assert!(matches!(b.build(), Err(FarmError::InvalidGeometry { .. })));
    }
}
