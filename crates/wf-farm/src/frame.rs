//! Wake frame geometry.
//!
//! For a wind direction `wd` (degrees, meteorological: the direction the
//! wind comes from, clockwise from north) the frame has
//!
//! - `x` along the downwind unit vector `n = (-sin wd, -cos wd)`,
//! - `y` along the horizontal cross-wind vector `c = (-n_y, n_x)`,
//! - `z` vertical, measured from the emitting rotor's hub.

use nalgebra::{Vector2, Vector3};

use crate::layout::Turbine;

/// Downwind/cross-wind axes for one wind direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WakeFrame {
    pub wd_deg: f64,
    downwind: Vector2<f64>,
    crosswind: Vector2<f64>,
}

/// Position of a point relative to an emitting rotor, in the wake frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WakeOffset {
    /// Downwind distance (m). Non-positive means the point is not downstream.
    pub x: f64,
    /// Cross-wind distance (m).
    pub y: f64,
    /// Height above the emitter hub (m).
    pub z: f64,
}

impl WakeOffset {
    /// Distance from the wake centreline.
    pub fn radial(&self) -> f64 {
        self.y.hypot(self.z)
    }
}

/// Trig residue below this is zeroed, so axis-aligned directions give exact
/// unit vectors and cross-wind rows share one downwind coordinate.
const AXIS_SNAP: f64 = 1e-12;

fn snap(v: f64) -> f64 {
    if v.abs() < AXIS_SNAP { 0.0 } else { v }
}

impl WakeFrame {
    pub fn from_direction(wd_deg: f64) -> Self {
        let (s, c) = wd_deg.to_radians().sin_cos();
        let downwind = Vector2::new(-snap(s), -snap(c));
        let crosswind = Vector2::new(-downwind.y, downwind.x);
        Self {
            wd_deg,
            downwind,
            crosswind,
        }
    }

    pub fn downwind(&self) -> Vector2<f64> {
        self.downwind
    }

    pub fn crosswind(&self) -> Vector2<f64> {
        self.crosswind
    }

    /// Coordinate of a horizontal position along the downwind axis.
    pub fn downwind_coordinate(&self, p: &Vector2<f64>) -> f64 {
        p.dot(&self.downwind)
    }

    /// Offset of `point` from the hub of `emitter`.
    pub fn offset(&self, emitter: &Turbine, point: &Vector3<f64>) -> WakeOffset {
        // Differences of projections, so that `x > 0` agrees exactly with
        // the ordering by downwind coordinate.
        let p = point.xy();
        WakeOffset {
            x: self.downwind_coordinate(&p) - self.downwind_coordinate(&emitter.position),
            y: p.dot(&self.crosswind) - emitter.position.dot(&self.crosswind),
            z: point.z - emitter.hub_height(),
        }
    }

    /// World position of a rotor point given in rotor-plane coordinates
    /// (`y` cross-wind, `z` vertical, both in metres from the hub).
    pub fn rotor_point(&self, turbine: &Turbine, y: f64, z: f64) -> Vector3<f64> {
        let xy = turbine.position + self.crosswind * y;
        Vector3::new(xy.x, xy.y, turbine.hub_height() + z)
    }
}
