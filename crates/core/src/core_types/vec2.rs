//! Vector type aliases for planar positions and directions.

use nalgebra::{Matrix2, Vector2};

/// 2D vector type for positions, flow velocities, and gradients.
///
/// This is a simple alias for `nalgebra::Vector2<f64>`, used throughout
/// the crate for grid coordinates, flow samples, and trajectory states.
/// Double precision is deliberate: geodesic coordinates are radians and
/// planar problems routinely span megameters, so `f32` would lose the
/// sub-meter resolution the front tracker needs near the zero level set.
pub type Vec2 = Vector2<f64>;

/// 2x2 matrix type for spatial Jacobians of flow fields.
pub type Mat2 = Matrix2<f64>;
