//! Flow fields: the ambient drift a vehicle is immersed in.
//!
//! A flow field is a vector field of position and (optionally) time. The
//! trajectory integrator adds it to the vehicle's own-speed heading vector;
//! the front tracker advects the reachable-set boundary with it. Two
//! families are provided: closed-form analytic fields with exact Jacobians,
//! and gridded fields sampled on a regular mesh with deterministic
//! nearest-edge extrapolation outside the sampled box.
//!
//! Fields are immutable once constructed and safe to query from any number
//! of threads; composites hold shared `Arc` handles to their constituents.

mod analytic;
mod combination;
mod gridded;

pub use analytic::{
    DoubleGyreFlow, LinearFlow, RankineVortexFlow, SourceFlow, TwoSectorsFlow, UniformFlow,
    VortexFlow,
};
pub use combination::{LinearCombination, ScaledFlow};
pub use gridded::{GriddedFlow, Interpolation};

use crate::core_types::{Mat2, Vec2};

/// A smooth vector field of time and position.
///
/// `value` is the drift velocity, `d_value` its spatial Jacobian. Both must
/// be defined everywhere the evaluator is queried; gridded implementations
/// clamp to their sampled box rather than failing near domain edges.
pub trait FlowField: Send + Sync {
    /// Drift velocity at time `t` and position `x`.
    fn value(&self, t: f64, x: Vec2) -> Vec2;

    /// Spatial Jacobian of the drift at time `t` and position `x`.
    fn d_value(&self, t: f64, x: Vec2) -> Mat2;

    /// Partial derivative of the drift with respect to time.
    ///
    /// Zero for steady fields, which is the default.
    fn time_derivative(&self, _t: f64, _x: Vec2) -> Vec2 {
        Vec2::zeros()
    }
}
