//! Time-optimal navigation in flow fields.
//!
//! This crate is the numerical core for planning the paths of a
//! fixed-airspeed vehicle through a spatially (and temporally) varying
//! flow such as wind or ocean current, with Zermelo kinematics: the state
//! moves at the vehicle's own speed along a commanded heading plus the
//! local drift. Two complementary techniques cooperate:
//!
//! - a grid-based level-set **front tracker** that propagates the entire
//!   reachable-set boundary forward in time, used to estimate arrival
//!   time and heading at a target;
//! - a fixed-step kinematic **trajectory integrator** that advances one
//!   candidate path under a feedback control law, bounded by stopping
//!   conditions and a feasible-domain test built from obstacle functions.
//!
//! Flow fields and obstacles are constructed independently and injected
//! into both consumers as shared read-only handles. Entry points, file
//! formats, plotting, and the outer shooting/optimization procedures live
//! in collaborating crates; this one owns the numerics.

// Core types and utilities
pub mod core_types;

pub mod error;
pub mod flow;
pub mod obstacle;
pub mod tracker;
pub mod trajectory;

// Re-export core types
pub use core_types::{CoordKind, Mat2, Vec2, EARTH_RADIUS};
pub use error::{ZermeloError, ZermeloResult};

// Re-export the main component surfaces
pub use flow::{FlowField, GriddedFlow, Interpolation, LinearCombination, ScaledFlow};
pub use obstacle::{GriddedScalar, Obstacle};
pub use tracker::{FrontBackend, FrontTracker, SchemeKind, TrackerConfig};
pub use trajectory::{
    Domain, EulerIntegrator, Feedback, FixedHeading, IntegratorConfig, StopCond, TargetHeading,
    TrajKind, Trajectory,
};
