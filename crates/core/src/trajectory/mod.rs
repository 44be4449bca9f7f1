//! Trajectory integration: records, stopping machinery, and the explicit
//! Euler integrator for Zermelo kinematics.

mod integrator;
mod record;
mod stopping;

pub use integrator::{EulerIntegrator, Feedback, FixedHeading, IntegratorConfig, TargetHeading};
pub use record::{TrajKind, Trajectory};
pub use stopping::{Domain, StopCond};
