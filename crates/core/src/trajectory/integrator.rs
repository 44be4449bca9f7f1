//! Explicit fixed-step trajectory integration.
//!
//! The kinematics are Zermelo's: the state moves at the vehicle's own
//! speed along the commanded heading plus the local flow,
//!
//! ```text
//! ẋ = s · u(heading) + w(t, x)
//! ```
//!
//! stepped with forward Euler at a fixed step size. The heading-to-velocity
//! conversion branches on the coordinate system: planar trigonometry for
//! Cartesian states, north-clockwise bearing with the `1/(R cos φ)`
//! longitude rate for geodesic states. Runs are bounded by an iteration
//! budget and end early when the stopping condition fires or the state
//! leaves the feasible domain.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core_types::{CoordKind, Vec2, EARTH_RADIUS};
use crate::flow::FlowField;
use crate::trajectory::{Domain, StopCond, TrajKind, Trajectory};

/// A feedback control law: state to heading angle.
///
/// Headings are trigonometric angles from the x-axis for Cartesian states
/// and bearings from north (clockwise) for geodesic states.
pub trait Feedback: Send + Sync {
    fn control(&self, t: f64, x: Vec2) -> f64;
}

impl<F> Feedback for F
where
    F: Fn(f64, Vec2) -> f64 + Send + Sync,
{
    fn control(&self, t: f64, x: Vec2) -> f64 {
        self(t, x)
    }
}

/// Constant-heading law.
pub struct FixedHeading(pub f64);

impl Feedback for FixedHeading {
    fn control(&self, _t: f64, _x: Vec2) -> f64 {
        self.0
    }
}

/// Point straight at a target under the given coordinate system.
pub struct TargetHeading {
    pub target: Vec2,
    pub coords: CoordKind,
}

impl Feedback for TargetHeading {
    fn control(&self, _t: f64, x: Vec2) -> f64 {
        self.coords.heading(x, self.target)
    }
}

/// Step size, budget, and direction of one integration run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IntegratorConfig {
    /// Fixed integration step (seconds).
    pub step: f64,
    /// Iteration budget; the sample buffers hold `max_iter + 1` entries.
    pub max_iter: usize,
    /// Initial timestamp.
    pub t_init: f64,
    /// Integrate toward decreasing time (dual problems shoot backward
    /// from the target under the mirrored flow).
    pub backward: bool,
    /// Initial costate; enables adjoint propagation alongside the state.
    pub adjoint_init: Option<Vec2>,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            step: 1e-4,
            max_iter: 20_000,
            t_init: 0.0,
            backward: false,
            adjoint_init: None,
        }
    }
}

/// Explicit Euler integrator for one feedback law over one flow field.
///
/// The flow, feedback, and domain are shared read-only handles, so several
/// integrators can query them concurrently.
pub struct EulerIntegrator {
    flow: Arc<dyn FlowField>,
    feedback: Arc<dyn Feedback>,
    domain: Domain,
    stop: StopCond,
    coords: CoordKind,
    airspeed: f64,
    config: IntegratorConfig,
}

impl EulerIntegrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        flow: Arc<dyn FlowField>,
        feedback: Arc<dyn Feedback>,
        coords: CoordKind,
        airspeed: f64,
        domain: Domain,
        stop: StopCond,
        config: IntegratorConfig,
    ) -> Self {
        Self {
            flow,
            feedback,
            domain,
            stop,
            coords,
            airspeed,
            config,
        }
    }

    /// Own-speed velocity vector for a heading, in physical units
    /// (east/north for geodesic states).
    fn own_velocity(&self, heading: f64) -> Vec2 {
        match self.coords {
            CoordKind::Cartesian => Vec2::new(heading.cos(), heading.sin()) * self.airspeed,
            CoordKind::Gcs => Vec2::new(heading.sin(), heading.cos()) * self.airspeed,
        }
    }

    /// Convert a physical velocity into coordinate rates at `x`.
    fn coordinate_rates(&self, v: Vec2, x: Vec2) -> Vec2 {
        match self.coords {
            CoordKind::Cartesian => v,
            CoordKind::Gcs => Vec2::new(v.x / (EARTH_RADIUS * x.y.cos()), v.y / EARTH_RADIUS),
        }
    }

    /// Integrate from `x_init` until the stopping condition fires, the
    /// state leaves the feasible domain, or the iteration budget runs out.
    ///
    /// The predicates are evaluated after each state update; the first one
    /// to fire leaves `last_index` on the prior sample. `interrupted` is
    /// set only when the domain exit was the cause.
    #[must_use]
    pub fn integrate(&self, x_init: Vec2) -> Trajectory {
        let n = self.config.max_iter + 1;
        let mut timestamps = vec![0.0; n];
        let mut points = vec![Vec2::zeros(); n];
        let mut controls = vec![0.0; n];
        let mut adjoints = self.config.adjoint_init.map(|p0| {
            let mut buf = vec![Vec2::zeros(); n];
            buf[0] = p0;
            buf
        });

        timestamps[0] = self.config.t_init;
        points[0] = x_init;

        let dir = if self.config.backward { -1.0 } else { 1.0 };
        let h = dir * self.config.step;
        let mut last_index = self.config.max_iter;
        let mut interrupted = false;

        for k in 0..self.config.max_iter {
            let (t, x) = (timestamps[k], points[k]);
            let heading = self.feedback.control(t, x);
            controls[k] = heading;

            let velocity = self.own_velocity(heading) + self.flow.value(t, x);
            let x_next = x + self.coordinate_rates(velocity, x) * h;
            let t_next = t + h;
            timestamps[k + 1] = t_next;
            points[k + 1] = x_next;

            if let Some(buf) = &mut adjoints {
                // Costate dynamics of the time-optimal Hamiltonian:
                // ṗ = −(∂w/∂x)ᵀ p
                let p = buf[k];
                buf[k + 1] = p - self.flow.d_value(t, x).transpose() * p * h;
            }

            if self.stop.fires(self.coords, t_next, x_next) {
                last_index = k;
                break;
            }
            if !self.domain.contains(t_next, x_next) {
                last_index = k;
                interrupted = true;
                break;
            }
            last_index = k + 1;
        }

        controls[last_index] = self
            .feedback
            .control(timestamps[last_index], points[last_index]);

        debug!(
            last_index,
            interrupted,
            final_time = timestamps[last_index],
            "integration finished"
        );

        Trajectory::from_parts(
            timestamps,
            points,
            controls,
            adjoints,
            last_index,
            TrajKind::Integral,
            interrupted,
            self.coords,
        )
    }
}
