//! Level-set front tracking.
//!
//! This module provides the grid solver that propagates the reachable-set
//! boundary forward in time, plus the finite-difference kernels it is
//! built from. The solver sits behind the [`FrontBackend`] trait so that
//! alternative kernels (an external toolbox invoked out of process, for
//! instance) can be swapped in by outer layers; the native grid kernel is
//! the one implemented here.

mod front;
pub mod stencil;

pub use front::{FrontTracker, SchemeKind, TrackerConfig};
pub use stencil::Axis;

use crate::core_types::Vec2;
use crate::error::ZermeloResult;

/// Backend-agnostic interface to a reachability front computation.
///
/// A backend owns its φ volume exclusively; slices become readable once
/// `compute` has run to completion. The time axis is strictly sequential,
/// so `compute` takes the backend to `Done` in one call.
pub trait FrontBackend: Send {
    /// Run the front propagation to completion. Idempotent: calling again
    /// after completion is a no-op.
    fn compute(&mut self) -> ZermeloResult<()>;

    /// Volume dimensions `(nt, nx, ny)`.
    fn dimensions(&self) -> (usize, usize, usize);

    /// Read-only view of time slice `k`, x-major; `None` until the run is
    /// complete or if `k` is out of range.
    fn phi_slice(&self, k: usize) -> Option<&[f64]>;

    /// Earliest time at which the front reaches `target`: the smallest
    /// time index where φ changes sign there, linearly interpolated
    /// between the bracketing slices. `None` until the run is complete or
    /// if the target is never reached within the time window.
    fn arrival_time(&self, target: Vec2) -> Option<f64>;

    /// Unit outward front normal at `target` on the bracketing slice —
    /// the estimated direction of travel at arrival. Backward shooting
    /// from the target uses its negation.
    fn arrival_heading(&self, target: Vec2) -> Option<Vec2>;
}
