//! Trajectory records.

use serde::{Deserialize, Serialize};

use crate::core_types::{CoordKind, Vec2};
use crate::error::{ZermeloError, ZermeloResult};

/// How a trajectory was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrajKind {
    /// Direct integration of a feedback law.
    Integral,
    /// Extracted time-optimal path.
    Optimal,
}

/// An immutable, pre-sized record of one integration run.
///
/// All arrays share the same sampled length; `last_index` marks the last
/// physically meaningful sample (integration may allocate a fixed-size
/// buffer and stop early, leaving the tail untouched). Created once by
/// the integrator and never mutated afterwards; owned exclusively by the
/// caller that requested the integration.
pub struct Trajectory {
    timestamps: Vec<f64>,
    points: Vec<Vec2>,
    controls: Vec<f64>,
    adjoints: Option<Vec<Vec2>>,
    last_index: usize,
    kind: TrajKind,
    interrupted: bool,
    coords: CoordKind,
}

impl Trajectory {
    /// Assemble a record from raw arrays.
    ///
    /// All arrays must share one length, `adjoints` included when present,
    /// and `last_index` must fall inside it.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        timestamps: Vec<f64>,
        points: Vec<Vec2>,
        controls: Vec<f64>,
        adjoints: Option<Vec<Vec2>>,
        last_index: usize,
        kind: TrajKind,
        interrupted: bool,
        coords: CoordKind,
    ) -> ZermeloResult<Self> {
        let n = timestamps.len();
        for (what, len) in [
            ("trajectory points", points.len()),
            ("trajectory controls", controls.len()),
            (
                "trajectory adjoints",
                adjoints.as_ref().map_or(n, Vec::len),
            ),
        ] {
            if len != n {
                return Err(ZermeloError::ShapeMismatch {
                    what,
                    expected: n,
                    got: len,
                });
            }
        }
        if last_index >= n {
            return Err(ZermeloError::ShapeMismatch {
                what: "trajectory last_index",
                expected: n,
                got: last_index,
            });
        }
        Ok(Self {
            timestamps,
            points,
            controls,
            adjoints,
            last_index,
            kind,
            interrupted,
            coords,
        })
    }

    /// Integrator-internal constructor: the arrays are built in lockstep,
    /// so the length checks of [`Trajectory::new`] are redundant here.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        timestamps: Vec<f64>,
        points: Vec<Vec2>,
        controls: Vec<f64>,
        adjoints: Option<Vec<Vec2>>,
        last_index: usize,
        kind: TrajKind,
        interrupted: bool,
        coords: CoordKind,
    ) -> Self {
        Self {
            timestamps,
            points,
            controls,
            adjoints,
            last_index,
            kind,
            interrupted,
            coords,
        }
    }

    /// Sample timestamps, full buffer length.
    #[must_use]
    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// Sample positions, full buffer length.
    #[must_use]
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Control angles applied at each sample.
    #[must_use]
    pub fn controls(&self) -> &[f64] {
        &self.controls
    }

    /// Adjoint states, when the run propagated them.
    #[must_use]
    pub fn adjoints(&self) -> Option<&[Vec2]> {
        self.adjoints.as_deref()
    }

    /// Index of the last physically meaningful sample.
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.last_index
    }

    #[must_use]
    pub fn kind(&self) -> TrajKind {
        self.kind
    }

    /// Whether the run was cut short by leaving the feasible domain.
    #[must_use]
    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    #[must_use]
    pub fn coords(&self) -> CoordKind {
        self.coords
    }

    /// Timestamp of the last meaningful sample.
    #[must_use]
    pub fn final_time(&self) -> f64 {
        self.timestamps[self.last_index]
    }

    /// `(min, max, mean)` of the inter-sample time steps over the
    /// meaningful range.
    #[must_use]
    pub fn dt_stats(&self) -> (f64, f64, f64) {
        let steps = self.timestamps[..=self.last_index]
            .windows(2)
            .map(|w| w[1] - w[0]);
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut count = 0usize;
        for dt in steps {
            min = min.min(dt);
            max = max.max(dt);
            sum += dt;
            count += 1;
        }
        if count == 0 {
            (0.0, 0.0, 0.0)
        } else {
            (min, max, sum / count as f64)
        }
    }

    /// Reverse the meaningful samples in time order.
    ///
    /// A backward-integrated solution runs from the target with decreasing
    /// timestamps; reversing presents it forward in time, which is how
    /// dual problems hand their extremals back.
    #[must_use]
    pub fn reversed_in_time(mut self) -> Self {
        self.timestamps[..=self.last_index].reverse();
        self.points[..=self.last_index].reverse();
        self.controls[..=self.last_index].reverse();
        if let Some(adjoints) = &mut self.adjoints {
            adjoints[..=self.last_index].reverse();
        }
        self
    }

    /// Re-tag the record as an extracted optimal path.
    #[must_use]
    pub fn marked_optimal(mut self) -> Self {
        self.kind = TrajKind::Optimal;
        self
    }
}
