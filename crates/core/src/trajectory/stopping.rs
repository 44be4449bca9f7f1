//! Stopping conditions and the feasible domain.
//!
//! An integration run ends when its stopping condition fires, when the
//! state leaves the feasible domain, or when the iteration budget is
//! exhausted — whichever comes first. Conditions compose by logical OR;
//! the domain test is evaluated separately so the record can distinguish
//! a satisfied objective from an excursion out of bounds.

use std::sync::Arc;

use crate::core_types::{CoordKind, Vec2};
use crate::obstacle::Obstacle;

/// A stopping predicate over `(t, x)`.
///
/// Distances are measured under the coordinate system the integrator was
/// built with, which is why `fires` receives the tag explicitly.
pub enum StopCond {
    /// Never fires; integration runs to the iteration budget.
    Never,
    /// Fires once the elapsed time since `start` reaches `budget`.
    Timed { start: f64, budget: f64 },
    /// Fires once the distance to `target` drops below `tol`.
    Distance { target: Vec2, tol: f64 },
    /// Fires when any member fires.
    Any(Vec<StopCond>),
}

impl StopCond {
    /// Time-budget condition measured from `start`.
    #[must_use]
    pub fn timed(start: f64, budget: f64) -> Self {
        StopCond::Timed { start, budget }
    }

    /// Distance-to-target condition with tolerance `tol`.
    #[must_use]
    pub fn distance(target: Vec2, tol: f64) -> Self {
        StopCond::Distance { target, tol }
    }

    /// Whether the condition fires at `(t, x)`.
    #[must_use]
    pub fn fires(&self, coords: CoordKind, t: f64, x: Vec2) -> bool {
        match self {
            StopCond::Never => false,
            StopCond::Timed { start, budget } => (t - start).abs() >= *budget,
            StopCond::Distance { target, tol } => coords.distance(x, *target) < *tol,
            StopCond::Any(members) => members.iter().any(|m| m.fires(coords, t, x)),
        }
    }
}

/// The feasible domain: an optional bounding box intersected with the
/// feasible side of every active obstacle.
///
/// Obstacles are shared read-only handles, so one obstacle set can back
/// several concurrent integrations.
pub struct Domain {
    bl: Option<Vec2>,
    tr: Option<Vec2>,
    obstacles: Vec<Arc<Obstacle>>,
}

impl Domain {
    /// The whole plane, no obstacles.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            bl: None,
            tr: None,
            obstacles: Vec::new(),
        }
    }

    /// Restrict to the open box `(bl, tr)`.
    #[must_use]
    pub fn boxed(bl: Vec2, tr: Vec2) -> Self {
        Self {
            bl: Some(bl),
            tr: Some(tr),
            obstacles: Vec::new(),
        }
    }

    /// Add one obstacle constraint.
    #[must_use]
    pub fn with_obstacle(mut self, obstacle: Arc<Obstacle>) -> Self {
        self.obstacles.push(obstacle);
        self
    }

    /// Add a set of obstacle constraints.
    #[must_use]
    pub fn with_obstacles(mut self, obstacles: impl IntoIterator<Item = Arc<Obstacle>>) -> Self {
        self.obstacles.extend(obstacles);
        self
    }

    /// Whether `(t, x)` is feasible: strictly inside the box (when one is
    /// set) and on the non-negative side of every obstacle.
    #[must_use]
    pub fn contains(&self, t: f64, x: Vec2) -> bool {
        if let (Some(bl), Some(tr)) = (self.bl, self.tr) {
            if !(x.x > bl.x && x.x < tr.x && x.y > bl.y && x.y < tr.y) {
                return false;
            }
        }
        self.violated_obstacle(t, x).is_none()
    }

    /// Index of the first obstacle whose value is negative at `(t, x)`,
    /// if any. Exposed for consumers that report which constraint was hit.
    #[must_use]
    pub fn violated_obstacle(&self, t: f64, x: Vec2) -> Option<usize> {
        self.obstacles.iter().position(|o| o.value(t, x) < 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_condition_measures_elapsed_time() {
        let cond = StopCond::timed(5.0, 10.0);
        assert!(!cond.fires(CoordKind::Cartesian, 14.9, Vec2::zeros()));
        assert!(cond.fires(CoordKind::Cartesian, 15.0, Vec2::zeros()));
        // Backward runs move to decreasing timestamps
        assert!(cond.fires(CoordKind::Cartesian, -5.0, Vec2::zeros()));
    }

    #[test]
    fn distance_condition_uses_the_active_metric() {
        let target = Vec2::new(1.0, 0.0);
        let cond = StopCond::distance(target, 0.5);
        assert!(cond.fires(CoordKind::Cartesian, 0.0, Vec2::new(0.6, 0.0)));
        assert!(!cond.fires(CoordKind::Cartesian, 0.0, Vec2::new(0.4, 0.0)));
    }

    #[test]
    fn disjunction_fires_when_any_member_does() {
        let cond = StopCond::Any(vec![
            StopCond::timed(0.0, 100.0),
            StopCond::distance(Vec2::zeros(), 1.0),
        ]);
        assert!(cond.fires(CoordKind::Cartesian, 1.0, Vec2::new(0.5, 0.0)));
        assert!(cond.fires(CoordKind::Cartesian, 100.0, Vec2::new(50.0, 0.0)));
        assert!(!cond.fires(CoordKind::Cartesian, 1.0, Vec2::new(50.0, 0.0)));
        assert!(!StopCond::Never.fires(CoordKind::Cartesian, 1e9, Vec2::zeros()));
    }

    #[test]
    fn domain_combines_box_and_obstacles() {
        let disk = Arc::new(Obstacle::disk(Vec2::new(0.5, 0.5), 0.2));
        let domain = Domain::boxed(Vec2::zeros(), Vec2::new(1.0, 1.0)).with_obstacle(disk);
        assert!(domain.contains(0.0, Vec2::new(0.1, 0.1)));
        // Inside the disk
        assert!(!domain.contains(0.0, Vec2::new(0.5, 0.5)));
        assert_eq!(domain.violated_obstacle(0.0, Vec2::new(0.5, 0.5)), Some(0));
        // Outside the box
        assert!(!domain.contains(0.0, Vec2::new(1.5, 0.5)));
        // The box boundary itself is infeasible
        assert!(!domain.contains(0.0, Vec2::new(0.0, 0.5)));
        // Near the obstacle but outside it is feasible
        assert!(domain.contains(0.0, Vec2::new(0.5, 0.75)));
    }
}
