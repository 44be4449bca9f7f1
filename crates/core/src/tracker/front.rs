//! Reachability front tracker.
//!
//! Propagates the boundary of the reachable set forward in time as the
//! zero level set of a scalar field φ on a uniform grid. Each time step
//! combines two physical effects: advection of the front by the ambient
//! flow and isotropic growth at the vehicle's own speed,
//!
//! ```text
//! ∂φ/∂t + w · ∇φ + s ‖∇φ‖ = 0
//! ```
//!
//! The volume `φ(space × time)` is the sole product; arrival time and
//! heading queries are consumer-side refinements of the sign-change scan
//! and are provided here for the shooting procedures that need them.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core_types::{CoordKind, Vec2};
use crate::error::{ZermeloError, ZermeloResult};
use crate::flow::FlowField;
use crate::tracker::stencil;
use crate::tracker::FrontBackend;

/// Numerical scheme for the per-step update, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemeKind {
    /// Single-step update: centered eikonal term plus sign-selected
    /// upwind advection.
    Sethian,
    /// Three-stage fractional-step splitting: eikonal half-step, full
    /// centered advection step, eikonal half-step. Reduces the
    /// operator-splitting error of the single-step update.
    Lolla,
}

impl FromStr for SchemeKind {
    type Err = ZermeloError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sethian" => Ok(SchemeKind::Sethian),
            "lolla" => Ok(SchemeKind::Lolla),
            other => Err(ZermeloError::UnknownScheme(other.to_string())),
        }
    }
}

/// Grid and problem geometry for a tracker run.
///
/// The grid spans `[bl, tr]` with `nx × ny` nodes inclusive of the
/// corners; the time axis spans `[0, max_time]` with `nt` slices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Grid bottom-left corner.
    pub bl: Vec2,
    /// Grid top-right corner.
    pub tr: Vec2,
    /// Nodes along x.
    pub nx: usize,
    /// Nodes along y.
    pub ny: usize,
    /// Time slices (including the seed slice).
    pub nt: usize,
    /// Time window upper bound.
    pub max_time: f64,
    /// Vehicle own speed.
    pub airspeed: f64,
    /// Seed point of the front.
    pub x_start: Vec2,
    /// Per-step update scheme.
    pub scheme: SchemeKind,
    /// Coordinate system the grid lives in. The kernel itself operates in
    /// coordinate space; the tag travels with the output for consumers.
    pub coords: CoordKind,
    /// Offset subtracted from the seed distance function, keeping the
    /// zero level set non-degenerate at the seed point.
    pub seed_epsilon: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            bl: Vec2::new(0.0, 0.0),
            tr: Vec2::new(1.0, 1.0),
            nx: 101,
            ny: 101,
            nt: 50,
            max_time: 1.0,
            airspeed: 1.0,
            x_start: Vec2::new(0.0, 0.0),
            scheme: SchemeKind::Sethian,
            coords: CoordKind::Cartesian,
            seed_epsilon: 5e-3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackerState {
    Uninitialized,
    Computing { step: usize },
    Done,
}

/// Grid-based level-set front tracker.
///
/// Owns its `phi` volume exclusively for its lifetime; slices become
/// readable once the run is complete. Slice `k` lives at offset
/// `k·nx·ny`, cells x-major within a slice.
pub struct FrontTracker {
    config: TrackerConfig,
    flow: Arc<dyn FlowField>,
    delta_x: f64,
    delta_y: f64,
    delta_t: f64,
    phi: Vec<f64>,
    wind: Vec<Vec2>,
    state: TrackerState,
}

impl FrontTracker {
    /// Validate the grid geometry and allocate the solver state.
    pub fn new(config: TrackerConfig, flow: Arc<dyn FlowField>) -> ZermeloResult<Self> {
        if config.nx < 3 || config.ny < 3 {
            return Err(ZermeloError::InvalidGrid {
                what: format!(
                    "front tracking needs an interior ring, got {}x{} nodes",
                    config.nx, config.ny
                ),
            });
        }
        if config.nt < 2 {
            return Err(ZermeloError::InvalidGrid {
                what: format!("need at least 2 time slices, got {}", config.nt),
            });
        }
        if config.max_time <= 0.0 || config.airspeed < 0.0 {
            return Err(ZermeloError::InvalidGrid {
                what: "max_time must be positive and airspeed non-negative".to_string(),
            });
        }
        if config.tr.x - config.bl.x <= 0.0 || config.tr.y - config.bl.y <= 0.0 {
            return Err(ZermeloError::InvalidGrid {
                what: "bounding box corners are inverted or degenerate".to_string(),
            });
        }
        let delta_x = (config.tr.x - config.bl.x) / (config.nx - 1) as f64;
        let delta_y = (config.tr.y - config.bl.y) / (config.ny - 1) as f64;
        let delta_t = config.max_time / (config.nt - 1) as f64;
        if config.airspeed * delta_t > delta_x.min(delta_y) {
            warn!(
                delta_t,
                delta_x, delta_y, "time step exceeds the CFL bound for the own-speed term"
            );
        }
        let cells = config.nt * config.nx * config.ny;
        Ok(Self {
            config,
            flow,
            delta_x,
            delta_y,
            delta_t,
            phi: vec![0.0; cells],
            wind: vec![Vec2::zeros(); cells],
            state: TrackerState::Uninitialized,
        })
    }

    /// Grid node position.
    #[must_use]
    pub fn node(&self, i: usize, j: usize) -> Vec2 {
        self.config.bl + Vec2::new(self.delta_x * i as f64, self.delta_y * j as f64)
    }

    /// Timestamp of slice `k`.
    #[must_use]
    pub fn time_of(&self, k: usize) -> f64 {
        self.delta_t * k as f64
    }

    /// Grid spacings `(δx, δy, δt)`.
    #[must_use]
    pub fn spacing(&self) -> (f64, f64, f64) {
        (self.delta_x, self.delta_y, self.delta_t)
    }

    /// Run configuration.
    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Whether the full volume has been computed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state == TrackerState::Done
    }

    fn slice_len(&self) -> usize {
        self.config.nx * self.config.ny
    }

    /// Sample the flow at every node of every slice and seed slice 0 with
    /// the offset distance function from the start point.
    fn initialize(&mut self) {
        let (nx, ny, nt) = (self.config.nx, self.config.ny, self.config.nt);
        for k in 0..nt {
            let t = self.time_of(k);
            for i in 0..nx {
                for j in 0..ny {
                    let node = self.node(i, j);
                    self.wind[(k * nx + i) * ny + j] = self.flow.value(t, node);
                }
            }
        }
        for i in 0..nx {
            for j in 0..ny {
                let node = self.node(i, j);
                self.phi[i * ny + j] = (node - self.config.x_start).norm() - self.config.seed_epsilon;
            }
        }
        self.state = TrackerState::Computing { step: 0 };
    }

    /// Produce slice `step + 1` from slice `step`. Slices are only ever
    /// written in time order.
    fn step_once(&mut self, step: usize) {
        let (nx, ny) = (self.config.nx, self.config.ny);
        let len = self.slice_len();
        let speed = self.config.airspeed;
        let dt = self.delta_t;
        let (dx, dy) = (self.delta_x, self.delta_y);

        let wind_slice = &self.wind[step * len..(step + 1) * len];
        let (head, tail) = self.phi.split_at_mut((step + 1) * len);
        let prev = &head[step * len..];
        let next = &mut tail[..len];

        match self.config.scheme {
            SchemeKind::Sethian => {
                let eikonal = stencil::norm_grad_central(prev, dx, dy, nx, ny);
                let advection = stencil::advect_upwind(prev, wind_slice, dx, dy, nx, ny);
                for idx in 0..len {
                    next[idx] = prev[idx] - dt * (speed * eikonal[idx] + advection[idx]);
                }
            }
            SchemeKind::Lolla => {
                // Predictor half-step on the eikonal term
                let eikonal = stencil::norm_grad_central(prev, dx, dy, nx, ny);
                let mut star = vec![0.0; len];
                for idx in 0..len {
                    star[idx] = prev[idx] - 0.5 * dt * speed * eikonal[idx];
                }
                // Full advection step on the intermediate field
                let advection = stencil::advect_central(&star, wind_slice, dx, dy, nx, ny);
                for idx in 0..len {
                    star[idx] -= dt * advection[idx];
                }
                // Corrector half-step on the eikonal term
                let eikonal = stencil::norm_grad_central(&star, dx, dy, nx, ny);
                for idx in 0..len {
                    next[idx] = star[idx] - 0.5 * dt * speed * eikonal[idx];
                }
            }
        }

        self.state = if step + 1 == self.config.nt - 1 {
            TrackerState::Done
        } else {
            TrackerState::Computing { step: step + 1 }
        };
    }

    /// Bilinear probe of slice `k` at position `x`, clamped to the grid.
    fn probe(&self, k: usize, x: Vec2) -> f64 {
        let (nx, ny) = (self.config.nx, self.config.ny);
        let gx = ((x.x - self.config.bl.x) / self.delta_x).clamp(0.0, (nx - 1) as f64);
        let gy = ((x.y - self.config.bl.y) / self.delta_y).clamp(0.0, (ny - 1) as f64);
        let i0 = (gx.floor() as usize).min(nx - 2);
        let j0 = (gy.floor() as usize).min(ny - 2);
        let (fx, fy) = (gx - i0 as f64, gy - j0 as f64);
        let slice = &self.phi[k * self.slice_len()..(k + 1) * self.slice_len()];
        let at = |i: usize, j: usize| slice[i * ny + j];
        at(i0, j0) * (1.0 - fx) * (1.0 - fy)
            + at(i0 + 1, j0) * fx * (1.0 - fy)
            + at(i0, j0 + 1) * (1.0 - fx) * fy
            + at(i0 + 1, j0 + 1) * fx * fy
    }

    /// First slice index at which φ is non-positive at `target`.
    fn crossing_slice(&self, target: Vec2) -> Option<usize> {
        (0..self.config.nt).find(|&k| self.probe(k, target) <= 0.0)
    }
}

impl FrontBackend for FrontTracker {
    fn compute(&mut self) -> ZermeloResult<()> {
        if self.state == TrackerState::Done {
            return Ok(());
        }
        let started = Instant::now();
        if self.state == TrackerState::Uninitialized {
            self.initialize();
        }
        while let TrackerState::Computing { step } = self.state {
            self.step_once(step);
        }
        info!(
            nx = self.config.nx,
            ny = self.config.ny,
            nt = self.config.nt,
            scheme = ?self.config.scheme,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "front tracking complete"
        );
        Ok(())
    }

    fn dimensions(&self) -> (usize, usize, usize) {
        (self.config.nt, self.config.nx, self.config.ny)
    }

    fn phi_slice(&self, k: usize) -> Option<&[f64]> {
        if self.state != TrackerState::Done || k >= self.config.nt {
            return None;
        }
        Some(&self.phi[k * self.slice_len()..(k + 1) * self.slice_len()])
    }

    fn arrival_time(&self, target: Vec2) -> Option<f64> {
        if self.state != TrackerState::Done {
            return None;
        }
        let k = self.crossing_slice(target)?;
        if k == 0 {
            return Some(0.0);
        }
        // Linear interpolation between the bracketing slices
        let before = self.probe(k - 1, target);
        let after = self.probe(k, target);
        let frac = before / (before - after);
        let t = self.time_of(k - 1) + frac * self.delta_t;
        debug!(k, before, after, t, "front reached the target");
        Some(t)
    }

    fn arrival_heading(&self, target: Vec2) -> Option<Vec2> {
        if self.state != TrackerState::Done {
            return None;
        }
        let k = self.crossing_slice(target)?;
        // Centered probe of the bracketing slice, one grid cell wide
        let ex = Vec2::new(self.delta_x, 0.0);
        let ey = Vec2::new(0.0, self.delta_y);
        let grad = Vec2::new(
            (self.probe(k, target + ex) - self.probe(k, target - ex)) / (2.0 * self.delta_x),
            (self.probe(k, target + ey) - self.probe(k, target - ey)) / (2.0 * self.delta_y),
        );
        let norm = grad.norm();
        if norm > 0.0 {
            // Outward front normal: the direction of travel at arrival
            Some(grad / norm)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::UniformFlow;
    use approx::assert_relative_eq;

    fn still_air() -> Arc<dyn FlowField> {
        Arc::new(UniformFlow::new(Vec2::zeros()))
    }

    fn small_config() -> TrackerConfig {
        TrackerConfig {
            bl: Vec2::new(-1.0, -1.0),
            tr: Vec2::new(1.0, 1.0),
            nx: 21,
            ny: 21,
            nt: 11,
            max_time: 0.5,
            airspeed: 1.0,
            x_start: Vec2::zeros(),
            ..TrackerConfig::default()
        }
    }

    #[test]
    fn scheme_names_parse_and_unknown_ones_fail() {
        assert_eq!("sethian".parse::<SchemeKind>().unwrap(), SchemeKind::Sethian);
        assert_eq!("lolla".parse::<SchemeKind>().unwrap(), SchemeKind::Lolla);
        assert!(matches!(
            "godunov".parse::<SchemeKind>(),
            Err(ZermeloError::UnknownScheme(_))
        ));
    }

    #[test]
    fn degenerate_grids_are_rejected() {
        let config = TrackerConfig {
            nx: 2,
            ..small_config()
        };
        assert!(matches!(
            FrontTracker::new(config, still_air()),
            Err(ZermeloError::InvalidGrid { .. })
        ));

        let config = TrackerConfig {
            max_time: 0.0,
            ..small_config()
        };
        assert!(matches!(
            FrontTracker::new(config, still_air()),
            Err(ZermeloError::InvalidGrid { .. })
        ));
    }

    #[test]
    fn output_is_unavailable_until_the_run_completes() {
        let mut tracker = FrontTracker::new(small_config(), still_air()).unwrap();
        assert!(!tracker.is_done());
        assert!(tracker.phi_slice(0).is_none());
        assert!(tracker.arrival_time(Vec2::zeros()).is_none());
        tracker.compute().unwrap();
        assert!(tracker.is_done());
        assert!(tracker.phi_slice(0).is_some());
        assert!(tracker.phi_slice(tracker.config().nt).is_none());
    }

    #[test]
    fn seed_slice_is_the_offset_distance_function() {
        let config = small_config();
        let eps = config.seed_epsilon;
        let mut tracker = FrontTracker::new(config, still_air()).unwrap();
        tracker.compute().unwrap();
        let slice = tracker.phi_slice(0).unwrap();
        for i in 0..21 {
            for j in 0..21 {
                let node = tracker.node(i, j);
                assert_relative_eq!(slice[i * 21 + j], node.norm() - eps, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn compute_twice_is_a_no_op() {
        let mut tracker = FrontTracker::new(small_config(), still_air()).unwrap();
        tracker.compute().unwrap();
        let snapshot = tracker.phi_slice(5).unwrap().to_vec();
        tracker.compute().unwrap();
        assert_eq!(tracker.phi_slice(5).unwrap(), snapshot.as_slice());
    }

    #[test]
    fn arrival_time_in_still_air_matches_distance_over_speed() {
        let config = TrackerConfig {
            bl: Vec2::new(-1.0, -1.0),
            tr: Vec2::new(1.0, 1.0),
            nx: 81,
            ny: 81,
            nt: 41,
            max_time: 0.8,
            airspeed: 1.0,
            x_start: Vec2::zeros(),
            ..TrackerConfig::default()
        };
        let delta_t = config.max_time / 40.0;
        let mut tracker = FrontTracker::new(config, still_air()).unwrap();
        tracker.compute().unwrap();
        let target = Vec2::new(0.5, 0.0);
        let eta = tracker.arrival_time(target).expect("target reached");
        // Still air: front crosses at distance / airspeed
        assert!((eta - 0.5).abs() < 2.0 * delta_t, "eta = {eta}");
        // The front travels outward from the seed
        let heading = tracker.arrival_heading(target).expect("gradient defined");
        assert!(heading.x > 0.9, "heading = {heading:?}");
    }
}
