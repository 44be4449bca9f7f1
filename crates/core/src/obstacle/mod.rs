//! Obstacles: scalar feasibility fields over time and position.
//!
//! An obstacle is a real-valued function with a fixed sign convention —
//! negative strictly inside the forbidden region, positive strictly
//! outside, exactly zero on the boundary. The trajectory integrator treats
//! `value(t, x) >= 0` as feasible.
//!
//! Kinds form a closed enumeration dispatched through a single interface
//! (`value`, `gradient`, `time_derivative`). Composite kinds hold shared
//! handles to their children, so one obstacle may participate in several
//! composites. Primitives without a closed-form gradient fall back to one
//! shared centered finite-difference helper parameterized by the
//! obstacle's reference length.

mod gridded;

pub use gridded::GriddedScalar;

use std::sync::Arc;

use nalgebra::Vector3;

use crate::core_types::{CoordKind, Vec2, EARTH_RADIUS};
use crate::error::{ZermeloError, ZermeloResult};

/// Feasible sentinel reported by zone-gated obstacles outside their
/// activation zone, regardless of the underlying half-space test.
const ZONE_FEASIBLE_VALUE: f64 = 1.0;

/// Embed a (longitude, latitude) point on the Earth sphere.
fn embed(p: Vec2) -> Vector3<f64> {
    let (lon, lat) = (p.x, p.y);
    Vector3::new(
        EARTH_RADIUS * lon.cos() * lat.cos(),
        EARTH_RADIUS * lon.sin() * lat.cos(),
        EARTH_RADIUS * lat.sin(),
    )
}

/// The closed set of obstacle kinds.
enum ObstacleKind {
    /// `‖x − center‖ − radius`.
    Disk { center: Vec2, radius: f64 },
    /// Rectangle acting as a frame: negative outside the box.
    Frame { bl: Vec2, tr: Vec2 },
    /// Half-plane bounded by a latitude; `up` selects the accessible side.
    Parallel { lat: f64, up: bool },
    /// Half-sphere bounded by a meridian; `right` selects the side in the
    /// Earth's rotation direction from the given longitude.
    Meridian { lon: f64, right: bool },
    /// Half-space test against a great-circle plane in 3-D embedding
    /// coordinates, optionally gated by a lon/lat activation zone.
    GreatCircle {
        normal: Vector3<f64>,
        zone: Option<(Vec2, Vec2)>,
    },
    /// Disk whose radius varies linearly in time (negative rate decays).
    TimedDisk { center: Vec2, radius: f64, rate: f64 },
    /// Sampled scalar field.
    Gridded(GriddedScalar),
    /// Pointwise maximum over children: inside iff inside every child.
    Max(Vec<Arc<Obstacle>>),
    /// Log-sum-exp smoothing of the maximum with temperature `tau`.
    LseMax { children: Vec<Arc<Obstacle>>, tau: f64 },
    /// Arithmetic average over children (ensemble smoothing, not a true
    /// boundary test).
    Mean(Vec<Arc<Obstacle>>),
}

/// A scalar feasibility field of time and position.
pub struct Obstacle {
    kind: ObstacleKind,
    /// Reference point within the obstacle, used by consumers that cycle
    /// around it; composites average their children's.
    ref_point: Vec2,
    /// Reference length scaling the finite-difference step.
    l_ref: f64,
}

impl Obstacle {
    fn new(kind: ObstacleKind, ref_point: Vec2) -> Self {
        Self {
            kind,
            ref_point,
            l_ref: 1.0,
        }
    }

    /// Disk obstacle defined by center and radius.
    #[must_use]
    pub fn disk(center: Vec2, radius: f64) -> Self {
        Self::new(ObstacleKind::Disk { center, radius }, center)
    }

    /// Rectangle obstacle acting as a frame: the region outside `[bl, tr]`
    /// is forbidden.
    #[must_use]
    pub fn frame(bl: Vec2, tr: Vec2) -> Self {
        let center = 0.5 * (bl + tr);
        Self::new(ObstacleKind::Frame { bl, tr }, center)
    }

    /// Half-plane bounded by `lat` (radians); accessible side above when
    /// `up` is true.
    #[must_use]
    pub fn parallel(lat: f64, up: bool) -> Self {
        Self::new(ObstacleKind::Parallel { lat, up }, Vec2::zeros())
    }

    /// Half-sphere bounded by `lon` (radians); accessible side in the
    /// Earth's rotation direction when `right` is true.
    #[must_use]
    pub fn meridian(lon: f64, right: bool) -> Self {
        Self::new(ObstacleKind::Meridian { lon, right }, Vec2::zeros())
    }

    /// Great-circle half-space through `p1` and `p2` (lon/lat radians).
    ///
    /// The cross product of the two embedded points is oriented toward the
    /// obstacle, so the forbidden side reports negative values. An
    /// optional `zone` gates the obstacle: outside the lon/lat box the
    /// value is a fixed feasible sentinel regardless of the half-space
    /// test.
    #[must_use]
    pub fn great_circle(p1: Vec2, p2: Vec2, zone: Option<(Vec2, Vec2)>) -> Self {
        let normal = -embed(p1).cross(&embed(p2)).normalize();
        Self::new(ObstacleKind::GreatCircle { normal, zone }, Vec2::zeros())
    }

    /// Disk whose radius is `radius + rate·t`, clamped at zero. A negative
    /// rate gives a decaying obstacle that eventually vanishes.
    #[must_use]
    pub fn timed_disk(center: Vec2, radius: f64, rate: f64) -> Self {
        Self::new(ObstacleKind::TimedDisk { center, radius, rate }, center)
    }

    /// Sampled obstacle over a gridded scalar field.
    #[must_use]
    pub fn gridded(field: GriddedScalar) -> Self {
        let center = field.center();
        Self::new(ObstacleKind::Gridded(field), center)
    }

    /// Intersection of forbidden regions: pointwise maximum over children.
    pub fn max(children: Vec<Arc<Obstacle>>) -> ZermeloResult<Self> {
        let (ref_point, l_ref) = Self::composite_refs(&children, "max composite")?;
        Ok(Self {
            kind: ObstacleKind::Max(children),
            ref_point,
            l_ref,
        })
    }

    /// Smoothed maximum: `τ·ln Σ exp(vᵢ/τ)`. The temperature `tau` has no
    /// derived default and must be supplied; large values approximate the
    /// exact maximum while staying differentiable.
    pub fn lse_max(children: Vec<Arc<Obstacle>>, tau: f64) -> ZermeloResult<Self> {
        let (ref_point, l_ref) = Self::composite_refs(&children, "smoothed-max composite")?;
        Ok(Self {
            kind: ObstacleKind::LseMax { children, tau },
            ref_point,
            l_ref,
        })
    }

    /// Arithmetic mean over children.
    pub fn mean(children: Vec<Arc<Obstacle>>) -> ZermeloResult<Self> {
        let (ref_point, l_ref) = Self::composite_refs(&children, "mean composite")?;
        Ok(Self {
            kind: ObstacleKind::Mean(children),
            ref_point,
            l_ref,
        })
    }

    fn composite_refs(
        children: &[Arc<Obstacle>],
        what: &'static str,
    ) -> ZermeloResult<(Vec2, f64)> {
        if children.is_empty() {
            return Err(ZermeloError::EmptyComposite { what });
        }
        let n = children.len() as f64;
        let ref_point = children.iter().map(|o| o.ref_point).sum::<Vec2>() / n;
        let l_ref = children.iter().map(|o| o.l_ref).sum::<f64>() / n;
        Ok((ref_point, l_ref))
    }

    /// Override the reference length used for finite differencing.
    #[must_use]
    pub fn with_ref_length(mut self, l_ref: f64) -> Self {
        self.l_ref = l_ref;
        self
    }

    /// Reference point within the obstacle.
    #[must_use]
    pub fn ref_point(&self) -> Vec2 {
        self.ref_point
    }

    /// Reference length for finite differencing.
    #[must_use]
    pub fn l_ref(&self) -> f64 {
        self.l_ref
    }

    /// Obstacle value: negative inside the forbidden region, positive
    /// outside, zero on the boundary.
    #[must_use]
    pub fn value(&self, t: f64, x: Vec2) -> f64 {
        match &self.kind {
            ObstacleKind::Disk { center, radius } => (x - center).norm() - radius,
            ObstacleKind::Frame { bl, tr } => (x.x - bl.x)
                .min(tr.x - x.x)
                .min(x.y - bl.y)
                .min(tr.y - x.y),
            ObstacleKind::Parallel { lat, up } => {
                if *up {
                    x.y - lat
                } else {
                    lat - x.y
                }
            }
            ObstacleKind::Meridian { lon, right } => {
                let cp = (x.x - lon).sin();
                if *right {
                    cp
                } else {
                    -cp
                }
            }
            ObstacleKind::GreatCircle { normal, zone } => {
                if let Some((z1, z2)) = zone {
                    if !CoordKind::in_lonlat_box(*z1, *z2, x) {
                        return ZONE_FEASIBLE_VALUE;
                    }
                }
                embed(x).dot(normal)
            }
            ObstacleKind::TimedDisk { center, radius, rate } => {
                let r = (radius + rate * t).max(0.0);
                (x - center).norm() - r
            }
            ObstacleKind::Gridded(field) => field.value(t, x),
            ObstacleKind::Max(children) => children
                .iter()
                .map(|o| o.value(t, x))
                .fold(f64::NEG_INFINITY, f64::max),
            ObstacleKind::LseMax { children, tau } => {
                // Max-shifted evaluation keeps small temperatures from
                // overflowing the exponentials; the value is unchanged.
                let values: Vec<f64> = children.iter().map(|o| o.value(t, x)).collect();
                let m = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let sum: f64 = values.iter().map(|v| ((v - m) / tau).exp()).sum();
                m + tau * sum.ln()
            }
            ObstacleKind::Mean(children) => {
                children.iter().map(|o| o.value(t, x)).sum::<f64>() / children.len() as f64
            }
        }
    }

    /// Gradient of the value function with respect to position.
    ///
    /// Uses the closed form where one exists; otherwise the shared
    /// centered finite-difference fallback.
    #[must_use]
    pub fn gradient(&self, t: f64, x: Vec2) -> Vec2 {
        self.analytic_gradient(t, x)
            .unwrap_or_else(|| self.finite_difference_gradient(t, x))
    }

    /// Centered finite-difference gradient with step `l_ref · 1e-5`.
    ///
    /// This is the fallback behind [`Obstacle::gradient`]; it is exposed
    /// so consumers can cross-check analytic gradients.
    #[must_use]
    pub fn finite_difference_gradient(&self, t: f64, x: Vec2) -> Vec2 {
        let eps = self.l_ref * 1e-5;
        let ex = Vec2::new(eps, 0.0);
        let ey = Vec2::new(0.0, eps);
        Vec2::new(
            (self.value(t, x + ex) - self.value(t, x - ex)) / (2.0 * eps),
            (self.value(t, x + ey) - self.value(t, x - ey)) / (2.0 * eps),
        )
    }

    fn analytic_gradient(&self, t: f64, x: Vec2) -> Option<Vec2> {
        match &self.kind {
            ObstacleKind::Disk { center, radius: _ } => {
                let d = x - center;
                let r = d.norm();
                if r > 0.0 {
                    Some(d / r)
                } else {
                    // Arbitrary fixed direction at the exact center
                    Some(Vec2::new(1.0, 0.0))
                }
            }
            ObstacleKind::Frame { bl, tr } => {
                let center = 0.5 * (bl + tr);
                let a = (x.x - center.x) / (tr.x - bl.x);
                let b = (x.y - center.y) / (tr.y - bl.y);
                // Clockwise through the four sides; ties resolved in the
                // order +x, -y, -x, +y
                Some(if a > b && a > -b {
                    Vec2::new(1.0, 0.0)
                } else if b < a && a < -b {
                    Vec2::new(0.0, -1.0)
                } else if a < b && a < -b {
                    Vec2::new(-1.0, 0.0)
                } else {
                    Vec2::new(0.0, 1.0)
                })
            }
            ObstacleKind::Parallel { lat: _, up } => {
                Some(if *up {
                    Vec2::new(0.0, 1.0)
                } else {
                    Vec2::new(0.0, -1.0)
                })
            }
            ObstacleKind::Meridian { lon, right } => {
                let dp = (x.x - lon).cos();
                Some(if *right {
                    Vec2::new(dp, 0.0)
                } else {
                    Vec2::new(-dp, 0.0)
                })
            }
            ObstacleKind::GreatCircle { normal, zone } => {
                if let Some((z1, z2)) = zone {
                    if !CoordKind::in_lonlat_box(*z1, *z2, x) {
                        return Some(Vec2::new(1.0, 1.0));
                    }
                }
                let (lon, lat) = (x.x, x.y);
                let d_dlon = Vector3::new(
                    -EARTH_RADIUS * lon.sin() * lat.cos(),
                    EARTH_RADIUS * lon.cos() * lat.cos(),
                    0.0,
                );
                let d_dlat = Vector3::new(
                    -EARTH_RADIUS * lon.cos() * lat.sin(),
                    -EARTH_RADIUS * lon.sin() * lat.sin(),
                    EARTH_RADIUS * lat.cos(),
                );
                Some(Vec2::new(normal.dot(&d_dlon), normal.dot(&d_dlat)))
            }
            // Defined by its value function only; exercised through the
            // finite-difference fallback
            ObstacleKind::TimedDisk { .. } => None,
            ObstacleKind::Gridded(field) => Some(field.gradient(t, x)),
            ObstacleKind::Max(children) => {
                Some(Self::argmax_child(children, t, x).gradient(t, x))
            }
            ObstacleKind::LseMax { children, tau } => {
                let values: Vec<f64> = children.iter().map(|o| o.value(t, x)).collect();
                let m = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let weights: Vec<f64> = values.iter().map(|v| ((v - m) / tau).exp()).collect();
                let total: f64 = weights.iter().sum();
                let mut grad = Vec2::zeros();
                for (o, w) in children.iter().zip(&weights) {
                    grad += o.gradient(t, x) * (w / total);
                }
                Some(grad)
            }
            ObstacleKind::Mean(children) => {
                let sum: Vec2 = children.iter().map(|o| o.gradient(t, x)).sum();
                Some(sum / children.len() as f64)
            }
        }
    }

    /// Partial derivative of the value function with respect to time.
    ///
    /// Zero unless the obstacle is explicitly time-varying.
    #[must_use]
    pub fn time_derivative(&self, t: f64, x: Vec2) -> f64 {
        match &self.kind {
            ObstacleKind::TimedDisk { radius, rate, .. } => {
                if radius + rate * t > 0.0 {
                    -rate
                } else {
                    0.0
                }
            }
            ObstacleKind::Gridded(field) => field.time_derivative(t, x),
            ObstacleKind::Max(children) => {
                Self::argmax_child(children, t, x).time_derivative(t, x)
            }
            ObstacleKind::LseMax { children, tau } => {
                let values: Vec<f64> = children.iter().map(|o| o.value(t, x)).collect();
                let m = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let weights: Vec<f64> = values.iter().map(|v| ((v - m) / tau).exp()).collect();
                let total: f64 = weights.iter().sum();
                children
                    .iter()
                    .zip(&weights)
                    .map(|(o, w)| o.time_derivative(t, x) * (w / total))
                    .sum()
            }
            ObstacleKind::Mean(children) => {
                children.iter().map(|o| o.time_derivative(t, x)).sum::<f64>()
                    / children.len() as f64
            }
            _ => 0.0,
        }
    }

    /// Child with the largest value; ties resolved by lowest index.
    fn argmax_child<'a>(children: &'a [Arc<Obstacle>], t: f64, x: Vec2) -> &'a Obstacle {
        let mut best = &children[0];
        let mut best_value = best.value(t, x);
        for child in &children[1..] {
            let v = child.value(t, x);
            if v > best_value {
                best = child;
                best_value = v;
            }
        }
        best
    }
}
