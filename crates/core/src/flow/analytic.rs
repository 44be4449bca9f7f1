//! Closed-form flow fields with analytic Jacobians.
//!
//! These are the classical building blocks of planar navigation problems:
//! uniform drift, piecewise-constant sector winds, affine fields, potential
//! vortices and sources, and the steady recirculating double gyre. All of
//! them implement [`FlowField`] exactly (no finite differencing).

use std::f64::consts::PI;

use crate::core_types::{Mat2, Vec2};
use crate::flow::FlowField;

/// Radius floor below which rotational/source fields report zero.
///
/// The potential vortex and source have a removable singularity at their
/// center; queries at (numerically) the exact center return a zero vector
/// and zero Jacobian instead of dividing by zero. The field remains
/// unbounded in any neighborhood of the center.
fn radius_floor(center: Vec2) -> f64 {
    1e-9 * (1.0 + center.norm())
}

/// Spatially and temporally constant drift.
#[derive(Debug, Clone, Copy)]
pub struct UniformFlow {
    vector: Vec2,
}

impl UniformFlow {
    #[must_use]
    pub fn new(vector: Vec2) -> Self {
        Self { vector }
    }
}

impl FlowField for UniformFlow {
    fn value(&self, _t: f64, _x: Vec2) -> Vec2 {
        self.vector
    }

    fn d_value(&self, _t: f64, _x: Vec2) -> Mat2 {
        Mat2::zeros()
    }
}

/// Constant y-drift over two half-planes separated at `x = x_switch`.
///
/// The x-component is always zero. Points on the separation line take the
/// right-hand sector's value.
#[derive(Debug, Clone, Copy)]
pub struct TwoSectorsFlow {
    v_left: f64,
    v_right: f64,
    x_switch: f64,
}

impl TwoSectorsFlow {
    #[must_use]
    pub fn new(v_left: f64, v_right: f64, x_switch: f64) -> Self {
        Self {
            v_left,
            v_right,
            x_switch,
        }
    }

    /// Sector separation midway to a target at `x = x_target`.
    #[must_use]
    pub fn midway(v_left: f64, v_right: f64, x_target: f64) -> Self {
        Self::new(v_left, v_right, x_target / 2.0)
    }
}

impl FlowField for TwoSectorsFlow {
    fn value(&self, _t: f64, x: Vec2) -> Vec2 {
        let vy = if x.x < self.x_switch {
            self.v_left
        } else {
            self.v_right
        };
        Vec2::new(0.0, vy)
    }

    fn d_value(&self, _t: f64, _x: Vec2) -> Mat2 {
        // Piecewise constant: zero almost everywhere, undefined on the
        // switch line itself; zero is the usable convention there.
        Mat2::zeros()
    }
}

/// Affine field `v0 + A (x - origin)` with constant Jacobian `A`.
#[derive(Debug, Clone, Copy)]
pub struct LinearFlow {
    gradient: Mat2,
    origin: Vec2,
    value_origin: Vec2,
}

impl LinearFlow {
    #[must_use]
    pub fn new(gradient: Mat2, origin: Vec2, value_origin: Vec2) -> Self {
        Self {
            gradient,
            origin,
            value_origin,
        }
    }
}

impl FlowField for LinearFlow {
    fn value(&self, _t: f64, x: Vec2) -> Vec2 {
        self.value_origin + self.gradient * (x - self.origin)
    }

    fn d_value(&self, _t: f64, _x: Vec2) -> Mat2 {
        self.gradient
    }
}

/// Potential-theory point vortex.
///
/// Tangential field `Γ / (2πr) e_θ`; positive circulation is
/// counterclockwise. Singular at the center (see [`radius_floor`]).
#[derive(Debug, Clone, Copy)]
pub struct VortexFlow {
    center: Vec2,
    circulation: f64,
}

impl VortexFlow {
    #[must_use]
    pub fn new(center: Vec2, circulation: f64) -> Self {
        Self {
            center,
            circulation,
        }
    }
}

impl FlowField for VortexFlow {
    fn value(&self, _t: f64, x: Vec2) -> Vec2 {
        let d = x - self.center;
        let r2 = d.norm_squared();
        if r2.sqrt() < radius_floor(self.center) {
            return Vec2::zeros();
        }
        self.circulation / (2.0 * PI * r2) * Vec2::new(-d.y, d.x)
    }

    fn d_value(&self, _t: f64, x: Vec2) -> Mat2 {
        let d = x - self.center;
        let r2 = d.norm_squared();
        if r2.sqrt() < radius_floor(self.center) {
            return Mat2::zeros();
        }
        let c = self.circulation / (2.0 * PI * r2 * r2);
        let off = d.y * d.y - d.x * d.x;
        Mat2::new(2.0 * d.x * d.y, off, off, -2.0 * d.x * d.y) * c
    }
}

/// Rankine vortex: solid-body rotation inside the core, potential vortex
/// outside. Regular everywhere, continuous at the core radius.
#[derive(Debug, Clone, Copy)]
pub struct RankineVortexFlow {
    center: Vec2,
    circulation: f64,
    core_radius: f64,
}

impl RankineVortexFlow {
    #[must_use]
    pub fn new(center: Vec2, circulation: f64, core_radius: f64) -> Self {
        Self {
            center,
            circulation,
            core_radius,
        }
    }
}

impl FlowField for RankineVortexFlow {
    fn value(&self, t: f64, x: Vec2) -> Vec2 {
        let d = x - self.center;
        let r = d.norm();
        if r <= self.core_radius {
            let c = self.circulation / (2.0 * PI * self.core_radius * self.core_radius);
            c * Vec2::new(-d.y, d.x)
        } else {
            VortexFlow::new(self.center, self.circulation).value(t, x)
        }
    }

    fn d_value(&self, t: f64, x: Vec2) -> Mat2 {
        let d = x - self.center;
        if d.norm() <= self.core_radius {
            let c = self.circulation / (2.0 * PI * self.core_radius * self.core_radius);
            Mat2::new(0.0, -c, c, 0.0)
        } else {
            VortexFlow::new(self.center, self.circulation).d_value(t, x)
        }
    }
}

/// Potential-theory source (positive flux) or sink (negative flux).
///
/// Radial field `Φ / (2πr) e_r`. Singular at the center (see
/// [`radius_floor`]).
#[derive(Debug, Clone, Copy)]
pub struct SourceFlow {
    center: Vec2,
    flux: f64,
}

impl SourceFlow {
    #[must_use]
    pub fn new(center: Vec2, flux: f64) -> Self {
        Self { center, flux }
    }
}

impl FlowField for SourceFlow {
    fn value(&self, _t: f64, x: Vec2) -> Vec2 {
        let d = x - self.center;
        let r2 = d.norm_squared();
        if r2.sqrt() < radius_floor(self.center) {
            return Vec2::zeros();
        }
        self.flux / (2.0 * PI * r2) * d
    }

    fn d_value(&self, _t: f64, x: Vec2) -> Mat2 {
        let d = x - self.center;
        let r2 = d.norm_squared();
        if r2.sqrt() < radius_floor(self.center) {
            return Mat2::zeros();
        }
        let c = self.flux / (2.0 * PI * r2 * r2);
        let diag = d.y * d.y - d.x * d.x;
        Mat2::new(diag, -2.0 * d.x * d.y, -2.0 * d.x * d.y, -diag) * c
    }
}

/// Steady recirculating double gyre on a rectangular cell.
///
/// Stream function `ψ = (A·lx/π) sin(π(x−x0)/lx) sin(π(y−y0)/ly)`, so the
/// field is divergence-free and `A` is the peak speed for square cells.
#[derive(Debug, Clone, Copy)]
pub struct DoubleGyreFlow {
    origin: Vec2,
    wavelength: Vec2,
    amplitude: f64,
}

impl DoubleGyreFlow {
    #[must_use]
    pub fn new(origin: Vec2, wavelength: Vec2, amplitude: f64) -> Self {
        Self {
            origin,
            wavelength,
            amplitude,
        }
    }

    fn phases(&self, x: Vec2) -> (f64, f64) {
        (
            PI * (x.x - self.origin.x) / self.wavelength.x,
            PI * (x.y - self.origin.y) / self.wavelength.y,
        )
    }
}

impl FlowField for DoubleGyreFlow {
    fn value(&self, _t: f64, x: Vec2) -> Vec2 {
        let (px, py) = self.phases(x);
        let aspect = self.wavelength.x / self.wavelength.y;
        Vec2::new(
            -self.amplitude * aspect * px.sin() * py.cos(),
            self.amplitude * px.cos() * py.sin(),
        )
    }

    fn d_value(&self, _t: f64, x: Vec2) -> Mat2 {
        let (px, py) = self.phases(x);
        let kx = PI / self.wavelength.x;
        let ky = PI / self.wavelength.y;
        let aspect = self.wavelength.x / self.wavelength.y;
        let a = self.amplitude;
        Mat2::new(
            -a * aspect * kx * px.cos() * py.cos(),
            a * aspect * ky * px.sin() * py.sin(),
            -a * kx * px.sin() * py.sin(),
            a * ky * px.cos() * py.cos(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Centered finite-difference Jacobian, for checking the analytic ones.
    fn fd_jacobian(field: &dyn FlowField, x: Vec2, eps: f64) -> Mat2 {
        let mut j = Mat2::zeros();
        for axis in 0..2 {
            let mut e = Vec2::zeros();
            e[axis] = eps;
            let dv = (field.value(0.0, x + e) - field.value(0.0, x - e)) / (2.0 * eps);
            j[(0, axis)] = dv.x;
            j[(1, axis)] = dv.y;
        }
        j
    }

    #[test]
    fn linear_flow_matches_its_gradient() {
        let a = Mat2::new(0.1, 0.4, -0.2, 0.3);
        let flow = LinearFlow::new(a, Vec2::new(1.0, 2.0), Vec2::new(5.0, -1.0));
        let x = Vec2::new(3.0, -4.0);
        let fd = fd_jacobian(&flow, x, 1e-6);
        assert_relative_eq!(flow.d_value(0.0, x), fd, max_relative = 1e-6);
        assert_relative_eq!(
            flow.value(0.0, Vec2::new(1.0, 2.0)),
            Vec2::new(5.0, -1.0)
        );
    }

    #[test]
    fn vortex_is_tangential_and_jacobian_checks_out() {
        let flow = VortexFlow::new(Vec2::new(1.0, 1.0), 2.0 * PI);
        let x = Vec2::new(2.0, 1.0);
        let v = flow.value(0.0, x);
        // Circulation 2π at unit radius gives unit tangential speed, ccw
        assert_relative_eq!(v, Vec2::new(0.0, 1.0), epsilon = 1e-12);
        let fd = fd_jacobian(&flow, x, 1e-6);
        assert_relative_eq!(flow.d_value(0.0, x), fd, max_relative = 1e-5);
    }

    #[test]
    fn vortex_center_is_clamped_to_zero() {
        let center = Vec2::new(0.5, -0.5);
        let flow = VortexFlow::new(center, 100.0);
        assert_eq!(flow.value(0.0, center), Vec2::zeros());
        assert_eq!(flow.d_value(0.0, center), Mat2::zeros());
    }

    #[test]
    fn rankine_vortex_is_continuous_at_core_radius() {
        let flow = RankineVortexFlow::new(Vec2::zeros(), 10.0, 2.0);
        let just_in = flow.value(0.0, Vec2::new(2.0 - 1e-9, 0.0));
        let just_out = flow.value(0.0, Vec2::new(2.0 + 1e-9, 0.0));
        assert_relative_eq!(just_in, just_out, epsilon = 1e-7);
    }

    #[test]
    fn source_jacobian_checks_out() {
        let flow = SourceFlow::new(Vec2::new(-1.0, 2.0), 3.0);
        let x = Vec2::new(0.5, 0.5);
        let fd = fd_jacobian(&flow, x, 1e-6);
        assert_relative_eq!(flow.d_value(0.0, x), fd, max_relative = 1e-5);
    }

    #[test]
    fn double_gyre_is_divergence_free() {
        let flow = DoubleGyreFlow::new(Vec2::zeros(), Vec2::new(500.0, 500.0), 1.0);
        for &(x, y) in &[(100.0, 200.0), (333.0, 71.0), (450.0, 450.0)] {
            let j = flow.d_value(0.0, Vec2::new(x, y));
            assert_relative_eq!(j.trace(), 0.0, epsilon = 1e-12);
            let fd = fd_jacobian(&flow, Vec2::new(x, y), 1e-4);
            assert_relative_eq!(j, fd, max_relative = 1e-6, epsilon = 1e-9);
        }
    }

    #[test]
    fn two_sectors_switches_at_separation() {
        let flow = TwoSectorsFlow::midway(3.0, -2.0, 10.0);
        assert_eq!(flow.value(0.0, Vec2::new(4.9, 0.0)).y, 3.0);
        assert_eq!(flow.value(0.0, Vec2::new(5.1, 0.0)).y, -2.0);
        assert_eq!(flow.value(0.0, Vec2::new(4.9, 0.0)).x, 0.0);
    }
}
