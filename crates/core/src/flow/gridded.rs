//! Flow fields sampled on a regular mesh.
//!
//! A gridded field stores dense vector samples on a uniform space (and
//! optionally time) grid and answers queries through an interpolant.
//! Queries outside the sampled box or time window never fail: they clamp
//! to the nearest edge, since trajectories legitimately probe near domain
//! edges. The Jacobian is the analytic derivative of the interpolant, not
//! a finite difference of it.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core_types::{Mat2, Vec2};
use crate::error::{ZermeloError, ZermeloResult};
use crate::flow::FlowField;

/// Interpolation discipline for gridded fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Piecewise-multilinear in space (and linear in time when unsteady).
    Bilinear,
    /// Piecewise-constant: snap to the nearest grid node.
    Nearest,
}

impl FromStr for Interpolation {
    type Err = ZermeloError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bilinear" | "linear" => Ok(Interpolation::Bilinear),
            "nearest" | "pwc" => Ok(Interpolation::Nearest),
            other => Err(ZermeloError::UnknownInterpolation(other.to_string())),
        }
    }
}

/// Dense flow samples on a regular mesh.
///
/// Sample layout is time-major, then x-major: index `(k·nx + i)·ny + j`
/// for time slice `k` and node `(i, j)`. Steady fields hold a single
/// slice. The mesh spans `[bl, tr]` with `nx × ny` nodes inclusive of the
/// corners, matching the front tracker's grid convention.
pub struct GriddedFlow {
    values: Vec<Vec2>,
    nt: usize,
    nx: usize,
    ny: usize,
    bl: Vec2,
    tr: Vec2,
    t_start: f64,
    t_end: f64,
    interp: Interpolation,
}

impl GriddedFlow {
    /// Build a steady gridded field from raw samples.
    ///
    /// `bounds` must have rank 2 (`[[x_min, x_max], [y_min, y_max]]`) and
    /// `values.len()` must equal `nx · ny`.
    pub fn steady(
        values: Vec<Vec2>,
        nx: usize,
        ny: usize,
        bounds: &[[f64; 2]],
        interp: Interpolation,
    ) -> ZermeloResult<Self> {
        if bounds.len() != 2 {
            return Err(ZermeloError::ShapeMismatch {
                what: "steady flow grid bounds",
                expected: 2,
                got: bounds.len(),
            });
        }
        Self::build(values, 1, nx, ny, bounds[0], bounds[1], 0.0, 0.0, interp)
    }

    /// Build an unsteady gridded field from raw samples.
    ///
    /// `bounds` must have rank 3 (`[[t_min, t_max], [x_min, x_max],
    /// [y_min, y_max]]`) and `values.len()` must equal `nt · nx · ny`.
    pub fn unsteady(
        values: Vec<Vec2>,
        nt: usize,
        nx: usize,
        ny: usize,
        bounds: &[[f64; 2]],
        interp: Interpolation,
    ) -> ZermeloResult<Self> {
        if bounds.len() != 3 {
            return Err(ZermeloError::ShapeMismatch {
                what: "unsteady flow grid bounds",
                expected: 3,
                got: bounds.len(),
            });
        }
        if nt < 2 {
            return Err(ZermeloError::InvalidGrid {
                what: format!("unsteady field needs nt >= 2, got {nt}"),
            });
        }
        let [t_start, t_end] = bounds[0];
        if t_end - t_start <= 0.0 {
            return Err(ZermeloError::InvalidGrid {
                what: format!("time window [{t_start}, {t_end}] is empty"),
            });
        }
        Self::build(values, nt, nx, ny, bounds[1], bounds[2], t_start, t_end, interp)
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        values: Vec<Vec2>,
        nt: usize,
        nx: usize,
        ny: usize,
        xb: [f64; 2],
        yb: [f64; 2],
        t_start: f64,
        t_end: f64,
        interp: Interpolation,
    ) -> ZermeloResult<Self> {
        if nx < 2 || ny < 2 {
            return Err(ZermeloError::InvalidGrid {
                what: format!("grid needs at least 2x2 nodes, got {nx}x{ny}"),
            });
        }
        if xb[1] - xb[0] <= 0.0 || yb[1] - yb[0] <= 0.0 {
            return Err(ZermeloError::InvalidGrid {
                what: "bounding box corners are inverted or degenerate".to_string(),
            });
        }
        let expected = nt * nx * ny;
        if values.len() != expected {
            return Err(ZermeloError::ShapeMismatch {
                what: "flow grid samples",
                expected,
                got: values.len(),
            });
        }
        Ok(Self {
            values,
            nt,
            nx,
            ny,
            bl: Vec2::new(xb[0], yb[0]),
            tr: Vec2::new(xb[1], yb[1]),
            t_start,
            t_end,
            interp,
        })
    }

    /// Tabulate a steady field by evaluating `field` at every mesh node
    /// (at `t = 0`). This is the only supported path from analytic to
    /// gridded form; cost is O(nx·ny).
    pub fn sample_steady(
        field: &dyn FlowField,
        nx: usize,
        ny: usize,
        bl: Vec2,
        tr: Vec2,
        interp: Interpolation,
    ) -> ZermeloResult<Self> {
        let bounds = [[bl.x, tr.x], [bl.y, tr.y]];
        let mut probe = Self::build(vec![Vec2::zeros(); nx * ny], 1, nx, ny, bounds[0], bounds[1], 0.0, 0.0, interp)?;
        for i in 0..nx {
            for j in 0..ny {
                let node = probe.node(i, j);
                probe.values[i * ny + j] = field.value(0.0, node);
            }
        }
        Ok(probe)
    }

    /// Tabulate an unsteady field over `nt` uniform time slices spanning
    /// `t_span`. Cost is O(nt·nx·ny).
    #[allow(clippy::too_many_arguments)]
    pub fn sample_unsteady(
        field: &dyn FlowField,
        nt: usize,
        nx: usize,
        ny: usize,
        bl: Vec2,
        tr: Vec2,
        t_span: (f64, f64),
        interp: Interpolation,
    ) -> ZermeloResult<Self> {
        let bounds = [[t_span.0, t_span.1], [bl.x, tr.x], [bl.y, tr.y]];
        let mut probe = Self::unsteady(vec![Vec2::zeros(); nt * nx * ny], nt, nx, ny, &bounds, interp)?;
        for k in 0..nt {
            let t = probe.time_node(k);
            for i in 0..nx {
                for j in 0..ny {
                    let node = probe.node(i, j);
                    probe.values[(k * nx + i) * ny + j] = field.value(t, node);
                }
            }
        }
        Ok(probe)
    }

    /// Bottom-left corner of the sampled box.
    #[must_use]
    pub fn bl(&self) -> Vec2 {
        self.bl
    }

    /// Top-right corner of the sampled box.
    #[must_use]
    pub fn tr(&self) -> Vec2 {
        self.tr
    }

    fn cell_dx(&self) -> f64 {
        (self.tr.x - self.bl.x) / (self.nx - 1) as f64
    }

    fn cell_dy(&self) -> f64 {
        (self.tr.y - self.bl.y) / (self.ny - 1) as f64
    }

    fn cell_dt(&self) -> f64 {
        (self.t_end - self.t_start) / (self.nt - 1) as f64
    }

    fn node(&self, i: usize, j: usize) -> Vec2 {
        self.bl + Vec2::new(self.cell_dx() * i as f64, self.cell_dy() * j as f64)
    }

    fn time_node(&self, k: usize) -> f64 {
        self.t_start + self.cell_dt() * k as f64
    }

    fn at(&self, k: usize, i: usize, j: usize) -> Vec2 {
        self.values[(k * self.nx + i) * self.ny + j]
    }

    /// Continuous grid coordinates of `x`, clamped to the sampled box.
    fn grid_coords(&self, x: Vec2) -> (f64, f64) {
        let gx = ((x.x - self.bl.x) / self.cell_dx()).clamp(0.0, (self.nx - 1) as f64);
        let gy = ((x.y - self.bl.y) / self.cell_dy()).clamp(0.0, (self.ny - 1) as f64);
        (gx, gy)
    }

    /// Cell index and fractional offset along one axis.
    fn split(g: f64, n: usize) -> (usize, f64) {
        let i0 = (g.floor() as usize).min(n - 2);
        (i0, g - i0 as f64)
    }

    /// Time cell bracketing `t`, clamped to the sampled window.
    fn time_cell(&self, t: f64) -> (usize, f64) {
        if self.nt == 1 {
            return (0, 0.0);
        }
        let gt = ((t - self.t_start) / self.cell_dt()).clamp(0.0, (self.nt - 1) as f64);
        Self::split(gt, self.nt)
    }

    fn slice_bilinear(&self, k: usize, i0: usize, j0: usize, fx: f64, fy: f64) -> Vec2 {
        self.at(k, i0, j0) * (1.0 - fx) * (1.0 - fy)
            + self.at(k, i0 + 1, j0) * fx * (1.0 - fy)
            + self.at(k, i0, j0 + 1) * (1.0 - fx) * fy
            + self.at(k, i0 + 1, j0 + 1) * fx * fy
    }

    /// Spatial slope of the bilinear patch at fractional offsets, one
    /// column of the Jacobian per axis.
    fn slice_jacobian(&self, k: usize, i0: usize, j0: usize, fx: f64, fy: f64) -> Mat2 {
        let col_x = ((self.at(k, i0 + 1, j0) - self.at(k, i0, j0)) * (1.0 - fy)
            + (self.at(k, i0 + 1, j0 + 1) - self.at(k, i0, j0 + 1)) * fy)
            / self.cell_dx();
        let col_y = ((self.at(k, i0, j0 + 1) - self.at(k, i0, j0)) * (1.0 - fx)
            + (self.at(k, i0 + 1, j0 + 1) - self.at(k, i0 + 1, j0)) * fx)
            / self.cell_dy();
        Mat2::from_columns(&[col_x, col_y])
    }
}

impl FlowField for GriddedFlow {
    fn value(&self, t: f64, x: Vec2) -> Vec2 {
        let (gx, gy) = self.grid_coords(x);
        match self.interp {
            Interpolation::Nearest => {
                let i = (gx.round() as usize).min(self.nx - 1);
                let j = (gy.round() as usize).min(self.ny - 1);
                let k = if self.nt == 1 {
                    0
                } else {
                    let (k0, ft) = self.time_cell(t);
                    if ft < 0.5 { k0 } else { k0 + 1 }
                };
                self.at(k, i, j)
            }
            Interpolation::Bilinear => {
                let (i0, fx) = Self::split(gx, self.nx);
                let (j0, fy) = Self::split(gy, self.ny);
                let (k0, ft) = self.time_cell(t);
                if self.nt == 1 {
                    self.slice_bilinear(0, i0, j0, fx, fy)
                } else {
                    self.slice_bilinear(k0, i0, j0, fx, fy) * (1.0 - ft)
                        + self.slice_bilinear(k0 + 1, i0, j0, fx, fy) * ft
                }
            }
        }
    }

    fn d_value(&self, t: f64, x: Vec2) -> Mat2 {
        match self.interp {
            // Piecewise constant: zero slope almost everywhere
            Interpolation::Nearest => Mat2::zeros(),
            Interpolation::Bilinear => {
                let (gx, gy) = self.grid_coords(x);
                let (i0, fx) = Self::split(gx, self.nx);
                let (j0, fy) = Self::split(gy, self.ny);
                let (k0, ft) = self.time_cell(t);
                if self.nt == 1 {
                    self.slice_jacobian(0, i0, j0, fx, fy)
                } else {
                    self.slice_jacobian(k0, i0, j0, fx, fy) * (1.0 - ft)
                        + self.slice_jacobian(k0 + 1, i0, j0, fx, fy) * ft
                }
            }
        }
    }

    fn time_derivative(&self, t: f64, x: Vec2) -> Vec2 {
        if self.nt == 1 || self.interp == Interpolation::Nearest {
            return Vec2::zeros();
        }
        let (gx, gy) = self.grid_coords(x);
        let (i0, fx) = Self::split(gx, self.nx);
        let (j0, fy) = Self::split(gy, self.ny);
        let (k0, _) = self.time_cell(t);
        (self.slice_bilinear(k0 + 1, i0, j0, fx, fy) - self.slice_bilinear(k0, i0, j0, fx, fy))
            / self.cell_dt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{LinearFlow, UniformFlow};
    use approx::assert_relative_eq;

    fn affine() -> LinearFlow {
        let a = Mat2::new(0.5, -0.25, 1.0, 0.75);
        LinearFlow::new(a, Vec2::zeros(), Vec2::new(2.0, -3.0))
    }

    #[test]
    fn sampling_reproduces_values_at_nodes_exactly() {
        let field = affine();
        let bl = Vec2::new(-1.0, -2.0);
        let tr = Vec2::new(3.0, 2.0);
        let grid = GriddedFlow::sample_steady(&field, 9, 11, bl, tr, Interpolation::Bilinear)
            .expect("valid grid");
        for i in 0..9 {
            for j in 0..11 {
                let node = bl + Vec2::new(0.5 * i as f64, 0.4 * j as f64);
                assert_relative_eq!(
                    grid.value(0.0, node),
                    field.value(0.0, node),
                    max_relative = 1e-12
                );
            }
        }
    }

    #[test]
    fn bilinear_reproduces_affine_fields_off_node() {
        // An affine field lies within the interpolant's truncation order,
        // so reproduction off-node is exact up to rounding
        let field = affine();
        let grid = GriddedFlow::sample_steady(
            &field,
            5,
            5,
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 4.0),
            Interpolation::Bilinear,
        )
        .expect("valid grid");
        let x = Vec2::new(1.37, 2.61);
        assert_relative_eq!(grid.value(0.0, x), field.value(0.0, x), max_relative = 1e-12);
        assert_relative_eq!(grid.d_value(0.0, x), field.d_value(0.0, x), max_relative = 1e-12);
    }

    #[test]
    fn queries_outside_the_box_clamp_to_the_edge() {
        let field = affine();
        let bl = Vec2::new(0.0, 0.0);
        let tr = Vec2::new(4.0, 4.0);
        let grid =
            GriddedFlow::sample_steady(&field, 5, 5, bl, tr, Interpolation::Bilinear).expect("valid grid");
        let inside_edge = Vec2::new(4.0, 2.0);
        let outside = Vec2::new(10.0, 2.0);
        assert_relative_eq!(
            grid.value(0.0, outside),
            grid.value(0.0, inside_edge),
            max_relative = 1e-12
        );
    }

    #[test]
    fn nearest_mode_snaps_to_nodes() {
        let field = affine();
        let grid = GriddedFlow::sample_steady(
            &field,
            5,
            5,
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 4.0),
            Interpolation::Nearest,
        )
        .expect("valid grid");
        let near_node = Vec2::new(2.1, 2.9);
        assert_relative_eq!(
            grid.value(0.0, near_node),
            field.value(0.0, Vec2::new(2.0, 3.0)),
            max_relative = 1e-12
        );
        assert_eq!(grid.d_value(0.0, near_node), Mat2::zeros());
    }

    #[test]
    fn bounds_rank_mismatch_is_rejected() {
        let bad = GriddedFlow::steady(
            vec![Vec2::zeros(); 4],
            2,
            2,
            &[[0.0, 1.0], [0.0, 1.0], [0.0, 1.0]],
            Interpolation::Bilinear,
        );
        assert!(matches!(bad, Err(ZermeloError::ShapeMismatch { .. })));

        let bad_len = GriddedFlow::steady(
            vec![Vec2::zeros(); 3],
            2,
            2,
            &[[0.0, 1.0], [0.0, 1.0]],
            Interpolation::Bilinear,
        );
        assert!(matches!(bad_len, Err(ZermeloError::ShapeMismatch { .. })));
    }

    #[test]
    fn unsteady_field_interpolates_and_clamps_in_time() {
        // Two slices: uniform (1, 0) at t=0 and (3, 0) at t=10
        let mut values = vec![Vec2::new(1.0, 0.0); 2 * 2 * 2];
        for v in values.iter_mut().skip(4) {
            *v = Vec2::new(3.0, 0.0);
        }
        let bounds = [[0.0, 10.0], [0.0, 1.0], [0.0, 1.0]];
        let grid = GriddedFlow::unsteady(values, 2, 2, 2, &bounds, Interpolation::Bilinear)
            .expect("valid grid");
        let x = Vec2::new(0.5, 0.5);
        assert_relative_eq!(grid.value(5.0, x).x, 2.0);
        assert_relative_eq!(grid.value(-100.0, x).x, 1.0);
        assert_relative_eq!(grid.value(100.0, x).x, 3.0);
        assert_relative_eq!(grid.time_derivative(5.0, x).x, 0.2);
    }

    #[test]
    fn interpolation_parses_from_text() {
        assert_eq!("bilinear".parse::<Interpolation>().unwrap(), Interpolation::Bilinear);
        assert_eq!("pwc".parse::<Interpolation>().unwrap(), Interpolation::Nearest);
        assert!(matches!(
            "spline".parse::<Interpolation>(),
            Err(ZermeloError::UnknownInterpolation(_))
        ));
    }

    #[test]
    fn random_volumes_construct_and_answer_everywhere() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(42);
        let (nt, nx, ny) = (10, 20, 20);
        let values: Vec<Vec2> = (0..nt * nx * ny)
            .map(|_| Vec2::new(rng.random::<f64>(), rng.random::<f64>()))
            .collect();
        let bounds = [[0.0, 1.0], [0.0, 1.0], [0.0, 1.0]];
        let grid = GriddedFlow::unsteady(values, nt, nx, ny, &bounds, Interpolation::Bilinear)
            .expect("valid grid");
        // Interpolation stays inside the sample hull, even when clamping
        for &(t, x, y) in &[(0.5, 0.5, 0.5), (-1.0, 2.0, -2.0), (9.0, 0.99, 0.01)] {
            let v = grid.value(t, Vec2::new(x, y));
            assert!((0.0..=1.0).contains(&v.x), "u out of hull: {}", v.x);
            assert!((0.0..=1.0).contains(&v.y), "v out of hull: {}", v.y);
        }
    }

    #[test]
    fn uniform_field_samples_flat() {
        let grid = GriddedFlow::sample_steady(
            &UniformFlow::new(Vec2::new(-2.0, 7.0)),
            3,
            3,
            Vec2::zeros(),
            Vec2::new(1.0, 1.0),
            Interpolation::Bilinear,
        )
        .expect("valid grid");
        assert_relative_eq!(grid.value(0.0, Vec2::new(0.3, 0.7)), Vec2::new(-2.0, 7.0));
    }
}
