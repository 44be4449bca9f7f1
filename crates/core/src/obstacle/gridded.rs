//! Obstacle value functions sampled on a regular mesh.
//!
//! Same interpolation discipline as gridded flow fields: uniform node
//! placement inclusive of the box corners, deterministic nearest-edge
//! clamping outside the sampled region, and gradients taken as the
//! analytic derivative of the interpolant rather than finite differences.

use crate::core_types::Vec2;
use crate::error::{ZermeloError, ZermeloResult};
use crate::flow::Interpolation;

/// Dense scalar samples on a regular mesh, time-major then x-major.
pub struct GriddedScalar {
    values: Vec<f64>,
    nt: usize,
    nx: usize,
    ny: usize,
    bl: Vec2,
    tr: Vec2,
    t_start: f64,
    t_end: f64,
    interp: Interpolation,
}

impl GriddedScalar {
    /// Build a steady sampled scalar field.
    ///
    /// `bounds` must have rank 2; `values.len()` must equal `nx · ny`.
    pub fn steady(
        values: Vec<f64>,
        nx: usize,
        ny: usize,
        bounds: &[[f64; 2]],
        interp: Interpolation,
    ) -> ZermeloResult<Self> {
        if bounds.len() != 2 {
            return Err(ZermeloError::ShapeMismatch {
                what: "steady obstacle grid bounds",
                expected: 2,
                got: bounds.len(),
            });
        }
        Self::build(values, 1, nx, ny, bounds[0], bounds[1], 0.0, 0.0, interp)
    }

    /// Build an unsteady sampled scalar field.
    ///
    /// `bounds` must have rank 3; `values.len()` must equal `nt · nx · ny`.
    pub fn unsteady(
        values: Vec<f64>,
        nt: usize,
        nx: usize,
        ny: usize,
        bounds: &[[f64; 2]],
        interp: Interpolation,
    ) -> ZermeloResult<Self> {
        if bounds.len() != 3 {
            return Err(ZermeloError::ShapeMismatch {
                what: "unsteady obstacle grid bounds",
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
        values: Vec<f64>,
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
                what: "obstacle grid samples",
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

    /// Center of the sampled box; used as the obstacle reference point.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        0.5 * (self.bl + self.tr)
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

    fn at(&self, k: usize, i: usize, j: usize) -> f64 {
        self.values[(k * self.nx + i) * self.ny + j]
    }

    fn grid_coords(&self, x: Vec2) -> (f64, f64) {
        let gx = ((x.x - self.bl.x) / self.cell_dx()).clamp(0.0, (self.nx - 1) as f64);
        let gy = ((x.y - self.bl.y) / self.cell_dy()).clamp(0.0, (self.ny - 1) as f64);
        (gx, gy)
    }

    fn split(g: f64, n: usize) -> (usize, f64) {
        let i0 = (g.floor() as usize).min(n - 2);
        (i0, g - i0 as f64)
    }

    fn time_cell(&self, t: f64) -> (usize, f64) {
        if self.nt == 1 {
            return (0, 0.0);
        }
        let gt = ((t - self.t_start) / self.cell_dt()).clamp(0.0, (self.nt - 1) as f64);
        Self::split(gt, self.nt)
    }

    fn slice_bilinear(&self, k: usize, i0: usize, j0: usize, fx: f64, fy: f64) -> f64 {
        self.at(k, i0, j0) * (1.0 - fx) * (1.0 - fy)
            + self.at(k, i0 + 1, j0) * fx * (1.0 - fy)
            + self.at(k, i0, j0 + 1) * (1.0 - fx) * fy
            + self.at(k, i0 + 1, j0 + 1) * fx * fy
    }

    fn slice_gradient(&self, k: usize, i0: usize, j0: usize, fx: f64, fy: f64) -> Vec2 {
        let gx = ((self.at(k, i0 + 1, j0) - self.at(k, i0, j0)) * (1.0 - fy)
            + (self.at(k, i0 + 1, j0 + 1) - self.at(k, i0, j0 + 1)) * fy)
            / self.cell_dx();
        let gy = ((self.at(k, i0, j0 + 1) - self.at(k, i0, j0)) * (1.0 - fx)
            + (self.at(k, i0 + 1, j0 + 1) - self.at(k, i0 + 1, j0)) * fx)
            / self.cell_dy();
        Vec2::new(gx, gy)
    }

    /// Interpolated value at `(t, x)`.
    #[must_use]
    pub fn value(&self, t: f64, x: Vec2) -> f64 {
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
                if self.nt == 1 {
                    self.slice_bilinear(0, i0, j0, fx, fy)
                } else {
                    let (k0, ft) = self.time_cell(t);
                    self.slice_bilinear(k0, i0, j0, fx, fy) * (1.0 - ft)
                        + self.slice_bilinear(k0 + 1, i0, j0, fx, fy) * ft
                }
            }
        }
    }

    /// Spatial gradient of the interpolant at `(t, x)`.
    #[must_use]
    pub fn gradient(&self, t: f64, x: Vec2) -> Vec2 {
        match self.interp {
            Interpolation::Nearest => Vec2::zeros(),
            Interpolation::Bilinear => {
                let (gx, gy) = self.grid_coords(x);
                let (i0, fx) = Self::split(gx, self.nx);
                let (j0, fy) = Self::split(gy, self.ny);
                if self.nt == 1 {
                    self.slice_gradient(0, i0, j0, fx, fy)
                } else {
                    let (k0, ft) = self.time_cell(t);
                    self.slice_gradient(k0, i0, j0, fx, fy) * (1.0 - ft)
                        + self.slice_gradient(k0 + 1, i0, j0, fx, fy) * ft
                }
            }
        }
    }

    /// Time slope of the interpolant at `(t, x)`; zero for steady fields.
    #[must_use]
    pub fn time_derivative(&self, t: f64, x: Vec2) -> f64 {
        if self.nt == 1 || self.interp == Interpolation::Nearest {
            return 0.0;
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
    use approx::assert_relative_eq;

    /// Sample the plane z = 2x - y + 1 on [0,4]^2 with 5x5 nodes.
    fn plane_grid() -> GriddedScalar {
        let mut values = Vec::with_capacity(25);
        for i in 0..5 {
            for j in 0..5 {
                let (x, y) = (i as f64, j as f64);
                values.push(2.0 * x - y + 1.0);
            }
        }
        GriddedScalar::steady(values, 5, 5, &[[0.0, 4.0], [0.0, 4.0]], Interpolation::Bilinear)
            .expect("valid grid")
    }

    #[test]
    fn plane_is_reproduced_with_its_gradient() {
        let grid = plane_grid();
        let x = Vec2::new(1.3, 2.7);
        assert_relative_eq!(grid.value(0.0, x), 2.0 * 1.3 - 2.7 + 1.0, max_relative = 1e-12);
        assert_relative_eq!(grid.gradient(0.0, x), Vec2::new(2.0, -1.0), max_relative = 1e-12);
    }

    #[test]
    fn clamps_outside_the_sampled_box() {
        let grid = plane_grid();
        assert_relative_eq!(
            grid.value(0.0, Vec2::new(-3.0, 2.0)),
            grid.value(0.0, Vec2::new(0.0, 2.0))
        );
    }

    #[test]
    fn rank_mismatch_is_rejected() {
        let bad = GriddedScalar::steady(
            vec![0.0; 4],
            2,
            2,
            &[[0.0, 1.0]],
            Interpolation::Bilinear,
        );
        assert!(matches!(bad, Err(ZermeloError::ShapeMismatch { .. })));
    }

    #[test]
    fn unsteady_time_slope() {
        // Constant 1.0 at t=0, constant 5.0 at t=2
        let mut values = vec![1.0; 8];
        for v in values.iter_mut().skip(4) {
            *v = 5.0;
        }
        let grid = GriddedScalar::unsteady(
            values,
            2,
            2,
            2,
            &[[0.0, 2.0], [0.0, 1.0], [0.0, 1.0]],
            Interpolation::Bilinear,
        )
        .expect("valid grid");
        let x = Vec2::new(0.5, 0.5);
        assert_relative_eq!(grid.value(1.0, x), 3.0);
        assert_relative_eq!(grid.time_derivative(1.0, x), 2.0);
    }
}
