//! Finite-difference kernels for the level-set solver.
//!
//! All kernels operate on a 2-D scalar slice stored x-major (`i·ny + j`)
//! and are only defined on the interior ring; the outermost ring is filled
//! by copying the nearest interior value to every edge cell and the
//! nearest diagonal interior value to every corner. This extension is a
//! deliberate zero-Neumann-like simplification, not a physically derived
//! boundary condition; a one-sided stencil would be the principled
//! replacement but changes results near the frame.
//!
//! Cell updates are independent given the previous slice, so the interior
//! loops parallelize over grid rows.

use rayon::prelude::*;

use crate::core_types::Vec2;

/// Differencing axis of a 2-D slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Copy nearest-interior values onto the outer ring.
fn extend_boundary(res: &mut [f64], nx: usize, ny: usize) {
    for j in 1..ny - 1 {
        res[j] = res[ny + j];
        res[(nx - 1) * ny + j] = res[(nx - 2) * ny + j];
    }
    for i in 1..nx - 1 {
        res[i * ny] = res[i * ny + 1];
        res[i * ny + ny - 1] = res[i * ny + ny - 2];
    }
    res[0] = res[ny + 1];
    res[(nx - 1) * ny] = res[(nx - 2) * ny + 1];
    res[ny - 1] = res[ny + ny - 2];
    res[(nx - 1) * ny + ny - 1] = res[(nx - 2) * ny + ny - 2];
}

/// Run `kernel` over every interior cell, rows in parallel, then extend
/// the result onto the boundary ring.
fn interior_map<F>(nx: usize, ny: usize, kernel: F) -> Vec<f64>
where
    F: Fn(usize, usize) -> f64 + Sync,
{
    let mut res = vec![0.0; nx * ny];
    res[ny..(nx - 1) * ny]
        .par_chunks_mut(ny)
        .enumerate()
        .for_each(|(row, out)| {
            let i = row + 1;
            for j in 1..ny - 1 {
                out[j] = kernel(i, j);
            }
        });
    extend_boundary(&mut res, nx, ny);
    res
}

/// Centered first derivative along `axis` with spacing `delta`.
pub fn central_diff(field: &[f64], axis: Axis, delta: f64, nx: usize, ny: usize) -> Vec<f64> {
    interior_map(nx, ny, |i, j| match axis {
        Axis::X => (field[(i + 1) * ny + j] - field[(i - 1) * ny + j]) / (2.0 * delta),
        Axis::Y => (field[i * ny + j + 1] - field[i * ny + j - 1]) / (2.0 * delta),
    })
}

/// One-sided first derivative along `axis`, switched on the local
/// monotonicity of the field: the difference is taken on the side the
/// field decreases toward, centered across local extrema, and zero at a
/// local minimum.
pub fn upwind_diff(field: &[f64], axis: Axis, delta: f64, nx: usize, ny: usize) -> Vec<f64> {
    interior_map(nx, ny, |i, j| {
        let (prev, cur, next) = match axis {
            Axis::X => (
                field[(i - 1) * ny + j],
                field[i * ny + j],
                field[(i + 1) * ny + j],
            ),
            Axis::Y => (
                field[i * ny + j - 1],
                field[i * ny + j],
                field[i * ny + j + 1],
            ),
        };
        if prev < cur && cur < next {
            (cur - prev) / delta
        } else if prev > cur && cur > next {
            (next - cur) / delta
        } else if prev <= cur && cur >= next {
            (next - prev) / (2.0 * delta)
        } else {
            0.0
        }
    })
}

/// Norm of the slice gradient using centered differences, the stencil of
/// the isotropic (eikonal) growth term.
pub fn norm_grad_central(field: &[f64], dx: f64, dy: f64, nx: usize, ny: usize) -> Vec<f64> {
    let gx = central_diff(field, Axis::X, dx, nx, ny);
    let gy = central_diff(field, Axis::Y, dy, nx, ny);
    gx.iter()
        .zip(&gy)
        .map(|(a, b)| a.hypot(*b))
        .collect()
}

/// Advection term `w · ∇φ` with the classic sign-selected first-order
/// upwind stencil: the backward difference is weighted by `max(w, 0)` and
/// the forward difference by `min(w, 0)` per component, so information is
/// always taken from the side it propagates from.
pub fn advect_upwind(
    field: &[f64],
    flow: &[Vec2],
    dx: f64,
    dy: f64,
    nx: usize,
    ny: usize,
) -> Vec<f64> {
    interior_map(nx, ny, |i, j| {
        let idx = i * ny + j;
        let d_mx = (field[idx] - field[idx - ny]) / dx;
        let d_px = (field[idx + ny] - field[idx]) / dx;
        let d_my = (field[idx] - field[idx - 1]) / dy;
        let d_py = (field[idx + 1] - field[idx]) / dy;
        let w = flow[idx];
        w.x.max(0.0) * d_mx + w.x.min(0.0) * d_px + w.y.max(0.0) * d_my + w.y.min(0.0) * d_py
    })
}

/// Advection term `w · ∇φ` with centered differences, used by the
/// fractional-step scheme's transport stage.
pub fn advect_central(
    field: &[f64],
    flow: &[Vec2],
    dx: f64,
    dy: f64,
    nx: usize,
    ny: usize,
) -> Vec<f64> {
    let gx = central_diff(field, Axis::X, dx, nx, ny);
    let gy = central_diff(field, Axis::Y, dy, nx, ny);
    flow.iter()
        .zip(gx.iter().zip(&gy))
        .map(|(w, (a, b))| w.x * a + w.y * b)
        .collect()
}
