//! Fourth-order staggered-grid first derivative.
//!
//! Pressure lives on integer nodes and particle velocity on half nodes, so the
//! derivative of one field lands on the nodes of the other. The two stencil
//! orientations are mirror images of each other.

use std::ops::Range;

use ndarray::{s, ArrayView1, ArrayViewMut1, Zip};

use crate::grid::Grid;

/// Weight of the nearest pair of samples.
pub const NEAR: f64 = 9.0 / 8.0;
/// Weight of the outer pair of samples.
pub const FAR: f64 = 1.0 / 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staggering {
    /// Derivative at `k + 1/2` from samples `k-1 ..= k+2`. Used on `vx`
    /// to drive the pressure update.
    Forward,
    /// Derivative at `k - 1/2` from samples `k-2 ..= k+1`. Used on `p`
    /// to drive the velocity update.
    Backward,
}

/// How a spatial loop is spread across threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    Serial,
    #[default]
    Parallel,
}

#[inline]
pub fn derivative_at(f: ArrayView1<f64>, k: usize, staggering: Staggering, dx: f64) -> f64 {
    match staggering {
        Staggering::Forward => (NEAR * (f[k + 1] - f[k]) - FAR * (f[k + 2] - f[k - 1])) / dx,
        Staggering::Backward => (NEAR * (f[k] - f[k - 1]) - FAR * (f[k + 1] - f[k - 2])) / dx,
    }
}

#[derive(Debug, Clone)]
pub struct Stencil {
    pub staggering: Staggering,
    dx: f64,
    range: Range<usize>,
}

impl Stencil {
    pub fn new(staggering: Staggering, grid: &Grid) -> Self {
        Self {
            staggering,
            dx: grid.dx,
            range: grid.interior(),
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Writes the derivative of `f` into `out` over the interior. Entries of
    /// `out` outside the interior are left as they are.
    pub fn apply(&self, f: ArrayView1<f64>, mut out: ArrayViewMut1<f64>, execution: Execution) {
        debug_assert_eq!(f.len(), out.len());
        let start = self.range.start;
        let (staggering, dx) = (self.staggering, self.dx);
        let interior = out.slice_mut(s![self.range.start..self.range.end]);
        let zip = Zip::indexed(interior);

        match execution {
            Execution::Serial => {
                zip.for_each(|j, d| *d = derivative_at(f, start + j, staggering, dx));
            }
            Execution::Parallel => {
                zip.par_for_each(|j, d| *d = derivative_at(f, start + j, staggering, dx));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array1;

    fn cubic(x: f64) -> f64 {
        x * x * x - 2.0 * x * x + x
    }

    fn cubic_slope(x: f64) -> f64 {
        3.0 * x * x - 4.0 * x + 1.0
    }

    #[test]
    fn weights_sum_to_unit_slope() {
        // 9/8 * 1 - 1/24 * 3 = 1 on a unit ramp
        assert_abs_diff_eq!(NEAR - 3.0 * FAR, 1.0, epsilon = 1e-15);
    }

    #[test]
    fn exact_for_cubics_at_half_nodes() {
        let dx = 0.5;
        let f = Array1::from_shape_fn(24, |i| cubic(i as f64 * dx));
        for k in 5..19 {
            let forward = derivative_at(f.view(), k, Staggering::Forward, dx);
            assert_abs_diff_eq!(forward, cubic_slope((k as f64 + 0.5) * dx), epsilon = 1e-10);
            let backward = derivative_at(f.view(), k, Staggering::Backward, dx);
            assert_abs_diff_eq!(backward, cubic_slope((k as f64 - 0.5) * dx), epsilon = 1e-10);
        }
    }

    #[test]
    fn mirrored_stencils_are_shifted_copies() {
        let f = Array1::from_shape_fn(30, |i| (0.3 * i as f64).sin());
        for k in 5..24 {
            let fwd = derivative_at(f.view(), k, Staggering::Forward, 1.0);
            let bwd = derivative_at(f.view(), k + 1, Staggering::Backward, 1.0);
            assert_eq!(fwd, bwd);
        }
    }

    #[test]
    fn margins_are_left_untouched() {
        let grid = Grid::new(20, 1.0).unwrap();
        let f = Array1::from_shape_fn(20, |i| (i * i) as f64);
        for staggering in [Staggering::Forward, Staggering::Backward] {
            let stencil = Stencil::new(staggering, &grid);
            let mut out = Array1::from_elem(20, 7.0);
            stencil.apply(f.view(), out.view_mut(), Execution::Serial);
            for i in (0..5).chain(15..20) {
                assert_eq!(out[i], 7.0);
            }
            for i in 5..15 {
                assert_ne!(out[i], 7.0);
            }
        }
    }

    #[test]
    fn parallel_matches_serial() {
        let grid = Grid::new(257, 2.5).unwrap();
        let f = Array1::from_shape_fn(257, |i| (0.05 * i as f64).cos() * i as f64);
        let stencil = Stencil::new(Staggering::Backward, &grid);
        let mut serial = Array1::zeros(257);
        let mut parallel = Array1::zeros(257);
        stencil.apply(f.view(), serial.view_mut(), Execution::Serial);
        stencil.apply(f.view(), parallel.view_mut(), Execution::Parallel);
        assert_eq!(serial, parallel);
    }
}
