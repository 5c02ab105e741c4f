use std::ops::Range;

use ndarray::Array1;

use crate::error::{ModelError, ModelResult};

/// Cells at each edge that the 4-point stencil never updates.
pub const MARGIN: usize = 5;

/// Smallest grid that leaves at least one interior point.
pub const MIN_POINTS: usize = 2 * MARGIN + 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub nx: usize, // Number of grid points
    pub dx: f64,   // Grid spacing (meters)
}

impl Grid {
    pub fn new(nx: usize, dx: f64) -> ModelResult<Self> {
        if nx < MIN_POINTS {
            return Err(ModelError::config(
                "nx",
                nx,
                format!("must be at least {MIN_POINTS} to leave a {MARGIN}-cell margin on each side"),
            ));
        }
        if dx <= 0.0 || !dx.is_finite() {
            return Err(ModelError::config("dx", dx, "must be positive and finite"));
        }
        Ok(Grid { nx, dx })
    }

    pub fn x_coord(&self, i: usize) -> f64 {
        // Convert grid index i to physical x coordinate
        self.dx * (i as f64)
    }

    pub fn coordinates(&self) -> Array1<f64> {
        Array1::from_shape_fn(self.nx, |i| self.x_coord(i))
    }

    pub fn width(&self) -> f64 {
        (self.nx - 1) as f64 * self.dx
    }

    /// Indices touched by the field updates.
    pub fn interior(&self) -> Range<usize> {
        interior(self.nx)
    }

    pub fn in_interior(&self, i: usize) -> bool {
        self.interior().contains(&i)
    }
}

pub fn interior(nx: usize) -> Range<usize> {
    MARGIN..nx.saturating_sub(MARGIN).max(MARGIN)
}

/// Checks that a source or receiver index sits where the field is updated.
pub fn check_interior_index(parameter: &str, index: usize, nx: usize) -> ModelResult<()> {
    let range = interior(nx);
    if !range.contains(&index) {
        return Err(ModelError::config(
            parameter,
            index,
            format!("must lie in [{}, {})", range.start, range.end),
        ));
    }
    Ok(())
}
