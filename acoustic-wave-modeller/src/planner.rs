use ndarray::Array1;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ModelError, ModelResult};
use crate::grid::{Grid, MIN_POINTS};

/// Largest Courant number at which the four-level scheme stays bounded in
/// practice. Values up to 1 are accepted but grow without bound over long runs.
pub const STABLE_COURANT: f64 = 0.55;

/// Resolution and stability targets the grid is derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannerInput {
    pub points_per_wavelength: f64, // c1
    pub courant_number: f64,        // c2
    pub nx: usize,
    pub total_time: f64, // T (s)
    pub frequency: f64,  // f0, dominant source frequency (Hz)
}

/// Derived discretization. Computed once before the run and never changed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Discretization {
    pub dx: f64,
    pub dt: f64,
    pub nx: usize,
    pub nt: usize,
    pub total_time: f64,
}

impl Discretization {
    pub fn grid(&self) -> ModelResult<Grid> {
        Grid::new(self.nx, self.dx)
    }

    pub fn time(&self, n: usize) -> f64 {
        n as f64 * self.dt
    }

    pub fn times(&self) -> Array1<f64> {
        Array1::from_shape_fn(self.nt, |n| self.time(n))
    }

    pub fn courant(&self, vp_max: f64) -> f64 {
        self.dt * vp_max / self.dx
    }
}

/// Derives `dx`, `dt` and `nt` from the medium's velocity extrema.
///
/// `dx` resolves the slowest wavelength at `fmax = 2 f0` with
/// `points_per_wavelength` points, and `dt` puts the fastest velocity at the
/// requested Courant number.
pub fn plan(input: &PlannerInput, vp_min: f64, vp_max: f64) -> ModelResult<Discretization> {
    if input.points_per_wavelength <= 0.0 || !input.points_per_wavelength.is_finite() {
        return Err(ModelError::config(
            "points_per_wavelength",
            input.points_per_wavelength,
            "must be positive",
        ));
    }
    if input.courant_number <= 0.0 || input.courant_number.is_nan() {
        return Err(ModelError::config(
            "courant_number",
            input.courant_number,
            "must be positive",
        ));
    }
    if input.courant_number > 1.0 {
        return Err(ModelError::config(
            "courant_number",
            input.courant_number,
            "must not exceed 1, the explicit scheme is unstable above it",
        ));
    }
    if input.nx < MIN_POINTS {
        return Err(ModelError::config(
            "nx",
            input.nx,
            format!("must be at least {MIN_POINTS}"),
        ));
    }
    if input.total_time <= 0.0 || !input.total_time.is_finite() {
        return Err(ModelError::config(
            "total_time",
            input.total_time,
            "must be positive",
        ));
    }
    if input.frequency <= 0.0 || !input.frequency.is_finite() {
        return Err(ModelError::config(
            "frequency",
            input.frequency,
            "must be positive",
        ));
    }
    if vp_min <= 0.0 || !vp_min.is_finite() {
        return Err(ModelError::config("vp_min", vp_min, "must be positive"));
    }
    if vp_max <= 0.0 || !vp_max.is_finite() {
        return Err(ModelError::config("vp_max", vp_max, "must be positive"));
    }
    if vp_min > vp_max {
        return Err(ModelError::config(
            "vp_min",
            vp_min,
            format!("must not exceed vp_max = {vp_max}"),
        ));
    }

    let fmax = 2.0 * input.frequency;
    let dx = vp_min / (fmax * input.points_per_wavelength);
    let dt = input.courant_number * dx / vp_max;
    let nt = (input.total_time / dt).floor() as usize;

    if nt < 3 {
        return Err(ModelError::config(
            "total_time",
            input.total_time,
            format!("yields nt = {nt} with dt = {dt:e}, at least 3 steps are needed"),
        ));
    }
    if input.courant_number > STABLE_COURANT {
        warn!(
            courant_number = input.courant_number,
            stable = STABLE_COURANT,
            "courant number above the practical stability limit, consider divergence_threshold"
        );
    }
    if dt < 1e-7 {
        warn!(dt, "computed dt is very small, simulation may be slow");
    }

    info!(dx, dt, nt, nx = input.nx, "discretization planned");

    Ok(Discretization {
        dx,
        dt,
        nx: input.nx,
        nt,
        total_time: input.total_time,
    })
}
