use std::f64::consts::PI;

use ndarray::Array1;

use crate::error::{ModelError, ModelResult};
use crate::planner::Discretization;

/// Ricker wavelet delayed by 1.5 periods so it starts close to zero.
pub fn ricker_wavelet(t: f64, f0: f64, q0: f64) -> f64 {
    let tau = PI * f0 * (t - 1.5 / f0);
    let arg = tau * tau;
    q0 * (1.0 - 2.0 * arg) * (-arg).exp()
}

/// Source time function sampled once at every time step.
#[derive(Debug, Clone)]
pub struct SourceSignal {
    samples: Array1<f64>,
    pub f0: f64, // Peak frequency (Hz)
    pub q0: f64, // Peak amplitude
}

impl SourceSignal {
    pub fn ricker(f0: f64, q0: f64, dt: f64, nt: usize) -> ModelResult<Self> {
        if f0 <= 0.0 || !f0.is_finite() {
            return Err(ModelError::config("source.frequency", f0, "must be positive"));
        }
        if !q0.is_finite() {
            return Err(ModelError::config("source.amplitude", q0, "must be finite"));
        }
        let samples = Array1::from_shape_fn(nt, |n| ricker_wavelet(n as f64 * dt, f0, q0));
        Ok(Self { samples, f0, q0 })
    }

    pub fn for_discretization(f0: f64, q0: f64, plan: &Discretization) -> ModelResult<Self> {
        Self::ricker(f0, q0, plan.dt, plan.nt)
    }

    /// Arbitrary precomputed samples, e.g. a silent source.
    pub fn from_samples(samples: Array1<f64>) -> Self {
        Self {
            samples,
            f0: 0.0,
            q0: 0.0,
        }
    }

    pub fn at(&self, n: usize) -> f64 {
        self.samples[n]
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &Array1<f64> {
        &self.samples
    }
}
