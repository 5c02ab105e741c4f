use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// One homogeneous block of the layered profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub velocity: f64, // P-wave velocity (m/s)
    pub density: f64,  // Density (kg/m³)
    pub points: usize, // Extent in grid points
}

/// Per-grid-point acoustic properties. Immutable once built.
#[derive(Debug, Clone)]
pub struct MediumModel {
    velocity: Array1<f64>,
    density: Array1<f64>,
    // Elastic (bulk) modulus, rho * vp²
    lambda: Array1<f64>,
    // 1 / rho, the coefficient of the velocity update
    buoyancy: Array1<f64>,
}

impl MediumModel {
    pub fn new(velocity: Array1<f64>, density: Array1<f64>, nx: usize) -> ModelResult<Self> {
        if velocity.len() != nx {
            return Err(ModelError::config(
                "medium.velocity",
                format!("{} points", velocity.len()),
                format!("profile length must equal nx = {nx}"),
            ));
        }
        if density.len() != nx {
            return Err(ModelError::config(
                "medium.density",
                format!("{} points", density.len()),
                format!("profile length must equal nx = {nx}"),
            ));
        }
        if let Some((i, &v)) = velocity
            .iter()
            .enumerate()
            .find(|&(_, &v)| v <= 0.0 || !v.is_finite())
        {
            return Err(ModelError::config(
                format!("medium.velocity[{i}]"),
                v,
                "must be positive",
            ));
        }
        if let Some((i, &rho)) = density
            .iter()
            .enumerate()
            .find(|&(_, &rho)| rho <= 0.0 || !rho.is_finite())
        {
            return Err(ModelError::config(
                format!("medium.density[{i}]"),
                rho,
                "must be positive",
            ));
        }

        let lambda = &density * &velocity * &velocity;
        let buoyancy = density.mapv(|rho| 1.0 / rho);

        Ok(Self {
            velocity,
            density,
            lambda,
            buoyancy,
        })
    }

    pub fn homogeneous(velocity: f64, density: f64, nx: usize) -> ModelResult<Self> {
        Self::new(
            Array1::from_elem(nx, velocity),
            Array1::from_elem(nx, density),
            nx,
        )
    }

    /// Stacks layers in order from x = 0. The extents must add up to `nx`.
    pub fn from_layers(layers: &[Layer], nx: usize) -> ModelResult<Self> {
        if layers.is_empty() {
            return Err(ModelError::config(
                "medium.layers",
                "[]",
                "at least one layer is required",
            ));
        }
        let total: usize = layers.iter().map(|layer| layer.points).sum();
        if total != nx {
            return Err(ModelError::config(
                "medium.layers",
                format!("{total} points"),
                format!("layer extents must sum to nx = {nx}"),
            ));
        }

        let mut velocity = Vec::with_capacity(nx);
        let mut density = Vec::with_capacity(nx);
        for layer in layers {
            velocity.extend(std::iter::repeat(layer.velocity).take(layer.points));
            density.extend(std::iter::repeat(layer.density).take(layer.points));
        }

        Self::new(Array1::from(velocity), Array1::from(density), nx)
    }

    pub fn nx(&self) -> usize {
        self.velocity.len()
    }

    pub fn velocity(&self, i: usize) -> f64 {
        self.velocity[i]
    }

    pub fn density(&self, i: usize) -> f64 {
        self.density[i]
    }

    pub fn lambda(&self, i: usize) -> f64 {
        self.lambda[i]
    }

    pub fn velocities(&self) -> &Array1<f64> {
        &self.velocity
    }

    pub fn densities(&self) -> &Array1<f64> {
        &self.density
    }

    pub fn lambdas(&self) -> &Array1<f64> {
        &self.lambda
    }

    pub fn buoyancy(&self) -> &Array1<f64> {
        &self.buoyancy
    }

    pub fn min_velocity(&self) -> f64 {
        self.velocity.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max_velocity(&self) -> f64 {
        self.velocity.iter().copied().fold(0.0, f64::max)
    }
}
