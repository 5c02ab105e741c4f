use ndarray::Array1;

/// Particle velocity and pressure on the staggered 1D grid.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveField {
    pub vx: Array1<f64>, // Particle velocity at half nodes
    pub p: Array1<f64>,  // Pressure at integer nodes
}

impl WaveField {
    pub fn new(nx: usize) -> Self {
        WaveField {
            vx: Array1::zeros(nx),
            p: Array1::zeros(nx),
        }
    }

    pub fn nx(&self) -> usize {
        self.p.len()
    }

    pub fn zero(&mut self) {
        self.vx.fill(0.0);
        self.p.fill(0.0);
    }

    pub fn max_abs_pressure(&self) -> f64 {
        self.p.iter().map(|&v| v.abs()).fold(0.0_f64, f64::max)
    }

    pub fn max_abs_velocity(&self) -> f64 {
        self.vx.iter().map(|&v| v.abs()).fold(0.0_f64, f64::max)
    }

    pub fn is_finite(&self) -> bool {
        self.p.iter().chain(self.vx.iter()).all(|v| v.is_finite())
    }

    /// Sum of p² + vx² over the grid. Only a relative measure, the medium
    /// weights are left out.
    pub fn energy_proxy(&self) -> f64 {
        self.p.iter().map(|v| v * v).sum::<f64>() + self.vx.iter().map(|v| v * v).sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_rest() {
        let field = WaveField::new(32);
        assert_eq!(field.nx(), 32);
        assert_eq!(field.max_abs_pressure(), 0.0);
        assert_eq!(field.max_abs_velocity(), 0.0);
        assert_eq!(field.energy_proxy(), 0.0);
    }

    #[test]
    fn magnitudes_ignore_sign() {
        let mut field = WaveField::new(8);
        field.p[3] = -4.0;
        field.p[4] = 2.0;
        field.vx[1] = -0.5;
        assert_eq!(field.max_abs_pressure(), 4.0);
        assert_eq!(field.max_abs_velocity(), 0.5);
        field.zero();
        assert_eq!(field.max_abs_pressure(), 0.0);
    }

    #[test]
    fn detects_non_finite_values() {
        let mut field = WaveField::new(8);
        assert!(field.is_finite());
        field.vx[2] = f64::NAN;
        assert!(!field.is_finite());
    }
}
