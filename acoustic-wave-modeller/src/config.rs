use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::grid::MIN_POINTS;
use crate::materials::{Layer, MediumModel};
use crate::planner::PlannerInput;
use crate::seismogram::RECEIVERS;
use crate::simulation::{SimulationParams, Simulator};
use crate::stencil::Execution;

/// Resolution and stability targets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscretizationConfig {
    pub points_per_wavelength: f64, // c1, grid points per dominant wavelength
    pub courant_number: f64,        // c2, target dt * vp_max / dx
    pub nx: usize,
    pub total_time: f64, // seconds
}

impl DiscretizationConfig {
    fn validate(&self) -> Result<()> {
        if self.nx < MIN_POINTS {
            return Err(anyhow!(
                "nx must be at least {} to support the stencil margin, got {}",
                MIN_POINTS,
                self.nx
            ));
        }
        if self.points_per_wavelength <= 0.0 {
            return Err(anyhow!(
                "points_per_wavelength must be positive, got {}",
                self.points_per_wavelength
            ));
        }
        if self.courant_number <= 0.0 || self.courant_number > 1.0 {
            return Err(anyhow!(
                "courant_number must be in (0, 1], got {}",
                self.courant_number
            ));
        }
        if self.total_time <= 0.0 {
            return Err(anyhow!("total_time must be positive, got {}", self.total_time));
        }
        Ok(())
    }
}

/// Ricker point source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub index: usize,
    pub frequency: f64, // f0 (Hz)
    #[serde(default = "default_amplitude")]
    pub amplitude: f64, // q0
}

fn default_amplitude() -> f64 {
    1.0
}

impl SourceConfig {
    fn validate(&self) -> Result<()> {
        if self.frequency <= 0.0 {
            return Err(anyhow!("Source frequency must be positive, got {}", self.frequency));
        }
        if !self.amplitude.is_finite() {
            return Err(anyhow!("Source amplitude must be finite, got {}", self.amplitude));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverConfig {
    pub indices: Vec<usize>,
}

impl ReceiverConfig {
    fn validate(&self) -> Result<()> {
        if self.indices.len() != RECEIVERS {
            return Err(anyhow!(
                "Exactly {} receivers are required, got {}",
                RECEIVERS,
                self.indices.len()
            ));
        }
        Ok(())
    }

    pub fn as_array(&self) -> Result<[usize; RECEIVERS]> {
        self.indices
            .as_slice()
            .try_into()
            .map_err(|_| anyhow!("Exactly {} receivers are required", RECEIVERS))
    }
}

/// Layered velocity/density profile, stacked from x = 0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediumConfig {
    pub layers: Vec<Layer>,
}

impl MediumConfig {
    fn validate(&self, nx: usize) -> Result<()> {
        if self.layers.is_empty() {
            return Err(anyhow!("At least one medium layer must be defined"));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.velocity <= 0.0 || layer.density <= 0.0 {
                return Err(anyhow!(
                    "Layer {} properties must be positive (velocity={}, density={})",
                    i,
                    layer.velocity,
                    layer.density
                ));
            }
        }
        let total: usize = self.layers.iter().map(|layer| layer.points).sum();
        if total != nx {
            return Err(anyhow!(
                "Layer extents cover {} points but nx = {}",
                total,
                nx
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: usize, // 0 disables snapshots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub divergence_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>, // Size of the rayon pool, default: all cores
    #[serde(default = "default_true")]
    pub parallel: bool,
    #[serde(default = "default_report_period")]
    pub report_period: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            snapshot_interval: default_snapshot_interval(),
            divergence_threshold: None,
            threads: None,
            parallel: true,
            report_period: default_report_period(),
        }
    }
}

fn default_snapshot_interval() -> usize {
    20
}

fn default_report_period() -> usize {
    10
}

fn default_true() -> bool {
    true
}

impl RunConfig {
    fn validate(&self) -> Result<()> {
        if let Some(threshold) = self.divergence_threshold {
            if threshold <= 0.0 {
                return Err(anyhow!(
                    "divergence_threshold must be positive, got {}",
                    threshold
                ));
            }
        }
        if self.threads == Some(0) {
            return Err(anyhow!("threads must be at least 1"));
        }
        Ok(())
    }

    pub fn execution(&self) -> Execution {
        if self.parallel {
            Execution::Parallel
        } else {
            Execution::Serial
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_true")]
    pub write_json: bool,
    #[serde(default = "default_true")]
    pub write_csv: bool,
    #[serde(default = "default_true")]
    pub plots: bool,
    #[serde(default = "default_image_width")]
    pub image_width: u32,
    #[serde(default = "default_image_height")]
    pub image_height: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            write_json: true,
            write_csv: true,
            plots: true,
            image_width: default_image_width(),
            image_height: default_image_height(),
        }
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from("output")
}

fn default_image_width() -> u32 {
    1200
}

fn default_image_height() -> u32 {
    600
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(anyhow!(
                "Image dimensions must be positive (width={}, height={})",
                self.image_width,
                self.image_height
            ));
        }
        Ok(())
    }
}

/// Complete modelling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub discretization: DiscretizationConfig,
    pub source: SourceConfig,
    pub receivers: ReceiverConfig,
    pub medium: MediumConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<()> {
        self.discretization.validate()?;
        self.source.validate()?;
        self.receivers.validate()?;
        self.medium.validate(self.discretization.nx)?;
        self.run.validate()?;
        self.output.validate()?;
        Ok(())
    }

    pub fn planner_input(&self) -> PlannerInput {
        PlannerInput {
            points_per_wavelength: self.discretization.points_per_wavelength,
            courant_number: self.discretization.courant_number,
            nx: self.discretization.nx,
            total_time: self.discretization.total_time,
            frequency: self.source.frequency,
        }
    }

    pub fn medium_model(&self) -> Result<MediumModel> {
        Ok(MediumModel::from_layers(
            &self.medium.layers,
            self.discretization.nx,
        )?)
    }

    pub fn simulation_params(&self) -> Result<SimulationParams> {
        let mut params = SimulationParams::new(self.source.index, self.receivers.as_array()?);
        params.execution = self.run.execution();
        params.divergence_threshold = self.run.divergence_threshold;
        params.report_period = self.run.report_period;
        Ok(params)
    }

    /// Builds the medium, plans the grid and samples the source. Every
    /// configuration error surfaces here, before any time step runs.
    pub fn build_simulator(&self) -> Result<Simulator> {
        let simulator = Simulator::from_targets(
            self.medium_model()?,
            &self.planner_input(),
            self.source.amplitude,
            self.simulation_params()?,
        )?;
        Ok(simulator)
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("=== Modelling Configuration ===");
        println!(
            "Grid: nx={}, {} points per wavelength, Courant number {}",
            self.discretization.nx,
            self.discretization.points_per_wavelength,
            self.discretization.courant_number
        );
        println!("Total time: {} s", self.discretization.total_time);
        println!("Medium: {} layer(s)", self.medium.layers.len());
        for (i, layer) in self.medium.layers.iter().enumerate() {
            println!(
                "  Layer {}: {} points, Vp={} m/s, ρ={} kg/m³",
                i, layer.points, layer.velocity, layer.density
            );
        }
        println!(
            "Source: index {}, f0={} Hz, q0={}",
            self.source.index, self.source.frequency, self.source.amplitude
        );
        println!("Receivers: {:?}", self.receivers.indices);
        println!(
            "Run: {}, snapshots every {} steps",
            if self.run.parallel { "parallel" } else { "serial" },
            self.run.snapshot_interval
        );
        println!("Output: {}", self.output.directory.display());
        println!("===============================");
    }
}
