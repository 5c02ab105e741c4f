//! One-dimensional acoustic finite-difference modelling.
//!
//! Velocity and pressure live on a staggered grid, spatial derivatives use a
//! fourth-order stencil and time stepping uses a four-level Adams-Bashforth
//! scheme. The pressure is sampled at three receivers to build a seismogram.

pub mod config;
pub mod error;
pub mod grid;
pub mod integrator;
pub mod materials;
pub mod output;
pub mod planner;
pub mod seismogram;
pub mod simulation;
pub mod source;
pub mod stencil;
pub mod visualisation;
pub mod wavefield;

pub use error::{ModelError, ModelResult};
pub use materials::{Layer, MediumModel};
pub use planner::{plan, Discretization, PlannerInput};
pub use seismogram::Seismogram;
pub use simulation::{SimulationOutput, SimulationParams, Simulator, Snapshot};
pub use source::SourceSignal;
pub use stencil::Execution;
pub use wavefield::WaveField;
