use std::time::{Duration, Instant};

use ndarray::{Array1, ArrayView1};
use tracing::{debug, info, warn};

use crate::error::{ModelError, ModelResult};
use crate::grid::{check_interior_index, Grid};
use crate::integrator::AdamsBashforth;
use crate::materials::MediumModel;
use crate::planner::{plan, Discretization, PlannerInput};
use crate::seismogram::{Seismogram, RECEIVERS};
use crate::source::SourceSignal;
use crate::stencil::{Execution, Staggering, Stencil};
use crate::wavefield::WaveField;

/// Steps 0 and 1 only seed the derivative history with zeros.
pub const FIRST_STEP: usize = 2;

#[derive(Debug, Clone)]
pub struct SimulationParams {
    pub source_index: usize,               // Grid index of the point source
    pub receivers: [usize; RECEIVERS],     // Grid indices of the receivers
    pub execution: Execution,              // Spatial loops on one thread or many
    pub divergence_threshold: Option<f64>, // Abort when max |p| exceeds this
    pub report_period: usize,              // How many times to report progress
}

impl SimulationParams {
    pub fn new(source_index: usize, receivers: [usize; RECEIVERS]) -> Self {
        Self {
            source_index,
            receivers,
            execution: Execution::Parallel,
            divergence_threshold: None,
            report_period: 10,
        }
    }
}

/// Read-only view of the fields handed to snapshot observers.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub step: usize,
    pub time: f64,
    pub x: ArrayView1<'a, f64>,
    pub pressure: ArrayView1<'a, f64>,
    pub velocity: ArrayView1<'a, f64>,
}

#[derive(Debug, Clone)]
pub struct SimulationOutput {
    pub seismogram: Seismogram,
    pub discretization: Discretization,
    pub elapsed: Duration,
    pub wavefield: WaveField,
    pub source_index: usize,
}

pub struct Simulator {
    pub grid: Grid,
    pub medium: MediumModel,
    pub discretization: Discretization,
    pub wavefield: WaveField,
    source: SourceSignal,
    params: SimulationParams,
    // One history per field: dp/dx drives vx, dvx/dx drives p
    velocity_integrator: AdamsBashforth,
    pressure_integrator: AdamsBashforth,
    pressure_gradient: Stencil,
    velocity_gradient: Stencil,
    seismogram: Seismogram,
    x: Array1<f64>,
    current_step: usize,
}

impl Simulator {
    pub fn new(
        medium: MediumModel,
        discretization: Discretization,
        source: SourceSignal,
        params: SimulationParams,
    ) -> ModelResult<Self> {
        let grid = discretization.grid()?;
        if medium.nx() != grid.nx {
            return Err(ModelError::config(
                "medium",
                format!("{} points", medium.nx()),
                format!("profile length must equal nx = {}", grid.nx),
            ));
        }
        if source.len() != discretization.nt {
            return Err(ModelError::config(
                "source",
                format!("{} samples", source.len()),
                format!("must hold one sample per step (nt = {})", discretization.nt),
            ));
        }
        check_interior_index("source.index", params.source_index, grid.nx)?;
        for (r, &index) in params.receivers.iter().enumerate() {
            check_interior_index(&format!("receivers.indices[{r}]"), index, grid.nx)?;
        }
        if let Some(threshold) = params.divergence_threshold {
            if threshold <= 0.0 || threshold.is_nan() {
                return Err(ModelError::config(
                    "divergence_threshold",
                    threshold,
                    "must be positive",
                ));
            }
        }

        let courant = discretization.courant(medium.max_velocity());
        if courant > 1.0 + 1e-12 {
            return Err(ModelError::config(
                "courant_number",
                courant,
                "dt * vp_max / dx must not exceed 1",
            ));
        }

        Ok(Self {
            velocity_integrator: AdamsBashforth::new(&grid),
            pressure_integrator: AdamsBashforth::new(&grid),
            pressure_gradient: Stencil::new(Staggering::Backward, &grid),
            velocity_gradient: Stencil::new(Staggering::Forward, &grid),
            wavefield: WaveField::new(grid.nx),
            seismogram: Seismogram::new(params.receivers, discretization.nt),
            x: grid.coordinates(),
            current_step: FIRST_STEP,
            grid,
            medium,
            discretization,
            source,
            params,
        })
    }

    /// Plans the grid from the medium's velocity range, samples a Ricker
    /// source on it and builds the simulator.
    pub fn from_targets(
        medium: MediumModel,
        input: &PlannerInput,
        amplitude: f64,
        params: SimulationParams,
    ) -> ModelResult<Self> {
        if medium.nx() != input.nx {
            return Err(ModelError::config(
                "medium",
                format!("{} points", medium.nx()),
                format!("profile length must equal nx = {}", input.nx),
            ));
        }
        let discretization = plan(input, medium.min_velocity(), medium.max_velocity())?;
        let source = SourceSignal::for_discretization(input.frequency, amplitude, &discretization)?;
        Self::new(medium, discretization, source, params)
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn current_time(&self) -> f64 {
        self.discretization.time(self.current_step)
    }

    /// The last step is left out so every recorded column has a time sample.
    pub fn last_step(&self) -> usize {
        self.discretization.nt.saturating_sub(1)
    }

    pub fn is_finished(&self) -> bool {
        self.current_step >= self.last_step()
    }

    pub fn seismogram(&self) -> &Seismogram {
        &self.seismogram
    }

    pub fn source(&self) -> &SourceSignal {
        &self.source
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn coordinates(&self) -> ArrayView1<'_, f64> {
        self.x.view()
    }

    pub fn snapshot(&self, step: usize) -> Snapshot<'_> {
        Snapshot {
            step,
            time: self.discretization.time(step),
            x: self.x.view(),
            pressure: self.wavefield.p.view(),
            velocity: self.wavefield.vx.view(),
        }
    }

    /// One time step with both spatial loops spread across the rayon pool.
    pub fn step(&mut self) -> ModelResult<()> {
        self.advance(Execution::Parallel)
    }

    /// Same update as `step` on the calling thread only.
    pub fn step_serial(&mut self) -> ModelResult<()> {
        self.advance(Execution::Serial)
    }

    fn advance(&mut self, execution: Execution) -> ModelResult<()> {
        if self.is_finished() {
            return Ok(());
        }
        let n = self.current_step;
        let dt = self.discretization.dt;

        // 1. Inject the source, additive so it acts as a continuous point source
        self.wavefield.p[self.params.source_index] += self.source.at(n);

        // 2. Velocity from the pressure gradient
        self.velocity_integrator.step(
            &mut self.wavefield.vx,
            self.wavefield.p.view(),
            &self.pressure_gradient,
            self.medium.buoyancy().view(),
            dt,
            execution,
        );

        // 3. Pressure from the gradient of the velocity just computed
        self.pressure_integrator.step(
            &mut self.wavefield.p,
            self.wavefield.vx.view(),
            &self.velocity_gradient,
            self.medium.lambdas().view(),
            dt,
            execution,
        );

        // 4. Sample receivers
        self.seismogram.record(n, self.wavefield.p.view());

        self.current_step += 1;
        self.check_divergence(n)
    }

    fn check_divergence(&self, step: usize) -> ModelResult<()> {
        let Some(threshold) = self.params.divergence_threshold else {
            return Ok(());
        };
        let magnitude = self.wavefield.max_abs_pressure();
        if !magnitude.is_finite() || magnitude > threshold || !self.wavefield.is_finite() {
            warn!(step, magnitude, threshold, "pressure field diverged");
            return Err(ModelError::NumericalDivergence {
                step,
                magnitude,
                threshold,
            });
        }
        Ok(())
    }

    pub fn run(self) -> ModelResult<SimulationOutput> {
        self.run_with_observer(0, |_| Ok(()))
    }

    /// Runs every remaining step. When `cadence > 0` the observer sees the
    /// fields after each step that is a multiple of `cadence`.
    pub fn run_with_observer<F>(
        mut self,
        cadence: usize,
        mut observer: F,
    ) -> ModelResult<SimulationOutput>
    where
        F: FnMut(&Snapshot<'_>) -> anyhow::Result<()>,
    {
        info!(
            nx = self.grid.nx,
            nt = self.discretization.nt,
            dx = self.discretization.dx,
            dt = self.discretization.dt,
            execution = ?self.params.execution,
            "starting simulation"
        );

        let execution = self.params.execution;
        let report_every = (self.discretization.nt / self.params.report_period.max(1)).max(1);
        let start = Instant::now();

        while !self.is_finished() {
            let n = self.current_step;
            self.advance(execution)?;

            if cadence > 0 && n % cadence == 0 {
                observer(&self.snapshot(n)).map_err(ModelError::Observer)?;
            }
            if n % report_every == 0 {
                debug!(
                    step = n,
                    nt = self.discretization.nt,
                    time = self.discretization.time(n),
                    max_p = self.wavefield.max_abs_pressure(),
                    energy = self.wavefield.energy_proxy(),
                    "progress"
                );
            }
        }

        let elapsed = start.elapsed();
        info!(elapsed_s = elapsed.as_secs_f64(), "simulation complete");

        Ok(SimulationOutput {
            seismogram: self.seismogram,
            discretization: self.discretization,
            elapsed,
            wavefield: self.wavefield,
            source_index: self.params.source_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::Layer;

    fn input(nx: usize, total_time: f64) -> PlannerInput {
        PlannerInput {
            points_per_wavelength: 20.0,
            courant_number: 0.5,
            nx,
            total_time,
            frequency: 10.0,
        }
    }

    fn homogeneous(nx: usize) -> MediumModel {
        MediumModel::homogeneous(1000.0, 1000.0, nx).unwrap()
    }

    #[test]
    fn rejects_source_in_margin() {
        let err = Simulator::from_targets(
            homogeneous(200),
            &input(200, 0.05),
            1.0,
            SimulationParams::new(4, [50, 100, 150]),
        )
        .err()
        .unwrap();
        assert!(err.to_string().contains("source.index"));
    }

    #[test]
    fn rejects_receiver_in_margin() {
        let err = Simulator::from_targets(
            homogeneous(200),
            &input(200, 0.05),
            1.0,
            SimulationParams::new(100, [50, 195, 150]),
        )
        .err()
        .unwrap();
        assert!(err.to_string().contains("receivers.indices[1]"));
    }

    #[test]
    fn rejects_mismatched_medium() {
        let layers = [Layer {
            velocity: 1000.0,
            density: 1000.0,
            points: 150,
        }];
        let medium = MediumModel::from_layers(&layers, 150).unwrap();
        assert!(Simulator::from_targets(
            medium,
            &input(200, 0.05),
            1.0,
            SimulationParams::new(100, [50, 100, 150])
        )
        .is_err());
    }

    #[test]
    fn first_step_is_two() {
        let sim = Simulator::from_targets(
            homogeneous(200),
            &input(200, 0.05),
            1.0,
            SimulationParams::new(100, [50, 100, 150]),
        )
        .unwrap();
        assert_eq!(sim.current_step(), FIRST_STEP);
        assert!(!sim.is_finished());
    }

    fn with_samples(nx: usize, samples: &[(usize, f64)]) -> Simulator {
        let medium = homogeneous(nx);
        let discretization = plan(&input(nx, 0.2), 1000.0, 1000.0).unwrap();
        let mut q = Array1::zeros(discretization.nt);
        for &(n, value) in samples {
            q[n] = value;
        }
        Simulator::new(
            medium,
            discretization,
            SourceSignal::from_samples(q),
            SimulationParams::new(nx / 2, [nx / 4, nx / 2, 3 * nx / 4]),
        )
        .unwrap()
    }

    #[test]
    fn pressure_update_sees_updated_velocity() {
        // Impulse of height q at the source: after one step the source node
        // keeps q minus the response to the velocity computed in that step.
        let mut sim = with_samples(200, &[(FIRST_STEP, 1.0)]);
        sim.step_serial().unwrap();
        let c = sim.discretization.courant(1000.0);
        let w0 = 13.0 / 12.0;
        let spread = 81.0 / 32.0 + 1.0 / 288.0;
        let expected = 1.0 - w0 * w0 * c * c * spread;
        approx::assert_relative_eq!(sim.wavefield.p[100], expected, max_relative = 1e-12);
        assert_eq!(sim.seismogram().trace(1)[FIRST_STEP], sim.wavefield.p[100]);
    }

    #[test]
    fn source_injection_is_additive() {
        let mut first = with_samples(200, &[(FIRST_STEP, 1.0)]);
        let mut second = with_samples(200, &[(FIRST_STEP + 1, 0.5)]);
        let mut both = with_samples(200, &[(FIRST_STEP, 1.0), (FIRST_STEP + 1, 0.5)]);
        for _ in 0..2 {
            first.step_serial().unwrap();
            second.step_serial().unwrap();
            both.step_serial().unwrap();
        }
        for i in 0..200 {
            approx::assert_abs_diff_eq!(
                both.wavefield.p[i],
                first.wavefield.p[i] + second.wavefield.p[i],
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn serial_and_parallel_steps_agree() {
        let build = || {
            Simulator::from_targets(
                homogeneous(300),
                &input(300, 0.25),
                1.0,
                SimulationParams::new(150, [60, 120, 240]),
            )
            .unwrap()
        };
        let mut serial = build();
        let mut parallel = build();
        for _ in 0..150 {
            serial.step_serial().unwrap();
            parallel.step().unwrap();
        }
        assert_eq!(serial.wavefield, parallel.wavefield);
        assert_eq!(serial.seismogram(), parallel.seismogram());
    }

    #[test]
    fn stepping_past_the_end_is_a_no_op() {
        let mut sim = with_samples(100, &[(FIRST_STEP, 1.0)]);
        while !sim.is_finished() {
            sim.step_serial().unwrap();
        }
        let frozen = sim.wavefield.clone();
        sim.step().unwrap();
        assert_eq!(sim.wavefield, frozen);
        assert_eq!(sim.current_step(), sim.last_step());
    }

    #[test]
    fn observer_sees_requested_cadence() {
        let sim = Simulator::from_targets(
            homogeneous(200),
            &input(200, 0.02),
            1.0,
            SimulationParams::new(100, [50, 100, 150]),
        )
        .unwrap();
        let last = sim.last_step();
        let mut seen = Vec::new();
        sim.run_with_observer(4, |snap| {
            assert_eq!(snap.pressure.len(), 200);
            seen.push(snap.step);
            Ok(())
        })
        .unwrap();
        let expected: Vec<usize> = (FIRST_STEP..last).filter(|n| n % 4 == 0).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn observer_failure_aborts_run() {
        let sim = Simulator::from_targets(
            homogeneous(200),
            &input(200, 0.02),
            1.0,
            SimulationParams::new(100, [50, 100, 150]),
        )
        .unwrap();
        let err = sim
            .run_with_observer(10, |_| Err(anyhow::anyhow!("disk full")))
            .unwrap_err();
        assert!(matches!(err, ModelError::Observer(_)));
    }

    #[test]
    fn divergence_threshold_trips() {
        let mut params = SimulationParams::new(100, [50, 100, 150]);
        params.divergence_threshold = Some(1e-6);
        let sim =
            Simulator::from_targets(homogeneous(200), &input(200, 0.3), 1.0, params).unwrap();
        let err = sim.run().unwrap_err();
        assert!(matches!(err, ModelError::NumericalDivergence { .. }));
    }
}
