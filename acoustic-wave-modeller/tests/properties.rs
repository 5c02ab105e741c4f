use acoustic_wave_modeller::grid::MARGIN;
use acoustic_wave_modeller::materials::Layer;
use acoustic_wave_modeller::{
    plan, Execution, MediumModel, PlannerInput, SimulationParams, Simulator, SourceSignal,
};
use approx::assert_relative_eq;
use ndarray::Array1;

fn planner_input(nx: usize, total_time: f64, courant_number: f64) -> PlannerInput {
    PlannerInput {
        points_per_wavelength: 20.0,
        courant_number,
        nx,
        total_time,
        frequency: 10.0,
    }
}

fn homogeneous_simulator(nx: usize, total_time: f64, params: SimulationParams) -> Simulator {
    let medium = MediumModel::homogeneous(1000.0, 1000.0, nx).unwrap();
    Simulator::from_targets(medium, &planner_input(nx, total_time, 0.5), 1.0, params).unwrap()
}

#[test]
fn silent_source_leaves_fields_at_zero() {
    let nx = 200;
    let medium = MediumModel::homogeneous(1200.0, 1800.0, nx).unwrap();
    let plan = plan(&planner_input(nx, 0.2, 0.5), 1200.0, 1200.0).unwrap();
    let silence = SourceSignal::from_samples(Array1::zeros(plan.nt));
    let mut simulator =
        Simulator::new(medium, plan, silence, SimulationParams::new(100, [50, 100, 150])).unwrap();

    while !simulator.is_finished() {
        simulator.step().unwrap();
        assert!(simulator.wavefield.p.iter().all(|&v| v == 0.0));
        assert!(simulator.wavefield.vx.iter().all(|&v| v == 0.0));
    }
}

#[test]
fn margins_stay_frozen_while_waves_hit_them() {
    let nx = 120;
    // Sources next to the margins reach them within a few steps
    let mut simulator = homogeneous_simulator(nx, 0.3, SimulationParams::new(6, [6, 60, 113]));

    let mut steps = 0;
    while !simulator.is_finished() {
        simulator.step().unwrap();
        steps += 1;
        let field = &simulator.wavefield;
        for k in (0..MARGIN).chain(nx - MARGIN..nx) {
            assert_eq!(field.p[k], 0.0, "p[{k}] moved at step {}", simulator.current_step());
            assert_eq!(field.vx[k], 0.0, "vx[{k}] moved at step {}", simulator.current_step());
        }
    }
    assert!(steps > 100);
    assert!(simulator.wavefield.max_abs_pressure() > 0.0);
}

#[test]
fn half_courant_run_stays_bounded() {
    let nx = 300;
    // Long enough for many reflections off both rigid ends
    let mut params = SimulationParams::new(150, [60, 150, 240]);
    params.divergence_threshold = Some(1e3);
    let output = homogeneous_simulator(nx, 2.0, params).run().unwrap();

    assert!(output.wavefield.is_finite());
    assert!(output.wavefield.max_abs_pressure() < 10.0);
    assert!(output.seismogram.max_abs() < 10.0);
    assert!(output.seismogram.max_abs() > 0.1);
}

#[test]
fn courant_number_above_one_is_rejected_before_running() {
    let nx = 200;
    let medium = MediumModel::homogeneous(1000.0, 1000.0, nx).unwrap();
    let err = Simulator::from_targets(
        medium,
        &planner_input(nx, 0.5, 1.01),
        1.0,
        SimulationParams::new(100, [50, 100, 150]),
    )
    .err()
    .unwrap();
    assert!(err.is_configuration());
}

#[test]
fn identical_layers_match_a_homogeneous_medium() {
    let nx = 240;
    let layer = |points| Layer {
        velocity: 1500.0,
        density: 2000.0,
        points,
    };
    let layered = MediumModel::from_layers(&[layer(100), layer(140)], nx).unwrap();
    let uniform = MediumModel::homogeneous(1500.0, 2000.0, nx).unwrap();
    let input = planner_input(nx, 0.3, 0.5);
    let params = SimulationParams::new(120, [40, 120, 200]);

    let a = Simulator::from_targets(layered, &input, 1.0, params.clone())
        .unwrap()
        .run()
        .unwrap();
    let b = Simulator::from_targets(uniform, &input, 1.0, params)
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(a.discretization, b.discretization);
    assert_eq!(a.seismogram.traces(), b.seismogram.traces());
    assert_eq!(a.wavefield, b.wavefield);
}

#[test]
fn arrivals_travel_at_the_medium_velocity() {
    let nx = 400;
    let output = homogeneous_simulator(nx, 0.9, SimulationParams::new(100, [150, 250, 350]))
        .run()
        .unwrap();
    let plan = output.discretization;

    // Receivers are 100 cells apart, 0.25 s at 1000 m/s
    let expected = 100.0 * plan.dx / 1000.0;
    let breaks: Vec<usize> = (0..3)
        .map(|r| output.seismogram.first_break(r, 0.05).unwrap())
        .collect();
    for pair in breaks.windows(2) {
        let delay = plan.time(pair[1]) - plan.time(pair[0]);
        assert!(
            (delay - expected).abs() <= 3.0 * plan.dt,
            "delay {delay} s, expected {expected} s"
        );
    }
}

#[test]
fn serial_and_parallel_runs_agree() {
    let nx = 256;
    let mut serial = SimulationParams::new(128, [30, 128, 220]);
    serial.execution = Execution::Serial;
    let parallel = SimulationParams::new(128, [30, 128, 220]);

    let a = homogeneous_simulator(nx, 0.2, serial).run().unwrap();
    let b = homogeneous_simulator(nx, 0.2, parallel).run().unwrap();
    assert_eq!(a.seismogram.traces(), b.seismogram.traces());
}

#[test]
fn two_layer_reference_discretization() {
    let input = PlannerInput {
        points_per_wavelength: 20.0,
        courant_number: 0.5,
        nx: 2000,
        total_time: 1.0,
        frequency: 10.0,
    };
    let plan = plan(&input, 1000.0, 1500.0).unwrap();
    assert_relative_eq!(plan.dx, 2.5);
    assert_relative_eq!(plan.dt, 0.000833333333, max_relative = 1e-9);
    assert_eq!(plan.nt, 1200);
}
