use std::path::PathBuf;

use acoustic_wave_modeller::config::Config;
use acoustic_wave_modeller::output::{self, Artifacts};
use acoustic_wave_modeller::visualisation::WavefieldVisualiser;
use acoustic_wave_modeller::SimulationOutput;
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Synthetic seismograms from 1D acoustic finite-difference modelling
#[derive(Parser, Debug)]
#[command(name = "acoustic-wave-modeller", version, about)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, default_value = "configs/two_layer.toml")]
    config: PathBuf,

    /// Output directory, overrides `output.directory`
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip all PNG rendering
    #[arg(long)]
    no_plots: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            EnvFilter::new("error")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let mut config = Config::from_file(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    if let Some(dir) = cli.output {
        config.output.directory = dir;
    }
    if cli.no_plots {
        config.output.plots = false;
    }
    if !cli.quiet {
        config.print_summary();
    }

    // All configuration errors surface here, before the first step
    let simulator = config.build_simulator()?;
    let artifacts = Artifacts::new(&config.output.directory);
    output::ensure_directory(&artifacts.directory)?;

    let plan = simulator.discretization;
    info!(
        dx = plan.dx,
        dt = plan.dt,
        nt = plan.nt,
        courant = plan.courant(simulator.medium.max_velocity()),
        "discretization"
    );

    let visualiser = if config.output.plots {
        let visualiser = WavefieldVisualiser::new(
            &artifacts.frames,
            config.output.image_width,
            config.output.image_height,
        )?;
        visualiser.plot_model(
            &artifacts.model_png,
            simulator.coordinates(),
            &simulator.medium,
        )?;
        Some(visualiser)
    } else {
        None
    };

    if let Some(threads) = config.run.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure worker thread pool")?;
    }

    let source_index = config.source.index;
    let receivers = simulator.seismogram().receivers();
    let cadence = match &visualiser {
        Some(_) => config.run.snapshot_interval,
        None => 0,
    };

    let result: SimulationOutput = simulator.run_with_observer(cadence, |snapshot| {
        if let Some(visualiser) = &visualiser {
            let frame = visualiser.plot_snapshot(snapshot, source_index, receivers)?;
            info!(step = snapshot.step, frame = %frame.display(), "saved frame");
        }
        Ok(())
    })?;

    info!(
        elapsed_s = result.elapsed.as_secs_f64(),
        max_p = result.seismogram.max_abs(),
        "run finished"
    );
    for (r, &index) in receivers.iter().enumerate() {
        match result.seismogram.first_break(r, 0.05) {
            Some(n) => info!(receiver = index, time = plan.time(n), "first break"),
            None => warn!(receiver = index, "no arrival recorded"),
        }
    }

    if config.output.write_json {
        output::write_record(&artifacts.record_json, &result)?;
        info!(path = %artifacts.record_json.display(), "wrote seismogram record");
    }
    if config.output.write_csv {
        output::write_traces_csv(&artifacts.traces_csv, &result)?;
        info!(path = %artifacts.traces_csv.display(), "wrote seismogram traces");
    }
    if let Some(visualiser) = &visualiser {
        visualiser.plot_seismogram(&artifacts.seismogram_png, &result)?;
    }

    println!(
        "Simulation complete. Results stored in {}",
        artifacts.directory.display()
    );
    Ok(())
}
