use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::seismogram::RECEIVERS;
use crate::simulation::SimulationOutput;

/// File locations for one run.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub directory: PathBuf,
    pub record_json: PathBuf,
    pub traces_csv: PathBuf,
    pub frames: PathBuf,
    pub seismogram_png: PathBuf,
    pub model_png: PathBuf,
}

impl Artifacts {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        let directory = directory.into();
        Self {
            record_json: directory.join("seismogram.json"),
            traces_csv: directory.join("seismogram.csv"),
            frames: directory.join("frames"),
            seismogram_png: directory.join("seismogram.png"),
            model_png: directory.join("model.png"),
            directory,
        }
    }
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create output directory {}", path.display()))?;
    }
    Ok(())
}

/// Self-describing record of a run: the traces plus everything needed to put
/// them on a time axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeismogramRecord {
    pub seismogram: Vec<Vec<f64>>, // receiver x step
    pub dt: f64,
    pub total_time: f64,
    pub elapsed_seconds: f64,
    pub dx: f64,
    pub nx: usize,
    pub nt: usize,
    pub source_index: usize,
    pub receivers: [usize; RECEIVERS],
}

impl From<&SimulationOutput> for SeismogramRecord {
    fn from(output: &SimulationOutput) -> Self {
        let seismogram = output
            .seismogram
            .traces()
            .rows()
            .into_iter()
            .map(|row| row.to_vec())
            .collect();
        let plan = &output.discretization;
        Self {
            seismogram,
            dt: plan.dt,
            total_time: plan.total_time,
            elapsed_seconds: output.elapsed.as_secs_f64(),
            dx: plan.dx,
            nx: plan.nx,
            nt: plan.nt,
            source_index: output.source_index,
            receivers: output.seismogram.receivers(),
        }
    }
}

pub fn write_record(path: &Path, output: &SimulationOutput) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }
    let record = SeismogramRecord::from(output);
    let file =
        File::create(path).with_context(|| format!("Unable to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &record)
        .with_context(|| format!("Failed to serialize seismogram record to {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))
}

pub fn read_record(path: &Path) -> Result<SeismogramRecord> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read seismogram record {}", path.display()))?;
    let record: SeismogramRecord = serde_json::from_str(&content)
        .with_context(|| format!("Malformed seismogram record {}", path.display()))?;
    ensure!(
        record.seismogram.len() == RECEIVERS,
        "record holds {} traces, expected {}",
        record.seismogram.len(),
        RECEIVERS
    );
    Ok(record)
}

/// One row per time step: `time, receiver_<index>...`.
pub fn write_traces_csv(path: &Path, output: &SimulationOutput) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Unable to create CSV file {}", path.display()))?;

    let receivers = output.seismogram.receivers();
    let mut header = vec!["time".to_string()];
    header.extend(receivers.iter().map(|index| format!("receiver_{index}")));
    writer.write_record(&header)?;

    let traces = output.seismogram.traces();
    let plan = &output.discretization;
    for n in 0..plan.nt {
        let mut row = Vec::with_capacity(RECEIVERS + 1);
        row.push(plan.time(n).to_string());
        row.extend(traces.column(n).iter().map(|v| v.to_string()));
        writer
            .write_record(&row)
            .with_context(|| format!("Failed to write sample at step {n}"))?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush CSV writer for {}", path.display()))
}
