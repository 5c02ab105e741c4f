use std::path::{Path, PathBuf};

use anyhow::Result;
use ndarray::ArrayView1;
use plotters::prelude::*;

use crate::materials::MediumModel;
use crate::output::ensure_directory;
use crate::seismogram::RECEIVERS;
use crate::simulation::{SimulationOutput, Snapshot};

pub struct WavefieldVisualiser {
    frame_dir: PathBuf,
    width: u32,
    height: u32,
    // Receiver colours, shared by the frames and the seismogram plot
    gradient: Box<dyn colorgrad::Gradient>,
}

impl WavefieldVisualiser {
    pub fn new(frame_dir: &Path, width: u32, height: u32) -> Result<Self> {
        ensure_directory(frame_dir)?;

        let gradient = Box::new(colorgrad::preset::viridis());

        Ok(Self {
            frame_dir: frame_dir.to_path_buf(),
            width,
            height,
            gradient,
        })
    }

    fn trace_color(&self, receiver: usize) -> RGBColor {
        // Stop short of the bright end so traces stay visible on white
        let t = 0.85 * receiver as f32 / (RECEIVERS - 1) as f32;
        let rgba = self.gradient.at(t).to_rgba8();
        RGBColor(rgba[0], rgba[1], rgba[2])
    }

    /// Pressure profile with the source and receivers marked.
    pub fn plot_snapshot(
        &self,
        snapshot: &Snapshot<'_>,
        source_index: usize,
        receivers: [usize; RECEIVERS],
    ) -> Result<PathBuf> {
        let path = self.frame_dir.join(format!("pressure_{:06}.png", snapshot.step));
        self.draw_snapshot(&path, snapshot, source_index, receivers)?;
        Ok(path)
    }

    fn draw_snapshot(
        &self,
        path: &Path,
        snapshot: &Snapshot<'_>,
        source_index: usize,
        receivers: [usize; RECEIVERS],
    ) -> Result<()> {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let x = snapshot.x;
        let (x_min, x_max) = extent(x);
        let y_limit = symmetric_limit(snapshot.pressure);

        let title = format!("p at t={:.4}s (step {})", snapshot.time, snapshot.step);
        let mut chart = ChartBuilder::on(&root)
            .caption(&title, ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x_min..x_max, -y_limit..y_limit)?;

        chart
            .configure_mesh()
            .x_desc("x (m)")
            .y_desc("pressure")
            .draw()?;

        chart.draw_series(LineSeries::new(
            x.iter().copied().zip(snapshot.pressure.iter().copied()),
            &BLACK,
        ))?;
        chart.draw_series(std::iter::once(Circle::new(
            (x[source_index], 0.0),
            5,
            RED.filled(),
        )))?;
        chart.draw_series(
            receivers
                .iter()
                .enumerate()
                .map(|(r, &i)| TriangleMarker::new((x[i], 0.0), 7, self.trace_color(r).filled())),
        )?;

        root.present()?;
        Ok(())
    }

    /// Velocity and density profiles along x.
    pub fn plot_model(&self, path: &Path, x: ArrayView1<f64>, medium: &MediumModel) -> Result<()> {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;
        let (x_min, x_max) = extent(x);
        let areas = root.split_evenly((2, 1));

        let panels = [
            ("P-wave velocity (m/s)", medium.velocities().view(), BLUE),
            ("density (kg/m³)", medium.densities().view(), RED),
        ];
        for (area, (label, values, color)) in areas.iter().zip(panels) {
            let (lo, hi) = padded_range(values);
            let mut chart = ChartBuilder::on(area)
                .caption(label, ("sans-serif", 20))
                .margin(10)
                .x_label_area_size(35)
                .y_label_area_size(70)
                .build_cartesian_2d(x_min..x_max, lo..hi)?;
            chart.configure_mesh().x_desc("x (m)").draw()?;
            chart.draw_series(LineSeries::new(
                x.iter().copied().zip(values.iter().copied()),
                color.stroke_width(2),
            ))?;
        }

        root.present()?;
        Ok(())
    }

    /// All three traces, normalised to the largest amplitude and offset by
    /// receiver.
    pub fn plot_seismogram(&self, path: &Path, output: &SimulationOutput) -> Result<()> {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let plan = &output.discretization;
        let peak = output.seismogram.max_abs();
        let scale = if peak > 0.0 { 0.45 / peak } else { 0.0 };

        let mut chart = ChartBuilder::on(&root)
            .caption("Seismogram", ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0.0..plan.total_time, -0.75..(RECEIVERS as f64 - 0.25))?;

        chart
            .configure_mesh()
            .x_desc("time (s)")
            .y_desc("receiver")
            .draw()?;

        for (r, &index) in output.seismogram.receivers().iter().enumerate() {
            let color = self.trace_color(r);
            let offset = r as f64;
            let trace = output.seismogram.trace(r);
            chart
                .draw_series(LineSeries::new(
                    trace
                        .iter()
                        .enumerate()
                        .map(|(n, &v)| (plan.time(n), offset + v * scale)),
                    color.stroke_width(2),
                ))?
                .label(format!("receiver {index}"))
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }
}

fn extent(x: ArrayView1<f64>) -> (f64, f64) {
    if x.is_empty() {
        return (0.0, 1.0);
    }
    let (lo, hi) = (x[0], x[x.len() - 1]);
    if hi > lo {
        (lo, hi)
    } else {
        (lo, lo + 1.0)
    }
}

fn symmetric_limit(values: ArrayView1<f64>) -> f64 {
    let max_abs = values.iter().map(|&v| v.abs()).fold(0.0_f64, f64::max);
    if max_abs > 0.0 {
        1.1 * max_abs
    } else {
        1.0
    }
}

fn padded_range(values: ArrayView1<f64>) -> (f64, f64) {
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let pad = if hi > lo { 0.1 * (hi - lo) } else { 0.1 * hi.abs().max(1.0) };
    (lo - pad, hi + pad)
}
