use ndarray::{Array2, ArrayView1, ArrayView2};

/// Number of receivers recorded in every run.
pub const RECEIVERS: usize = 3;

/// Pressure traces at fixed grid indices, one column per time step.
#[derive(Debug, Clone, PartialEq)]
pub struct Seismogram {
    receivers: [usize; RECEIVERS],
    traces: Array2<f64>, // (receiver, step)
}

impl Seismogram {
    pub fn new(receivers: [usize; RECEIVERS], nt: usize) -> Self {
        Self {
            receivers,
            traces: Array2::zeros((RECEIVERS, nt)),
        }
    }

    pub fn receivers(&self) -> [usize; RECEIVERS] {
        self.receivers
    }

    pub fn nt(&self) -> usize {
        self.traces.ncols()
    }

    /// Samples the pressure field at every receiver into column `n`.
    pub fn record(&mut self, n: usize, pressure: ArrayView1<f64>) {
        for (r, &index) in self.receivers.iter().enumerate() {
            self.traces[[r, n]] = pressure[index];
        }
    }

    pub fn trace(&self, receiver: usize) -> ArrayView1<'_, f64> {
        self.traces.row(receiver)
    }

    pub fn traces(&self) -> ArrayView2<'_, f64> {
        self.traces.view()
    }

    pub fn max_abs(&self) -> f64 {
        self.traces.iter().map(|v| v.abs()).fold(0.0_f64, f64::max)
    }

    /// First step whose amplitude reaches `fraction` of the trace's peak
    /// amplitude. `None` for a silent trace.
    pub fn first_break(&self, receiver: usize, fraction: f64) -> Option<usize> {
        let trace = self.trace(receiver);
        let peak = trace.iter().map(|v| v.abs()).fold(0.0_f64, f64::max);
        if peak == 0.0 {
            return None;
        }
        let threshold = fraction * peak;
        trace.iter().position(|v| v.abs() >= threshold)
    }

    /// Step of the largest absolute amplitude on a trace.
    pub fn peak_step(&self, receiver: usize) -> Option<usize> {
        let trace = self.trace(receiver);
        let (step, peak) = trace
            .iter()
            .enumerate()
            .map(|(n, v)| (n, v.abs()))
            .fold((0, 0.0_f64), |best, cur| if cur.1 > best.1 { cur } else { best });
        (peak > 0.0).then_some(step)
    }
}
