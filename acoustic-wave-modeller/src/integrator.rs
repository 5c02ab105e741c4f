//! Four-level Adams-Bashforth time stepping.
//!
//! Each field keeps the last four spatial-derivative evaluations in a ring of
//! four buffers. A new evaluation is written straight into the slot of the
//! oldest one, so advancing never copies whole arrays.

use std::ops::Range;

use ndarray::{s, Array1, ArrayView1, ArrayViewMut1, Zip};

use crate::grid::Grid;
use crate::stencil::{Execution, Stencil};

/// Weights applied to the derivatives at levels n, n-1, n-2, n-3.
pub const WEIGHTS: [f64; 4] = [13.0 / 12.0, -5.0 / 24.0, 1.0 / 6.0, -1.0 / 24.0];

const LEVELS: usize = 4;

/// The four most recent derivative evaluations of one field.
#[derive(Debug, Clone)]
pub struct DerivativeHistory {
    slots: [Array1<f64>; LEVELS],
    newest: usize,
}

impl DerivativeHistory {
    pub fn zeros(nx: usize) -> Self {
        Self {
            slots: std::array::from_fn(|_| Array1::zeros(nx)),
            newest: 0,
        }
    }

    fn slot_index(&self, age: usize) -> usize {
        (self.newest + age) % LEVELS
    }

    /// Derivative stored `age` updates ago, 0 being the newest.
    pub fn get(&self, age: usize) -> ArrayView1<'_, f64> {
        assert!(age < LEVELS, "history only holds {LEVELS} levels");
        self.slots[self.slot_index(age)].view()
    }

    /// The buffer that the next evaluation overwrites, currently the oldest.
    pub fn incoming_mut(&mut self) -> ArrayViewMut1<'_, f64> {
        let idx = self.slot_index(LEVELS - 1);
        self.slots[idx].view_mut()
    }

    /// Promotes the incoming buffer to newest and ages the rest by one.
    fn rotate(&mut self) {
        self.newest = self.slot_index(LEVELS - 1);
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.fill(0.0);
        }
        self.newest = 0;
    }
}

#[derive(Debug, Clone)]
pub struct AdamsBashforth {
    history: DerivativeHistory,
    range: Range<usize>,
}

impl AdamsBashforth {
    pub fn new(grid: &Grid) -> Self {
        Self {
            history: DerivativeHistory::zeros(grid.nx),
            range: grid.interior(),
        }
    }

    pub fn history(&self) -> &DerivativeHistory {
        &self.history
    }

    /// Buffer to fill with the current derivative before calling `advance`.
    pub fn derivative_slot(&mut self) -> ArrayViewMut1<'_, f64> {
        self.history.incoming_mut()
    }

    /// Subtracts `coefficient * dt * sum(w_i d_i)` from `field` over the
    /// interior, with `d0` taken from the derivative slot, then rotates the
    /// history so `d0` becomes the newest entry.
    pub fn advance(
        &mut self,
        field: &mut Array1<f64>,
        coefficient: ArrayView1<f64>,
        dt: f64,
        execution: Execution,
    ) {
        let (a, b) = (self.range.start, self.range.end);
        let d0 = self.history.slots[self.history.slot_index(LEVELS - 1)].slice(s![a..b]);
        let d1 = self.history.get(0).slice_move(s![a..b]);
        let d2 = self.history.get(1).slice_move(s![a..b]);
        let d3 = self.history.get(2).slice_move(s![a..b]);
        let [w0, w1, w2, w3] = WEIGHTS;

        let zip = Zip::from(field.slice_mut(s![a..b]))
            .and(coefficient.slice_move(s![a..b]))
            .and(d0)
            .and(d1)
            .and(d2)
            .and(d3);
        let update = |u: &mut f64, &c: &f64, &d0: &f64, &d1: &f64, &d2: &f64, &d3: &f64| {
            *u -= c * dt * (w0 * d0 + w1 * d1 + w2 * d2 + w3 * d3);
        };
        match execution {
            Execution::Serial => zip.for_each(update),
            Execution::Parallel => zip.par_for_each(update),
        }

        self.history.rotate();
    }

    /// Evaluates the stencil on `driver` into the derivative slot and advances
    /// `field` with it.
    pub fn step(
        &mut self,
        field: &mut Array1<f64>,
        driver: ArrayView1<f64>,
        stencil: &Stencil,
        coefficient: ArrayView1<f64>,
        dt: f64,
        execution: Execution,
    ) {
        stencil.apply(driver, self.derivative_slot(), execution);
        self.advance(field, coefficient, dt, execution);
    }
}
