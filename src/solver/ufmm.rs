//! Untidy Fast Marching Method: FMM driven by the approximate bucket-queue
//! narrow band instead of a heap, trading optimality for near-linear time.

use super::{Fmm, Solver};
use crate::error::Result;
use crate::grid::NDGrid;
use crate::heap::UntidyQueue;

/// FMM over an [`UntidyQueue`] narrow band. Structurally identical to
/// [`crate::solver::Fmm`]; wrapped in its own type so [`Solver::name`]
/// reports `"ufmm"` and so construction can expose the queue's `(S, Δ)`
/// parameters without complicating [`Fmm`]'s generic signature.
#[derive(Default)]
pub struct Ufmm<const N: usize> {
    inner: Fmm<UntidyQueue, N>,
}

impl<const N: usize> Ufmm<N> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<const N: usize> Solver<N> for Ufmm<N> {
    fn set_grid(&mut self, grid: NDGrid<N>) {
        self.inner.set_grid(grid);
    }

    fn set_sources(&mut self, sources: Vec<usize>, goal: Option<usize>) {
        self.inner.set_sources(sources, goal);
    }

    fn setup(&mut self) -> Result<()> {
        self.inner.setup()
    }

    fn compute(&mut self) {
        self.inner.compute();
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    fn clear(&mut self) {
        self.inner.clear();
    }

    fn name(&self) -> &'static str {
        "ufmm"
    }

    fn time_ms(&self) -> f64 {
        self.inner.time_ms()
    }

    fn grid(&self) -> &NDGrid<N> {
        self.inner.grid()
    }

    fn grid_mut(&mut self) -> &mut NDGrid<N> {
        self.inner.grid_mut()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn approximates_fmm_within_bucket_width() {
        use crate::solver::FmmDary;
        use crate::heap::DEFAULT_DELTA;

        let mut ufmm: Ufmm<2> = Ufmm::new();
        ufmm.set_grid(NDGrid::new([40, 40], 1.0));
        let source = ufmm.grid().coord_to_idx([20, 20]);
        ufmm.set_sources(vec![source], None);
        ufmm.setup().unwrap();
        ufmm.compute();

        let mut fmm: FmmDary<2> = FmmDary::new();
        fmm.set_grid(NDGrid::new([40, 40], 1.0));
        fmm.set_sources(vec![source], None);
        fmm.setup().unwrap();
        fmm.compute();

        let target = ufmm.grid().coord_to_idx([35, 35]);
        let diff = (ufmm.grid().cell(target).value() - fmm.grid().cell(target).value()).abs();
        assert!(
            diff <= DEFAULT_DELTA * ufmm.grid().leafsize() + 1e-9,
            "UFMM/FMM mismatch: {diff}"
        );
    }
}
