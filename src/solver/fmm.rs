//! Priority-queue Fast Marching: the foundational solver. `FmmDary`,
//! `FmmFib`, and `Sfmm` are the same algorithm body over different
//! [`NarrowBand`] implementations — the SFMM "skip frozen on pop" behavior
//! comes entirely from [`UnsortedQueue`]'s `pop_min` contract.

use super::{check_preconditions, freeze_sources, Solver};
use crate::cell::CellState;
use crate::eikonal::{improves, solve_eikonal};
use crate::error::Result;
use crate::grid::NDGrid;
use crate::heap::{DaryHeap, FibHeap, NarrowBand, UnsortedQueue};
use std::marker::PhantomData;
use std::time::Instant;
use tracing::info_span;

/// Fast Marching Method, generic over its narrow-band implementation `NB`.
pub struct Fmm<NB, const N: usize> {
    grid: Option<NDGrid<N>>,
    sources: Vec<usize>,
    goal: Option<usize>,
    band: NB,
    elapsed_ms: f64,
    _marker: PhantomData<NB>,
}

/// FMM with a binary-heap narrow band (the default, handle-based O(log n)
/// `decrease`).
pub type FmmDary<const N: usize> = Fmm<DaryHeap<2>, N>;
/// FMM with a Fibonacci-heap narrow band (amortized O(1) `push`/`decrease`).
pub type FmmFib<const N: usize> = Fmm<FibHeap, N>;
/// "Simplified" FMM: an unsorted priority queue that tolerates duplicate
/// entries instead of an O(log n) `decrease`.
pub type Sfmm<const N: usize> = Fmm<UnsortedQueue, N>;

impl<NB: NarrowBand<N> + Default, const N: usize> Default for Fmm<NB, N> {
    fn default() -> Self {
        Self {
            grid: None,
            sources: Vec::new(),
            goal: None,
            band: NB::default(),
            elapsed_ms: 0.0,
            _marker: PhantomData,
        }
    }
}

impl<NB, const N: usize> Fmm<NB, N>
where
    NB: NarrowBand<N> + Default,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<NB, const N: usize> Solver<N> for Fmm<NB, N>
where
    NB: NarrowBand<N> + Default,
{
    fn set_grid(&mut self, grid: NDGrid<N>) {
        self.grid = Some(grid);
    }

    fn set_sources(&mut self, sources: Vec<usize>, goal: Option<usize>) {
        self.sources = sources;
        self.goal = goal;
    }

    fn setup(&mut self) -> Result<()> {
        check_preconditions(self.grid.as_ref(), &self.sources, self.goal, false)?;
        let grid = self.grid.as_mut().unwrap();
        grid.mark_dirty();
        self.band.clear();
        self.band.reserve(grid.size());
        freeze_sources(grid, &self.sources);
        for &s in &self.sources {
            for n in grid.neighbor_iter(s).collect::<Vec<_>>() {
                if grid.cell(n).is_open() && grid.cell(n).velocity() > 0.0 {
                    let t = solve_eikonal(grid, n);
                    let cell = grid.cell_mut(n);
                    cell.set_value(t);
                    cell.set_state(CellState::Narrow);
                    self.band.push(grid, n);
                }
            }
        }
        Ok(())
    }

    fn compute(&mut self) {
        let grid = self.grid.as_mut().expect("grid set in setup");
        let _span = info_span!("fmm::compute", cells = grid.size()).entered();
        let start = Instant::now();

        while let Some(i) = self.band.pop_min(grid) {
            grid.cell_mut(i).set_state(CellState::Frozen);
            if self.goal == Some(i) {
                break;
            }
            for n in grid.neighbor_iter(i).collect::<Vec<_>>() {
                if grid.cell(n).is_frozen() || grid.cell(n).velocity() <= 0.0 {
                    continue;
                }
                let t = solve_eikonal(grid, n);
                if grid.cell(n).is_open() {
                    let cell = grid.cell_mut(n);
                    cell.set_value(t);
                    cell.set_state(CellState::Narrow);
                    self.band.push(grid, n);
                } else if improves(t, grid.cell(n).value()) {
                    grid.cell_mut(n).set_value(t);
                    self.band.decrease(grid, n);
                }
            }
        }

        self.elapsed_ms = start.elapsed().as_secs_f64() * 1e3;
    }

    fn reset(&mut self) {
        if let Some(grid) = self.grid.as_mut() {
            grid.reset();
        }
        self.band.clear();
    }

    fn clear(&mut self) {
        self.grid = None;
        self.sources.clear();
        self.goal = None;
        self.band.clear();
        self.elapsed_ms = 0.0;
    }

    fn name(&self) -> &'static str {
        "fmm"
    }

    fn time_ms(&self) -> f64 {
        self.elapsed_ms
    }

    fn grid(&self) -> &NDGrid<N> {
        self.grid.as_ref().expect("grid set in setup")
    }

    fn grid_mut(&mut self) -> &mut NDGrid<N> {
        self.grid.as_mut().expect("grid set in setup")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn source_has_zero_arrival_time() {
        let mut solver: FmmDary<2> = FmmDary::new();
        let grid: NDGrid<2> = NDGrid::new([10, 10], 1.0);
        let source = grid.coord_to_idx([5, 5]);
        solver.set_grid(grid);
        solver.set_sources(vec![source], None);
        solver.setup().unwrap();
        solver.compute();
        assert_eq!(solver.grid().cell(source).value(), 0.0);
    }

    #[test]
    fn uniform_speed_matches_euclidean_distance() {
        let mut solver: FmmDary<2> = FmmDary::new();
        let grid: NDGrid<2> = NDGrid::new([300, 300], 1.0);
        let source = grid.coord_to_idx([150, 150]);
        solver.set_grid(grid);
        solver.set_sources(vec![source], None);
        solver.setup().unwrap();
        solver.compute();
        let target = solver.grid().coord_to_idx([250, 250]);
        let t = solver.grid().cell(target).value();
        assert!((t - (2f64).sqrt() * 100.0).abs() < 1.0);
    }

    #[test]
    fn dary_and_fib_agree_on_uniform_grid() {
        let make_grid = || {
            let g: NDGrid<2> = NDGrid::new([40, 40], 1.0);
            g
        };
        let source = make_grid().coord_to_idx([20, 20]);

        let mut dary: FmmDary<2> = FmmDary::new();
        dary.set_grid(make_grid());
        dary.set_sources(vec![source], None);
        dary.setup().unwrap();
        dary.compute();

        let mut fib: FmmFib<2> = FmmFib::new();
        fib.set_grid(make_grid());
        fib.set_sources(vec![source], None);
        fib.setup().unwrap();
        fib.compute();

        for idx in 0..dary.grid().size() {
            let a = dary.grid().cell(idx).value();
            let b = fib.grid().cell(idx).value();
            if a.is_finite() || b.is_finite() {
                assert!((a - b).abs() < 1e-9, "mismatch at {idx}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn setup_rejects_impassable_source() {
        let mut solver: Sfmm<2> = Sfmm::new();
        let mut grid: NDGrid<2> = NDGrid::new([5, 5], 1.0);
        let source = grid.coord_to_idx([2, 2]);
        grid.set_occupancy([(source, false)]);
        solver.set_grid(grid);
        solver.set_sources(vec![source], None);
        assert!(solver.setup().is_err());
    }
}
