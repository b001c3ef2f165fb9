//! Fast Sweeping Method: a Gauss-Seidel-like solver that relaxes the whole
//! grid in `2^N` axis-direction sweeps until no cell improves.

use super::{check_preconditions, freeze_sources, Solver};
use crate::cell::CellState;
use crate::eikonal::{improves, solve_eikonal};
use crate::error::Result;
use crate::grid::NDGrid;
use std::time::Instant;
use tracing::info_span;

/// Fast Sweeping Method.
pub struct Fsm<const N: usize> {
    grid: Option<NDGrid<N>>,
    sources: Vec<usize>,
    max_sweeps: u32,
    elapsed_ms: f64,
    sweeps_run: u32,
}

impl<const N: usize> Default for Fsm<N> {
    fn default() -> Self {
        Self {
            grid: None,
            sources: Vec::new(),
            max_sweeps: u32::MAX,
            elapsed_ms: 0.0,
            sweeps_run: 0,
        }
    }
}

impl<const N: usize> Fsm<N> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_sweeps(max_sweeps: u32) -> Self {
        Self {
            max_sweeps,
            ..Self::default()
        }
    }

    /// Number of sweeps the most recent `compute` ran.
    #[must_use]
    pub fn sweeps_run(&self) -> u32 {
        self.sweeps_run
    }

    /// Direction signs for sweep `s`: `true` means "counting upward" for
    /// that dimension. Bit `k` of `s` selects dimension `k`'s sign, `0`
    /// meaning positive.
    fn direction_signs(s: usize) -> [bool; N] {
        let mut signs = [true; N];
        for (k, sign) in signs.iter_mut().enumerate() {
            *sign = (s >> k) & 1 == 0;
        }
        signs
    }

    /// One full pass over every cell in the orientation given by `signs`.
    /// Returns whether any cell's arrival time strictly improved.
    fn sweep_once(grid: &mut NDGrid<N>, signs: [bool; N]) -> bool {
        let dimsize = grid.dim_sizes();
        let mut improved = false;
        for linear in 0..grid.size() {
            let counting_coord = grid.idx_to_coord(linear);
            let mut actual = [0u32; N];
            for k in 0..N {
                actual[k] = if signs[k] {
                    counting_coord[k]
                } else {
                    dimsize[k] - 1 - counting_coord[k]
                };
            }
            let idx = grid.coord_to_idx(actual);
            let cell = grid.cell(idx);
            if cell.is_frozen() || cell.velocity() <= 0.0 {
                continue;
            }
            let t = solve_eikonal(grid, idx);
            if improves(t, grid.cell(idx).value()) {
                let cell = grid.cell_mut(idx);
                cell.set_value(t);
                cell.set_state(CellState::Narrow);
                improved = true;
            }
        }
        improved
    }
}

impl<const N: usize> Solver<N> for Fsm<N> {
    fn set_grid(&mut self, grid: NDGrid<N>) {
        self.grid = Some(grid);
    }

    fn set_sources(&mut self, sources: Vec<usize>, _goal: Option<usize>) {
        self.sources = sources;
    }

    fn setup(&mut self) -> Result<()> {
        check_preconditions(self.grid.as_ref(), &self.sources, None, false)?;
        let grid = self.grid.as_mut().unwrap();
        grid.mark_dirty();
        freeze_sources(grid, &self.sources);
        self.sweeps_run = 0;
        Ok(())
    }

    fn compute(&mut self) {
        let grid = self.grid.as_mut().expect("grid set in setup");
        let _span = info_span!("fsm::compute", cells = grid.size()).entered();
        let start = Instant::now();

        let directions = 1usize << N;
        self.sweeps_run = 0;
        loop {
            let signs = Self::direction_signs(self.sweeps_run as usize % directions);
            let improved = Self::sweep_once(grid, signs);
            self.sweeps_run += 1;
            if !improved || self.sweeps_run >= self.max_sweeps {
                break;
            }
        }

        for cell in grid.cells().to_vec() {
            if cell.state() == CellState::Narrow {
                grid.cell_mut(cell.index()).set_state(CellState::Frozen);
            }
        }

        self.elapsed_ms = start.elapsed().as_secs_f64() * 1e3;
    }

    fn reset(&mut self) {
        if let Some(grid) = self.grid.as_mut() {
            grid.reset();
        }
        self.sweeps_run = 0;
    }

    fn clear(&mut self) {
        self.grid = None;
        self.sources.clear();
        self.sweeps_run = 0;
        self.elapsed_ms = 0.0;
    }

    fn name(&self) -> &'static str {
        "fsm"
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
    fn direction_signs_cover_all_2n_combinations_for_3d() {
        let mut seen = std::collections::HashSet::new();
        for s in 0..8 {
            seen.insert(Fsm::<3>::direction_signs(s));
        }
        assert_eq!(seen.len(), 8);
    }

    #[test]
    fn converges_to_fixed_point_matching_fmm() {
        use crate::solver::FmmDary;

        let mut fsm: Fsm<2> = Fsm::new();
        fsm.set_grid(NDGrid::new([20, 20], 1.0));
        let source = fsm.grid().coord_to_idx([10, 10]);
        fsm.set_sources(vec![source], None);
        fsm.setup().unwrap();
        fsm.compute();

        let mut fmm: FmmDary<2> = FmmDary::new();
        fmm.set_grid(NDGrid::new([20, 20], 1.0));
        fmm.set_sources(vec![source], None);
        fmm.setup().unwrap();
        fmm.compute();

        let target = fsm.grid().coord_to_idx([18, 18]);
        let diff = (fsm.grid().cell(target).value() - fmm.grid().cell(target).value()).abs();
        assert!(diff < 1e-6, "FSM/FMM mismatch: {diff}");
    }
}
