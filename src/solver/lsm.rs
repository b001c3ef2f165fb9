//! Locking Sweep Method: Fast Sweeping with a per-cell lock that prunes
//! cells once they stop improving, re-opened only if a neighbor changes.

use super::{check_preconditions, freeze_sources, Solver};
use crate::cell::CellState;
use crate::eikonal::{improves, solve_eikonal};
use crate::error::Result;
use crate::grid::NDGrid;
use std::time::Instant;
use tracing::info_span;

/// Locking Sweep Method.
///
/// Produces the same fixed point as [`crate::solver::Fsm`], typically with
/// far fewer cell updates once most of the grid locks.
pub struct Lsm<const N: usize> {
    grid: Option<NDGrid<N>>,
    sources: Vec<usize>,
    goal: Option<usize>,
    locked: Vec<bool>,
    max_sweeps: u32,
    elapsed_ms: f64,
    sweeps_run: u32,
}

impl<const N: usize> Default for Lsm<N> {
    fn default() -> Self {
        Self {
            grid: None,
            sources: Vec::new(),
            goal: None,
            locked: Vec::new(),
            max_sweeps: u32::MAX,
            elapsed_ms: 0.0,
            sweeps_run: 0,
        }
    }
}

impl<const N: usize> Lsm<N> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn direction_signs(s: usize) -> [bool; N] {
        let mut signs = [true; N];
        for (k, sign) in signs.iter_mut().enumerate() {
            *sign = (s >> k) & 1 == 0;
        }
        signs
    }

    fn sweep_once(&mut self, grid: &mut NDGrid<N>, signs: [bool; N]) -> (bool, bool) {
        let dimsize = grid.dim_sizes();
        let mut improved_any = false;
        let mut goal_settled = false;
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

            if self.locked[idx] {
                continue;
            }
            let cell = grid.cell(idx);
            if cell.is_frozen() || cell.velocity() <= 0.0 {
                continue;
            }

            let t = solve_eikonal(grid, idx);
            if improves(t, grid.cell(idx).value()) {
                let cell = grid.cell_mut(idx);
                cell.set_value(t);
                cell.set_state(CellState::Narrow);
                improved_any = true;
                self.locked[idx] = false;
                for n in grid.neighbor_iter(idx).collect::<Vec<_>>() {
                    self.locked[n] = false;
                }
            } else {
                self.locked[idx] = true;
                if self.goal == Some(idx) {
                    goal_settled = true;
                }
            }
        }
        (improved_any, goal_settled)
    }
}

impl<const N: usize> Solver<N> for Lsm<N> {
    fn set_grid(&mut self, grid: NDGrid<N>) {
        self.grid = Some(grid);
    }

    fn set_sources(&mut self, sources: Vec<usize>, goal: Option<usize>) {
        self.sources = sources;
        self.goal = goal;
    }

    fn setup(&mut self) -> Result<()> {
        check_preconditions(self.grid.as_ref(), &self.sources, None, false)?;
        let grid = self.grid.as_mut().unwrap();
        grid.mark_dirty();
        freeze_sources(grid, &self.sources);
        self.locked = vec![false; grid.size()];
        for &s in &self.sources {
            self.locked[s] = true;
        }
        self.sweeps_run = 0;
        Ok(())
    }

    fn compute(&mut self) {
        let _span = {
            let grid = self.grid.as_ref().expect("grid set in setup");
            info_span!("lsm::compute", cells = grid.size())
        }
        .entered();
        let start = Instant::now();

        let directions = 1usize << N;
        self.sweeps_run = 0;
        loop {
            let signs = Self::direction_signs(self.sweeps_run as usize % directions);
            let mut grid = self.grid.take().expect("grid set in setup");
            let (improved, goal_settled) = self.sweep_once(&mut grid, signs);
            self.grid = Some(grid);
            self.sweeps_run += 1;

            let goal_known = self.goal.map(|g| self.grid().cell(g).value().is_finite());
            if (goal_settled && goal_known == Some(true))
                || !improved
                || self.sweeps_run >= self.max_sweeps
            {
                break;
            }
        }

        let grid = self.grid.as_mut().unwrap();
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
        self.locked.iter_mut().for_each(|l| *l = false);
        self.sweeps_run = 0;
    }

    fn clear(&mut self) {
        self.grid = None;
        self.sources.clear();
        self.goal = None;
        self.locked.clear();
        self.elapsed_ms = 0.0;
    }

    fn name(&self) -> &'static str {
        "lsm"
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
    fn converges_to_fixed_point_matching_fmm() {
        use crate::solver::FmmDary;

        let mut lsm: Lsm<2> = Lsm::new();
        lsm.set_grid(NDGrid::new([20, 20], 1.0));
        let source = lsm.grid().coord_to_idx([10, 10]);
        lsm.set_sources(vec![source], None);
        lsm.setup().unwrap();
        lsm.compute();

        let mut fmm: FmmDary<2> = FmmDary::new();
        fmm.set_grid(NDGrid::new([20, 20], 1.0));
        fmm.set_sources(vec![source], None);
        fmm.setup().unwrap();
        fmm.compute();

        let target = lsm.grid().coord_to_idx([18, 18]);
        let diff = (lsm.grid().cell(target).value() - fmm.grid().cell(target).value()).abs();
        assert!(diff < 1e-6, "LSM/FMM mismatch: {diff}");
    }
}
