//! FMM with an admissible heuristic toward a goal cell (FMM*): the same
//! propagation as [`crate::solver::Fmm`], but the narrow band is ordered by
//! `T + h` instead of `T` alone, so the search focuses toward the goal.

use super::{check_preconditions, freeze_sources, Solver};
use crate::cell::CellState;
use crate::eikonal::{improves, solve_eikonal};
use crate::error::Result;
use crate::grid::NDGrid;
use std::time::Instant;
use tracing::info_span;

const NOT_PRESENT: usize = usize::MAX;

/// How the admissible heuristic is scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Heuristic {
    /// Euclidean distance to the goal, scaled by leafsize and divided by the
    /// grid's maximum velocity, giving a lower-bound *time* estimate.
    #[default]
    Time,
    /// Plain Euclidean distance in grid units, independent of leafsize or
    /// velocity.
    Distance,
}

/// A binary min-heap ordered by an externally supplied priority (`T + h`)
/// rather than a cell's raw arrival time, since [`crate::heap::NarrowBand`]
/// is keyed purely on `Cell::value`.
#[derive(Default)]
struct PriorityHeap {
    heap: Vec<usize>,
    positions: Vec<usize>,
}

impl PriorityHeap {
    fn ensure(&mut self, size: usize) {
        if self.positions.len() < size {
            self.positions.resize(size, NOT_PRESENT);
        }
    }

    fn sift_up(&mut self, priority: &[f64], mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if priority[self.heap[slot]] < priority[self.heap[parent]] {
                self.swap_slots(parent, slot);
                slot = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, priority: &[f64], mut slot: usize) {
        loop {
            let left = slot * 2 + 1;
            let right = left + 1;
            let mut smallest = slot;
            if left < self.heap.len() && priority[self.heap[left]] < priority[self.heap[smallest]]
            {
                smallest = left;
            }
            if right < self.heap.len() && priority[self.heap[right]] < priority[self.heap[smallest]]
            {
                smallest = right;
            }
            if smallest == slot {
                break;
            }
            self.swap_slots(smallest, slot);
            slot = smallest;
        }
    }

    fn swap_slots(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.positions[self.heap[a]] = a;
        self.positions[self.heap[b]] = b;
    }

    fn push(&mut self, priority: &[f64], idx: usize) {
        self.ensure(priority.len());
        let slot = self.heap.len();
        self.heap.push(idx);
        self.positions[idx] = slot;
        self.sift_up(priority, slot);
    }

    fn decrease(&mut self, priority: &[f64], idx: usize) {
        let slot = self.positions[idx];
        debug_assert_ne!(slot, NOT_PRESENT);
        self.sift_up(priority, slot);
    }

    fn pop_min(&mut self, priority: &[f64]) -> Option<usize> {
        if self.heap.is_empty() {
            return None;
        }
        let min = self.heap[0];
        self.positions[min] = NOT_PRESENT;
        let last = self.heap.pop().unwrap();
        if !self.heap.is_empty() {
            self.heap[0] = last;
            self.positions[last] = 0;
            self.sift_down(priority, 0);
        }
        Some(min)
    }

    fn clear(&mut self) {
        self.heap.clear();
        self.positions.iter_mut().for_each(|p| *p = NOT_PRESENT);
    }
}

/// Fast Marching Method with a goal-directed admissible heuristic.
pub struct FmmStar<const N: usize> {
    grid: Option<NDGrid<N>>,
    sources: Vec<usize>,
    goal: Option<usize>,
    mode: Heuristic,
    /// `T + h` priority per cell, rebuilt (for `h`) at each `setup`.
    priority: Vec<f64>,
    heap: PriorityHeap,
    elapsed_ms: f64,
}

impl<const N: usize> Default for FmmStar<N> {
    fn default() -> Self {
        Self {
            grid: None,
            sources: Vec::new(),
            goal: None,
            mode: Heuristic::default(),
            priority: Vec::new(),
            heap: PriorityHeap::default(),
            elapsed_ms: 0.0,
        }
    }
}

impl<const N: usize> FmmStar<N> {
    #[must_use]
    pub fn new(mode: Heuristic) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    fn heuristic(&self, grid: &NDGrid<N>, idx: usize) -> f64 {
        let goal = self.goal.expect("goal validated in setup");
        let goal_coord = grid.idx_to_coord(goal);
        let coord = grid.idx_to_coord(idx);
        let mut sum_sq = 0.0;
        for k in 0..N {
            let diff = coord[k] as f64 - goal_coord[k] as f64;
            sum_sq += diff * diff;
        }
        let dist = sum_sq.sqrt();
        match self.mode {
            Heuristic::Distance => dist,
            Heuristic::Time => {
                let max_velocity = grid
                    .cells()
                    .iter()
                    .map(crate::cell::Cell::velocity)
                    .fold(0.0, f64::max)
                    .max(f64::EPSILON);
                dist * grid.leafsize() / max_velocity
            }
        }
    }

    fn push(&mut self, grid: &NDGrid<N>, idx: usize) {
        self.priority[idx] = grid.cell(idx).value() + self.heuristic(grid, idx);
        self.heap.push(&self.priority, idx);
    }

    fn decrease(&mut self, grid: &NDGrid<N>, idx: usize) {
        self.priority[idx] = grid.cell(idx).value() + self.heuristic(grid, idx);
        self.heap.decrease(&self.priority, idx);
    }
}

impl<const N: usize> Solver<N> for FmmStar<N> {
    fn set_grid(&mut self, grid: NDGrid<N>) {
        self.grid = Some(grid);
    }

    fn set_sources(&mut self, sources: Vec<usize>, goal: Option<usize>) {
        self.sources = sources;
        self.goal = goal;
    }

    fn setup(&mut self) -> Result<()> {
        check_preconditions(self.grid.as_ref(), &self.sources, self.goal, true)?;
        let grid = self.grid.as_mut().unwrap();
        grid.mark_dirty();
        self.priority = vec![0.0; grid.size()];
        self.heap.clear();
        freeze_sources(grid, &self.sources);
        let neighbors: Vec<usize> = self
            .sources
            .iter()
            .flat_map(|&s| grid.neighbor_iter(s).collect::<Vec<_>>())
            .collect();
        for n in neighbors {
            if grid.cell(n).is_open() && grid.cell(n).velocity() > 0.0 {
                let t = solve_eikonal(grid, n);
                let cell = grid.cell_mut(n);
                cell.set_value(t);
                cell.set_state(CellState::Narrow);
                self.push(grid, n);
            }
        }
        Ok(())
    }

    fn compute(&mut self) {
        let goal = self.goal.expect("goal validated in setup");
        let _span = info_span!("fmm_star::compute").entered();
        let start = Instant::now();

        loop {
            let grid = self.grid.as_mut().expect("grid set in setup");
            let Some(i) = self.heap.pop_min(&self.priority) else {
                break;
            };
            grid.cell_mut(i).set_state(CellState::Frozen);
            if i == goal {
                break;
            }
            let neighbors: Vec<usize> = grid.neighbor_iter(i).collect();
            for n in neighbors {
                let grid = self.grid.as_mut().unwrap();
                if grid.cell(n).is_frozen() || grid.cell(n).velocity() <= 0.0 {
                    continue;
                }
                let t = solve_eikonal(grid, n);
                if grid.cell(n).is_open() {
                    let cell = grid.cell_mut(n);
                    cell.set_value(t);
                    cell.set_state(CellState::Narrow);
                    self.push(grid, n);
                } else if improves(t, grid.cell(n).value()) {
                    grid.cell_mut(n).set_value(t);
                    self.decrease(grid, n);
                }
            }
        }

        self.elapsed_ms = start.elapsed().as_secs_f64() * 1e3;
    }

    fn reset(&mut self) {
        if let Some(grid) = self.grid.as_mut() {
            grid.reset();
        }
        self.heap.clear();
    }

    fn clear(&mut self) {
        self.grid = None;
        self.sources.clear();
        self.goal = None;
        self.priority.clear();
        self.heap.clear();
        self.elapsed_ms = 0.0;
    }

    fn name(&self) -> &'static str {
        "fmm_star"
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
    use crate::solver::FmmDary;

    #[test]
    fn matches_fmm_arrival_time_at_goal_on_uniform_grid() {
        let source_grid: NDGrid<2> = NDGrid::new([30, 30], 1.0);
        let source = source_grid.coord_to_idx([2, 2]);
        let goal = source_grid.coord_to_idx([27, 27]);

        let mut fmm: FmmDary<2> = FmmDary::new();
        fmm.set_grid(NDGrid::new([30, 30], 1.0));
        fmm.set_sources(vec![source], None);
        fmm.setup().unwrap();
        fmm.compute();

        let mut star: FmmStar<2> = FmmStar::new(Heuristic::Time);
        star.set_grid(NDGrid::new([30, 30], 1.0));
        star.set_sources(vec![source], Some(goal));
        star.setup().unwrap();
        star.compute();

        let a = fmm.grid().cell(goal).value();
        let b = star.grid().cell(goal).value();
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn setup_requires_goal() {
        let mut star: FmmStar<2> = FmmStar::new(Heuristic::Time);
        let grid: NDGrid<2> = NDGrid::new([10, 10], 1.0);
        let source = grid.coord_to_idx([1, 1]);
        star.set_grid(grid);
        star.set_sources(vec![source], None);
        assert!(star.setup().is_err());
    }
}
