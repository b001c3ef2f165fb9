//! The `Solver` lifecycle trait and every Eikonal solver variant built on top
//! of [`crate::eikonal::solve_eikonal`].

mod ddqm;
mod fim;
mod fmm;
mod fmm_star;
mod fsm;
mod gmm;
mod lsm;
mod ufmm;

pub use ddqm::Ddqm;
pub use fim::Fim;
pub use fmm::{Fmm, FmmDary, FmmFib, Sfmm};
pub use fmm_star::{FmmStar, Heuristic};
pub use fsm::Fsm;
pub use gmm::Gmm;
pub use lsm::Lsm;
pub use ufmm::Ufmm;

use crate::cell::CellState;
use crate::error::{EikonalError, Result};
use crate::grid::NDGrid;

/// Shared lifecycle for every Eikonal solver variant.
///
/// `setup` validates preconditions and initializes solver-specific state;
/// `compute` runs to completion (or to the goal, if one was set) and records
/// wall time; `reset` restores the grid and internal state so another
/// `compute` can run against the same sources without reallocating the grid.
pub trait Solver<const N: usize> {
    /// Takes ownership of the grid this solver will operate on.
    fn set_grid(&mut self, grid: NDGrid<N>);

    /// Sets the source cells (arrival time `0`) and, for goal-aware solvers,
    /// the cell propagation should stop at.
    fn set_sources(&mut self, sources: Vec<usize>, goal: Option<usize>);

    /// Validates preconditions and prepares internal state. Must be called
    /// before [`Solver::compute`].
    ///
    /// # Errors
    ///
    /// Returns [`EikonalError::Precondition`] if the grid is missing or
    /// dirty, no sources were given, a goal is required but unset, or a
    /// source cell is impassable.
    fn setup(&mut self) -> Result<()>;

    /// Runs the algorithm to completion (or to the goal).
    fn compute(&mut self);

    /// Restores the grid and solver state so another `compute` can run.
    fn reset(&mut self);

    /// Releases the grid and all internal state.
    fn clear(&mut self);

    fn name(&self) -> &'static str;

    /// Wall-clock time of the most recent [`Solver::compute`] call, in
    /// milliseconds.
    fn time_ms(&self) -> f64;

    fn grid(&self) -> &NDGrid<N>;

    fn grid_mut(&mut self) -> &mut NDGrid<N>;
}

/// Validates the common preconditions shared by every solver variant.
pub(crate) fn check_preconditions<const N: usize>(
    grid: Option<&NDGrid<N>>,
    sources: &[usize],
    goal: Option<usize>,
    requires_goal: bool,
) -> Result<()> {
    let grid = grid.ok_or_else(|| EikonalError::Precondition("no grid set".into()))?;
    if !grid.is_clean() {
        return Err(EikonalError::Precondition(
            "grid is not clean; call reset before setup".into(),
        ));
    }
    if sources.is_empty() {
        return Err(EikonalError::Precondition("no sources given".into()));
    }
    if requires_goal && goal.is_none() {
        return Err(EikonalError::Precondition(
            "this solver requires a goal cell".into(),
        ));
    }
    for &s in sources {
        if grid.cell(s).velocity() <= 0.0 {
            return Err(EikonalError::Precondition(format!(
                "source cell {s} is impassable"
            )));
        }
    }
    Ok(())
}

/// Freezes every source cell at arrival time `0`. Shared by every solver's
/// `setup`.
pub(crate) fn freeze_sources<const N: usize>(grid: &mut NDGrid<N>, sources: &[usize]) {
    for &s in sources {
        let cell = grid.cell_mut(s);
        cell.set_value(0.0);
        cell.set_state(CellState::Frozen);
    }
}
