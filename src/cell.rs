//! The value-bearing unit of an [`crate::grid::NDGrid`].

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Lifecycle state of a cell within a running solver, per the classic Fast
/// Marching state machine: `Open` -> `Narrow` -> `Frozen`, monotonically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum CellState {
    /// Never touched by a running solver.
    #[default]
    Open,
    /// Has a tentative arrival time and is present in the active narrow-band
    /// structure.
    Narrow,
    /// Arrival time is final.
    Frozen,
}

/// A single cell of an [`crate::grid::NDGrid`].
///
/// Holds the arrival time (`value`), local propagation speed (`velocity`),
/// occupancy, lifecycle `state`, and the cell's own flat index. `bucket` and
/// `heuristic` are method-specific slots used only by [`crate::solver::Ufmm`]
/// and [`crate::solver::FmmStar`] respectively; they are folded into one
/// struct rather than mirrored as a `Cell` -> `FMCell` -> `FMStarCell`
/// inheritance chain, since this crate has exactly one cell shape.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Cell {
    value: f64,
    velocity: f64,
    occupied: bool,
    state: CellState,
    index: usize,
    /// Only meaningful for [`crate::solver::Ufmm`]: the bucket slot the cell
    /// currently occupies in the untidy queue.
    pub(crate) bucket: usize,
    /// Only meaningful for [`crate::solver::FmmStar`]: the admissible
    /// lower-bound estimate of remaining time to the goal.
    pub(crate) heuristic: f64,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            value: f64::INFINITY,
            velocity: 1.0,
            occupied: true,
            state: CellState::Open,
            index: 0,
            bucket: 0,
            heuristic: 0.0,
        }
    }
}

impl Cell {
    /// Arrival time `T`. Defaults to `+inf`; a source cell's value is `0`.
    #[inline]
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[inline]
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    /// Local propagation speed `F`, in `[0, 1]` under the default occupancy
    /// convention. `0` means impassable.
    #[inline]
    #[must_use]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    #[inline]
    pub fn set_velocity(&mut self, velocity: f64) {
        self.velocity = velocity;
    }

    /// Whether this cell may be traversed. An unoccupied cell forces
    /// `velocity` to `0` via [`Cell::set_occupied`].
    #[inline]
    #[must_use]
    pub fn occupied(&self) -> bool {
        self.occupied
    }

    /// Sets occupancy. When `occupied` is `false`, velocity is forced to `0`;
    /// restoring occupancy does not itself restore a prior velocity value,
    /// matching the grid's painting API which always sets both together.
    #[inline]
    pub fn set_occupied(&mut self, occupied: bool) {
        self.occupied = occupied;
        if !occupied {
            self.velocity = 0.0;
        }
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> CellState {
        self.state
    }

    #[inline]
    pub fn set_state(&mut self, state: CellState) {
        self.state = state;
    }

    /// This cell's own position in the grid's flat backing storage.
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// `true` iff this cell has never been visited by a solver.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == CellState::Open
    }

    /// `true` iff this cell's arrival time is final.
    #[inline]
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.state == CellState::Frozen
    }

    /// Restores this cell to its default solver-facing state (`value`,
    /// `state`) while preserving `occupied`/`velocity`, then reconciles
    /// velocity with occupancy. Used by [`crate::grid::NDGrid::reset`]
    /// between benchmark runs.
    #[inline]
    pub fn set_default(&mut self) {
        self.value = f64::INFINITY;
        self.state = CellState::Open;
        self.bucket = 0;
        self.heuristic = 0.0;
        if !self.occupied {
            self.velocity = 0.0;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_cell_is_open_and_passable() {
        let cell = Cell::default();
        assert_eq!(cell.value(), f64::INFINITY);
        assert!(cell.occupied());
        assert_eq!(cell.velocity(), 1.0);
        assert!(cell.is_open());
    }

    #[test]
    fn set_occupied_false_zeroes_velocity() {
        let mut cell = Cell::default();
        cell.set_velocity(0.8);
        cell.set_occupied(false);
        assert_eq!(cell.velocity(), 0.0);
    }

    #[test]
    fn set_default_preserves_occupancy() {
        let mut cell = Cell::default();
        cell.set_occupied(true);
        cell.set_velocity(0.5);
        cell.set_value(3.2);
        cell.set_state(CellState::Frozen);
        cell.set_default();
        assert!(cell.occupied());
        assert_eq!(cell.value(), f64::INFINITY);
        assert!(cell.is_open());
    }
}
