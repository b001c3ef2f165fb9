//! Fast Marching Square: composes two Eikonal solves into a smooth,
//! obstacle-avoiding time-of-arrival field.

use crate::error::Result;
use crate::grid::NDGrid;
use crate::solver::{FmmDary, FmmStar, Heuristic, Solver};

/// Runs the velocity wave shared by [`Fm2`] and [`Fm2Star`]: floods outward
/// from every obstacle cell with a plain, non-goal-directed solve, then
/// turns the resulting distance-to-obstacle field into a safety-weighted
/// velocity field. Leaves `solver` cleared on return.
fn velocity_wave<V: Solver<N>, const N: usize>(
    solver: &mut V,
    grid: NDGrid<N>,
    obstacles: Vec<usize>,
    max_distance: Option<f64>,
) -> Result<NDGrid<N>> {
    solver.set_grid(grid);
    solver.set_sources(obstacles, None);
    solver.setup()?;
    solver.compute();

    let size = solver.grid().size();
    let t_max = solver.grid().max_finite_value();
    let mut velocities = vec![1.0f64; size];

    for i in 0..size {
        let t = solver.grid().cell(i).value();
        velocities[i] = if t.is_finite() && t_max > 0.0 {
            t / t_max
        } else {
            1.0
        };
    }

    if let Some(max_distance) = max_distance {
        let threshold = (max_distance / solver.grid().leafsize()).max(f64::EPSILON);
        for i in 0..size {
            let t = solver.grid().cell(i).value();
            velocities[i] = if t.is_finite() && t < threshold {
                (t / threshold).min(1.0)
            } else {
                1.0
            };
        }
    }

    let mut grid = std::mem::replace(solver.grid_mut(), NDGrid::new([1u32; N], 1.0));
    solver.clear();
    grid.reset();
    for (i, v) in velocities.into_iter().enumerate() {
        if grid.cell(i).velocity() > 0.0 {
            grid.cell_mut(i).set_velocity(v.max(0.0));
        }
    }
    Ok(grid)
}

/// Runs the Fast Marching Square pipeline over a chosen base solver `S`.
///
/// The velocity wave treats every impassable cell as a source and turns the
/// resulting distance-to-obstacle field into a safety-weighted velocity
/// field; the time wave then solves from the goal (or start, if no goal is
/// given) over that field. `S` is reused for both waves, clearing its state
/// between them.
pub struct Fm2<S, const N: usize> {
    solver: S,
    max_distance: Option<f64>,
}

impl<S: Solver<N> + Default, const N: usize> Default for Fm2<S, N> {
    fn default() -> Self {
        Self {
            solver: S::default(),
            max_distance: None,
        }
    }
}

impl<S: Solver<N> + Default, const N: usize> Fm2<S, N> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Saturates the velocity field at `max_distance` (in real units): cells
    /// whose distance to the nearest obstacle meets or exceeds this get full
    /// velocity `1.0`; closer cells are scaled proportionally.
    #[must_use]
    pub fn with_max_distance(max_distance: f64) -> Self {
        Self {
            solver: S::default(),
            max_distance: Some(max_distance),
        }
    }

    /// Runs both waves and returns the resulting grid, whose arrival time
    /// field is suitable for [`crate::gradient_descent::descend`] from
    /// `start`.
    ///
    /// # Errors
    ///
    /// Propagates any [`crate::error::EikonalError::Precondition`] raised by
    /// the underlying solver's `setup`.
    pub fn compute(&mut self, mut grid: NDGrid<N>, start: usize, goal: Option<usize>) -> Result<NDGrid<N>> {
        let obstacles: Vec<usize> = grid.obstacle_indices().to_vec();

        if !obstacles.is_empty() {
            grid = velocity_wave(&mut self.solver, grid, obstacles, self.max_distance)?;
        }

        let (sources, termination) = match goal {
            Some(g) => (vec![g], Some(start)),
            None => (vec![start], None),
        };
        self.solver.set_grid(grid);
        self.solver.set_sources(sources, termination);
        self.solver.setup()?;
        self.solver.compute();

        let result = std::mem::replace(self.solver.grid_mut(), NDGrid::new([1u32; N], 1.0));
        self.solver.clear();
        Ok(result)
    }
}

/// FM²★: Fast Marching Square whose time wave is goal-directed via
/// [`FmmStar`]'s admissible heuristic.
///
/// Grounded on `original_source/fm2star/fm2star.hpp`'s `FastMarching2Star`:
/// its `computeFirstPotential` runs the obstacle (velocity) wave with
/// `solveEikonal(j, star=false)`, a plain Eikonal update, while
/// `computeFM2Star` runs the time wave with `star=true`, adding the
/// precomputed-distance-to-goal term. A single shared solver can't
/// reproduce that split: [`FmmStar`] always requires a goal to compute its
/// heuristic (see [`FmmStar::setup`][crate::solver::FmmStar]'s
/// precondition), but the velocity wave has no single target — it radiates
/// from every obstacle cell at once. `Fm2Star` therefore keeps two solvers,
/// [`FmmDary`] for the velocity wave and [`FmmStar`] for the time wave,
/// matching the original's two differently-parameterized `solveEikonal`
/// calls instead of forcing one generic solver to serve both roles.
pub struct Fm2Star<const N: usize> {
    velocity: FmmDary<N>,
    time: FmmStar<N>,
    max_distance: Option<f64>,
}

impl<const N: usize> Default for Fm2Star<N> {
    fn default() -> Self {
        Self {
            velocity: FmmDary::default(),
            time: FmmStar::new(Heuristic::Time),
            max_distance: None,
        }
    }
}

impl<const N: usize> Fm2Star<N> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Same saturation behavior as [`Fm2::with_max_distance`].
    #[must_use]
    pub fn with_max_distance(max_distance: f64) -> Self {
        Self {
            max_distance: Some(max_distance),
            ..Self::default()
        }
    }

    /// Chooses how [`FmmStar`]'s heuristic is scaled for the time wave. See
    /// [`crate::solver::Heuristic`].
    #[must_use]
    pub fn with_heuristic(mode: Heuristic) -> Self {
        Self {
            time: FmmStar::new(mode),
            ..Self::default()
        }
    }

    /// Runs the velocity wave (if the grid has obstacles) with a plain
    /// Eikonal solve, then the time wave from `goal` toward `start` with
    /// [`FmmStar`]'s heuristic doing the goal-directed search. Unlike
    /// [`Fm2::compute`], `goal` is mandatory here: FM²★'s entire premise is
    /// a heuristic aimed at a known target.
    ///
    /// # Errors
    ///
    /// Propagates any [`crate::error::EikonalError::Precondition`] raised by
    /// either solver's `setup`.
    pub fn compute(&mut self, mut grid: NDGrid<N>, start: usize, goal: usize) -> Result<NDGrid<N>> {
        let obstacles: Vec<usize> = grid.obstacle_indices().to_vec();

        if !obstacles.is_empty() {
            grid = velocity_wave(&mut self.velocity, grid, obstacles, self.max_distance)?;
        }

        self.time.set_grid(grid);
        self.time.set_sources(vec![goal], Some(start));
        self.time.setup()?;
        self.time.compute();

        let result = std::mem::replace(self.time.grid_mut(), NDGrid::new([1u32; N], 1.0));
        self.time.clear();
        Ok(result)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_map_matches_a_plain_eikonal_solve() {
        let grid: NDGrid<2> = NDGrid::new([20, 20], 1.0);
        let start = grid.coord_to_idx([1, 1]);
        let goal = grid.coord_to_idx([18, 18]);

        let mut fm2: Fm2<FmmDary<2>, 2> = Fm2::new();
        let result = fm2.compute(grid, start, Some(goal)).unwrap();

        assert_eq!(result.cell(goal).value(), 0.0);
        assert!(result.cell(start).value().is_finite());
    }

    #[test]
    fn obstacle_reduces_velocity_near_the_wall() {
        let mut grid: NDGrid<2> = NDGrid::new([20, 20], 1.0);
        for y in 0..20u32 {
            let idx = grid.coord_to_idx([10, y]);
            grid.set_occupancy([(idx, false)]);
        }
        let start = grid.coord_to_idx([9, 9]);
        let goal = grid.coord_to_idx([1, 1]);

        let mut fm2: Fm2<FmmDary<2>, 2> = Fm2::new();
        let result = fm2.compute(grid, start, Some(goal)).unwrap();
        assert!(result.cell(goal).value().is_finite());
    }

    #[test]
    fn fm2star_matches_fm2_arrival_times_on_uniform_grid() {
        let grid: NDGrid<2> = NDGrid::new([25, 25], 1.0);
        let start = grid.coord_to_idx([2, 2]);
        let goal = grid.coord_to_idx([22, 22]);

        let mut plain: Fm2<FmmDary<2>, 2> = Fm2::new();
        let plain_result = plain.compute(grid.clone(), start, Some(goal)).unwrap();

        let mut star: Fm2Star<2> = Fm2Star::new();
        let star_result = star.compute(grid, start, goal).unwrap();

        let diff = (plain_result.cell(start).value() - star_result.cell(start).value()).abs();
        assert!(diff < 1e-6, "FM2/FM2* arrival time mismatch: {diff}");
        assert_eq!(star_result.cell(goal).value(), 0.0);
    }

    #[test]
    fn fm2star_routes_around_an_obstacle_wall() {
        let mut grid: NDGrid<2> = NDGrid::new([20, 20], 1.0);
        for y in 0..20u32 {
            let idx = grid.coord_to_idx([10, y]);
            grid.set_occupancy([(idx, false)]);
        }
        let start = grid.coord_to_idx([9, 9]);
        let goal = grid.coord_to_idx([1, 1]);

        let mut star: Fm2Star<2> = Fm2Star::new();
        let result = star.compute(grid, start, goal).unwrap();
        assert!(result.cell(goal).value().is_finite());
        assert_eq!(result.cell(goal).value(), 0.0);
    }
}
