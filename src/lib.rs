//! eikonal_march
//! =============
//!
//! Solvers for the N-dimensional Eikonal equation `|grad T| = 1/F`, the
//! continuous generalization of shortest-path search to a speed field over a
//! grid. Nine members of the Fast Marching family are provided — `Fmm`,
//! `FmmFib`, `Sfmm`, `Fim`, `Gmm`, `Fsm`, `Lsm`, `Ddqm`, `Ufmm` — plus
//! `FmmStar` (a goal-directed, admissible-heuristic variant) behind one
//! shared [`solver::Solver`] trait, all built on a single `N`-dimensional,
//! const-generic [`grid::NDGrid`].
//!
//! [`fm2::Fm2`] composes two Eikonal solves into Fast Marching Square, an
//! obstacle-avoiding smooth time-of-arrival field; [`fm2::Fm2Star`] is its
//! goal-directed sibling, using `FmmStar`'s heuristic for the time wave.
//! [`gradient_descent`] extracts a waypoint path by descending that field.

mod benchmark;
mod cell;
mod config;
mod eikonal;
mod error;
mod fm2;
mod gradient_descent;
mod grid;
mod heap;
mod io;
mod solver;

pub use self::{
    benchmark::{construct_solver, Benchmark, RunRecord},
    cell::{Cell, CellState},
    config::{BenchmarkConfig, KNOWN_SOLVERS},
    eikonal::{solve_eikonal, EPSILON},
    error::{EikonalError, Result},
    fm2::{Fm2, Fm2Star},
    gradient_descent::{default_max_steps, descend, PathResult},
    grid::NDGrid,
    heap::{
        DaryHeap, FibHeap, NarrowBand, UnsortedQueue, UntidyQueue, DEFAULT_BUCKET_COUNT,
        DEFAULT_DELTA,
    },
    io::{
        obstacle_indices_from_mask, read_grid_values, read_grid_velocities, read_occupancy_image,
        read_occupancy_map, read_path, write_grid_values, write_grid_velocities,
        write_occupancy_map, write_path,
    },
    solver::{
        Ddqm, Fim, Fmm, FmmDary, FmmFib, FmmStar, Fsm, Gmm, Heuristic, Lsm, Sfmm, Solver, Ufmm,
    },
};
