//! Path extraction over a completed arrival-time field by following the
//! steepest descent of `T`.

use crate::grid::NDGrid;

/// A path recovered by gradient descent: a sequence of continuous points and
/// the propagation speed sampled at the cell nearest each one.
#[derive(Debug, Clone)]
pub struct PathResult<const N: usize> {
    pub points: Vec<[f64; N]>,
    pub velocities: Vec<f64>,
    /// `false` if descent was cut short by a termination guard instead of
    /// reaching a source (`T == 0`). The source material performs none of
    /// these checks; they are added here since an unchecked descent can
    /// otherwise loop forever or read out of bounds.
    pub complete: bool,
}

/// Upper bound on descent steps used by [`descend`] when the caller does not
/// supply one: proportional to the grid's diagonal so a path can legitimately
/// cross the whole grid, while still catching a runaway oscillation.
#[must_use]
pub fn default_max_steps<const N: usize>(grid: &NDGrid<N>) -> usize {
    grid.dim_sizes().iter().map(|&d| d as usize).sum::<usize>() * 4
}

/// Follows `-grad(T)` from `start_idx` down to a source (`T == 0`), sampling
/// velocity along the way.
///
/// Uses a central-difference gradient per dimension; an infinite difference
/// (at the edge of the explored region) collapses to its sign. The step is
/// normalized by the largest-magnitude gradient component and rounded to the
/// nearest cell for the next gradient read.
///
/// Descent terminates early (`complete: false`) if the gradient is
/// degenerate (every component infinite, collapsing to an all-zero vector,
/// or NaN), if the stepped point would leave the grid, or after
/// `max_steps` steps. Pass `usize::MAX` for `max_steps` to recover the
/// source material's unchecked behavior.
#[must_use]
pub fn descend<const N: usize>(
    grid: &NDGrid<N>,
    start_idx: usize,
    step: f64,
    max_steps: usize,
) -> PathResult<N> {
    let dimsize = grid.dim_sizes();
    let mut idx = start_idx;
    let mut point = {
        let c = grid.idx_to_coord(idx);
        let mut p = [0.0f64; N];
        for k in 0..N {
            p[k] = c[k] as f64;
        }
        p
    };

    let mut points = vec![point];
    let mut velocities = vec![grid.cell(idx).velocity()];

    if grid.cell(idx).value() == 0.0 {
        return PathResult {
            points,
            velocities,
            complete: true,
        };
    }

    let mut steps = 0;
    loop {
        if steps >= max_steps {
            return PathResult {
                points,
                velocities,
                complete: false,
            };
        }
        steps += 1;

        let mut grad = [0.0f64; N];
        for k in 0..N {
            let (minus, plus) = grid.neighbor_pair(idx, k);
            let tm = minus.map_or(f64::INFINITY, |i| grid.cell(i).value());
            let tp = plus.map_or(f64::INFINITY, |i| grid.cell(i).value());
            let mut g = (tp - tm) / 2.0;
            if g.is_infinite() {
                g = g.signum();
            }
            grad[k] = g;
        }

        let max_component = grad.iter().fold(0.0f64, |acc, g| acc.max(g.abs()));
        if max_component == 0.0 || grad.iter().any(|g| g.is_nan()) {
            return PathResult {
                points,
                velocities,
                complete: false,
            };
        }

        let mut coord = [0u32; N];
        let mut out_of_bounds = false;
        for k in 0..N {
            point[k] -= step * grad[k] / max_component;
            let rounded = (point[k] + 0.5).floor();
            if rounded < 0.0 || rounded >= dimsize[k] as f64 {
                out_of_bounds = true;
                break;
            }
            coord[k] = rounded as u32;
        }
        if out_of_bounds {
            return PathResult {
                points,
                velocities,
                complete: false,
            };
        }

        idx = grid.coord_to_idx(coord);
        points.push(point);
        velocities.push(grid.cell(idx).velocity());

        if grid.cell(idx).value() == 0.0 {
            // Snap the final recorded point to the source's own coordinates,
            // matching the source material's convention of ending exactly on
            // the minimum rather than one gradient step short of it.
            let c = grid.idx_to_coord(idx);
            let mut exact = [0.0f64; N];
            for k in 0..N {
                exact[k] = c[k] as f64;
            }
            *points.last_mut().unwrap() = exact;
            return PathResult {
                points,
                velocities,
                complete: true,
            };
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::solver::{FmmDary, Solver};

    #[test]
    fn straight_line_descent_reaches_the_source() {
        let mut solver: FmmDary<2> = FmmDary::new();
        solver.set_grid(NDGrid::new([20, 20], 1.0));
        let source = solver.grid().coord_to_idx([10, 10]);
        solver.set_sources(vec![source], None);
        solver.setup().unwrap();
        solver.compute();

        let start = solver.grid().coord_to_idx([18, 10]);
        let path = descend(solver.grid(), start, 1.0, default_max_steps(solver.grid()));
        assert!(path.complete);
        assert_eq!(*path.points.last().unwrap(), {
            let c = solver.grid().idx_to_coord(source);
            [c[0] as f64, c[1] as f64]
        });
    }

    #[test]
    fn source_start_returns_single_point_path() {
        let mut solver: FmmDary<2> = FmmDary::new();
        solver.set_grid(NDGrid::new([10, 10], 1.0));
        let source = solver.grid().coord_to_idx([5, 5]);
        solver.set_sources(vec![source], None);
        solver.setup().unwrap();
        solver.compute();

        let path = descend(solver.grid(), source, 1.0, 100);
        assert!(path.complete);
        assert_eq!(path.points.len(), 1);
    }
}
