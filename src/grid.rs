//! The N-dimensional Cartesian grid that every solver operates on.

use crate::cell::Cell;

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// A flat, row-major N-dimensional grid of [`Cell`]s.
///
/// `N` is a compile-time constant, so per-cell coordinate and neighbor work
/// stays on the stack instead of allocating a small `Vec` on every call.
/// Indexing is row-major with dimension `0` fastest-varying:
/// `idx = c0 + c1*d[1] + c2*d[2] + ...`, where `d[k]` is the product of all
/// dimension sizes preceding `k` (`d[0] = 1`).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct NDGrid<const N: usize> {
    cells: Vec<Cell>,
    dimsize: [u32; N],
    /// Prefix-product step table: `d[k]` is the flat-index stride of
    /// dimension `k`.
    d: [usize; N],
    leafsize: f64,
    clean: bool,
    #[cfg_attr(feature = "serialize", serde(skip))]
    obstacle_indices: Vec<usize>,
}

impl<const N: usize> NDGrid<N> {
    /// Builds a grid of the given per-dimension sizes, with a uniform cell
    /// edge length `leafsize`. All cells start at their defaults (open,
    /// `T = +inf`, passable, `F = 1`).
    ///
    /// # Panics
    ///
    /// Panics if `N == 0`, if any dimension size is `0`, or if `leafsize` is
    /// not a positive, finite number.
    #[must_use]
    pub fn new(dimsize: [u32; N], leafsize: f64) -> Self {
        assert!(N > 0, "NDGrid requires at least one dimension");
        assert!(
            dimsize.iter().all(|&s| s > 0),
            "all dimension sizes must be non-zero"
        );
        assert!(
            leafsize.is_finite() && leafsize > 0.0,
            "leafsize must be a positive, finite number"
        );

        let mut d = [1usize; N];
        for k in 1..N {
            d[k] = d[k - 1] * dimsize[k - 1] as usize;
        }
        let size = d[N - 1] * dimsize[N - 1] as usize;

        let mut cells = vec![Cell::default(); size];
        for (i, cell) in cells.iter_mut().enumerate() {
            cell.set_index(i);
        }

        Self {
            cells,
            dimsize,
            d,
            leafsize,
            clean: true,
            obstacle_indices: Vec::new(),
        }
    }

    /// Total number of cells (`prod(dimsize)`).
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    #[must_use]
    pub fn dim_sizes(&self) -> [u32; N] {
        self.dimsize
    }

    #[inline]
    #[must_use]
    pub fn leafsize(&self) -> f64 {
        self.leafsize
    }

    /// `true` iff every cell is at its default solver-facing state. Set by
    /// [`NDGrid::reset`]/construction and cleared by [`NDGrid::mark_dirty`],
    /// which every [`crate::solver::Solver::setup`] calls.
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.clean
    }

    #[inline]
    pub fn mark_dirty(&mut self) {
        self.clean = false;
    }

    #[inline]
    #[must_use]
    pub fn cell(&self, idx: usize) -> &Cell {
        &self.cells[idx]
    }

    #[inline]
    pub fn cell_mut(&mut self, idx: usize) -> &mut Cell {
        &mut self.cells[idx]
    }

    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Converts flat-index `idx` to per-dimension coordinates.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.size()`.
    #[must_use]
    pub fn idx_to_coord(&self, idx: usize) -> [u32; N] {
        assert!(idx < self.size(), "index out of bounds");
        let mut coord = [0u32; N];
        for k in 0..N {
            coord[k] = ((idx / self.d[k]) % self.dimsize[k] as usize) as u32;
        }
        coord
    }

    /// Converts per-dimension coordinates to a flat index.
    ///
    /// # Panics
    ///
    /// Panics if any coordinate is out of range for its dimension.
    #[must_use]
    pub fn coord_to_idx(&self, coord: [u32; N]) -> usize {
        let mut idx = 0usize;
        for k in 0..N {
            assert!(coord[k] < self.dimsize[k], "coordinate out of bounds");
            idx += coord[k] as usize * self.d[k];
        }
        idx
    }

    #[inline]
    fn coord_along(&self, idx: usize, dim: usize) -> usize {
        (idx / self.d[dim]) % self.dimsize[dim] as usize
    }

    /// Returns the (at most two) axis-aligned neighbor indices along `dim`,
    /// as `(minus, plus)`, `None` where the neighbor would leave the grid.
    #[inline]
    #[must_use]
    pub fn neighbor_pair(&self, idx: usize, dim: usize) -> (Option<usize>, Option<usize>) {
        let c = self.coord_along(idx, dim);
        let step = self.d[dim];
        let minus = (c > 0).then(|| idx - step);
        let plus = ((c + 1) < self.dimsize[dim] as usize).then(|| idx + step);
        (minus, plus)
    }

    /// Iterates every existing axis-aligned neighbor of `idx`, minus before
    /// plus within each dimension, dimensions in increasing order. Yields
    /// `2N` indices for an interior cell, fewer at the boundary.
    pub fn neighbor_iter(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        (0..N).flat_map(move |dim| {
            let (minus, plus) = self.neighbor_pair(idx, dim);
            minus.into_iter().chain(plus)
        })
    }

    /// Minimum arrival time among the (up to two) neighbors of `idx` along
    /// `dim`. `+inf` if neither neighbor exists.
    #[must_use]
    pub fn min_neighbor_t(&self, idx: usize, dim: usize) -> f64 {
        let (minus, plus) = self.neighbor_pair(idx, dim);
        let m = minus.map_or(f64::INFINITY, |i| self.cells[i].value());
        let p = plus.map_or(f64::INFINITY, |i| self.cells[i].value());
        m.min(p)
    }

    /// The largest finite value currently stored in the grid, or `0.0` if
    /// none is finite.
    #[must_use]
    pub fn max_finite_value(&self) -> f64 {
        self.cells
            .iter()
            .map(Cell::value)
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max)
    }

    /// Paints occupancy (and velocity, where unoccupied) for the given flat
    /// indices, then refreshes the cached obstacle-index list.
    pub fn set_occupancy(&mut self, occupied: impl IntoIterator<Item = (usize, bool)>) {
        for (idx, is_occupied) in occupied {
            self.cells[idx].set_occupied(is_occupied);
        }
        self.refresh_obstacle_indices();
    }

    /// Builds a grid of the given size where `obstacles` gives the flat
    /// indices that are impassable; every other cell is passable. The
    /// inverse of the convention `read_occupancy_image`/`read_occupancy_map`
    /// return (`true` meaning obstacle), so callers can feed a loaded map
    /// straight in without hand-inverting it.
    #[must_use]
    pub fn from_occupancy(
        dimsize: [u32; N],
        leafsize: f64,
        obstacles: impl IntoIterator<Item = usize>,
    ) -> Self {
        let mut grid = Self::new(dimsize, leafsize);
        let painting = obstacles.into_iter().map(|idx| (idx, false));
        grid.set_occupancy(painting);
        grid
    }

    fn refresh_obstacle_indices(&mut self) {
        self.obstacle_indices = self
            .cells
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.occupied())
            .map(|(i, _)| i)
            .collect();
    }

    /// Cached flat indices of every impassable cell, recomputed whenever
    /// occupancy is painted through [`NDGrid::set_occupancy`].
    #[inline]
    #[must_use]
    pub fn obstacle_indices(&self) -> &[usize] {
        &self.obstacle_indices
    }

    /// Restores every cell to its default solver-facing state (preserving
    /// occupancy) and marks the grid clean. A no-op if already clean.
    pub fn reset(&mut self) {
        if self.clean {
            return;
        }
        for cell in &mut self.cells {
            cell.set_default();
        }
        self.clean = true;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flat_indexing_round_trips() {
        let grid: NDGrid<3> = NDGrid::new([4, 5, 6], 1.0);
        for idx in 0..grid.size() {
            let coord = grid.idx_to_coord(idx);
            assert_eq!(grid.coord_to_idx(coord), idx);
        }
    }

    #[test]
    fn interior_cell_has_2n_neighbors() {
        let grid: NDGrid<3> = NDGrid::new([5, 5, 5], 1.0);
        let idx = grid.coord_to_idx([2, 2, 2]);
        assert_eq!(grid.neighbor_iter(idx).count(), 6);
    }

    #[test]
    fn corner_cell_has_n_neighbors() {
        let grid: NDGrid<2> = NDGrid::new([5, 5], 1.0);
        let idx = grid.coord_to_idx([0, 0]);
        assert_eq!(grid.neighbor_iter(idx).count(), 2);
    }

    #[test]
    fn reset_restores_defaults_but_keeps_occupancy() {
        let mut grid: NDGrid<2> = NDGrid::new([3, 3], 1.0);
        grid.set_occupancy([(4, true)]);
        grid.cell_mut(4).set_value(2.0);
        grid.mark_dirty();
        grid.reset();
        assert_eq!(grid.cell(4).value(), f64::INFINITY);
        assert!(grid.cell(4).occupied());
        assert!(grid.is_clean());
    }

    #[test]
    fn min_neighbor_t_is_infinite_at_far_boundary() {
        let grid: NDGrid<1> = NDGrid::new([3], 1.0);
        assert_eq!(grid.min_neighbor_t(0, 0), f64::INFINITY);
    }
}
