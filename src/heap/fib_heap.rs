//! An arena-based Fibonacci heap: O(1) amortized `push`/`decrease`, O(log n)
//! `pop_min`. The source material leans on Boost's `fibonacci_heap` and its
//! opaque handle type; here the node graph is an arena of indices into a
//! `Vec`, avoiding unsafe pointer-linked nodes while keeping the same
//! amortized bounds.

use super::NarrowBand;
use crate::grid::NDGrid;

const NOT_PRESENT: usize = usize::MAX;

#[derive(Clone, Copy)]
struct FibNode {
    /// The grid flat index this node represents.
    idx: usize,
    parent: Option<usize>,
    child: Option<usize>,
    /// Circular doubly linked sibling list; a lone node points to itself.
    left: usize,
    right: usize,
    degree: usize,
    marked: bool,
}

/// A Fibonacci heap keyed by `grid.cell(idx).value()`.
#[derive(Default)]
pub struct FibHeap {
    arena: Vec<FibNode>,
    /// `position[flat_idx]` is that cell's arena slot, or [`NOT_PRESENT`].
    position: Vec<usize>,
    min: Option<usize>,
    count: usize,
}

impl FibHeap {
    fn ensure_position(&mut self, grid_size: usize) {
        if self.position.len() < grid_size {
            self.position.resize(grid_size, NOT_PRESENT);
        }
    }

    fn value<const N: usize>(&self, grid: &NDGrid<N>, slot: usize) -> f64 {
        grid.cell(self.arena[slot].idx).value()
    }

    /// Splices `slot` into the circular sibling list anchored by `anchor`.
    fn insert_into_list(&mut self, anchor: usize, slot: usize) {
        let anchor_right = self.arena[anchor].right;
        self.arena[slot].left = anchor;
        self.arena[slot].right = anchor_right;
        self.arena[anchor].right = slot;
        self.arena[anchor_right].left = slot;
    }

    /// Removes `slot` from whatever sibling list it is in. Caller must fix
    /// up any `child`/`min` pointer that referenced it.
    fn unlink(&mut self, slot: usize) {
        let left = self.arena[slot].left;
        let right = self.arena[slot].right;
        self.arena[left].right = right;
        self.arena[right].left = left;
        self.arena[slot].left = slot;
        self.arena[slot].right = slot;
    }

    fn add_root(&mut self, slot: usize) {
        self.arena[slot].parent = None;
        self.arena[slot].marked = false;
        match self.min {
            None => {
                self.arena[slot].left = slot;
                self.arena[slot].right = slot;
                self.min = Some(slot);
            }
            Some(min) => self.insert_into_list(min, slot),
        }
    }

    fn link<const N: usize>(&mut self, grid: &NDGrid<N>, child: usize, parent: usize) {
        self.unlink(child);
        match self.arena[parent].child {
            None => {
                self.arena[child].left = child;
                self.arena[child].right = child;
                self.arena[parent].child = Some(child);
            }
            Some(existing) => self.insert_into_list(existing, child),
        }
        self.arena[child].parent = Some(parent);
        self.arena[child].marked = false;
        self.arena[parent].degree += 1;
        let _ = grid;
    }

    fn consolidate<const N: usize>(&mut self, grid: &NDGrid<N>) {
        let Some(min) = self.min else { return };

        let mut roots = Vec::new();
        let mut cur = min;
        loop {
            roots.push(cur);
            cur = self.arena[cur].right;
            if cur == min {
                break;
            }
        }

        let max_degree = (self.count.max(1) as f64).log2().ceil() as usize + 2;
        let mut by_degree: Vec<Option<usize>> = vec![None; max_degree + 1];

        for root in roots {
            let mut x = root;
            let mut d = self.arena[x].degree;
            while let Some(y) = by_degree[d] {
                let (mut lo, mut hi) = (x, y);
                if self.value(grid, hi) < self.value(grid, lo) {
                    std::mem::swap(&mut lo, &mut hi);
                }
                self.link(grid, hi, lo);
                by_degree[d] = None;
                x = lo;
                d += 1;
            }
            by_degree[d] = Some(x);
        }

        self.min = None;
        for slot in by_degree.into_iter().flatten() {
            self.add_root(slot);
        }
    }

    fn cut<const N: usize>(&mut self, grid: &NDGrid<N>, child: usize, parent: usize) {
        if self.arena[parent].child == Some(child) {
            let sibling = self.arena[child].right;
            self.arena[parent].child = if sibling == child { None } else { Some(sibling) };
        }
        self.arena[parent].degree -= 1;
        self.unlink(child);
        self.add_root(child);
        let _ = grid;
    }

    fn cascading_cut<const N: usize>(&mut self, grid: &NDGrid<N>, slot: usize) {
        if let Some(parent) = self.arena[slot].parent {
            if !self.arena[slot].marked {
                self.arena[slot].marked = true;
            } else {
                self.cut(grid, slot, parent);
                self.cascading_cut(grid, parent);
            }
        }
    }
}

impl<const N: usize> NarrowBand<N> for FibHeap {
    fn push(&mut self, grid: &mut NDGrid<N>, idx: usize) {
        self.ensure_position(grid.size());
        let slot = self.arena.len();
        self.arena.push(FibNode {
            idx,
            parent: None,
            child: None,
            left: slot,
            right: slot,
            degree: 0,
            marked: false,
        });
        self.position[idx] = slot;
        self.add_root(slot);
        self.count += 1;
        if self.value(grid, slot) < self.min.map_or(f64::INFINITY, |m| self.value(grid, m)) {
            self.min = Some(slot);
        }
    }

    fn pop_min(&mut self, grid: &mut NDGrid<N>) -> Option<usize> {
        let min = self.min?;
        if let Some(child) = self.arena[min].child {
            let mut c = child;
            loop {
                let next = self.arena[c].right;
                self.arena[c].parent = None;
                c = next;
                if c == child {
                    break;
                }
            }
            let sibling = self.arena[min].right;
            if sibling == min {
                self.min = Some(child);
            } else {
                self.insert_into_list(min, child);
            }
        }
        let right = self.arena[min].right;
        self.unlink(min);
        self.min = if right == min { None } else { Some(right) };
        self.count -= 1;
        if self.min.is_some() {
            self.consolidate(grid);
        }
        self.position[self.arena[min].idx] = NOT_PRESENT;
        Some(self.arena[min].idx)
    }

    fn decrease(&mut self, grid: &mut NDGrid<N>, idx: usize) {
        self.ensure_position(grid.size());
        let slot = self.position[idx];
        debug_assert_ne!(slot, NOT_PRESENT, "decrease called on absent index");
        if let Some(parent) = self.arena[slot].parent {
            if self.value(grid, slot) < self.value(grid, parent) {
                self.cut(grid, slot, parent);
                self.cascading_cut(grid, parent);
            }
        }
        if let Some(min) = self.min {
            if self.value(grid, slot) < self.value(grid, min) {
                self.min = Some(slot);
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn len(&self) -> usize {
        self.count
    }

    fn clear(&mut self) {
        self.arena.clear();
        self.position.iter_mut().for_each(|p| *p = NOT_PRESENT);
        self.min = None;
        self.count = 0;
    }

    fn reserve(&mut self, capacity: usize) {
        self.arena.reserve(capacity);
        if self.position.len() < capacity {
            self.position.resize(capacity, NOT_PRESENT);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pops_in_non_decreasing_order() {
        let mut grid: NDGrid<1> = NDGrid::new([20], 1.0);
        let mut heap = FibHeap::default();
        let values = [9.0, 3.0, 7.0, 1.0, 8.0, 2.0, 6.0, 4.0, 5.0, 0.0];
        for (i, t) in values.into_iter().enumerate() {
            grid.cell_mut(i).set_value(t);
            heap.push(&mut grid, i);
        }
        let mut popped = Vec::new();
        while let Some(idx) = heap.pop_min(&mut grid) {
            popped.push(grid.cell(idx).value());
        }
        let mut expected = values.to_vec();
        expected.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(popped, expected);
    }

    #[test]
    fn decrease_can_promote_a_deep_node_to_min() {
        let mut grid: NDGrid<1> = NDGrid::new([6], 1.0);
        let mut heap = FibHeap::default();
        for i in 0..6 {
            grid.cell_mut(i).set_value((i + 1) as f64 * 10.0);
            heap.push(&mut grid, i);
        }
        // Force some consolidation so node 5 is no longer a bare root.
        let _ = heap.pop_min(&mut grid);
        grid.cell_mut(5).set_value(0.5);
        heap.decrease(&mut grid, 5);
        assert_eq!(heap.pop_min(&mut grid), Some(5));
    }
}
