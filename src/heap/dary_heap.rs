//! A handle-indexed d-ary min-heap. Binary (`ARITY = 2`) by default.

use super::NarrowBand;
use crate::grid::NDGrid;

const NOT_PRESENT: usize = usize::MAX;

/// A d-ary heap over cell flat indices, ordered by arrival time.
///
/// `decrease` is O(log n) because a dense `positions` array maps each flat
/// grid index to its current slot in the backing array, rather than
/// searching for it. This is the crate's equivalent of the Boost
/// `d_ary_heap`'s handle, without depending on Boost.
pub struct DaryHeap<const ARITY: usize = 2> {
    heap: Vec<usize>,
    /// `positions[flat_idx]` is that cell's slot in `heap`, or
    /// [`NOT_PRESENT`].
    positions: Vec<usize>,
}

impl<const ARITY: usize> Default for DaryHeap<ARITY> {
    fn default() -> Self {
        Self {
            heap: Vec::new(),
            positions: Vec::new(),
        }
    }
}

impl<const ARITY: usize> DaryHeap<ARITY> {
    fn ensure_positions(&mut self, grid_size: usize) {
        if self.positions.len() < grid_size {
            self.positions.resize(grid_size, NOT_PRESENT);
        }
    }

    fn sift_up<const N: usize>(&mut self, grid: &NDGrid<N>, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / ARITY;
            if grid.cell(self.heap[slot]).value() < grid.cell(self.heap[parent]).value() {
                self.swap_slots(parent, slot);
                slot = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down<const N: usize>(&mut self, grid: &NDGrid<N>, mut slot: usize) {
        loop {
            let first_child = slot * ARITY + 1;
            if first_child >= self.heap.len() {
                break;
            }
            let last_child = (first_child + ARITY).min(self.heap.len());
            let mut smallest = first_child;
            for child in (first_child + 1)..last_child {
                if grid.cell(self.heap[child]).value() < grid.cell(self.heap[smallest]).value() {
                    smallest = child;
                }
            }
            if grid.cell(self.heap[smallest]).value() < grid.cell(self.heap[slot]).value() {
                self.swap_slots(smallest, slot);
                slot = smallest;
            } else {
                break;
            }
        }
    }

    fn swap_slots(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.positions[self.heap[a]] = a;
        self.positions[self.heap[b]] = b;
    }
}

impl<const ARITY: usize, const N: usize> NarrowBand<N> for DaryHeap<ARITY> {
    fn push(&mut self, grid: &mut NDGrid<N>, idx: usize) {
        self.ensure_positions(grid.size());
        let slot = self.heap.len();
        self.heap.push(idx);
        self.positions[idx] = slot;
        self.sift_up(grid, slot);
    }

    fn pop_min(&mut self, grid: &mut NDGrid<N>) -> Option<usize> {
        if self.heap.is_empty() {
            return None;
        }
        let min = self.heap[0];
        self.positions[min] = NOT_PRESENT;
        let last = self.heap.pop().unwrap();
        if !self.heap.is_empty() {
            self.heap[0] = last;
            self.positions[last] = 0;
            self.sift_down(grid, 0);
        }
        Some(min)
    }

    fn decrease(&mut self, grid: &mut NDGrid<N>, idx: usize) {
        self.ensure_positions(grid.size());
        let slot = self.positions[idx];
        debug_assert_ne!(slot, NOT_PRESENT, "decrease called on absent index");
        self.sift_up(grid, slot);
    }

    fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn clear(&mut self) {
        self.heap.clear();
        self.positions.iter_mut().for_each(|p| *p = NOT_PRESENT);
    }

    fn reserve(&mut self, capacity: usize) {
        self.heap.reserve(capacity);
        if self.positions.len() < capacity {
            self.positions.resize(capacity, NOT_PRESENT);
        }
    }
}
