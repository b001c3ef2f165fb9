//! The "SFMM" narrow band: an ordinary binary heap that tolerates duplicate
//! entries instead of paying for a handle-based `decrease`.

use super::NarrowBand;
use crate::grid::NDGrid;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A heap entry recording the arrival time an index had when it was pushed.
/// Because [`UnsortedQueue::decrease`] simply pushes again instead of
/// updating an existing entry, a cell may be present more than once; the
/// stale, larger-valued copies are discarded lazily in
/// [`UnsortedQueue::pop_min`] once the cell has been frozen.
struct Entry {
    value: f64,
    idx: usize,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}
impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    /// Reversed so [`BinaryHeap`] (a max-heap) pops the smallest value.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .value
            .partial_cmp(&self.value)
            .unwrap_or(Ordering::Equal)
    }
}

/// An unsorted priority queue: O(log n) `push`, O(log n) (amortized O(1) in
/// the common case) `decrease` via duplicate push, and a `pop_min` that
/// skips any entry whose cell has already been frozen.
#[derive(Default)]
pub struct UnsortedQueue {
    heap: BinaryHeap<Entry>,
}

impl<const N: usize> NarrowBand<N> for UnsortedQueue {
    fn push(&mut self, grid: &mut NDGrid<N>, idx: usize) {
        self.heap.push(Entry {
            value: grid.cell(idx).value(),
            idx,
        });
    }

    fn pop_min(&mut self, grid: &mut NDGrid<N>) -> Option<usize> {
        while let Some(Entry { idx, .. }) = self.heap.pop() {
            if !grid.cell(idx).is_frozen() {
                return Some(idx);
            }
        }
        None
    }

    fn decrease(&mut self, grid: &mut NDGrid<N>, idx: usize) {
        NarrowBand::<N>::push(self, grid, idx);
    }

    fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn clear(&mut self) {
        self.heap.clear();
    }

    fn reserve(&mut self, capacity: usize) {
        self.heap.reserve(capacity);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cell::CellState;

    #[test]
    fn skips_stale_duplicates_once_frozen() {
        let mut grid: NDGrid<1> = NDGrid::new([4], 1.0);
        let mut queue = UnsortedQueue::default();
        grid.cell_mut(0).set_value(5.0);
        NarrowBand::<1>::push(&mut queue, &mut grid, 0);
        grid.cell_mut(0).set_value(1.0);
        NarrowBand::<1>::decrease(&mut queue, &mut grid, 0);

        assert_eq!(NarrowBand::<1>::pop_min(&mut queue, &mut grid), Some(0));
        grid.cell_mut(0).set_state(CellState::Frozen);
        // The stale entry with value 5.0 is still in the heap, but is
        // skipped because the cell is now frozen.
        assert_eq!(NarrowBand::<1>::pop_min(&mut queue, &mut grid), None);
    }
}
