//! Narrow-band containers: four interchangeable priority structures sharing
//! one [`NarrowBand`] trait, trading optimality and update cost against
//! throughput. See [`dary_heap`], [`fib_heap`], [`unsorted_queue`], and
//! [`untidy_queue`].

mod dary_heap;
mod fib_heap;
mod unsorted_queue;
mod untidy_queue;

pub use dary_heap::DaryHeap;
pub use fib_heap::FibHeap;
pub use unsorted_queue::UnsortedQueue;
pub use untidy_queue::{UntidyQueue, DEFAULT_BUCKET_COUNT, DEFAULT_DELTA};

use crate::grid::NDGrid;

/// A container of `Narrow`-state cell indices, ordered by arrival time.
///
/// Implementations are keyed purely by `grid.cell(idx).value()`; callers are
/// responsible for setting a cell's state and value before calling `push`,
/// and for reacting to what `pop_min` returns (typically freezing it).
pub trait NarrowBand<const N: usize>: Default {
    /// Inserts `idx` into the band. `idx` must not already be present.
    fn push(&mut self, grid: &mut NDGrid<N>, idx: usize);

    /// Removes and returns the index with the smallest arrival time, or
    /// `None` if the band is empty. Implementations that tolerate duplicate
    /// entries (see [`UnsortedQueue`]) silently discard stale ones here.
    fn pop_min(&mut self, grid: &mut NDGrid<N>) -> Option<usize>;

    /// Notifies the band that `idx`'s stored arrival time has just
    /// decreased. `idx` must already be present.
    fn decrease(&mut self, grid: &mut NDGrid<N>, idx: usize);

    #[must_use]
    fn is_empty(&self) -> bool;

    #[must_use]
    fn len(&self) -> usize;

    fn clear(&mut self);

    fn reserve(&mut self, capacity: usize);
}
