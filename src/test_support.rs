//! Instrumented allocators and element types shared by the unit and property tests.

use crate::{AllocError, BlockAllocator, Global, Propagation};
use std::alloc::Layout;
use std::cell::Cell;
use std::ptr::NonNull;
use std::rc::Rc;

#[derive(Debug, Default)]
struct AllocStats {
    allocations: Cell<usize>,
    deallocations: Cell<usize>,
    limit: Cell<Option<usize>>,
}

/// Forwards to [`Global`], counting calls, and can be told to start failing.
#[derive(Clone, Debug, Default)]
pub(crate) struct CountingAllocator {
    stats: Rc<AllocStats>,
}

impl CountingAllocator {
    pub(crate) fn allocations(&self) -> usize {
        self.stats.allocations.get()
    }

    pub(crate) fn outstanding(&self) -> usize {
        self.stats.allocations.get() - self.stats.deallocations.get()
    }

    /// Every allocation fails once `total` allocations have succeeded.
    pub(crate) fn fail_after(&self, total: usize) {
        self.stats.limit.set(Some(total));
    }

    pub(crate) fn stop_failing(&self) {
        self.stats.limit.set(None);
    }

    pub(crate) fn same_as(&self, other: &CountingAllocator) -> bool {
        Rc::ptr_eq(&self.stats, &other.stats)
    }
}

impl BlockAllocator for CountingAllocator {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        if let Some(limit) = self.stats.limit.get() {
            if self.stats.allocations.get() >= limit {
                return Err(AllocError);
            }
        }
        let ptr = Global.allocate(layout)?;
        self.stats.allocations.set(self.stats.allocations.get() + 1);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.stats
            .deallocations
            .set(self.stats.deallocations.get() + 1);
        Global.deallocate(ptr, layout);
    }
}

/// A counting allocator that stays with the container it was created for.
///
/// Copies of a container get a fresh allocator with label 0.
#[derive(Clone, Debug, Default)]
pub(crate) struct PinnedAllocator {
    pub(crate) label: usize,
    pub(crate) inner: CountingAllocator,
}

impl PinnedAllocator {
    pub(crate) fn labelled(label: usize) -> Self {
        PinnedAllocator {
            label,
            inner: CountingAllocator::default(),
        }
    }
}

impl BlockAllocator for PinnedAllocator {
    const PROPAGATION: Propagation = Propagation::NEVER;

    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        self.inner.allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.inner.deallocate(ptr, layout)
    }

    fn select_on_copy(&self) -> Self {
        PinnedAllocator::default()
    }
}

#[derive(Debug, Default)]
pub(crate) struct TrackStats {
    live: Cell<isize>,
    clone_budget: Cell<Option<usize>>,
}

impl TrackStats {
    pub(crate) fn live(&self) -> isize {
        self.live.get()
    }

    /// The next `clones` clones succeed, the one after that panics.
    pub(crate) fn panic_after_clones(&self, clones: usize) {
        self.clone_budget.set(Some(clones));
    }
}

/// An element that keeps a live count and can be made to panic while cloning.
#[derive(Debug)]
pub(crate) struct Tracked {
    pub(crate) value: i32,
    stats: Rc<TrackStats>,
}

impl Tracked {
    pub(crate) fn new(value: i32, stats: &Rc<TrackStats>) -> Self {
        stats.live.set(stats.live.get() + 1);
        Tracked {
            value,
            stats: Rc::clone(stats),
        }
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        if let Some(budget) = self.stats.clone_budget.get() {
            if budget == 0 {
                panic!("tracked clone refused");
            }
            self.stats.clone_budget.set(Some(budget - 1));
        }
        Tracked::new(self.value, &self.stats)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.stats.live.set(self.stats.live.get() - 1);
    }
}

impl PartialEq for Tracked {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}
