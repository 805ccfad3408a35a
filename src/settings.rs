//! Allocator configuration for [`BlockDeque`](crate::BlockDeque).
//!
//! A deque stores one [`BlockAllocator`] and asks it for every block it owns. How that
//! allocator travels when a deque is copied or moved into another one is stated as
//! configuration through [`BlockAllocator::PROPAGATION`].

use crate::AllocError;
use std::alloc::Layout;
use std::fmt::Debug;
use std::ptr::NonNull;

/// Whether an allocator follows its contents on copy-assignment and move-assignment.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Propagation {
    /// `clone_from` adopts the source's allocator instead of keeping its own.
    pub on_copy: bool,
    /// `take_from` adopts the source's allocator (and its blocks) instead of keeping its own
    /// and moving the elements over one by one.
    pub on_move: bool,
}

impl Propagation {
    /// The allocator always follows its contents.
    pub const ALWAYS: Propagation = Propagation {
        on_copy: true,
        on_move: true,
    };

    /// The allocator stays with the container it was created for.
    pub const NEVER: Propagation = Propagation {
        on_copy: false,
        on_move: false,
    };
}

impl Default for Propagation {
    fn default() -> Self {
        Propagation::ALWAYS
    }
}

/// The allocation strategy a [`BlockDeque`](crate::BlockDeque) uses for its blocks.
///
/// Each block is requested as a single `Layout::array::<T>(B)` allocation and handed back with
/// the same layout. Zero-sized layouts are never requested.
pub trait BlockAllocator: Clone + Debug {
    /// How the allocator behaves on copy-assignment and move-assignment.
    const PROPAGATION: Propagation = Propagation::ALWAYS;

    /// Allocates memory according to the given layout.
    ///
    /// # Errors
    /// Returns [`AllocError`] if the memory could not be provided.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// Deallocates memory.
    ///
    /// # Safety
    /// `ptr` must have been returned by [`allocate`](BlockAllocator::allocate) on this allocator
    /// (or one it was cloned from) with the same `layout`, and must not have been deallocated yet.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Picks the allocator a copy of a container should use. Defaults to a clone of `self`.
    fn select_on_copy(&self) -> Self {
        self.clone()
    }
}

/// The global heap, through [`std::alloc`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Global;

impl BlockAllocator for Global {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        if layout.size() == 0 {
            // SAFETY: alignments are never zero
            return Ok(unsafe { NonNull::new_unchecked(layout.align() as *mut u8) });
        }
        let ptr = unsafe { std::alloc::alloc(layout) };
        NonNull::new(ptr).ok_or(AllocError)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() != 0 {
            std::alloc::dealloc(ptr.as_ptr(), layout);
        }
    }
}
