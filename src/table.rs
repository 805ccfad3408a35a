//! The block store behind a [`BlockDeque`](crate::BlockDeque).
//!
//! A [`BlockTable`] owns an ordered list of blocks, each one allocation of `B` slots obtained from
//! the configured [`BlockAllocator`]. It knows nothing about which slots are live; the deque drops
//! its elements before the table releases the memory. Blocks are only ever released by the
//! table's `Drop`, by [`BlockTable::release_tail`], by [`BlockTable::rebuild`] when it has more
//! spare blocks than it needs, and by the staging guard used while growing.

use crate::{AllocError, BlockAllocator};
use std::alloc::Layout;
use std::marker::PhantomData;
use std::ops::RangeInclusive;
use std::ptr::NonNull;

pub(crate) struct BlockTable<T, A, const B: usize>
where
    A: BlockAllocator,
{
    blocks: Vec<NonNull<T>>,
    alloc: A,
    _owns: PhantomData<T>,
}

impl<T, A, const B: usize> BlockTable<T, A, B>
where
    A: BlockAllocator,
{
    const NONZERO_BLOCK: () = assert!(B > 0, "block size must be at least one slot");

    /// Layout of a single block.
    pub(crate) fn block_layout() -> Layout {
        match Layout::array::<T>(B) {
            Ok(layout) => layout,
            Err(_) => panic!("capacity overflow"),
        }
    }

    /// Allocates a table holding `count` blocks, all or nothing.
    pub(crate) fn with_blocks(alloc: A, count: usize) -> Result<Self, AllocError> {
        let () = Self::NONZERO_BLOCK;
        let mut blocks = Vec::new();
        blocks.try_reserve_exact(count).map_err(|_| AllocError)?;
        let mut staged = StagedBlocks::<T, A, B>::new(&alloc);
        for _ in 0..count {
            staged.push_new()?;
        }
        blocks.extend(staged.commit());
        Ok(BlockTable {
            blocks,
            alloc,
            _owns: PhantomData,
        })
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub(crate) fn allocator(&self) -> &A {
        &self.alloc
    }

    #[inline]
    pub(crate) fn blocks(&self) -> &[NonNull<T>] {
        &self.blocks
    }

    /// Pointer to slot `offset` of block `block`.
    ///
    /// # Safety
    /// `block < self.len()` and `offset < B`.
    #[inline]
    pub(crate) unsafe fn slot(&self, block: usize, offset: usize) -> *mut T {
        debug_assert!(block < self.blocks.len() && offset < B);
        self.blocks.get_unchecked(block).as_ptr().add(offset)
    }

    /// Rebuilds the table as `[front slack][window][back slack]`.
    ///
    /// Blocks outside `window` hold no live elements. They are reused as slack before anything
    /// new is allocated, and whatever is left over is released. Returns the index the window's
    /// first block moved to. On failure every block acquired so far is released and the table is
    /// left as it was.
    pub(crate) fn rebuild(
        &mut self,
        window: RangeInclusive<usize>,
        front: usize,
        back: usize,
    ) -> Result<usize, AllocError> {
        let (first, last) = (*window.start(), *window.end());
        debug_assert!(first <= last && last < self.blocks.len());
        let live = last - first + 1;
        let slack = front.checked_add(back).ok_or(AllocError)?;
        let total = slack.checked_add(live).ok_or(AllocError)?;
        let missing = slack.saturating_sub(self.blocks.len() - live);

        let mut table = Vec::new();
        table.try_reserve_exact(total).map_err(|_| AllocError)?;
        let mut staged = StagedBlocks::<T, A, B>::new(&self.alloc);
        for _ in 0..missing {
            staged.push_new()?;
        }
        let fresh = staged.commit();

        let old = std::mem::take(&mut self.blocks);
        let mut spare = old[..first]
            .iter()
            .chain(&old[last + 1..])
            .copied()
            .chain(fresh);
        table.extend(spare.by_ref().take(front));
        table.extend_from_slice(&old[first..=last]);
        table.extend(spare.by_ref().take(back));
        for block in spare {
            unsafe { release_block::<T, A, B>(&self.alloc, block) };
        }
        self.blocks = table;
        Ok(front)
    }

    /// Releases every block from index `keep` onward.
    ///
    /// The caller guarantees none of them hold live elements.
    pub(crate) fn release_tail(&mut self, keep: usize) {
        if keep >= self.blocks.len() {
            return;
        }
        for block in self.blocks.drain(keep..) {
            unsafe { release_block::<T, A, B>(&self.alloc, block) };
        }
    }
}

impl<T, A, const B: usize> Drop for BlockTable<T, A, B>
where
    A: BlockAllocator,
{
    fn drop(&mut self) {
        for block in self.blocks.drain(..) {
            unsafe { release_block::<T, A, B>(&self.alloc, block) };
        }
    }
}

fn acquire_block<T, A, const B: usize>(alloc: &A) -> Result<NonNull<T>, AllocError>
where
    A: BlockAllocator,
{
    let layout = BlockTable::<T, A, B>::block_layout();
    if layout.size() == 0 {
        return Ok(NonNull::dangling());
    }
    let ptr = alloc.allocate(layout).map_err(|err| {
        crate::trace_event!(warn, size = layout.size(), "block allocation failed");
        err
    })?;
    Ok(ptr.cast())
}

unsafe fn release_block<T, A, const B: usize>(alloc: &A, block: NonNull<T>)
where
    A: BlockAllocator,
{
    let layout = BlockTable::<T, A, B>::block_layout();
    if layout.size() != 0 {
        alloc.deallocate(block.cast(), layout);
    }
}

/// Blocks acquired for an operation that has not committed yet.
///
/// Dropping the guard without calling [`commit`](StagedBlocks::commit) releases them.
struct StagedBlocks<'a, T, A, const B: usize>
where
    A: BlockAllocator,
{
    alloc: &'a A,
    blocks: Vec<NonNull<T>>,
}

impl<'a, T, A, const B: usize> StagedBlocks<'a, T, A, B>
where
    A: BlockAllocator,
{
    fn new(alloc: &'a A) -> Self {
        StagedBlocks {
            alloc,
            blocks: Vec::new(),
        }
    }

    fn push_new(&mut self) -> Result<(), AllocError> {
        self.blocks.try_reserve(1).map_err(|_| AllocError)?;
        let block = acquire_block::<T, A, B>(self.alloc)?;
        self.blocks.push(block);
        Ok(())
    }

    fn commit(mut self) -> Vec<NonNull<T>> {
        std::mem::take(&mut self.blocks)
    }
}

impl<'a, T, A, const B: usize> Drop for StagedBlocks<'a, T, A, B>
where
    A: BlockAllocator,
{
    fn drop(&mut self) {
        for block in self.blocks.drain(..) {
            unsafe { release_block::<T, A, B>(self.alloc, block) };
        }
    }
}
