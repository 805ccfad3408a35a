//! A [`BlockDeque`] is a double-ended sequence built from fixed-size blocks.
//! Its API follows [`VecDeque`](std::collections::VecDeque), but the elements never move when the
//! deque grows: only the table of block pointers is rebuilt around the blocks in use, with spare
//! blocks on both sides. Blocks left behind at either end are reused before new ones are allocated.
//! Any index is two divisions away from its slot, and pushing at either end is amortized O(1).

use crate::iter::{Cursor, IntoIter, Iter, IterMut};
use crate::position::Position;
use crate::table::BlockTable;
use crate::{AllocError, BlockAllocator, Global, OutOfRange, PushError};
use std::fmt::Debug;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};
use std::ptr;

/// Number of slots per block when the block size is not given explicitly.
pub const DEFAULT_BLOCK_SIZE: usize = 24;

/// A double-ended queue stored in blocks of `B` slots.
///
/// The deque keeps a table of blocks, the position of its first element, and its length. Every
/// other position is derived from those two through [`Position::locate`]. When an end runs out of
/// blocks, the table is tripled: the old blocks end up in the middle third, with as many fresh
/// blocks before them as after them, so both ends have room again.
///
/// # Examples
/// ```
/// use block_deque::BlockDeque;
/// let mut deque = BlockDeque::new();
/// deque.push_back(2);
/// deque.push_front(1);
/// deque.push_back(3);
/// assert_eq!(deque, [1, 2, 3]);
/// assert_eq!(deque[1], 2);
/// ```
///
/// # Allocators
/// Blocks come from a [`BlockAllocator`], [`Global`] by default. How the allocator behaves on
/// [`clone_from`](Clone::clone_from) and [`take_from`](BlockDeque::take_from) is configured by
/// [`BlockAllocator::PROPAGATION`].
pub struct BlockDeque<T, A = Global, const B: usize = DEFAULT_BLOCK_SIZE>
where
    A: BlockAllocator,
{
    table: BlockTable<T, A, B>,
    begin: Position,
    len: usize,
    _owns: PhantomData<T>,
}

unsafe impl<T: Send, A, const B: usize> Send for BlockDeque<T, A, B> where A: BlockAllocator + Send {}
unsafe impl<T: Sync, A, const B: usize> Sync for BlockDeque<T, A, B> where A: BlockAllocator + Sync {}

impl<T> BlockDeque<T> {
    /// Creates an empty deque holding a single block from the global heap.
    ///
    /// # Examples
    /// ```
    /// # use block_deque::BlockDeque;
    /// let deque: BlockDeque<i32> = BlockDeque::new();
    /// assert!(deque.is_empty());
    /// assert_eq!(deque.block_count(), 1);
    /// ```
    pub fn new() -> Self {
        BlockDeque::new_in(Global)
    }

    /// Creates an empty deque that can take at least `capacity` pushes at the back without growing.
    ///
    /// # Examples
    /// ```
    /// # use block_deque::BlockDeque;
    /// let deque: BlockDeque<i32> = BlockDeque::with_capacity(100);
    /// assert!(deque.space_back() >= 100);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        BlockDeque::with_capacity_in(capacity, Global)
    }

    /// Creates a deque of `len` default values.
    ///
    /// # Examples
    /// ```
    /// # use block_deque::BlockDeque;
    /// let deque: BlockDeque<u8> = BlockDeque::with_default(30);
    /// assert_eq!(deque.len(), 30);
    /// assert!(deque.iter().all(|&byte| byte == 0));
    /// ```
    pub fn with_default(len: usize) -> Self
    where
        T: Default,
    {
        BlockDeque::with_default_in(len, Global)
    }

    /// Creates a deque of `len` copies of `value`.
    ///
    /// # Examples
    /// ```
    /// # use block_deque::BlockDeque;
    /// let deque = BlockDeque::from_elem("ab", 3);
    /// assert_eq!(deque, ["ab", "ab", "ab"]);
    /// ```
    pub fn from_elem(value: T, len: usize) -> Self
    where
        T: Clone,
    {
        BlockDeque::from_elem_in(value, len, Global)
    }
}

impl<T, A, const B: usize> BlockDeque<T, A, B>
where
    A: BlockAllocator,
{
    /// Creates an empty deque holding a single block from `alloc`.
    ///
    /// # Errors
    /// Returns [`AllocError`] if the first block cannot be allocated.
    pub fn try_new_in(alloc: A) -> Result<Self, AllocError> {
        Ok(BlockDeque {
            table: BlockTable::with_blocks(alloc, 1)?,
            begin: Position::default(),
            len: 0,
            _owns: PhantomData,
        })
    }

    /// Creates an empty deque holding a single block from `alloc`.
    ///
    /// Allocation failure is reported through [`std::alloc::handle_alloc_error`].
    pub fn new_in(alloc: A) -> Self {
        match BlockDeque::try_new_in(alloc) {
            Ok(deque) => deque,
            Err(_) => Self::alloc_failure(),
        }
    }

    /// Creates an empty deque using `alloc` that can take at least `capacity` pushes at the back
    /// without growing.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        let mut deque = BlockDeque::new_in(alloc);
        deque.reserve_back(capacity);
        deque
    }

    /// Creates a deque of `len` default values using `alloc`.
    ///
    /// If `T::default` panics, the values built so far are dropped and every block is released
    /// before the panic continues.
    pub fn with_default_in(len: usize, alloc: A) -> Self
    where
        T: Default,
    {
        let mut deque = BlockDeque::with_capacity_in(len, alloc);
        for _ in 0..len {
            deque.emplace_back(T::default);
        }
        deque
    }

    /// Creates a deque of `len` copies of `value` using `alloc`.
    ///
    /// The last slot receives `value` itself, so `len` elements cost `len - 1` clones.
    pub fn from_elem_in(value: T, len: usize, alloc: A) -> Self
    where
        T: Clone,
    {
        let mut deque = BlockDeque::with_capacity_in(len, alloc);
        if len > 0 {
            for _ in 1..len {
                deque.push_back(value.clone());
            }
            deque.push_back(value);
        }
        deque
    }

    fn alloc_failure() -> ! {
        std::alloc::handle_alloc_error(BlockTable::<T, A, B>::block_layout())
    }

    /// Returns the number of elements.
    ///
    /// # Examples
    /// ```
    /// # use block_deque::BlockDeque;
    /// let mut deque = BlockDeque::new();
    /// deque.push_back(42);
    /// assert_eq!(deque.len(), 1);
    /// ```
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the deque contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the allocator the deque takes its blocks from.
    #[inline]
    pub fn allocator(&self) -> &A {
        self.table.allocator()
    }

    /// Returns the number of blocks in the block table, live or not.
    #[inline]
    pub fn block_count(&self) -> usize {
        self.table.len()
    }

    /// Returns how many elements can be pushed at the front before the table has to grow.
    #[inline]
    pub fn space_front(&self) -> usize {
        self.begin.flat::<B>()
    }

    /// Returns how many elements can be pushed at the back before the table has to grow.
    ///
    /// The slot after the last element must stay inside the table, so the last slot of the last
    /// block is never counted.
    #[inline]
    pub fn space_back(&self) -> usize {
        self.table.len() * B - self.end_position().flat::<B>() - 1
    }

    #[inline]
    pub(crate) fn begin_position(&self) -> Position {
        self.begin
    }

    #[inline]
    pub(crate) fn end_position(&self) -> Position {
        Position::locate::<B>(self.begin, self.len)
    }

    #[inline]
    pub(crate) fn position_of(&self, index: usize) -> Position {
        Position::locate::<B>(self.begin, index)
    }

    #[inline]
    pub(crate) fn blocks(&self) -> &[std::ptr::NonNull<T>] {
        self.table.blocks()
    }

    /// # Safety
    /// `pos` must lie inside the table.
    #[inline]
    unsafe fn slot_ptr(&self, pos: Position) -> *mut T {
        self.table.slot(pos.block, pos.offset)
    }

    /// Moves the element at logical index `from` into the empty slot at logical index `to`.
    ///
    /// # Safety
    /// `from` must hold a live element, `to` must be an empty slot inside the table.
    #[inline]
    unsafe fn relocate(&mut self, from: usize, to: usize) {
        let src = self.slot_ptr(self.position_of(from));
        let dst = self.slot_ptr(self.position_of(to));
        ptr::copy_nonoverlapping(src, dst, 1);
    }

    /// Number of blocks holding live elements or the slot after the last one.
    #[inline]
    fn live_blocks(&self) -> usize {
        self.end_position().block - self.begin.block + 1
    }

    /// Rebuilds the table around the live blocks with `front` and `back` spare blocks.
    fn rebuild(&mut self, front: usize, back: usize) -> Result<(), AllocError> {
        let window = self.begin.block..=self.end_position().block;
        self.begin.block = self.table.rebuild(window, front, back)?;
        crate::trace_event!(
            debug,
            front_slack = front,
            back_slack = back,
            blocks = self.table.len(),
            len = self.len,
            "rebuilt block table"
        );
        Ok(())
    }

    fn grow(&mut self) -> Result<(), AllocError> {
        let live = self.live_blocks();
        self.rebuild(live, live)
    }

    /// Returns a reference to the element at `index`, or `None` if it is out of bounds.
    ///
    /// # Examples
    /// ```
    /// # use block_deque::BlockDeque;
    /// let deque = BlockDeque::<_>::from([3, 4, 5]);
    /// assert_eq!(deque.get(1), Some(&4));
    /// assert_eq!(deque.get(3), None);
    /// ```
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.len {
            Some(unsafe { self.get_unchecked(index) })
        } else {
            None
        }
    }

    /// Returns a mutable reference to the element at `index`, or `None` if it is out of bounds.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index < self.len {
            Some(unsafe { self.get_unchecked_mut(index) })
        } else {
            None
        }
    }

    /// Returns a reference to the element at `index` without checking bounds.
    ///
    /// # Safety
    /// `index` must be less than [`len`](BlockDeque::len).
    #[inline]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        debug_assert!(index < self.len);
        &*self.slot_ptr(self.position_of(index))
    }

    /// Returns a mutable reference to the element at `index` without checking bounds.
    ///
    /// # Safety
    /// `index` must be less than [`len`](BlockDeque::len).
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        debug_assert!(index < self.len);
        &mut *self.slot_ptr(self.position_of(index))
    }

    /// Bounds-checked access.
    ///
    /// # Errors
    /// Returns [`OutOfRange`] when `index >= len`.
    ///
    /// # Examples
    /// ```
    /// # use block_deque::{BlockDeque, OutOfRange};
    /// let deque = BlockDeque::<_>::from([3, 4, 5]);
    /// assert_eq!(deque.try_get(2), Ok(&5));
    /// assert_eq!(deque.try_get(3), Err(OutOfRange { index: 3, len: 3 }));
    /// ```
    pub fn try_get(&self, index: usize) -> Result<&T, OutOfRange> {
        let len = self.len;
        self.get(index).ok_or(OutOfRange { index, len })
    }

    /// Mutable version of [`try_get`](BlockDeque::try_get).
    ///
    /// # Errors
    /// Returns [`OutOfRange`] when `index >= len`.
    pub fn try_get_mut(&mut self, index: usize) -> Result<&mut T, OutOfRange> {
        let len = self.len;
        self.get_mut(index).ok_or(OutOfRange { index, len })
    }

    /// Returns the first element, if any.
    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Returns the first element mutably, if any.
    #[inline]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.get_mut(0)
    }

    /// Returns the last element, if any.
    #[inline]
    pub fn back(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|last| self.get(last))
    }

    /// Returns the last element mutably, if any.
    #[inline]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        match self.len.checked_sub(1) {
            Some(last) => self.get_mut(last),
            None => None,
        }
    }

    /// Makes room for at least `additional` pushes at the back.
    ///
    /// # Errors
    /// Returns [`AllocError`] if the table could not grow; the deque is unchanged in that case.
    pub fn try_reserve_back(&mut self, additional: usize) -> Result<(), AllocError> {
        if self.space_back() >= additional {
            return Ok(());
        }
        let end = self.end_position();
        let short = additional - (B - 1 - end.offset);
        let live = self.live_blocks();
        let back = live.max(blocks_for::<B>(short));
        self.rebuild(live.max(self.begin.block), back)
    }

    /// Makes room for at least `additional` pushes at the front.
    ///
    /// # Errors
    /// Returns [`AllocError`] if the table could not grow; the deque is unchanged in that case.
    pub fn try_reserve_front(&mut self, additional: usize) -> Result<(), AllocError> {
        if self.space_front() >= additional {
            return Ok(());
        }
        let short = additional - self.begin.offset;
        let live = self.live_blocks();
        let front = live.max(blocks_for::<B>(short));
        let back = self.table.len() - 1 - self.end_position().block;
        self.rebuild(front, live.max(back))
    }

    /// Makes room for at least `additional` pushes at the back.
    ///
    /// # Examples
    /// ```
    /// # use block_deque::BlockDeque;
    /// let mut deque: BlockDeque<u32> = BlockDeque::new();
    /// deque.reserve_back(500);
    /// assert!(deque.space_back() >= 500);
    /// ```
    pub fn reserve_back(&mut self, additional: usize) {
        if self.try_reserve_back(additional).is_err() {
            Self::alloc_failure()
        }
    }

    /// Makes room for at least `additional` pushes at the front.
    pub fn reserve_front(&mut self, additional: usize) {
        if self.try_reserve_front(additional).is_err() {
            Self::alloc_failure()
        }
    }

    /// Secures the slot after the last element.
    fn secure_back(&mut self) -> Result<(), AllocError> {
        if self.space_back() == 0 {
            self.grow()?;
        }
        Ok(())
    }

    /// Secures the slot before the first element.
    fn secure_front(&mut self) -> Result<(), AllocError> {
        if self.space_front() == 0 {
            self.grow()?;
        }
        Ok(())
    }

    /// Appends an element to the back, growing the table first if the end would otherwise leave it.
    ///
    /// # Errors
    /// Hands `value` back inside a [`PushError`] if the table could not grow.
    pub fn try_push_back(&mut self, value: T) -> Result<(), PushError<T>> {
        if let Err(err) = self.secure_back() {
            return Err(PushError::new(value, err));
        }
        unsafe { ptr::write(self.slot_ptr(self.end_position()), value) };
        self.len += 1;
        Ok(())
    }

    /// Appends an element to the back.
    ///
    /// # Examples
    /// ```
    /// # use block_deque::BlockDeque;
    /// let mut deque = BlockDeque::new();
    /// for value in 1..=25 {
    ///     deque.push_back(value);
    /// }
    /// assert_eq!(deque.len(), 25);
    /// assert_eq!(deque[24], 25);
    /// ```
    pub fn push_back(&mut self, value: T) {
        if self.try_push_back(value).is_err() {
            Self::alloc_failure()
        }
    }

    /// Builds an element in a freshly secured back slot and returns a reference to it.
    ///
    /// The slot is secured before `make` runs, so a panic in `make` leaves the deque unchanged.
    pub fn emplace_back<F>(&mut self, make: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        if self.secure_back().is_err() {
            Self::alloc_failure()
        }
        let value = make();
        let slot = unsafe { self.slot_ptr(self.end_position()) };
        self.len += 1;
        unsafe {
            ptr::write(slot, value);
            &mut *slot
        }
    }

    /// Prepends an element to the front, growing the table first if block 0 is exhausted.
    ///
    /// # Errors
    /// Hands `value` back inside a [`PushError`] if the table could not grow.
    pub fn try_push_front(&mut self, value: T) -> Result<(), PushError<T>> {
        if let Err(err) = self.secure_front() {
            return Err(PushError::new(value, err));
        }
        self.begin = self.begin.retreat::<B>(1);
        unsafe { ptr::write(self.slot_ptr(self.begin), value) };
        self.len += 1;
        Ok(())
    }

    /// Prepends an element to the front.
    ///
    /// # Examples
    /// ```
    /// # use block_deque::BlockDeque;
    /// let mut deque = BlockDeque::<_>::from([2, 3]);
    /// deque.push_front(1);
    /// assert_eq!(deque, [1, 2, 3]);
    /// ```
    pub fn push_front(&mut self, value: T) {
        if self.try_push_front(value).is_err() {
            Self::alloc_failure()
        }
    }

    /// Builds an element in a freshly secured front slot and returns a reference to it.
    ///
    /// The slot is secured before `make` runs, so a panic in `make` leaves the deque unchanged.
    pub fn emplace_front<F>(&mut self, make: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        if self.secure_front().is_err() {
            Self::alloc_failure()
        }
        let value = make();
        self.begin = self.begin.retreat::<B>(1);
        self.len += 1;
        unsafe {
            let slot = self.slot_ptr(self.begin);
            ptr::write(slot, value);
            &mut *slot
        }
    }

    /// Removes the last element and returns it, or `None` if the deque is empty.
    ///
    /// Blocks are never released by popping.
    ///
    /// # Examples
    /// ```
    /// # use block_deque::BlockDeque;
    /// let mut deque = BlockDeque::<_>::from([42, 10]);
    /// assert_eq!(deque.pop_back(), Some(10));
    /// assert_eq!(deque.pop_back(), Some(42));
    /// assert_eq!(deque.pop_back(), None);
    /// ```
    pub fn pop_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(unsafe { ptr::read(self.slot_ptr(self.end_position())) })
    }

    /// Removes the first element and returns it, or `None` if the deque is empty.
    ///
    /// # Examples
    /// ```
    /// # use block_deque::BlockDeque;
    /// let mut deque = BlockDeque::<_>::from([42, 10]);
    /// assert_eq!(deque.pop_front(), Some(42));
    /// assert_eq!(deque.pop_front(), Some(10));
    /// assert_eq!(deque.pop_front(), None);
    /// ```
    pub fn pop_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let value = unsafe { ptr::read(self.slot_ptr(self.begin)) };
        self.begin = self.begin.advance::<B>(1);
        self.len -= 1;
        Some(value)
    }

    /// Inserts `value` at `index`, shifting whichever side of `index` is shorter.
    ///
    /// The slot is secured first; if that fails the deque is unchanged and `value` is handed
    /// back. The shift itself only moves elements bitwise and cannot fail.
    ///
    /// # Errors
    /// Hands `value` back inside a [`PushError`] if the table could not grow.
    ///
    /// # Panics
    /// Panics if `index > len`.
    pub fn try_insert(&mut self, index: usize, value: T) -> Result<(), PushError<T>> {
        let len = self.len;
        assert!(
            index <= len,
            "insertion index (is {index}) should be <= len (is {len})"
        );
        if index == len {
            return self.try_push_back(value);
        }
        if index == 0 {
            return self.try_push_front(value);
        }

        if index < len - index {
            if let Err(err) = self.secure_front() {
                return Err(PushError::new(value, err));
            }
            self.begin = self.begin.retreat::<B>(1);
            // slide the leading elements one slot toward the front
            for i in 0..index {
                unsafe { self.relocate(i + 1, i) };
            }
        } else {
            if let Err(err) = self.secure_back() {
                return Err(PushError::new(value, err));
            }
            for i in (index..len).rev() {
                unsafe { self.relocate(i, i + 1) };
            }
        }
        unsafe { ptr::write(self.slot_ptr(self.position_of(index)), value) };
        self.len += 1;
        Ok(())
    }

    /// Inserts `value` at `index`, shifting whichever side of `index` is shorter.
    ///
    /// # Panics
    /// Panics if `index > len`.
    ///
    /// # Examples
    /// ```
    /// # use block_deque::BlockDeque;
    /// let mut deque = BlockDeque::<_>::from([1, 2, 4]);
    /// deque.insert(2, 3);
    /// assert_eq!(deque, [1, 2, 3, 4]);
    /// ```
    pub fn insert(&mut self, index: usize, value: T) {
        if self.try_insert(index, value).is_err() {
            Self::alloc_failure()
        }
    }

    /// Removes and returns the element at `index`, closing the gap from the shorter side.
    /// Returns `None` if `index` is out of bounds.
    ///
    /// # Examples
    /// ```
    /// # use block_deque::BlockDeque;
    /// let mut deque = BlockDeque::<_>::from([10, 20, 30, 40, 50]);
    /// assert_eq!(deque.remove(0), Some(10));
    /// assert_eq!(deque, [20, 30, 40, 50]);
    /// assert_eq!(deque.remove(9), None);
    /// ```
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        let value = unsafe { ptr::read(self.slot_ptr(self.position_of(index))) };
        let after = self.len - 1 - index;
        if index < after {
            for i in (0..index).rev() {
                unsafe { self.relocate(i, i + 1) };
            }
            self.begin = self.begin.advance::<B>(1);
        } else {
            for i in index + 1..self.len {
                unsafe { self.relocate(i, i - 1) };
            }
        }
        self.len -= 1;
        Some(value)
    }

    /// Drops the elements past `len`, back to front. Does nothing if `len >= self.len()`.
    pub fn truncate(&mut self, len: usize) {
        while self.len > len {
            self.pop_back();
        }
    }

    /// Drops every element front to back, then releases every block but one.
    ///
    /// # Examples
    /// ```
    /// # use block_deque::BlockDeque;
    /// let mut deque: BlockDeque<i32> = (0..100).collect();
    /// assert!(deque.block_count() > 1);
    /// deque.clear();
    /// assert!(deque.is_empty());
    /// assert_eq!(deque.block_count(), 1);
    /// ```
    pub fn clear(&mut self) {
        while self.pop_front().is_some() {}
        self.table.release_tail(1);
        self.begin = Position::default();
    }

    /// Move-assignment: replaces the contents of `self` with those of `source` and leaves
    /// `source` as a freshly constructed, empty deque.
    ///
    /// When the allocator propagates on move, `self` adopts `source`'s blocks and allocator.
    /// Otherwise `self` keeps its own allocator and the elements are moved over one by one.
    ///
    /// # Examples
    /// ```
    /// # use block_deque::BlockDeque;
    /// let mut target = BlockDeque::<_>::from([1, 2]);
    /// let mut source = BlockDeque::<_>::from([7, 8, 9]);
    /// target.take_from(&mut source);
    /// assert_eq!(target, [7, 8, 9]);
    /// assert!(source.is_empty());
    /// ```
    pub fn take_from(&mut self, source: &mut Self) {
        if A::PROPAGATION.on_move {
            let fresh = BlockDeque::new_in(source.allocator().clone());
            *self = std::mem::replace(source, fresh);
        } else {
            let mut replacement =
                BlockDeque::with_capacity_in(source.len, self.allocator().clone());
            while let Some(value) = source.pop_front() {
                replacement.push_back(value);
            }
            source.clear();
            *self = replacement;
        }
    }

    fn clone_in(&self, alloc: A) -> Self
    where
        T: Clone,
    {
        let mut copy = BlockDeque::with_capacity_in(self.len, alloc);
        for value in self.iter() {
            copy.push_back(value.clone());
        }
        copy
    }

    /// Returns a front-to-back iterator.
    ///
    /// # Examples
    /// ```
    /// # use block_deque::BlockDeque;
    /// let deque = BlockDeque::<_>::from([1, 2, 3]);
    /// let forward: Vec<_> = deque.iter().copied().collect();
    /// let backward: Vec<_> = deque.iter().rev().copied().collect();
    /// assert_eq!(forward, [1, 2, 3]);
    /// assert_eq!(backward, [3, 2, 1]);
    /// ```
    pub fn iter(&self) -> Iter<'_, T, B> {
        Iter::new(self.blocks(), self.begin, self.end_position(), self.len)
    }

    /// Returns a front-to-back iterator that allows modifying each element.
    pub fn iter_mut(&mut self) -> IterMut<'_, T, B> {
        let (begin, end, len) = (self.begin, self.end_position(), self.len);
        IterMut::new(self.table.blocks(), begin, end, len)
    }

    /// Returns a read-only cursor on the first element.
    pub fn cursor_front(&self) -> Cursor<&Self> {
        Cursor::new(self, self.begin)
    }

    /// Returns a read-only cursor one past the last element.
    pub fn cursor_end(&self) -> Cursor<&Self> {
        Cursor::new(self, self.end_position())
    }

    /// Returns a read-only cursor on the element at `index`.
    ///
    /// # Panics
    /// Panics if `index > len`; `index == len` gives the end cursor.
    pub fn cursor_at(&self, index: usize) -> Cursor<&Self> {
        assert!(index <= self.len, "cursor index (is {index}) should be <= len (is {})", self.len);
        Cursor::new(self, self.position_of(index))
    }

    /// Returns a read-write cursor on the first element.
    pub fn cursor_front_mut(&mut self) -> Cursor<&mut Self> {
        let begin = self.begin;
        Cursor::new(self, begin)
    }

    /// Returns a read-write cursor on the element at `index`.
    ///
    /// # Panics
    /// Panics if `index > len`; `index == len` gives the end cursor.
    pub fn cursor_at_mut(&mut self, index: usize) -> Cursor<&mut Self> {
        assert!(index <= self.len, "cursor index (is {index}) should be <= len (is {})", self.len);
        let pos = self.position_of(index);
        Cursor::new(self, pos)
    }
}

impl<T, A, const B: usize> Drop for BlockDeque<T, A, B>
where
    A: BlockAllocator,
{
    fn drop(&mut self) {
        // keeps dropping the rest if one element's destructor panics
        struct DropRest<'a, T, A: BlockAllocator, const B: usize>(&'a mut BlockDeque<T, A, B>);

        impl<T, A: BlockAllocator, const B: usize> Drop for DropRest<'_, T, A, B> {
            fn drop(&mut self) {
                while self.0.pop_front().is_some() {}
            }
        }

        // front to back; the table releases the blocks afterwards
        let mut rest = DropRest(self);
        while rest.0.pop_front().is_some() {}
    }
}

/// Blocks needed to hold `slots` slots.
#[inline]
fn blocks_for<const B: usize>(slots: usize) -> usize {
    slots / B + usize::from(slots % B != 0)
}

impl<T, A, const B: usize> Default for BlockDeque<T, A, B>
where
    A: BlockAllocator + Default,
{
    #[inline]
    fn default() -> Self {
        BlockDeque::new_in(A::default())
    }
}

impl<T, A, const B: usize> Clone for BlockDeque<T, A, B>
where
    T: Clone,
    A: BlockAllocator,
{
    /// Deep copy into fresh blocks from `allocator().select_on_copy()`.
    ///
    /// If a clone panics, the partial copy drops what it built and releases its blocks.
    fn clone(&self) -> Self {
        self.clone_in(self.allocator().select_on_copy())
    }

    /// Copy-assignment. The replacement is built completely before it is swapped in, so a
    /// panicking clone leaves `self` untouched.
    fn clone_from(&mut self, source: &Self) {
        let alloc = if A::PROPAGATION.on_copy {
            source.allocator().clone()
        } else {
            self.allocator().clone()
        };
        let mut replacement = source.clone_in(alloc);
        std::mem::swap(self, &mut replacement);
    }
}

impl<T: Debug, A, const B: usize> Debug for BlockDeque<T, A, B>
where
    A: BlockAllocator,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, A, const B: usize> Index<usize> for BlockDeque<T, A, B>
where
    A: BlockAllocator,
{
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(value) => value,
            None => panic!(
                "index out of bounds: the len is {} but the index is {index}",
                self.len
            ),
        }
    }
}

impl<T, A, const B: usize> IndexMut<usize> for BlockDeque<T, A, B>
where
    A: BlockAllocator,
{
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len;
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("index out of bounds: the len is {len} but the index is {index}"),
        }
    }
}

impl<T, A, const B: usize> Extend<T> for BlockDeque<T, A, B>
where
    A: BlockAllocator,
{
    #[inline]
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve_back(iter.size_hint().0);
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<'a, T, A, const B: usize> Extend<&'a T> for BlockDeque<T, A, B>
where
    T: Copy + 'a,
    A: BlockAllocator,
{
    #[inline]
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T, A, const B: usize> FromIterator<T> for BlockDeque<T, A, B>
where
    A: BlockAllocator + Default,
{
    #[inline]
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut deque = BlockDeque::new_in(A::default());
        deque.extend(iter);
        deque
    }
}

impl<T, A, const B: usize> From<Vec<T>> for BlockDeque<T, A, B>
where
    A: BlockAllocator + Default,
{
    #[inline]
    fn from(vec: Vec<T>) -> Self {
        vec.into_iter().collect()
    }
}

impl<T, A, const B: usize, const N: usize> From<[T; N]> for BlockDeque<T, A, B>
where
    A: BlockAllocator + Default,
{
    #[inline]
    fn from(array: [T; N]) -> Self {
        array.into_iter().collect()
    }
}

impl<T, A, const B: usize> IntoIterator for BlockDeque<T, A, B>
where
    A: BlockAllocator,
{
    type Item = T;
    type IntoIter = IntoIter<T, A, B>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

impl<'a, T, A, const B: usize> IntoIterator for &'a BlockDeque<T, A, B>
where
    A: BlockAllocator,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T, B>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A, const B: usize> IntoIterator for &'a mut BlockDeque<T, A, B>
where
    A: BlockAllocator,
{
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T, B>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

// partialeq, eq, partialord, ord, and hash implementations
impl<T, A, const B: usize> PartialEq for BlockDeque<T, A, B>
where
    T: PartialEq,
    A: BlockAllocator,
{
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T, A, const B: usize> PartialEq<[T]> for BlockDeque<T, A, B>
where
    T: PartialEq,
    A: BlockAllocator,
{
    #[inline]
    fn eq(&self, other: &[T]) -> bool {
        self.len == other.len() && self.iter().eq(other.iter())
    }
}

impl<T, A, const B: usize> PartialEq<&[T]> for BlockDeque<T, A, B>
where
    T: PartialEq,
    A: BlockAllocator,
{
    #[inline]
    fn eq(&self, other: &&[T]) -> bool {
        *self == **other
    }
}

impl<T, A, const B: usize, const N: usize> PartialEq<[T; N]> for BlockDeque<T, A, B>
where
    T: PartialEq,
    A: BlockAllocator,
{
    #[inline]
    fn eq(&self, other: &[T; N]) -> bool {
        *self == other[..]
    }
}

impl<T, A, const B: usize> PartialEq<Vec<T>> for BlockDeque<T, A, B>
where
    T: PartialEq,
    A: BlockAllocator,
{
    #[inline]
    fn eq(&self, other: &Vec<T>) -> bool {
        *self == other[..]
    }
}

impl<T, A, const B: usize> Eq for BlockDeque<T, A, B>
where
    T: Eq,
    A: BlockAllocator,
{
}

impl<T, A, const B: usize> PartialOrd for BlockDeque<T, A, B>
where
    T: PartialOrd,
    A: BlockAllocator,
{
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<T, A, const B: usize> Ord for BlockDeque<T, A, B>
where
    T: Ord,
    A: BlockAllocator,
{
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<T, A, const B: usize> std::hash::Hash for BlockDeque<T, A, B>
where
    T: std::hash::Hash,
    A: BlockAllocator,
{
    #[inline]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_usize(self.len);
        self.iter().for_each(|value| value.hash(state));
    }
}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
pub(crate) mod serde_impls {
    use super::*;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    impl<T, A, const B: usize> Serialize for BlockDeque<T, A, B>
    where
        T: Serialize,
        A: BlockAllocator,
    {
        #[inline]
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_seq(self.iter())
        }
    }

    impl<'src, T, A, const B: usize> Deserialize<'src> for BlockDeque<T, A, B>
    where
        T: Deserialize<'src>,
        A: BlockAllocator + Default,
    {
        #[inline]
        fn deserialize<D: Deserializer<'src>>(deserializer: D) -> Result<Self, D::Error> {
            let vec = <Vec<T> as Deserialize<'src>>::deserialize(deserializer)?;
            Ok(BlockDeque::from(vec))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_serde() {
            let input_sequences = [vec![0, 1, 2, 3, 4, 5, 6], vec![3, 2, 1], vec![]];
            for sequence in input_sequences.iter() {
                let deque: BlockDeque<i32, Global, 2> = BlockDeque::from(sequence.clone());
                let serialized = serde_json::to_string(&deque).unwrap();
                assert_eq!(serialized, serde_json::to_string(sequence).unwrap());
                let deserialized: BlockDeque<i32, Global, 2> =
                    serde_json::from_str(&serialized).unwrap();
                assert_eq!(deque, deserialized);
            }
        }
    }
}
