//! Iterators and cursors over a [`BlockDeque`].
//!
//! [`Iter`] and [`IterMut`] walk a pair of [`Position`]s toward each other, so they work from
//! both ends at once. [`Cursor`] is a random-access position that supports signed arithmetic,
//! distances, and comparisons. It comes in a read-only flavor, `Cursor<&BlockDeque>`, and a
//! read-write flavor, `Cursor<&mut BlockDeque>`, that can also insert and remove.

use crate::position::Position;
use crate::{BlockAllocator, BlockDeque};
use std::cmp::Ordering;
use std::fmt::Debug;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ops::{Add, AddAssign, Deref, Sub, SubAssign};
use std::ptr::NonNull;

/// Front-to-back iterator over shared references, created by [`BlockDeque::iter`].
pub struct Iter<'a, T, const B: usize> {
    blocks: &'a [NonNull<T>],
    front: Position,
    back: Position,
    remaining: usize,
    _borrow: PhantomData<&'a T>,
}

unsafe impl<'a, T: Sync, const B: usize> Send for Iter<'a, T, B> {}
unsafe impl<'a, T: Sync, const B: usize> Sync for Iter<'a, T, B> {}

impl<'a, T, const B: usize> Iter<'a, T, B> {
    pub(crate) fn new(
        blocks: &'a [NonNull<T>],
        front: Position,
        back: Position,
        remaining: usize,
    ) -> Self {
        Iter {
            blocks,
            front,
            back,
            remaining,
            _borrow: PhantomData,
        }
    }

    /// # Safety
    /// `pos` must name a live element of the borrowed deque.
    #[inline]
    unsafe fn element(&self, pos: Position) -> &'a T {
        &*self.blocks.get_unchecked(pos.block).as_ptr().add(pos.offset)
    }
}

impl<'a, T, const B: usize> Clone for Iter<'a, T, B> {
    fn clone(&self) -> Self {
        Iter { ..*self }
    }
}

impl<'a, T: Debug, const B: usize> Debug for Iter<'a, T, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Iter").field(&self.clone().collect::<Vec<_>>()).finish()
    }
}

impl<'a, T, const B: usize> Iterator for Iter<'a, T, B> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let pos = self.front;
        self.front = pos.advance::<B>(1);
        self.remaining -= 1;
        Some(unsafe { self.element(pos) })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }

    #[inline]
    fn nth(&mut self, n: usize) -> Option<&'a T> {
        if n >= self.remaining {
            self.front = self.back;
            self.remaining = 0;
            return None;
        }
        self.front = self.front.advance::<B>(n);
        self.remaining -= n;
        self.next()
    }

    #[inline]
    fn count(self) -> usize {
        self.remaining
    }

    #[inline]
    fn last(mut self) -> Option<&'a T> {
        self.next_back()
    }
}

impl<'a, T, const B: usize> DoubleEndedIterator for Iter<'a, T, B> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        self.back = self.back.retreat::<B>(1);
        self.remaining -= 1;
        Some(unsafe { self.element(self.back) })
    }
}

impl<'a, T, const B: usize> ExactSizeIterator for Iter<'a, T, B> {}
impl<'a, T, const B: usize> FusedIterator for Iter<'a, T, B> {}

/// Front-to-back iterator over mutable references, created by [`BlockDeque::iter_mut`].
pub struct IterMut<'a, T, const B: usize> {
    blocks: &'a [NonNull<T>],
    front: Position,
    back: Position,
    remaining: usize,
    _borrow: PhantomData<&'a mut T>,
}

unsafe impl<'a, T: Send, const B: usize> Send for IterMut<'a, T, B> {}
unsafe impl<'a, T: Sync, const B: usize> Sync for IterMut<'a, T, B> {}

impl<'a, T, const B: usize> IterMut<'a, T, B> {
    pub(crate) fn new(
        blocks: &'a [NonNull<T>],
        front: Position,
        back: Position,
        remaining: usize,
    ) -> Self {
        IterMut {
            blocks,
            front,
            back,
            remaining,
            _borrow: PhantomData,
        }
    }

    /// # Safety
    /// `pos` must name a live element of the borrowed deque that has not been handed out yet.
    #[inline]
    unsafe fn element(&mut self, pos: Position) -> &'a mut T {
        &mut *self.blocks.get_unchecked(pos.block).as_ptr().add(pos.offset)
    }
}

impl<'a, T: Debug, const B: usize> Debug for IterMut<'a, T, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pending = Iter::<T, B>::new(self.blocks, self.front, self.back, self.remaining);
        f.debug_tuple("IterMut").field(&pending.collect::<Vec<_>>()).finish()
    }
}

impl<'a, T, const B: usize> Iterator for IterMut<'a, T, B> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<&'a mut T> {
        if self.remaining == 0 {
            return None;
        }
        let pos = self.front;
        self.front = pos.advance::<B>(1);
        self.remaining -= 1;
        Some(unsafe { self.element(pos) })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }

    #[inline]
    fn nth(&mut self, n: usize) -> Option<&'a mut T> {
        if n >= self.remaining {
            self.front = self.back;
            self.remaining = 0;
            return None;
        }
        self.front = self.front.advance::<B>(n);
        self.remaining -= n;
        self.next()
    }

    #[inline]
    fn count(self) -> usize {
        self.remaining
    }

    #[inline]
    fn last(mut self) -> Option<&'a mut T> {
        self.next_back()
    }
}

impl<'a, T, const B: usize> DoubleEndedIterator for IterMut<'a, T, B> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a mut T> {
        if self.remaining == 0 {
            return None;
        }
        self.back = self.back.retreat::<B>(1);
        self.remaining -= 1;
        let pos = self.back;
        Some(unsafe { self.element(pos) })
    }
}

impl<'a, T, const B: usize> ExactSizeIterator for IterMut<'a, T, B> {}
impl<'a, T, const B: usize> FusedIterator for IterMut<'a, T, B> {}

/// Owning iterator, created by [`BlockDeque::into_iter`](IntoIterator::into_iter).
///
/// Elements not yielded are dropped with the iterator.
pub struct IntoIter<T, A, const B: usize>
where
    A: BlockAllocator,
{
    deque: BlockDeque<T, A, B>,
}

impl<T, A, const B: usize> IntoIter<T, A, B>
where
    A: BlockAllocator,
{
    pub(crate) fn new(deque: BlockDeque<T, A, B>) -> Self {
        IntoIter { deque }
    }
}

impl<T: Debug, A, const B: usize> Debug for IntoIter<T, A, B>
where
    A: BlockAllocator,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("IntoIter").field(&self.deque).finish()
    }
}

impl<T, A, const B: usize> Iterator for IntoIter<T, A, B>
where
    A: BlockAllocator,
{
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.deque.pop_front()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.deque.len(), Some(self.deque.len()))
    }
}

impl<T, A, const B: usize> DoubleEndedIterator for IntoIter<T, A, B>
where
    A: BlockAllocator,
{
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        self.deque.pop_back()
    }
}

impl<T, A, const B: usize> ExactSizeIterator for IntoIter<T, A, B> where A: BlockAllocator {}
impl<T, A, const B: usize> FusedIterator for IntoIter<T, A, B> where A: BlockAllocator {}

/// A random-access position in a [`BlockDeque`].
///
/// `R` is the borrow the cursor holds: `&BlockDeque` for a read-only cursor, `&mut BlockDeque`
/// for one that can also modify the deque. A cursor may sit anywhere inside the block table; only
/// positions between the first element and one past the last hold something, and
/// [`get`](Cursor::get) returns `None` everywhere else.
///
/// Cursors compare and subtract by position, so `(&b - &a)` is the number of steps from `a`
/// to `b`, and moving a cursor by `n` then back by `n` returns it to where it started.
///
/// # Examples
/// ```
/// # use block_deque::BlockDeque;
/// let deque: BlockDeque<i32> = (0..60).collect();
/// let start = deque.cursor_front();
/// let mut cursor = start + 50;
/// assert_eq!(cursor.get(), Some(&50));
/// cursor -= 45;
/// assert_eq!(cursor.get(), Some(&5));
/// assert_eq!(&cursor - &start, 5);
/// assert!(start < cursor);
/// assert_eq!(&deque.cursor_end() - &start, 60);
/// ```
#[derive(Clone, Copy)]
pub struct Cursor<R> {
    deque: R,
    pos: Position,
}

impl<R> Cursor<R> {
    pub(crate) fn new(deque: R, pos: Position) -> Self {
        Cursor { deque, pos }
    }

    /// Returns the slot the cursor points at.
    #[inline]
    pub fn position(&self) -> Position {
        self.pos
    }
}

impl<R> Debug for Cursor<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor").field("pos", &self.pos).finish()
    }
}

impl<R, T, A, const B: usize> Cursor<R>
where
    R: Deref<Target = BlockDeque<T, A, B>>,
    A: BlockAllocator,
{
    /// Returns the logical index of the cursor: its distance from the first element.
    ///
    /// Negative before the first element, `len` at the end.
    #[inline]
    pub fn index(&self) -> isize {
        self.pos.distance::<B>(self.deque.begin_position())
    }

    /// Returns the element under the cursor, or `None` outside `[front, end)`.
    #[inline]
    pub fn get<'s>(&'s self) -> Option<&'s T>
    where
        A: 's,
    {
        usize::try_from(self.index())
            .ok()
            .and_then(|index| self.deque.get(index))
    }

    /// Returns `true` if the cursor sits one past the last element.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.pos == self.deque.end_position()
    }

    /// Steps one slot forward.
    #[inline]
    pub fn move_next(&mut self) {
        self.pos = self.pos.advance::<B>(1);
    }

    /// Steps one slot backward.
    ///
    /// # Panics
    /// Panics if the cursor is on the first slot of the block table.
    #[inline]
    pub fn move_prev(&mut self) {
        self.pos = self.pos.retreat::<B>(1);
    }

    /// Moves the cursor by `delta` slots.
    ///
    /// # Panics
    /// Panics if that would move before the first slot of the block table.
    #[inline]
    pub fn seek(&mut self, delta: isize) {
        self.pos = match self.pos.checked_offset::<B>(delta) {
            Some(pos) => pos,
            None => panic!("cursor moved before the first block"),
        };
    }
}

impl<'a, T, A, const B: usize> Cursor<&'a mut BlockDeque<T, A, B>>
where
    A: BlockAllocator,
{
    /// Returns the element under the cursor mutably, or `None` outside `[front, end)`.
    #[inline]
    pub fn get_mut(&mut self) -> Option<&mut T> {
        match usize::try_from(self.index()) {
            Ok(index) => self.deque.get_mut(index),
            Err(_) => None,
        }
    }

    /// Inserts `value` before the element under the cursor and leaves the cursor on `value`.
    ///
    /// # Panics
    /// Panics if the cursor is outside `[front, end]`.
    ///
    /// # Examples
    /// ```
    /// # use block_deque::BlockDeque;
    /// let mut deque = BlockDeque::<_>::from([1, 3]);
    /// let mut cursor = deque.cursor_at_mut(1);
    /// cursor.insert(2);
    /// assert_eq!(cursor.get(), Some(&2));
    /// assert_eq!(deque, [1, 2, 3]);
    /// ```
    pub fn insert(&mut self, value: T) {
        let index = match usize::try_from(self.index()) {
            Ok(index) if index <= self.deque.len() => index,
            _ => panic!("cursor is outside the deque"),
        };
        self.deque.insert(index, value);
        self.pos = self.deque.position_of(index);
    }

    /// Removes the element under the cursor and leaves the cursor on the element that followed
    /// it. Returns `None`, changing nothing, when the cursor is outside `[front, end)`.
    pub fn remove(&mut self) -> Option<T> {
        let index = usize::try_from(self.index()).ok()?;
        let value = self.deque.remove(index)?;
        self.pos = self.deque.position_of(index);
        Some(value)
    }

    /// Borrows a read-only cursor at the same position.
    #[inline]
    pub fn as_cursor(&self) -> Cursor<&BlockDeque<T, A, B>> {
        Cursor::new(&*self.deque, self.pos)
    }
}

impl<'a, T, A, const B: usize> From<Cursor<&'a mut BlockDeque<T, A, B>>>
    for Cursor<&'a BlockDeque<T, A, B>>
where
    A: BlockAllocator,
{
    #[inline]
    fn from(cursor: Cursor<&'a mut BlockDeque<T, A, B>>) -> Self {
        Cursor {
            deque: cursor.deque,
            pos: cursor.pos,
        }
    }
}

impl<R, T, A, const B: usize> AddAssign<isize> for Cursor<R>
where
    R: Deref<Target = BlockDeque<T, A, B>>,
    A: BlockAllocator,
{
    #[inline]
    fn add_assign(&mut self, delta: isize) {
        self.seek(delta);
    }
}

impl<R, T, A, const B: usize> SubAssign<isize> for Cursor<R>
where
    R: Deref<Target = BlockDeque<T, A, B>>,
    A: BlockAllocator,
{
    #[inline]
    fn sub_assign(&mut self, delta: isize) {
        self.pos = if delta >= 0 {
            self.pos.retreat::<B>(delta.unsigned_abs())
        } else {
            self.pos.advance::<B>(delta.unsigned_abs())
        };
    }
}

impl<R, T, A, const B: usize> Add<isize> for Cursor<R>
where
    R: Deref<Target = BlockDeque<T, A, B>>,
    A: BlockAllocator,
{
    type Output = Cursor<R>;

    #[inline]
    fn add(mut self, delta: isize) -> Cursor<R> {
        self += delta;
        self
    }
}

impl<R, T, A, const B: usize> Sub<isize> for Cursor<R>
where
    R: Deref<Target = BlockDeque<T, A, B>>,
    A: BlockAllocator,
{
    type Output = Cursor<R>;

    #[inline]
    fn sub(mut self, delta: isize) -> Cursor<R> {
        self -= delta;
        self
    }
}

impl<'a, 'b, R, S, T, A, const B: usize> Sub<&'b Cursor<S>> for &'a Cursor<R>
where
    R: Deref<Target = BlockDeque<T, A, B>>,
    S: Deref<Target = BlockDeque<T, A, B>>,
    A: BlockAllocator,
{
    type Output = isize;

    #[inline]
    fn sub(self, other: &'b Cursor<S>) -> isize {
        self.pos.distance::<B>(other.pos)
    }
}

impl<R, S> PartialEq<Cursor<S>> for Cursor<R> {
    #[inline]
    fn eq(&self, other: &Cursor<S>) -> bool {
        self.pos == other.pos
    }
}

impl<R> Eq for Cursor<R> {}

impl<R, S> PartialOrd<Cursor<S>> for Cursor<R> {
    #[inline]
    fn partial_cmp(&self, other: &Cursor<S>) -> Option<Ordering> {
        Some(self.pos.cmp(&other.pos))
    }
}

impl<R> Ord for Cursor<R> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.pos.cmp(&other.pos)
    }
}

#[cfg(test)]
mod iter_tests {
    use super::*;
    use crate::Global;

    type Small = BlockDeque<i32, Global, 4>;

    fn straddling() -> Small {
        // front elements end up in a block that was added by growth
        let mut deque = Small::new_in(Global);
        for value in 5..15 {
            deque.push_back(value);
        }
        for value in (0..5).rev() {
            deque.push_front(value);
        }
        deque
    }

    #[test]
    pub fn iter_both_ends_meet() {
        let deque = straddling();
        let mut iter = deque.iter();
        assert_eq!(iter.len(), 15);
        assert_eq!(iter.next(), Some(&0));
        assert_eq!(iter.next_back(), Some(&14));
        assert_eq!(iter.len(), 13);
        let middle: Vec<_> = iter.by_ref().copied().collect();
        assert_eq!(middle, (1..14).collect::<Vec<_>>());
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    pub fn iter_nth_jumps_across_blocks() {
        let deque = straddling();
        let mut iter = deque.iter();
        assert_eq!(iter.nth(9), Some(&9));
        assert_eq!(iter.next(), Some(&10));
        assert_eq!(iter.nth(10), None);
        assert_eq!(iter.next(), None);
        assert_eq!(deque.iter().last(), Some(&14));
        assert_eq!(deque.iter().count(), 15);
    }

    #[test]
    pub fn iter_clone_is_independent() {
        let deque = straddling();
        let mut iter = deque.iter();
        iter.next();
        let snapshot = iter.clone();
        iter.next();
        assert_eq!(snapshot.len(), 14);
        assert_eq!(iter.len(), 13);
    }

    #[test]
    pub fn iter_mut_from_both_ends() {
        let mut deque = straddling();
        let mut iter = deque.iter_mut();
        *iter.next().unwrap() = 100;
        *iter.next_back().unwrap() = 200;
        for value in iter {
            *value *= 2;
        }
        assert_eq!(deque[0], 100);
        assert_eq!(deque[1], 2);
        assert_eq!(deque[13], 26);
        assert_eq!(deque[14], 200);
    }

    #[test]
    pub fn iter_mut_nth_jumps_across_blocks() {
        let mut deque = straddling();
        let mut iter = deque.iter_mut();
        *iter.nth(9).unwrap() = 90;
        assert_eq!(iter.len(), 5);
        assert_eq!(iter.next().map(|value| *value), Some(10));
        assert!(iter.nth(4).is_none());
        assert!(iter.next().is_none());
        assert_eq!(deque.iter_mut().count(), 15);
        *deque.iter_mut().last().unwrap() = 140;
        assert_eq!(deque[9], 90);
        assert_eq!(deque[14], 140);
    }

    #[test]
    pub fn into_iter_drops_what_it_does_not_yield() {
        use crate::test_support::{Tracked, TrackStats};
        use std::rc::Rc;

        let stats = Rc::new(TrackStats::default());
        let mut deque = BlockDeque::<Tracked, Global, 3>::new_in(Global);
        for value in 0..10 {
            deque.push_back(Tracked::new(value, &stats));
        }
        let mut iter = deque.into_iter();
        assert_eq!(iter.next().map(|tracked| tracked.value), Some(0));
        assert_eq!(iter.next_back().map(|tracked| tracked.value), Some(9));
        assert_eq!(iter.len(), 8);
        drop(iter);
        assert_eq!(stats.live(), 0);
    }

    #[test]
    pub fn cursor_arithmetic_round_trips() {
        let deque = straddling();
        let front = deque.cursor_front();
        let end = deque.cursor_end();
        assert_eq!(&end - &front, 15);
        assert_eq!(&front - &end, -15);
        for n in 0..15isize {
            let moved = front + n;
            assert_eq!(moved.get(), Some(&(n as i32)));
            assert_eq!(moved.index(), n);
            assert_eq!(moved - n, front);
        }
        assert!(end.is_end());
        assert_eq!(end.get(), None);
    }

    #[test]
    pub fn cursor_steps_and_ordering() {
        let deque = straddling();
        let mut cursor = deque.cursor_at(3);
        cursor.move_next();
        assert_eq!(cursor.get(), Some(&4));
        cursor.move_prev();
        cursor.move_prev();
        assert_eq!(cursor.get(), Some(&2));
        assert!(cursor < deque.cursor_at(3));
        assert!(cursor > deque.cursor_front());
        assert_eq!(cursor, deque.cursor_at(2));
        cursor -= -5;
        assert_eq!(cursor.get(), Some(&7));
    }

    #[test]
    pub fn cursor_outside_live_range_reads_nothing() {
        let mut deque = Small::new_in(Global);
        deque.push_back(1);
        deque.push_front(0);
        let front = deque.cursor_front();
        // the slot before the front is inside the table after the front growth
        let before = front - 1;
        assert_eq!(before.index(), -1);
        assert_eq!(before.get(), None);
    }

    #[test]
    #[should_panic(expected = "before the first block")]
    pub fn cursor_cannot_leave_the_table() {
        let deque = Small::new_in(Global);
        let mut cursor = deque.cursor_front();
        cursor.move_prev();
    }

    #[test]
    pub fn cursor_mut_edits_in_place() {
        let mut deque = straddling();
        let mut cursor = deque.cursor_at_mut(7);
        *cursor.get_mut().unwrap() = 70;
        cursor.insert(65);
        assert_eq!(cursor.get(), Some(&65));
        assert_eq!(cursor.index(), 7);
        cursor += 1;
        assert_eq!(cursor.remove(), Some(70));
        assert_eq!(cursor.get(), Some(&8));
        let frozen = cursor.as_cursor();
        assert_eq!(frozen.index(), 8);
        let shared: Cursor<&Small> = cursor.into();
        assert_eq!(shared.get(), Some(&8));
        assert_eq!(
            deque,
            [0, 1, 2, 3, 4, 5, 6, 65, 8, 9, 10, 11, 12, 13, 14]
        );
    }

    #[test]
    pub fn cursor_mut_insert_at_end_and_front() {
        let mut deque = Small::new_in(Global);
        let mut cursor = deque.cursor_front_mut();
        cursor.insert(2);
        cursor.insert(1);
        assert_eq!(cursor.index(), 0);
        cursor += 2;
        assert!(cursor.is_end());
        cursor.insert(3);
        assert_eq!(cursor.get(), Some(&3));
        assert_eq!(cursor.remove(), Some(3));
        assert_eq!(cursor.remove(), None);
        assert_eq!(deque, [1, 2]);
    }
}
