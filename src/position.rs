//! Two-level addressing for a [`BlockDeque`](crate::BlockDeque).
//!
//! Every slot in the deque is named by a [`Position`]: the index of its block in the block table
//! and its offset inside that block. All arithmetic wraps at the block size `B`, carrying into
//! (or borrowing from) the block index, so walking `n` slots forward from any position lands on
//! the same slot as flattening, adding `n`, and splitting again.

/// A (block index, in-block offset) pair.
///
/// Positions order lexicographically, block first, which matches the logical order of the slots
/// they name.
///
/// # Examples
/// ```
/// # use block_deque::Position;
/// let begin = Position::new(1, 20);
/// let fifth = Position::locate::<24>(begin, 5);
/// assert_eq!(fifth, Position::new(2, 1));
/// assert_eq!(fifth.distance::<24>(begin), 5);
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// Index of the owning block in the block table.
    pub block: usize,
    /// Offset of the slot inside its block, always `< B`.
    pub offset: usize,
}

impl Position {
    /// Creates a position from its parts.
    pub const fn new(block: usize, offset: usize) -> Self {
        Position { block, offset }
    }

    /// Returns the position `index` slots after `begin`.
    #[inline]
    pub const fn locate<const B: usize>(begin: Position, index: usize) -> Position {
        let walked = begin.offset + index;
        Position {
            block: begin.block + walked / B,
            offset: walked % B,
        }
    }

    /// Returns the number of slots between the first slot of block 0 and this position.
    #[inline]
    pub const fn flat<const B: usize>(self) -> usize {
        self.block * B + self.offset
    }

    /// Splits a flat slot number back into a position.
    #[inline]
    pub const fn from_flat<const B: usize>(flat: usize) -> Position {
        Position {
            block: flat / B,
            offset: flat % B,
        }
    }

    /// Steps `n` slots forward.
    #[inline]
    pub const fn advance<const B: usize>(self, n: usize) -> Position {
        Position::locate::<B>(self, n)
    }

    /// Steps `n` slots backward.
    ///
    /// # Panics
    /// Panics if that would move before the first slot of block 0.
    #[inline]
    pub fn retreat<const B: usize>(self, n: usize) -> Position {
        match self.flat::<B>().checked_sub(n) {
            Some(flat) => Position::from_flat::<B>(flat),
            None => panic!("position moved before the first block"),
        }
    }

    /// Steps `delta` slots in either direction, or returns `None` when that would move before
    /// the first slot of block 0.
    #[inline]
    pub fn checked_offset<const B: usize>(self, delta: isize) -> Option<Position> {
        let flat = self.flat::<B>();
        let moved = if delta >= 0 {
            flat.checked_add(delta.unsigned_abs())?
        } else {
            flat.checked_sub(delta.unsigned_abs())?
        };
        Some(Position::from_flat::<B>(moved))
    }

    /// Signed number of slots from `other` to `self`:
    /// `(block difference) * B + offset difference`.
    #[inline]
    pub fn distance<const B: usize>(self, other: Position) -> isize {
        let blocks = self.block as isize - other.block as isize;
        let offsets = self.offset as isize - other.offset as isize;
        blocks * B as isize + offsets
    }
}
