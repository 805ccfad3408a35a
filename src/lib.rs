//! A double-ended queue stored in fixed-size blocks.
//!
//! [`BlockDeque`] keeps its elements in blocks of `B` slots and a table of pointers to those
//! blocks. Pushing at either end is amortized O(1), indexing is O(1), and elements never move
//! when the deque grows, since only the pointer table is rebuilt.
//!
//! ```
//! use block_deque::{block_deque, BlockDeque};
//!
//! let mut deque: BlockDeque<i32> = block_deque![2, 3];
//! deque.push_front(1);
//! deque.push_back(4);
//! assert_eq!(deque, [1, 2, 3, 4]);
//!
//! let cursor = deque.cursor_front() + 2;
//! assert_eq!(cursor.get(), Some(&3));
//! ```
//!
//! # Features
//! - `serde`: `Serialize`/`Deserialize` as a plain sequence.
//! - `tracing`: `debug` events when the block table grows, `warn` events when an allocation fails.

#![cfg_attr(docsrs, feature(doc_cfg))]

macro_rules! trace_event {
    ($level:ident, $($arg:tt)+) => {
        #[cfg(feature = "tracing")]
        tracing::$level!($($arg)+);
    };
}
pub(crate) use trace_event;

pub mod deque;
pub mod error;
pub mod iter;
pub mod position;
pub mod settings;
mod table;

#[cfg(test)]
mod test_support;

pub use deque::{BlockDeque, DEFAULT_BLOCK_SIZE};
pub use error::{AllocError, OutOfRange, PushError};
pub use iter::{Cursor, IntoIter, Iter, IterMut};
pub use position::Position;
pub use settings::{BlockAllocator, Global, Propagation};

/// Creates a [`BlockDeque`] holding the given elements, in the manner of [`vec!`].
///
/// # Examples
/// ```
/// # use block_deque::{BlockDeque, block_deque};
/// let deque: BlockDeque<i32> = block_deque![];
/// assert_eq!(deque.len(), 0);
/// assert_eq!(deque.block_count(), 1);
///
/// let deque = block_deque![1; 3];
/// assert_eq!(deque, [1, 1, 1]);
///
/// let deque = block_deque![1, 2, 3];
/// assert_eq!(deque, [1, 2, 3]);
/// ```
#[macro_export]
macro_rules! block_deque {
    () => {
        $crate::BlockDeque::<_>::new()
    };
    ($elem:expr; $n:expr) => {
        $crate::BlockDeque::<_>::from_elem($elem, $n)
    };
    ($($x:expr),+ $(,)?) => {
        $crate::BlockDeque::<_>::from([$($x),+])
    };
}
