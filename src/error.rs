//! Error types returned by the fallible [`BlockDeque`](crate::BlockDeque) operations.

use std::fmt;

/// A block or block-table allocation failed.
///
/// Returned by the `try_` family of methods. The container that reported it is left exactly
/// as it was before the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError;

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("memory allocation failed")
    }
}

impl std::error::Error for AllocError {}

/// A bounds-checked access asked for an index past the end of the deque.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfRange {
    /// The requested index.
    pub index: usize,
    /// The length of the deque at the time of the access.
    pub len: usize,
}

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "index {} is out of range for a deque of length {}",
            self.index, self.len
        )
    }
}

impl std::error::Error for OutOfRange {}

/// A push or insert could not secure a slot for its element.
///
/// The rejected element is handed back through [`PushError::into_inner`].
///
/// # Examples
/// ```
/// # use block_deque::{AllocError, PushError};
/// let err = PushError::new(7, AllocError);
/// assert_eq!(err.into_inner(), 7);
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PushError<T> {
    value: T,
    source: AllocError,
}

impl<T> PushError<T> {
    /// Bundles a rejected element with the allocation failure that rejected it.
    pub const fn new(value: T, source: AllocError) -> Self {
        PushError { value, source }
    }

    /// Returns the element that could not be stored.
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Returns a reference to the element that could not be stored.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Returns the underlying allocation failure.
    pub fn alloc_error(&self) -> AllocError {
        self.source
    }
}

// no `T: Debug` bound, so the error stays usable with `?` for any element type
impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushError")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not store element: {}", self.source)
    }
}

impl<T> std::error::Error for PushError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}
