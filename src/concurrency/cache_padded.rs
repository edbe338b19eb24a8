//! Cache-line aligned carrier wrapper.

use core::fmt;
use std::ops::{Deref, DerefMut};

/// Aligns a value to its own cache line so that hot reference counters do not
/// share a line with neighbouring data.
///
/// 128 bytes covers both 64-byte lines (x86) and the 128-byte pairs fetched by
/// Apple Silicon. Implements [`AtomicOps`](super::atomic::AtomicOps) whenever
/// the wrapped carrier does.
#[repr(align(128))]
#[derive(Default)]
pub struct CachePadded<T> {
    value: T,
}

impl<T> CachePadded<T> {
    /// Wraps `value`.
    pub const fn new(value: T) -> Self {
        Self { value }
    }

    /// Unwraps the inner value.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for CachePadded<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for CachePadded<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for CachePadded<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachePadded").field("value", &self.value).finish()
    }
}
