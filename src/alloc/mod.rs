//! Fallible heap allocation for reference counter carriers.

pub mod allocator;

pub use allocator::{allocate, deallocate, AllocError};

#[cfg(test)]
pub(crate) use allocator::fail_next_allocation;
