//! Concurrency building blocks for resource ownership.
//!
//! Counters here only order the *lifetime* of shared handles. Access to the
//! data behind a handle is serialized separately, through [`sync`].

pub mod atomic;
pub mod cache_padded;
pub mod sync;

pub use cache_padded::CachePadded;
