//! # `resmgr` - Scoped Resource Ownership
//!
//! RAII wrappers for handles that live outside Rust's ownership model (file
//! descriptors, OS handles, C heap blocks, anything identified by a plain
//! `Copy` value), plus the small concurrency toolkit they need.
//!
//! ## Key Features
//!
//! - **Unique ownership**: [`UniqueResource`] releases its handle exactly once,
//!   on drop or explicit release, and moves ownership instead of copying it.
//! - **Shared ownership**: [`SharedResource`] keeps a heap-allocated atomic
//!   counter; the owner whose decrement observes zero performs the release.
//! - **Pluggable counters**: any [`RefCounter`] carrier (std atomics,
//!   `crossbeam_utils::atomic::AtomicCell`, [`CachePadded`] wrappers).
//! - **Scoped locking**: [`LockBox`] and [`ScopedLock`] bracket an
//!   acquire/release pair over spin, futex, pthread or Win32 primitives;
//!   [`Locked`] guards a value behind an [`ExclusiveLock`].
//!
//! ## Sentinels
//!
//! Every wrapper carries one *sentinel* handle value meaning "nothing owned",
//! supplied when it is constructed. Releasing a wrapper writes the sentinel
//! back, which is what makes release idempotent. Validity defaults to
//! `handle != sentinel` and can be overridden per capability through
//! [`Release::is_valid`].
//!
//! ## Example
//!
//! ```rust
//! use resmgr::{ReleaseFn, SharedResource};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! static RELEASED: AtomicUsize = AtomicUsize::new(0);
//!
//! let first: SharedResource<u32, _> = SharedResource::new(
//!     7,
//!     0,
//!     ReleaseFn(|_h: u32| {
//!         RELEASED.fetch_add(1, Ordering::SeqCst);
//!     }),
//! )?;
//! let second = first.clone();
//! assert_eq!(first.ref_count(), 2);
//!
//! drop(first);
//! assert_eq!(RELEASED.load(Ordering::SeqCst), 0);
//! drop(second);
//! assert_eq!(RELEASED.load(Ordering::SeqCst), 1);
//! # Ok::<(), resmgr::AllocError>(())
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod alloc;
pub mod concurrency;
pub mod resource;

pub use alloc::AllocError;
pub use concurrency::atomic::{AtomicOps, RefCounter};
pub use concurrency::sync::{ExclusiveLock, LockBox, LockOps, Locked, ScopedLock};
pub use concurrency::CachePadded;
pub use resource::{Release, ReleaseFn, SharedResource, UniqueResource};

// Compile-time assertions for memory layout
const _: () = {
    use core::mem;

    // A unique wrapper over a closure-free capability is two handles wide.
    assert!(
        mem::size_of::<UniqueResource<resource::os::HeapBlock, resource::os::FreeHeap>>()
            == 2 * mem::size_of::<usize>()
    );

    // Counter carriers own whole cache lines.
    assert!(mem::align_of::<CachePadded<core::sync::atomic::AtomicUsize>>() == 128);
};
