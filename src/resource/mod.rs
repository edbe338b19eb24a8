//! Ownership wrappers for externally managed handles.
//!
//! A *handle* is an opaque `Copy` value (a descriptor, an address, a platform
//! handle) whose teardown happens through a caller-supplied [`Release`]
//! capability. One designated *sentinel* value means "nothing owned"; it is
//! supplied at construction and compared through [`Release::is_valid`].
//!
//! - [`UniqueResource`]: exactly one owner, ownership moves.
//! - [`SharedResource`]: many owners, an atomic counter decides who releases.
//!
//! Neither wrapper synchronizes access to whatever the handle refers to. A
//! `SharedResource` makes the *existence* of a resource safe to share; guard
//! its *contents* with a [`LockBox`](crate::concurrency::sync::LockBox).

pub mod os;
pub mod shared;
pub mod unique;

pub use shared::SharedResource;
pub use unique::UniqueResource;

use std::panic::{self, AssertUnwindSafe};

/// Teardown capability for handles of type `T`.
///
/// `release` is called at most once per acquired handle and never with a
/// handle that `is_valid` rejects. It has no way to report failure to the
/// wrapper: a capability whose teardown can fail reports through its own
/// channel (logging, a status slot it owns) and returns normally. A panic
/// raised by `release` is caught by the wrapper and logged at `error`.
pub trait Release<T: PartialEq> {
    /// Tears down `handle`.
    fn release(&mut self, handle: T);

    /// Returns `true` if `handle` refers to a live resource.
    ///
    /// The default treats everything except the sentinel as live.
    #[inline]
    fn is_valid(&self, handle: &T, sentinel: &T) -> bool {
        handle != sentinel
    }
}

/// Adapts a closure into a [`Release`] capability.
///
/// ```
/// use resmgr::resource::{ReleaseFn, UniqueResource};
///
/// let mut closed = Vec::new();
/// {
///     let _fd = UniqueResource::new(3, -1, ReleaseFn(|fd: i32| closed.push(fd)));
/// }
/// assert_eq!(closed, [3]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseFn<F>(pub F);

impl<T: PartialEq, F: FnMut(T)> Release<T> for ReleaseFn<F> {
    #[inline]
    fn release(&mut self, handle: T) {
        (self.0)(handle);
    }
}

/// Runs a release capability without letting a panic escape.
///
/// Used by every teardown path (explicit release, reset, assignment, drop),
/// so ownership bookkeeping always finishes and scope exit stays
/// unconditional. The panic is logged and otherwise discarded.
pub(crate) fn release_contained<F: FnOnce()>(kind: &'static str, f: F) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
        let reason = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("non-string panic payload");
        tracing::error!(kind, reason, "release capability panicked");
    }
}
