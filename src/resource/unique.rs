//! `UniqueResource`: single-owner handle wrapper.

use core::fmt;
use core::mem::{self, ManuallyDrop};
use core::ptr;

use super::{release_contained, Release};

/// Sole owner of one handle.
///
/// The release capability fires exactly once for every valid handle the
/// wrapper adopts: on [`release`](Self::release), on [`reset`](Self::reset),
/// on [`assign_from`](Self::assign_from), or when the wrapper is dropped.
/// Ownership moves with the value; [`take`](Self::take) moves it out of a
/// borrowed wrapper and leaves the sentinel behind.
pub struct UniqueResource<T, R>
where
    T: Copy + PartialEq,
    R: Release<T>,
{
    handle: T,
    sentinel: T,
    releaser: R,
}

impl<T, R> UniqueResource<T, R>
where
    T: Copy + PartialEq,
    R: Release<T>,
{
    /// Takes ownership of `handle`. Passing the sentinel creates an empty wrapper.
    #[inline]
    pub fn new(handle: T, sentinel: T, releaser: R) -> Self {
        Self {
            handle,
            sentinel,
            releaser,
        }
    }

    /// Creates a wrapper that owns nothing.
    #[inline]
    pub fn invalid(sentinel: T, releaser: R) -> Self {
        Self::new(sentinel, sentinel, releaser)
    }

    /// Returns the handle without giving up ownership.
    #[inline]
    pub fn get(&self) -> T {
        self.handle
    }

    /// The value this wrapper treats as "nothing owned".
    #[inline]
    pub fn sentinel(&self) -> T {
        self.sentinel
    }

    /// Returns `true` if a live handle is owned.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.releaser.is_valid(&self.handle, &self.sentinel)
    }

    /// The release capability.
    #[inline]
    pub fn releaser(&self) -> &R {
        &self.releaser
    }

    /// Releases the owned handle, if any, and leaves the sentinel behind.
    ///
    /// Calling this on an empty wrapper does nothing. A panic raised by the
    /// capability is caught and logged, never propagated.
    pub fn release(&mut self) {
        if !self.is_valid() {
            return;
        }
        // Forget the handle before tearing it down so a panicking capability
        // cannot lead to a second release.
        let handle = mem::replace(&mut self.handle, self.sentinel);
        tracing::trace!(handle_type = core::any::type_name::<T>(), "releasing unique resource");
        let releaser = &mut self.releaser;
        release_contained("unique", || releaser.release(handle));
    }

    /// Releases the current handle, then adopts `handle` (which may be the sentinel).
    pub fn reset(&mut self, handle: T) {
        self.release();
        self.handle = handle;
    }

    /// Moves ownership into a new wrapper; `self` is left holding the sentinel.
    #[must_use]
    pub fn take(&mut self) -> Self
    where
        R: Clone,
    {
        let handle = mem::replace(&mut self.handle, self.sentinel);
        Self::new(handle, self.sentinel, self.releaser.clone())
    }

    /// Move-assignment: releases what `self` owns, then adopts the handle of
    /// `src`, which is left holding its sentinel.
    ///
    /// If both wrappers hold the same handle value the destination keeps it and
    /// no release happens.
    pub fn assign_from(&mut self, src: &mut Self) {
        let incoming = mem::replace(&mut src.handle, src.sentinel);
        if incoming != self.handle {
            self.release();
        }
        self.handle = incoming;
    }

    /// Exchanges the contents of two wrappers. Nothing is released.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Gives up ownership without releasing and returns the handle.
    pub fn into_raw(self) -> T {
        let mut this = ManuallyDrop::new(self);
        let handle = this.handle;
        // SAFETY: `this` is never used again and its destructor never runs, so
        // the releaser is dropped exactly once here.
        unsafe { ptr::drop_in_place(&mut this.releaser) };
        handle
    }
}

impl<T, R> Drop for UniqueResource<T, R>
where
    T: Copy + PartialEq,
    R: Release<T>,
{
    fn drop(&mut self) {
        self.release();
    }
}

impl<T, R> fmt::Debug for UniqueResource<T, R>
where
    T: Copy + PartialEq + fmt::Debug,
    R: Release<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniqueResource")
            .field("handle", &self.handle)
            .field("valid", &self.is_valid())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Log(Rc<RefCell<Vec<i32>>>);

    impl Log {
        fn released(&self) -> Vec<i32> {
            self.0.borrow().clone()
        }
    }

    impl Release<i32> for Log {
        fn release(&mut self, handle: i32) {
            self.0.borrow_mut().push(handle);
        }
    }

    fn unique(handle: i32, log: &Log) -> UniqueResource<i32, Log> {
        UniqueResource::new(handle, -1, log.clone())
    }

    #[test]
    fn drop_releases_once() {
        let log = Log::default();
        {
            let r = unique(5, &log);
            assert!(r.is_valid());
            assert_eq!(r.get(), 5);
        }
        assert_eq!(log.released(), [5]);
    }

    #[test]
    fn sentinel_wrapper_never_releases() {
        let log = Log::default();
        {
            let mut r = UniqueResource::invalid(-1, log.clone());
            assert!(!r.is_valid());
            r.release();
            assert!(!r.is_valid());
        }
        assert!(log.released().is_empty());
    }

    #[test]
    fn release_is_idempotent() {
        let log = Log::default();
        let mut r = unique(7, &log);
        r.release();
        r.release();
        assert!(!r.is_valid());
        assert_eq!(r.get(), -1);
        drop(r);
        assert_eq!(log.released(), [7]);
    }

    #[test]
    fn reset_releases_previous_handle() {
        let log = Log::default();
        let mut r = unique(1, &log);
        r.reset(2);
        assert_eq!(log.released(), [1]);
        r.reset(-1);
        assert_eq!(log.released(), [1, 2]);
        assert!(!r.is_valid());
    }

    #[test]
    fn take_leaves_sentinel() {
        let log = Log::default();
        let mut a = unique(9, &log);
        let b = a.take();
        assert!(!a.is_valid());
        assert_eq!(b.get(), 9);
        drop(a);
        assert!(log.released().is_empty());
        drop(b);
        assert_eq!(log.released(), [9]);
    }

    #[test]
    fn assign_from_releases_destination_first() {
        let log = Log::default();
        let mut dst = unique(1, &log);
        let mut src = unique(2, &log);
        dst.assign_from(&mut src);
        assert_eq!(log.released(), [1]);
        assert_eq!(dst.get(), 2);
        assert!(!src.is_valid());
    }

    #[test]
    fn swap_does_not_release() {
        let log = Log::default();
        let mut a = unique(1, &log);
        let mut b = unique(2, &log);
        a.swap(&mut b);
        assert_eq!((a.get(), b.get()), (2, 1));
        assert!(log.released().is_empty());
    }

    #[test]
    fn into_raw_skips_release() {
        let log = Log::default();
        let r = unique(4, &log);
        assert_eq!(r.into_raw(), 4);
        assert!(log.released().is_empty());
    }

    #[test]
    fn custom_validity_predicate() {
        // Any negative descriptor is invalid, not just the sentinel.
        #[derive(Clone, Default)]
        struct NonNegative(Log);
        impl Release<i32> for NonNegative {
            fn release(&mut self, handle: i32) {
                self.0.release(handle);
            }
            fn is_valid(&self, handle: &i32, _sentinel: &i32) -> bool {
                *handle >= 0
            }
        }

        let log = Log::default();
        {
            let r = UniqueResource::new(-7, -1, NonNegative(log.clone()));
            assert!(!r.is_valid());
        }
        assert!(log.released().is_empty());
    }

    #[test]
    fn panicking_release_does_not_escape_drop() {
        struct Boom;
        impl Release<i32> for Boom {
            fn release(&mut self, _handle: i32) {
                panic!("close failed");
            }
        }

        let r = UniqueResource::new(3, -1, Boom);
        drop(r);
    }

    #[test]
    fn panicking_release_does_not_escape_explicit_calls() {
        #[derive(Clone, Default)]
        struct Flaky(Log);
        impl Release<i32> for Flaky {
            fn release(&mut self, handle: i32) {
                self.0.release(handle);
                if handle == 1 {
                    panic!("close failed");
                }
            }
        }

        let log = Log::default();
        let mut r = UniqueResource::new(1, -1, Flaky(log.clone()));
        r.release();
        assert!(!r.is_valid());

        r.reset(1);
        r.reset(2);
        assert_eq!(r.get(), 2);

        let mut src = UniqueResource::new(3, -1, Flaky(log.clone()));
        r.reset(1);
        r.assign_from(&mut src);
        assert_eq!(r.get(), 3);
        drop(r);
        assert_eq!(log.released(), [1, 1, 2, 1, 3]);
    }
}
