//! `SharedResource`: reference-counted handle wrapper.
//!
//! Every group of aliases shares one heap-allocated counter carrier. The
//! counter is only ever touched through [`AtomicOps`], so the same algorithm
//! runs over a native atomic, a `crossbeam_utils` `AtomicCell`, or any other
//! carrier implementing [`RefCounter`].
//!
//! # Counter protocol
//! - Adopting a raw handle allocates a carrier holding one.
//! - Cloning increments the source's carrier *before* the clone exists, so the
//!   count never reaches zero while an owner still holds the handle.
//! - Releasing decrements; the single decrement that observes zero frees the
//!   carrier and runs the release capability. Every other releaser just
//!   forgets its handle.

use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ptr::NonNull;
use core::sync::atomic::AtomicUsize;

use num_traits::{Bounded, One, Zero};

use super::{release_contained, Release};
use crate::alloc::{self, AllocError};
use crate::concurrency::atomic::{AtomicOps, RefCounter};

/// Jointly owned handle; the last owner to let go releases it.
///
/// `C` is the counter carrier and `I` the integer it counts in. The defaults
/// use a native `AtomicUsize`.
///
/// The handle's payload is not synchronized: the counter only decides *when*
/// release happens.
///
/// At most `I::max_value() - 1` instances may share one handle; cloning
/// beyond that aborts the process.
pub struct SharedResource<T, R, C = AtomicUsize, I = usize>
where
    T: Copy + PartialEq,
    R: Release<T>,
    C: RefCounter<I>,
    I: Copy + PartialEq + Zero + One + Bounded,
{
    handle: T,
    sentinel: T,
    count: Option<NonNull<C>>,
    releaser: R,
    _count_type: PhantomData<fn() -> I>,
}

// SAFETY: aliases on other threads share the handle and the carrier, in the
// same way `Arc<T>` shares its payload.
unsafe impl<T, R, C, I> Send for SharedResource<T, R, C, I>
where
    T: Copy + PartialEq + Send + Sync,
    R: Release<T> + Send,
    C: RefCounter<I> + Send + Sync,
    I: Copy + PartialEq + Zero + One + Bounded,
{
}

// SAFETY: `&SharedResource` only reads the handle and performs atomic
// operations on the carrier; cloning through it needs the `Send` bounds too.
unsafe impl<T, R, C, I> Sync for SharedResource<T, R, C, I>
where
    T: Copy + PartialEq + Send + Sync,
    R: Release<T> + Send + Sync,
    C: RefCounter<I> + Send + Sync,
    I: Copy + PartialEq + Zero + One + Bounded,
{
}

impl<T, R, C, I> SharedResource<T, R, C, I>
where
    T: Copy + PartialEq,
    R: Release<T>,
    C: RefCounter<I>,
    I: Copy + PartialEq + Zero + One + Bounded,
{
    /// Takes ownership of `handle` with a reference count of one.
    ///
    /// # Errors
    /// If the counter cannot be allocated the handle is released immediately
    /// and `AllocError` is returned, so the resource never leaks.
    pub fn new(handle: T, sentinel: T, releaser: R) -> Result<Self, AllocError> {
        let mut this = Self::invalid(sentinel, releaser);
        this.adopt(handle)?;
        Ok(this)
    }

    /// Creates an instance that owns nothing and has no counter.
    #[inline]
    pub fn invalid(sentinel: T, releaser: R) -> Self {
        Self {
            handle: sentinel,
            sentinel,
            count: None,
            releaser,
            _count_type: PhantomData,
        }
    }

    /// Returns the handle without affecting ownership.
    #[inline]
    pub fn get(&self) -> T {
        self.handle
    }

    /// The value this instance treats as "nothing owned".
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

    /// Number of instances sharing this handle, or zero if none is owned.
    ///
    /// This is a snapshot. Other threads may change the count before the
    /// caller looks at it, so never use it to decide who releases.
    #[inline]
    pub fn ref_count(&self) -> I {
        self.counter().map_or_else(I::zero, <C as AtomicOps<I>>::load)
    }

    /// Returns `true` if `self` and `other` alias the same counter.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.count.is_some() && self.count == other.count
    }

    /// Gives up this instance's share of the handle.
    ///
    /// Only the instance whose decrement brings the count to zero runs the
    /// release capability. Either way `self` is left holding the sentinel.
    /// A panic raised by the capability is caught and logged.
    pub fn release(&mut self) {
        let handle = mem::replace(&mut self.handle, self.sentinel);
        let Some(count) = self.count.take() else {
            return;
        };
        // SAFETY: our share keeps the carrier alive until this decrement.
        let remaining = unsafe { count.as_ref() }.decrement();
        if remaining != I::zero() {
            return;
        }
        // SAFETY: the count reached zero, so no other instance references the
        // carrier any more and exactly one thread gets here.
        unsafe { alloc::deallocate(count) };
        tracing::trace!(handle_type = core::any::type_name::<T>(), "releasing shared resource");
        let releaser = &mut self.releaser;
        release_contained("shared", || releaser.release(handle));
    }

    /// Releases this instance's share, then adopts `handle` with a fresh count.
    ///
    /// # Errors
    /// See [`new`](Self::new): on allocation failure `handle` is released and
    /// `self` is left holding the sentinel.
    pub fn reset(&mut self, handle: T) -> Result<(), AllocError> {
        self.release();
        self.adopt(handle)
    }

    /// Exchanges the contents of two instances. Counts are unchanged.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    #[inline]
    fn counter(&self) -> Option<&C> {
        // SAFETY: while `self` holds a share the carrier stays allocated.
        self.count.map(|c| unsafe { &*c.as_ptr() })
    }

    /// Must only be called while `self` owns nothing.
    fn adopt(&mut self, handle: T) -> Result<(), AllocError> {
        debug_assert!(self.count.is_none());
        self.handle = handle;
        if !self.is_valid() {
            return Ok(());
        }
        match alloc::allocate(C::with_value(I::one())) {
            Ok(count) => {
                self.count = Some(count);
                Ok(())
            }
            Err(err) => {
                tracing::error!(
                    handle_type = core::any::type_name::<T>(),
                    "reference counter allocation failed; releasing handle"
                );
                self.handle = self.sentinel;
                let releaser = &mut self.releaser;
                release_contained("shared", || releaser.release(handle));
                Err(err)
            }
        }
    }
}

impl<T, R, C, I> Clone for SharedResource<T, R, C, I>
where
    T: Copy + PartialEq,
    R: Release<T> + Clone,
    C: RefCounter<I>,
    I: Copy + PartialEq + Zero + One + Bounded,
{
    /// Takes a new share before the clone exists.
    ///
    /// Aborts the process if the counter would reach `I::max_value()`: a
    /// wrapped count would release the handle under live owners.
    fn clone(&self) -> Self {
        if let Some(count) = self.counter() {
            if count.increment() == I::max_value() {
                tracing::error!(
                    counter_type = core::any::type_name::<I>(),
                    "reference count overflow; aborting"
                );
                std::process::abort();
            }
        }
        Self {
            handle: self.handle,
            sentinel: self.sentinel,
            count: self.count,
            releaser: self.releaser.clone(),
            _count_type: PhantomData,
        }
    }

    /// Copy-assignment. Assigning an alias of the same counter is a no-op.
    fn clone_from(&mut self, source: &Self) {
        if self.ptr_eq(source) {
            return;
        }
        // The new share is taken before the old one is dropped.
        *self = source.clone();
    }
}

impl<T, R, C, I> Drop for SharedResource<T, R, C, I>
where
    T: Copy + PartialEq,
    R: Release<T>,
    C: RefCounter<I>,
    I: Copy + PartialEq + Zero + One + Bounded,
{
    fn drop(&mut self) {
        self.release();
    }
}

impl<T, R, C, I> fmt::Debug for SharedResource<T, R, C, I>
where
    T: Copy + PartialEq + fmt::Debug,
    R: Release<T>,
    C: RefCounter<I>,
    I: Copy + PartialEq + Zero + One + Bounded + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedResource")
            .field("handle", &self.handle)
            .field("ref_count", &self.ref_count())
            .finish()
    }
}
