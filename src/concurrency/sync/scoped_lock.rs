//! Scope-bound lock guards.

use core::cell::UnsafeCell;
use core::fmt;
use core::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use super::{ExclusiveLock, LockBox, LockOps};

/// Holds a [`LockBox`] locked until dropped.
///
/// The release runs exactly once on every exit path, including unwinding.
/// The guard is neither `Clone` nor `Send`: the unlock must happen on the
/// thread that locked.
#[must_use = "if unused the lock is released immediately"]
pub struct ScopedLock<'a, L: LockOps> {
    lock: &'a LockBox<L>,
    _not_send: PhantomData<*const ()>,
}

impl<'a, L: LockOps> ScopedLock<'a, L> {
    /// Blocks until `lock` is acquired.
    #[inline]
    pub fn new(lock: &'a LockBox<L>) -> Self {
        lock.lock_raw();
        Self {
            lock,
            _not_send: PhantomData,
        }
    }
}

impl<L: LockOps> Drop for ScopedLock<'_, L> {
    #[inline]
    fn drop(&mut self) {
        // SAFETY: acquired in `new` on this thread (the guard is !Send).
        unsafe { self.lock.unlock_raw() };
    }
}

impl<L: LockOps> fmt::Debug for ScopedLock<'_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedLock").finish_non_exhaustive()
    }
}

/// A value that can only be reached through a held [`LockBox`].
///
/// This is the explicit composition for payloads shared across threads, for
/// instance the memory behind a `SharedResource`. The guard hands out
/// `&mut V`, so only [`ExclusiveLock`] primitives qualify; a lock that lets
/// a second holder in is rejected at compile time:
///
/// ```compile_fail
/// use resmgr::{LockOps, Locked};
///
/// struct NoLock;
///
/// impl LockOps for NoLock {
///     type Primitive = ();
///     fn init(&self, _: &mut ()) {}
///     fn deinit(&self, _: &mut ()) {}
///     fn acquire(&self, _: &()) {}
///     fn release(&self, _: &()) {}
/// }
///
/// let value = Locked::new(NoLock, 0_u32);
/// ```
pub struct Locked<L: ExclusiveLock, V> {
    lock: LockBox<L>,
    value: UnsafeCell<V>,
}

// SAFETY: `value` is only reachable through a guard, i.e. while the lock is
// held, and `ExclusiveLock` admits one holder at a time.
unsafe impl<L, V> Sync for Locked<L, V>
where
    L: ExclusiveLock,
    LockBox<L>: Sync,
    V: Send,
{
}

impl<L: ExclusiveLock, V> Locked<L, V> {
    /// Wraps `value` behind a new lock box driven by `ops`.
    pub fn new(ops: L, value: V) -> Self {
        Self {
            lock: LockBox::new(ops),
            value: UnsafeCell::new(value),
        }
    }

    /// Locks and returns a guard dereferencing to the value.
    pub fn lock(&self) -> LockedGuard<'_, L, V> {
        LockedGuard {
            _scope: self.lock.lock(),
            value: &self.value,
        }
    }

    /// Mutable access without locking; `&mut self` already excludes others.
    pub fn get_mut(&mut self) -> &mut V {
        self.value.get_mut()
    }

    /// Consumes the wrapper and returns the value.
    pub fn into_inner(self) -> V {
        self.value.into_inner()
    }
}

impl<L: ExclusiveLock + Default, V: Default> Default for Locked<L, V> {
    fn default() -> Self {
        Self::new(L::default(), V::default())
    }
}

/// Guard returned by [`Locked::lock`].
#[must_use = "if unused the lock is released immediately"]
pub struct LockedGuard<'a, L: LockOps, V> {
    _scope: ScopedLock<'a, L>,
    value: &'a UnsafeCell<V>,
}

impl<L: LockOps, V> Deref for LockedGuard<'_, L, V> {
    type Target = V;
    fn deref(&self) -> &V {
        // SAFETY: the lock is held for the guard's lifetime.
        unsafe { &*self.value.get() }
    }
}

impl<L: LockOps, V> DerefMut for LockedGuard<'_, L, V> {
    fn deref_mut(&mut self) -> &mut V {
        // SAFETY: the lock is held for the guard's lifetime.
        unsafe { &mut *self.value.get() }
    }
}
