//! `LockBox`: owner of one lock primitive.

use core::fmt;

use super::ScopedLock;

/// Operation set for a lock primitive.
///
/// `Primitive::default()` only provides storage; the box calls `init` on it at
/// its final heap address before first use, so primitives that must not move
/// once initialized (pthread mutexes, critical sections) are supported.
///
/// `acquire` blocks until the lock is held. `release` is only ever called by
/// the box after a matching `acquire` on the same thread.
pub trait LockOps {
    /// Storage for the primitive.
    type Primitive: Default;

    /// Brings the primitive into its usable, unlocked state.
    fn init(&self, lock: &mut Self::Primitive);

    /// Tears the primitive down. Called once, after the last `release`.
    fn deinit(&self, lock: &mut Self::Primitive);

    /// Blocks until the lock is held by the calling thread.
    fn acquire(&self, lock: &Self::Primitive);

    /// Releases a lock held by the calling thread.
    fn release(&self, lock: &Self::Primitive);
}

/// Lock operations whose `acquire` excludes every other holder.
///
/// [`Locked`](super::Locked) hands out `&mut V` through its guard, so it is
/// only available for primitives carrying this marker.
///
/// # Safety
/// While one `acquire` has not been matched by a `release`, no other
/// `acquire` on the same primitive may return, whether it comes from
/// another thread or from the holding thread itself. Reentrant primitives
/// (Win32 critical sections and kernel mutexes) must not implement it. A
/// primitive may satisfy the rule by blocking or by panicking.
pub unsafe trait ExclusiveLock: LockOps {}

/// A lock primitive together with the operations that drive it.
///
/// Lifecycle: initialized in [`new`](Self::new), destroyed on drop. Dropping a
/// box that is still locked is a caller error whose outcome depends on the
/// primitive. The box does not count acquisitions.
pub struct LockBox<L: LockOps> {
    ops: L,
    primitive: Box<L::Primitive>,
}

impl<L: LockOps> LockBox<L> {
    /// Allocates and initializes a primitive.
    pub fn new(ops: L) -> Self {
        let mut primitive = Box::<L::Primitive>::default();
        ops.init(&mut primitive);
        tracing::debug!(
            primitive = core::any::type_name::<L::Primitive>(),
            "lock box initialized"
        );
        Self { ops, primitive }
    }

    /// Acquires the lock for the lifetime of the returned guard.
    #[inline]
    pub fn lock(&self) -> ScopedLock<'_, L> {
        ScopedLock::new(self)
    }

    /// Acquires the lock without a guard.
    ///
    /// Pair with [`unlock_raw`](Self::unlock_raw) on the same thread.
    #[inline]
    pub fn lock_raw(&self) {
        self.ops.acquire(&self.primitive);
    }

    /// Releases a lock taken with [`lock_raw`](Self::lock_raw).
    ///
    /// # Safety
    /// The calling thread must hold the lock through a previous `lock_raw`
    /// that has not been released yet. Primitives such as pthread mutexes
    /// have undefined behavior otherwise.
    #[inline]
    pub unsafe fn unlock_raw(&self) {
        self.ops.release(&self.primitive);
    }

    /// The operation set.
    #[inline]
    pub fn ops(&self) -> &L {
        &self.ops
    }

    /// The initialized primitive, for platform calls the operation set does
    /// not cover (waiting on a kernel mutex handle together with other
    /// objects, for instance).
    #[inline]
    pub fn primitive(&self) -> &L::Primitive {
        &self.primitive
    }
}

impl<L: LockOps + Default> Default for LockBox<L> {
    fn default() -> Self {
        Self::new(L::default())
    }
}

impl<L: LockOps> Drop for LockBox<L> {
    fn drop(&mut self) {
        self.ops.deinit(&mut self.primitive);
        tracing::debug!(
            primitive = core::any::type_name::<L::Primitive>(),
            "lock box destroyed"
        );
    }
}

impl<L: LockOps> fmt::Debug for LockBox<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockBox")
            .field("primitive", &core::any::type_name::<L::Primitive>())
            .finish_non_exhaustive()
    }
}
