//! Test-and-test-and-set spin lock.

use core::sync::atomic::{AtomicBool, Ordering};

use crossbeam_utils::Backoff;

use super::{ExclusiveLock, LockOps};

/// Spin lock over an `AtomicBool`.
///
/// Waiters spin on a plain load and back off with `crossbeam_utils::Backoff`
/// (exponential spinning, then yielding) before retrying the exchange.
/// Suitable for very short critical sections. Not reentrant.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpinLockOps;

impl LockOps for SpinLockOps {
    type Primitive = AtomicBool;

    #[inline]
    fn init(&self, lock: &mut AtomicBool) {
        *lock.get_mut() = false;
    }

    fn deinit(&self, lock: &mut AtomicBool) {
        if *lock.get_mut() {
            tracing::warn!("spin lock destroyed while held");
        }
    }

    #[inline]
    fn acquire(&self, lock: &AtomicBool) {
        let backoff = Backoff::new();
        while lock
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            while lock.load(Ordering::Relaxed) {
                backoff.snooze();
            }
        }
    }

    #[inline]
    fn release(&self, lock: &AtomicBool) {
        lock.store(false, Ordering::Release);
    }
}

// SAFETY: the flag is set by exactly one successful exchange and cleared only
// by `release`; a second acquire, even from the holder, spins until then.
unsafe impl ExclusiveLock for SpinLockOps {}
