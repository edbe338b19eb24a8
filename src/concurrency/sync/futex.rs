//! Three-state futex mutex.

use core::sync::atomic::{AtomicU32, Ordering};

use super::{wait_on_u32, wake_one_u32, ExclusiveLock, LockOps};

const UNLOCKED: u32 = 0;
const LOCKED: u32 = 1;
const CONTENDED: u32 = 2;

const SPIN_LIMIT: u32 = 40;

/// A blocking mutex over a single `AtomicU32`.
///
/// # States
/// - 0: Unlocked
/// - 1: Locked, no waiters (likely)
/// - 2: Locked, waiters exist (contended)
///
/// Uncontended lock/unlock are one CAS / one swap. Under contention waiters
/// spin briefly, then park on the word (futex on Linux, `WaitOnAddress` on
/// Windows, yield loop elsewhere). Not reentrant.
#[derive(Debug, Clone, Copy, Default)]
pub struct FutexLockOps;

impl FutexLockOps {
    #[cold]
    fn acquire_slow(state: &AtomicU32) {
        let mut spin_count = 0;
        while spin_count < SPIN_LIMIT {
            if state.load(Ordering::Relaxed) == UNLOCKED
                && state
                    .compare_exchange(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
                    .is_ok()
            {
                return;
            }
            spin_count += 1;
            std::hint::spin_loop();
        }

        // From here on we may have waiters behind us, so always leave the
        // word at CONTENDED; the unlocker then knows to wake someone.
        while state.swap(CONTENDED, Ordering::Acquire) != UNLOCKED {
            wait_on_u32(state, CONTENDED);
        }
    }
}

impl LockOps for FutexLockOps {
    type Primitive = AtomicU32;

    #[inline]
    fn init(&self, lock: &mut AtomicU32) {
        *lock.get_mut() = UNLOCKED;
    }

    fn deinit(&self, lock: &mut AtomicU32) {
        if *lock.get_mut() != UNLOCKED {
            tracing::warn!("futex lock destroyed while held");
        }
    }

    #[inline]
    fn acquire(&self, lock: &AtomicU32) {
        if lock
            .compare_exchange(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            Self::acquire_slow(lock);
        }
    }

    #[inline]
    fn release(&self, lock: &AtomicU32) {
        if lock.swap(UNLOCKED, Ordering::Release) == CONTENDED {
            wake_one_u32(lock);
        }
    }
}

// SAFETY: only the CAS/swap that moves the word away from UNLOCKED acquires;
// every other caller, the holder included, waits for `release`.
unsafe impl ExclusiveLock for FutexLockOps {}
