//! Scoped locking over pluggable lock primitives.
//!
//! [`LockBox`] owns a primitive and runs a [`LockOps`] capability over it:
//! `init` once at construction, `deinit` once at drop, and any number of
//! `acquire`/`release` pairs in between. [`ScopedLock`] brackets one
//! acquire/release pair to a lexical scope.
//!
//! Reentrancy is whatever the primitive provides. Nesting two scoped locks on
//! the same box deadlocks with the spin and futex locks and panics with the
//! pthread lock.
//!
//! Provided primitives:
//! - [`SpinLockOps`]: test-and-test-and-set flag with `crossbeam_utils` backoff.
//! - [`FutexLockOps`]: three-state mutex parked on a futex (Linux) or
//!   `WaitOnAddress` (Windows).
//! - `PthreadMutexOps` (unix, error-checking).
//! - `CriticalSectionOps` and `WinMutexOps` (Windows, both reentrant).
//!
//! [`Locked`] hands out `&mut` access and therefore only accepts primitives
//! marked [`ExclusiveLock`]: spin, futex and pthread.

pub mod futex;
pub mod lock_box;
pub mod scoped_lock;
pub mod spin;

#[cfg(unix)]
pub mod pthread;

#[cfg(windows)]
pub mod critical_section;

#[cfg(windows)]
pub mod win_mutex;


pub use futex::FutexLockOps;
pub use lock_box::{ExclusiveLock, LockBox, LockOps};
pub use scoped_lock::{Locked, LockedGuard, ScopedLock};
pub use spin::SpinLockOps;

#[cfg(unix)]
pub use pthread::{PthreadMutex, PthreadMutexOps};

#[cfg(windows)]
pub use critical_section::{CriticalSection, CriticalSectionOps};

#[cfg(windows)]
pub use win_mutex::{WinMutex, WinMutexOps};

use core::sync::atomic::AtomicU32;
#[cfg(not(any(windows, target_os = "linux")))]
use core::sync::atomic::Ordering;

#[cfg(windows)]
use windows_sys::Win32::System::Threading::{WaitOnAddress, WakeByAddressAll, WakeByAddressSingle};

#[cfg(target_os = "linux")]
use libc::{SYS_futex, FUTEX_PRIVATE_FLAG, FUTEX_WAIT, FUTEX_WAKE};

#[cfg(target_os = "linux")]
#[inline]
fn futex_wait(addr: *const u32, expected: u32) {
    // The kernel re-checks `*addr == expected` atomically, so a wake between
    // the caller's check and this call is not lost.
    unsafe {
        libc::syscall(
            SYS_futex,
            addr,
            FUTEX_WAIT | FUTEX_PRIVATE_FLAG,
            expected,
            core::ptr::null::<libc::timespec>(),
        );
    }
}

#[cfg(target_os = "linux")]
#[inline]
fn futex_wake(addr: *const u32, count: i32) {
    unsafe {
        libc::syscall(SYS_futex, addr, FUTEX_WAKE | FUTEX_PRIVATE_FLAG, count);
    }
}

/// Wakes all threads waiting on the given address.
#[inline]
pub fn wake_all_u32(addr: &AtomicU32) {
    #[cfg(windows)]
    unsafe {
        WakeByAddressAll(addr as *const _ as *const _);
    }
    #[cfg(target_os = "linux")]
    futex_wake(addr.as_ptr(), i32::MAX);
    #[cfg(not(any(windows, target_os = "linux")))]
    let _ = addr;
}

/// Wakes one thread waiting on the given address.
#[inline]
pub fn wake_one_u32(addr: &AtomicU32) {
    #[cfg(windows)]
    unsafe {
        WakeByAddressSingle(addr as *const _ as *const _);
    }
    #[cfg(target_os = "linux")]
    futex_wake(addr.as_ptr(), 1);
    #[cfg(not(any(windows, target_os = "linux")))]
    let _ = addr;
}

/// Blocks while `*addr == expected`. May return spuriously.
#[inline]
pub fn wait_on_u32(addr: &AtomicU32, expected: u32) {
    #[cfg(windows)]
    unsafe {
        let expected_ptr = &expected as *const u32 as *const _;
        let addr_ptr = addr as *const _ as *const _;
        WaitOnAddress(addr_ptr, expected_ptr, core::mem::size_of::<u32>(), u32::MAX);
    }
    #[cfg(target_os = "linux")]
    futex_wait(addr.as_ptr(), expected);
    #[cfg(not(any(windows, target_os = "linux")))]
    while addr.load(Ordering::Acquire) == expected {
        std::thread::yield_now();
    }
}
