//! POSIX mutex lock.

use core::cell::UnsafeCell;
use std::io;

use super::{ExclusiveLock, LockOps};

/// Storage for a `pthread_mutex_t`.
///
/// Lives inside the [`LockBox`](super::LockBox) heap allocation so it never
/// moves after `pthread_mutex_init`.
pub struct PthreadMutex(UnsafeCell<libc::pthread_mutex_t>);

// SAFETY: pthread mutexes are designed to be shared between threads; all
// access goes through the pthread API.
unsafe impl Send for PthreadMutex {}
unsafe impl Sync for PthreadMutex {}

impl Default for PthreadMutex {
    fn default() -> Self {
        Self(UnsafeCell::new(libc::PTHREAD_MUTEX_INITIALIZER))
    }
}

/// Drives an error-checking pthread mutex.
///
/// Relocking from the holding thread fails with `EDEADLK` instead of
/// deadlocking, and `acquire` turns that into a panic.
#[derive(Debug, Clone, Copy, Default)]
pub struct PthreadMutexOps;

impl LockOps for PthreadMutexOps {
    type Primitive = PthreadMutex;

    fn init(&self, lock: &mut PthreadMutex) {
        let mut attr = core::mem::MaybeUninit::<libc::pthread_mutexattr_t>::uninit();
        // SAFETY: `attr` is initialized by `pthread_mutexattr_init` before use
        // and destroyed once the mutex has copied it; storage is not yet in use.
        let rc = unsafe {
            let mut rc = libc::pthread_mutexattr_init(attr.as_mut_ptr());
            if rc == 0 {
                rc = libc::pthread_mutexattr_settype(attr.as_mut_ptr(), libc::PTHREAD_MUTEX_ERRORCHECK);
                if rc == 0 {
                    rc = libc::pthread_mutex_init(lock.0.get(), attr.as_ptr());
                }
                libc::pthread_mutexattr_destroy(attr.as_mut_ptr());
            }
            rc
        };
        if rc != 0 {
            let err = io::Error::from_raw_os_error(rc);
            tracing::error!(error = %err, "pthread_mutex_init failed");
            // The static initializer left in place is not error-checking.
            panic!("pthread_mutex_init failed: {err}");
        }
    }

    fn deinit(&self, lock: &mut PthreadMutex) {
        // SAFETY: initialized in `init`; the box guarantees no further use.
        let rc = unsafe { libc::pthread_mutex_destroy(lock.0.get()) };
        if rc != 0 {
            tracing::warn!(error = %io::Error::from_raw_os_error(rc), "pthread_mutex_destroy failed");
        }
    }

    fn acquire(&self, lock: &PthreadMutex) {
        // SAFETY: initialized in `init` and pinned inside the box.
        let rc = unsafe { libc::pthread_mutex_lock(lock.0.get()) };
        if rc != 0 {
            let err = io::Error::from_raw_os_error(rc);
            tracing::error!(error = %err, "pthread_mutex_lock failed");
            // Returning would let the caller enter the critical section unlocked.
            panic!("pthread_mutex_lock failed: {err}");
        }
    }

    fn release(&self, lock: &PthreadMutex) {
        // SAFETY: the box only releases after a matching acquire.
        let rc = unsafe { libc::pthread_mutex_unlock(lock.0.get()) };
        if rc != 0 {
            tracing::warn!(error = %io::Error::from_raw_os_error(rc), "pthread_mutex_unlock failed");
        }
    }
}

// SAFETY: the mutex is error-checking, so a relock by the holder returns
// EDEADLK and `acquire` panics instead of returning; other threads block.
unsafe impl ExclusiveLock for PthreadMutexOps {}
