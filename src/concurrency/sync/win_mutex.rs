//! Win32 kernel mutex lock.

use windows_sys::Win32::Foundation::{CloseHandle, HANDLE, WAIT_ABANDONED, WAIT_OBJECT_0};
use windows_sys::Win32::System::Threading::{CreateMutexW, ReleaseMutex, WaitForSingleObject, INFINITE};

use super::LockOps;

/// Owns the `HANDLE` of an unnamed kernel mutex. Zero until `init`.
#[derive(Debug, Default)]
pub struct WinMutex(HANDLE);

impl WinMutex {
    /// The underlying handle, zero if creation failed.
    #[inline]
    pub fn handle(&self) -> HANDLE {
        self.0
    }
}

/// Drives a kernel mutex created with `CreateMutexW`.
///
/// Kernel mutexes are reentrant for the owning thread and, unlike critical
/// sections, can be waited on alongside other kernel objects. Not an
/// [`ExclusiveLock`](super::ExclusiveLock).
#[derive(Debug, Clone, Copy, Default)]
pub struct WinMutexOps;

impl LockOps for WinMutexOps {
    type Primitive = WinMutex;

    fn init(&self, lock: &mut WinMutex) {
        // SAFETY: default security, not initially owned, unnamed.
        let handle = unsafe { CreateMutexW(core::ptr::null(), 0, core::ptr::null()) };
        if handle == 0 {
            let err = std::io::Error::last_os_error();
            tracing::error!(error = %err, "CreateMutexW failed");
            // Every later wait would fail on a null handle.
            panic!("CreateMutexW failed: {err}");
        }
        lock.0 = handle;
    }

    fn deinit(&self, lock: &mut WinMutex) {
        // SAFETY: created in `init` and owned by this primitive.
        if unsafe { CloseHandle(lock.0) } == 0 {
            tracing::warn!(
                handle = lock.0,
                error = %std::io::Error::last_os_error(),
                "CloseHandle failed for lock mutex"
            );
        }
        lock.0 = 0;
    }

    fn acquire(&self, lock: &WinMutex) {
        // SAFETY: the handle stays open until `deinit`.
        match unsafe { WaitForSingleObject(lock.0, INFINITE) } {
            WAIT_OBJECT_0 => {}
            WAIT_ABANDONED => {
                // Ownership is granted, but the previous holder died inside.
                tracing::warn!(handle = lock.0, "acquired an abandoned mutex");
            }
            other => {
                let err = std::io::Error::last_os_error();
                tracing::error!(handle = lock.0, result = other, error = %err, "WaitForSingleObject failed");
                panic!("WaitForSingleObject failed: {err}");
            }
        }
    }

    fn release(&self, lock: &WinMutex) {
        // SAFETY: the box only releases after a matching acquire.
        if unsafe { ReleaseMutex(lock.0) } == 0 {
            tracing::warn!(
                handle = lock.0,
                error = %std::io::Error::last_os_error(),
                "ReleaseMutex failed"
            );
        }
    }
}
