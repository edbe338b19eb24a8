//! Win32 critical section lock.

use core::cell::UnsafeCell;

use windows_sys::Win32::System::Threading::{
    DeleteCriticalSection, EnterCriticalSection, InitializeCriticalSectionAndSpinCount,
    LeaveCriticalSection, CRITICAL_SECTION,
};

use super::LockOps;

/// Storage for a `CRITICAL_SECTION`.
pub struct CriticalSection(UnsafeCell<CRITICAL_SECTION>);

// SAFETY: critical sections are designed to be shared between threads of one
// process; all access goes through the Win32 API.
unsafe impl Send for CriticalSection {}
unsafe impl Sync for CriticalSection {}

impl Default for CriticalSection {
    fn default() -> Self {
        // SAFETY: CRITICAL_SECTION is plain data; it is initialized in `init`.
        Self(UnsafeCell::new(unsafe { core::mem::zeroed() }))
    }
}

/// Drives a Win32 critical section.
///
/// Critical sections are reentrant for the owning thread, so nested scoped
/// locks on one box do not deadlock here. For the same reason this is not an
/// [`ExclusiveLock`](super::ExclusiveLock) and cannot back a `Locked` value.
#[derive(Debug, Clone, Copy)]
pub struct CriticalSectionOps {
    /// Spins before a waiter blocks in the kernel.
    pub spin_count: u32,
}

impl Default for CriticalSectionOps {
    fn default() -> Self {
        Self { spin_count: 4000 }
    }
}

impl LockOps for CriticalSectionOps {
    type Primitive = CriticalSection;

    fn init(&self, lock: &mut CriticalSection) {
        // SAFETY: storage is valid and not yet in use.
        if unsafe { InitializeCriticalSectionAndSpinCount(lock.0.get(), self.spin_count) } == 0 {
            tracing::warn!(
                error = %std::io::Error::last_os_error(),
                "InitializeCriticalSectionAndSpinCount failed"
            );
        }
    }

    fn deinit(&self, lock: &mut CriticalSection) {
        // SAFETY: initialized in `init`; no further use after this.
        unsafe { DeleteCriticalSection(lock.0.get()) };
    }

    fn acquire(&self, lock: &CriticalSection) {
        // SAFETY: initialized and pinned inside the box.
        unsafe { EnterCriticalSection(lock.0.get()) };
    }

    fn release(&self, lock: &CriticalSection) {
        // SAFETY: the box only releases after a matching acquire.
        unsafe { LeaveCriticalSection(lock.0.get()) };
    }
}
