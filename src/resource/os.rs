//! Release capabilities for common operating-system resources.
//!
//! These live outside the wrappers themselves: the wrappers never assume a
//! resource kind, they only call whatever [`Release`] they are given. Failures
//! reported by the OS are logged with `tracing` and otherwise swallowed, as a
//! release routine has no caller to report to.

use super::{Release, SharedResource, UniqueResource};
use crate::alloc::AllocError;

/// A block of C heap memory from `calloc`.
///
/// The null block is the sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeapBlock(*mut u8);

// SAFETY: a heap block is plain memory that may be freed from any thread.
// Synchronizing access to its contents is the owner's responsibility.
unsafe impl Send for HeapBlock {}
unsafe impl Sync for HeapBlock {}

impl HeapBlock {
    /// The sentinel block.
    pub const NULL: Self = Self(core::ptr::null_mut());

    /// Allocates `len` zeroed bytes. Returns [`HeapBlock::NULL`] on failure.
    pub fn calloc(len: usize) -> Self {
        // SAFETY: calloc has no preconditions.
        Self(unsafe { libc::calloc(len, 1) }.cast::<u8>())
    }

    /// Start of the block.
    #[inline]
    pub fn as_ptr(self) -> *mut u8 {
        self.0
    }

    /// Returns `true` for the sentinel block.
    #[inline]
    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

/// Releases a [`HeapBlock`] with `free`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreeHeap;

impl Release<HeapBlock> for FreeHeap {
    fn release(&mut self, block: HeapBlock) {
        // SAFETY: the wrapper only hands over blocks it owns, exactly once.
        unsafe { libc::free(block.0.cast::<libc::c_void>()) };
        tracing::trace!(address = ?block.0, "heap block freed");
    }
}

/// Exclusively owned heap block.
pub type UniqueHeap = UniqueResource<HeapBlock, FreeHeap>;
/// Reference-counted heap block.
pub type SharedHeap = SharedResource<HeapBlock, FreeHeap>;

/// Wraps `block` in a [`UniqueHeap`].
pub fn unique_heap(block: HeapBlock) -> UniqueHeap {
    UniqueResource::new(block, HeapBlock::NULL, FreeHeap)
}

/// Wraps `block` in a [`SharedHeap`].
///
/// # Errors
/// Returns `AllocError` (after freeing `block`) if the counter cannot be allocated.
pub fn shared_heap(block: HeapBlock) -> Result<SharedHeap, AllocError> {
    SharedResource::new(block, HeapBlock::NULL, FreeHeap)
}

#[cfg(unix)]
pub use self::unix::*;

#[cfg(unix)]
mod unix {
    use std::io;
    use std::os::unix::io::RawFd;

    use super::super::{Release, SharedResource, UniqueResource};
    use crate::alloc::AllocError;

    /// The conventional invalid descriptor.
    pub const INVALID_FD: RawFd = -1;

    /// Releases a file or socket descriptor with `close`.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct CloseFd;

    impl Release<RawFd> for CloseFd {
        fn release(&mut self, fd: RawFd) {
            // SAFETY: the wrapper owns `fd` and hands it over exactly once.
            if unsafe { libc::close(fd) } == -1 {
                let err = io::Error::last_os_error();
                tracing::warn!(fd, error = %err, "close failed");
                debug_assert_ne!(err.raw_os_error(), Some(libc::EBADF), "closed a descriptor that was not open");
            }
        }

        #[inline]
        fn is_valid(&self, fd: &RawFd, _sentinel: &RawFd) -> bool {
            *fd >= 0
        }
    }

    /// Exclusively owned descriptor.
    pub type UniqueFd = UniqueResource<RawFd, CloseFd>;
    /// Reference-counted descriptor.
    pub type SharedFd = SharedResource<RawFd, CloseFd>;

    /// Wraps `fd` in a [`UniqueFd`].
    pub fn unique_fd(fd: RawFd) -> UniqueFd {
        UniqueResource::new(fd, INVALID_FD, CloseFd)
    }

    /// Wraps `fd` in a [`SharedFd`].
    ///
    /// # Errors
    /// Returns `AllocError` (after closing `fd`) if the counter cannot be allocated.
    pub fn shared_fd(fd: RawFd) -> Result<SharedFd, AllocError> {
        SharedResource::new(fd, INVALID_FD, CloseFd)
    }
}

#[cfg(windows)]
pub use self::windows::*;

#[cfg(windows)]
mod windows {
    use windows_sys::Win32::Foundation::{CloseHandle as Win32CloseHandle, HANDLE, INVALID_HANDLE_VALUE};

    use super::super::{Release, SharedResource, UniqueResource};
    use crate::alloc::AllocError;

    /// Releases a kernel object handle with `CloseHandle`.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct CloseHandle;

    impl Release<HANDLE> for CloseHandle {
        fn release(&mut self, handle: HANDLE) {
            // SAFETY: the wrapper owns `handle` and hands it over exactly once.
            if unsafe { Win32CloseHandle(handle) } == 0 {
                let err = std::io::Error::last_os_error();
                tracing::warn!(handle, error = %err, "CloseHandle failed");
            }
        }
    }

    /// Handle whose sentinel is `NULL` (mutexes, events, threads).
    pub type UniqueHandle = UniqueResource<HANDLE, CloseHandle>;
    /// Shared handle whose sentinel is `NULL`.
    pub type SharedHandle = SharedResource<HANDLE, CloseHandle>;

    /// Wraps a handle whose failure value is `NULL`.
    pub fn unique_handle(handle: HANDLE) -> UniqueHandle {
        UniqueResource::new(handle, 0, CloseHandle)
    }

    /// Wraps a handle whose failure value is `INVALID_HANDLE_VALUE` (files).
    pub fn unique_file_handle(handle: HANDLE) -> UniqueHandle {
        UniqueResource::new(handle, INVALID_HANDLE_VALUE, CloseHandle)
    }

    /// Shares a handle whose failure value is `NULL`.
    ///
    /// # Errors
    /// Returns `AllocError` (after closing `handle`) if the counter cannot be allocated.
    pub fn shared_handle(handle: HANDLE) -> Result<SharedHandle, AllocError> {
        SharedResource::new(handle, 0, CloseHandle)
    }

    /// Shares a handle whose failure value is `INVALID_HANDLE_VALUE`.
    ///
    /// # Errors
    /// Returns `AllocError` (after closing `handle`) if the counter cannot be allocated.
    pub fn shared_file_handle(handle: HANDLE) -> Result<SharedHandle, AllocError> {
        SharedResource::new(handle, INVALID_HANDLE_VALUE, CloseHandle)
    }
}
