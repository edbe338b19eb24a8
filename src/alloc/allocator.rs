use core::alloc::Layout;
use core::ptr::NonNull;

/// The error type for allocation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError;

impl core::fmt::Display for AllocError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("memory allocation failed")
    }
}

impl std::error::Error for AllocError {}

#[cfg(test)]
thread_local! {
    static FAIL_NEXT: core::cell::Cell<bool> = const { core::cell::Cell::new(false) };
}

/// Makes the next [`allocate`] on this thread report `AllocError`.
#[cfg(test)]
pub(crate) fn fail_next_allocation() {
    FAIL_NEXT.with(|f| f.set(true));
}

#[cfg(test)]
fn injected_failure() -> bool {
    FAIL_NEXT.with(|f| f.replace(false))
}

#[cfg(not(test))]
#[inline(always)]
fn injected_failure() -> bool {
    false
}

/// Moves `value` into a fresh heap block.
///
/// Unlike `Box::new`, running out of memory is reported instead of aborting.
/// On failure `value` is dropped.
///
/// # Errors
/// Returns `AllocError` if the global allocator returns null.
pub fn allocate<T>(value: T) -> Result<NonNull<T>, AllocError> {
    let layout = Layout::new::<T>();
    if injected_failure() {
        return Err(AllocError);
    }
    let ptr = if layout.size() == 0 {
        NonNull::dangling()
    } else {
        // SAFETY: layout has non-zero size.
        let raw = unsafe { std::alloc::alloc(layout) }.cast::<T>();
        NonNull::new(raw).ok_or(AllocError)?
    };
    // SAFETY: `ptr` is valid for writes of `T` and properly aligned.
    unsafe { ptr.as_ptr().write(value) };
    Ok(ptr)
}

/// Drops the value in a block obtained from [`allocate`] and frees the block.
///
/// # Safety
/// `ptr` must come from [`allocate::<T>`] and must not be used afterwards.
pub unsafe fn deallocate<T>(ptr: NonNull<T>) {
    let layout = Layout::new::<T>();
    // SAFETY: the caller guarantees `ptr` holds a live `T` from `allocate`.
    unsafe {
        core::ptr::drop_in_place(ptr.as_ptr());
        if layout.size() != 0 {
            std::alloc::dealloc(ptr.as_ptr().cast::<u8>(), layout);
        }
    }
}
