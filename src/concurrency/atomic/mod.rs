//! Pluggable atomic counter operations.
//!
//! [`AtomicOps`] is the operation set a reference-counted wrapper needs from
//! its counter: increment, decrement, load, store, add, subtract and the three
//! bitwise read-modify-write operations. It is parameterized over the logical
//! integer type `I` so that one carrier type may expose several views, and it
//! is implemented for every std integer atomic, for
//! `crossbeam_utils::atomic::AtomicCell`, and for [`CachePadded`] carriers.
//!
//! Important:
//! - Each operation is indivisible and linearizable with respect to every
//!   other operation on the same carrier. Nothing is promised about ordering
//!   between *different* carriers.
//! - Arithmetic wraps on overflow, like the hardware instructions.
//!
//! [`CachePadded`]: crate::concurrency::CachePadded

/// Carriers backed by `crossbeam_utils::atomic::AtomicCell`.
pub mod cell;
/// Carriers backed by `core::sync::atomic` integers.
pub mod native;

use num_traits::{Bounded, One, Zero};

use crate::concurrency::CachePadded;

/// Atomic read-modify-write operations over a carrier holding an `I`.
///
/// Unless noted, operations return the value stored *after* the operation.
pub trait AtomicOps<I: Copy> {
    /// Adds one; returns the new value.
    fn increment(&self) -> I;

    /// Subtracts one; returns the new value.
    fn decrement(&self) -> I;

    /// Reads the current value.
    fn load(&self) -> I;

    /// Replaces the current value, returning the **previous** value.
    fn store(&self, value: I) -> I;

    /// Adds `value`; returns the new value.
    fn add(&self, value: I) -> I;

    /// Subtracts `value`; returns the new value.
    fn sub(&self, value: I) -> I;

    /// Bitwise AND with `value`; returns the new value.
    fn and(&self, value: I) -> I;

    /// Bitwise OR with `value`; returns the new value.
    fn or(&self, value: I) -> I;

    /// Bitwise XOR with `value`; returns the new value.
    fn xor(&self, value: I) -> I;
}

/// A carrier that can back the reference count of a shared resource.
///
/// The logical type must know its own zero, one and maximum; every primitive
/// integer qualifies through `num-traits`. The maximum bounds the number of
/// owners a counter can track.
pub trait RefCounter<I>: AtomicOps<I>
where
    I: Copy + PartialEq + Zero + One + Bounded,
{
    /// Creates a carrier holding `value`.
    fn with_value(value: I) -> Self
    where
        Self: Sized;
}

impl<I, A> AtomicOps<I> for CachePadded<A>
where
    I: Copy,
    A: AtomicOps<I>,
{
    #[inline(always)]
    fn increment(&self) -> I {
        (**self).increment()
    }

    #[inline(always)]
    fn decrement(&self) -> I {
        (**self).decrement()
    }

    #[inline(always)]
    fn load(&self) -> I {
        (**self).load()
    }

    #[inline(always)]
    fn store(&self, value: I) -> I {
        (**self).store(value)
    }

    #[inline(always)]
    fn add(&self, value: I) -> I {
        (**self).add(value)
    }

    #[inline(always)]
    fn sub(&self, value: I) -> I {
        (**self).sub(value)
    }

    #[inline(always)]
    fn and(&self, value: I) -> I {
        (**self).and(value)
    }

    #[inline(always)]
    fn or(&self, value: I) -> I {
        (**self).or(value)
    }

    #[inline(always)]
    fn xor(&self, value: I) -> I {
        (**self).xor(value)
    }
}

impl<I, A> RefCounter<I> for CachePadded<A>
where
    I: Copy + PartialEq + Zero + One + Bounded,
    A: RefCounter<I>,
{
    fn with_value(value: I) -> Self {
        CachePadded::new(A::with_value(value))
    }
}

/// Turns a raw carrier pointer into a reference.
///
/// A null pointer is a precondition violation and panics before anything is
/// dereferenced.
///
/// # Safety
/// A non-null `ptr` must point to a live, properly aligned carrier that stays
/// valid for `'a`.
///
/// # Panics
/// Panics if `ptr` is null.
#[inline]
pub unsafe fn carrier_from_ptr<'a, A>(ptr: *const A) -> &'a A {
    assert!(!ptr.is_null(), "atomic carrier pointer must not be null");
    // SAFETY: non-null checked above; liveness and alignment are the caller's contract.
    unsafe { &*ptr }
}

/// Pre-increment: adds one and returns the new value.
#[inline(always)]
pub fn atomic_increment<I: Copy, A: AtomicOps<I> + ?Sized>(carrier: &A) -> I {
    carrier.increment()
}

/// Pre-decrement: subtracts one and returns the new value.
#[inline(always)]
pub fn atomic_decrement<I: Copy, A: AtomicOps<I> + ?Sized>(carrier: &A) -> I {
    carrier.decrement()
}

/// Reads the current value.
#[inline(always)]
pub fn atomic_load<I: Copy, A: AtomicOps<I> + ?Sized>(carrier: &A) -> I {
    carrier.load()
}

/// Stores `value`, returning the previous value.
#[inline(always)]
pub fn atomic_store<I: Copy, A: AtomicOps<I> + ?Sized>(carrier: &A, value: I) -> I {
    carrier.store(value)
}

/// Adds `value` and returns the new value.
#[inline(always)]
pub fn atomic_add<I: Copy, A: AtomicOps<I> + ?Sized>(carrier: &A, value: I) -> I {
    carrier.add(value)
}

/// Subtracts `value` and returns the new value.
#[inline(always)]
pub fn atomic_sub<I: Copy, A: AtomicOps<I> + ?Sized>(carrier: &A, value: I) -> I {
    carrier.sub(value)
}

/// Bitwise AND; returns the new value.
#[inline(always)]
pub fn atomic_and<I: Copy, A: AtomicOps<I> + ?Sized>(carrier: &A, value: I) -> I {
    carrier.and(value)
}

/// Bitwise OR; returns the new value.
#[inline(always)]
pub fn atomic_or<I: Copy, A: AtomicOps<I> + ?Sized>(carrier: &A, value: I) -> I {
    carrier.or(value)
}

/// Bitwise XOR; returns the new value.
#[inline(always)]
pub fn atomic_xor<I: Copy, A: AtomicOps<I> + ?Sized>(carrier: &A, value: I) -> I {
    carrier.xor(value)
}
