use core::sync::atomic::{
    AtomicI16, AtomicI32, AtomicI64, AtomicI8, AtomicIsize, AtomicU16, AtomicU32, AtomicU64,
    AtomicU8, AtomicUsize, Ordering,
};

use super::{AtomicOps, RefCounter};

// Read-modify-write uses `AcqRel` so the thread that observes a count of zero
// also observes every write made by the threads that decremented before it.
macro_rules! impl_native_atomic_ops {
    ($($atomic:ty => $int:ty),* $(,)?) => {$(
        impl AtomicOps<$int> for $atomic {
            #[inline(always)]
            fn increment(&self) -> $int {
                self.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
            }

            #[inline(always)]
            fn decrement(&self) -> $int {
                self.fetch_sub(1, Ordering::AcqRel).wrapping_sub(1)
            }

            #[inline(always)]
            fn load(&self) -> $int {
                <$atomic>::load(self, Ordering::Acquire)
            }

            #[inline(always)]
            fn store(&self, value: $int) -> $int {
                self.swap(value, Ordering::AcqRel)
            }

            #[inline(always)]
            fn add(&self, value: $int) -> $int {
                self.fetch_add(value, Ordering::AcqRel).wrapping_add(value)
            }

            #[inline(always)]
            fn sub(&self, value: $int) -> $int {
                self.fetch_sub(value, Ordering::AcqRel).wrapping_sub(value)
            }

            #[inline(always)]
            fn and(&self, value: $int) -> $int {
                self.fetch_and(value, Ordering::AcqRel) & value
            }

            #[inline(always)]
            fn or(&self, value: $int) -> $int {
                self.fetch_or(value, Ordering::AcqRel) | value
            }

            #[inline(always)]
            fn xor(&self, value: $int) -> $int {
                self.fetch_xor(value, Ordering::AcqRel) ^ value
            }
        }

        impl RefCounter<$int> for $atomic {
            #[inline]
            fn with_value(value: $int) -> Self {
                <$atomic>::new(value)
            }
        }
    )*};
}

impl_native_atomic_ops! {
    AtomicI8 => i8,
    AtomicU8 => u8,
    AtomicI16 => i16,
    AtomicU16 => u16,
    AtomicI32 => i32,
    AtomicU32 => u32,
    AtomicI64 => i64,
    AtomicU64 => u64,
    AtomicIsize => isize,
    AtomicUsize => usize,
}

#[cfg(test)]
mod tests {
    use super::super::*;
    use core::sync::atomic::{AtomicI32, AtomicU32};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn arithmetic_returns_new_value() {
        let n = AtomicI32::new(0);
        assert_eq!(atomic_increment(&n), 1);
        assert_eq!(atomic_decrement(&n), 0);
        assert_eq!(atomic_decrement(&n), -1);
        assert_eq!(atomic_add(&n, 5), 4);
        assert_eq!(atomic_sub(&n, 5), -1);
    }

    #[test]
    fn store_returns_previous_value() {
        let n = AtomicU32::new(3);
        assert_eq!(atomic_store(&n, 9), 3);
        assert_eq!(atomic_load(&n), 9);
    }

    #[test]
    fn bitwise_returns_new_value() {
        let n = AtomicU32::new(0xFFFF);
        assert_eq!(atomic_and(&n, 0xFF), 0xFF);
        assert_eq!(atomic_or(&n, 0xFF00), 0xFFFF);
        assert_eq!(atomic_xor(&n, 0xFFFF_FFFF), 0xFFFF_0000);
    }

    #[test]
    fn unsigned_wraps() {
        let n = AtomicU32::new(0);
        assert_eq!(atomic_decrement(&n), u32::MAX);
        assert_eq!(atomic_increment(&n), 0);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        const THREADS: usize = 4;
        const ITERS: usize = 10_000;
        let n = Arc::new(AtomicI32::new(0));
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let n = Arc::clone(&n);
                thread::spawn(move || {
                    for _ in 0..ITERS {
                        atomic_increment(&*n);
                        atomic_add(&*n, 2);
                        atomic_sub(&*n, 2);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(atomic_load(&*n), (THREADS * ITERS) as i32);
    }
}
