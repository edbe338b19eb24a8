use crossbeam_utils::atomic::AtomicCell;

use super::{AtomicOps, RefCounter};

// `AtomicCell` falls back to a striped global lock when the platform has no
// native atomic of the right width, which makes it a useful second backing:
// the same refcount logic runs unchanged over either implementation.
macro_rules! impl_cell_atomic_ops {
    ($($int:ty),* $(,)?) => {$(
        impl AtomicOps<$int> for AtomicCell<$int> {
            #[inline]
            fn increment(&self) -> $int {
                self.fetch_add(1).wrapping_add(1)
            }

            #[inline]
            fn decrement(&self) -> $int {
                self.fetch_sub(1).wrapping_sub(1)
            }

            #[inline]
            fn load(&self) -> $int {
                AtomicCell::load(self)
            }

            #[inline]
            fn store(&self, value: $int) -> $int {
                self.swap(value)
            }

            #[inline]
            fn add(&self, value: $int) -> $int {
                self.fetch_add(value).wrapping_add(value)
            }

            #[inline]
            fn sub(&self, value: $int) -> $int {
                self.fetch_sub(value).wrapping_sub(value)
            }

            #[inline]
            fn and(&self, value: $int) -> $int {
                self.fetch_and(value) & value
            }

            #[inline]
            fn or(&self, value: $int) -> $int {
                self.fetch_or(value) | value
            }

            #[inline]
            fn xor(&self, value: $int) -> $int {
                self.fetch_xor(value) ^ value
            }
        }

        impl RefCounter<$int> for AtomicCell<$int> {
            #[inline]
            fn with_value(value: $int) -> Self {
                AtomicCell::new(value)
            }
        }
    )*};
}

impl_cell_atomic_ops!(i8, u8, i16, u16, i32, u32, i64, u64, i128, u128, isize, usize);
