//! Bit storage backing a [`BloomFilter`](crate::BloomFilter).

mod bytes;
pub use bytes::*;

/// A trait to abstract bit storage for use in a
/// [`BloomFilter`](crate::BloomFilter).
///
/// Bits are only ever set, never cleared: once [`get`](Bitmap::get) returns
/// `true` for a key it continues to do so for the lifetime of the bitmap.
pub trait Bitmap {
    /// Set the bit indexed by `key`.
    ///
    /// Setting an already set bit has no effect.
    fn set(&mut self, key: usize);

    /// Return `true` if the given bit index was previously set.
    fn get(&self, key: usize) -> bool;

    /// Return the size of the bitmap in bytes.
    fn byte_size(&self) -> usize;
}

#[inline(always)]
pub(crate) fn bitmask_for_key(key: usize) -> u8 {
    1 << (key % 8)
}

#[inline(always)]
pub(crate) fn index_for_key(key: usize) -> usize {
    key / 8
}
