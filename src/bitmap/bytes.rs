use crate::bitmap::{bitmask_for_key, index_for_key, Bitmap};

/// A plain, heap-allocated, `O(1)` indexed bitmap packed into bytes.
///
/// Bit `n` lives in byte `n / 8`, at position `n % 8` counting from the least
/// significant bit. That is, setting bit 0 sets the value `0b0000_0001` of
/// the first byte, and setting bit 9 sets the value `0b0000_0010` of the
/// second byte.
///
/// This is the layout written by [`dump`](crate::BloomFilter::dump), so the
/// output of [`ByteBitmap::as_bytes()`] can be used to reconstruct an
/// identical bitmap with [`ByteBitmap::from_bytes()`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ByteBitmap {
    bitmap: Vec<u8>,
}

impl ByteBitmap {
    /// Construct a zeroed `ByteBitmap` of `len` bytes, addressing `8 * len`
    /// bits.
    pub fn with_byte_len(len: usize) -> Self {
        Self {
            bitmap: vec![0; len],
        }
    }

    /// Construct a `ByteBitmap` taking ownership of `bitmap` as its contents.
    pub fn from_bytes(bitmap: impl Into<Vec<u8>>) -> Self {
        Self {
            bitmap: bitmap.into(),
        }
    }

    /// The raw bytes backing this bitmap.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bitmap
    }

    /// The number of addressable bits.
    pub fn bit_len(&self) -> usize {
        self.bitmap.len() * 8
    }

    /// The number of bits currently set.
    pub fn count_ones(&self) -> usize {
        self.bitmap.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Consume the bitmap, returning the backing bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bitmap
    }
}

impl Bitmap for ByteBitmap {
    /// # Panics
    ///
    /// Panics if `key` is not less than [`ByteBitmap::bit_len()`].
    fn set(&mut self, key: usize) {
        debug_assert!(key < self.bit_len(), "key {} >= {} bits", key, self.bit_len());

        self.bitmap[index_for_key(key)] |= bitmask_for_key(key);
    }

    /// # Panics
    ///
    /// Panics if `key` is not less than [`ByteBitmap::bit_len()`].
    fn get(&self, key: usize) -> bool {
        debug_assert!(key < self.bit_len(), "key {} >= {} bits", key, self.bit_len());

        self.bitmap[index_for_key(key)] & bitmask_for_key(key) != 0
    }

    fn byte_size(&self) -> usize {
        self.bitmap.len()
    }
}
