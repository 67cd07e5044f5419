//! Seeded hash functions used to derive bit indexes for an element.

use twox_hash::XxHash64;

/// A deterministic hash function with a seed fixed at construction.
///
/// A [`BloomFilter`](crate::BloomFilter) holds `k` implementations of this
/// trait and derives one bit index from each for every element inserted or
/// queried. Implementations MUST return the same output for the same input
/// across runs, otherwise a dumped filter can not be loaded back with the same
/// membership answers.
pub trait SeededHasher {
    /// Hash `data` to an unsigned integer.
    fn hash(&self, data: &[u8]) -> u64;
}

impl<T> SeededHasher for Box<T>
where
    T: SeededHasher + ?Sized,
{
    fn hash(&self, data: &[u8]) -> u64 {
        (**self).hash(data)
    }
}

impl<T> SeededHasher for &T
where
    T: SeededHasher + ?Sized,
{
    fn hash(&self, data: &[u8]) -> u64 {
        (**self).hash(data)
    }
}

/// The default [`SeededHasher`], [XXH64] with a fixed seed.
///
/// ```rust
/// use bitdump::{SeededHasher, XxSeeded};
///
/// let h = XxSeeded::new(1204);
/// assert_eq!(h.hash(b"bananas"), XxSeeded::new(1204).hash(b"bananas"));
/// assert_ne!(h.hash(b"bananas"), XxSeeded::new(666).hash(b"bananas"));
/// ```
///
/// [XXH64]: https://github.com/Cyan4973/xxHash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct XxSeeded {
    seed: u64,
}

impl XxSeeded {
    /// Initialise a hasher using `seed`.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// The seed this hasher was constructed with.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl SeededHasher for XxSeeded {
    fn hash(&self, data: &[u8]) -> u64 {
        XxHash64::oneshot(self.seed, data)
    }
}

/// Adapts a closure into a [`SeededHasher`].
///
/// Any seed must be captured by the closure itself.
///
/// ```rust
/// use bitdump::{from_fn, SeededHasher};
///
/// let h = from_fn(|data: &[u8]| data.len() as u64);
/// assert_eq!(h.hash(b"four"), 4);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FnHasher<F>(F);

/// Wrap `f` as a [`SeededHasher`].
pub fn from_fn<F>(f: F) -> FnHasher<F>
where
    F: Fn(&[u8]) -> u64,
{
    FnHasher(f)
}

impl<F> SeededHasher for FnHasher<F>
where
    F: Fn(&[u8]) -> u64,
{
    fn hash(&self, data: &[u8]) -> u64 {
        (self.0)(data)
    }
}
