use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use tracing::{debug, warn};

use crate::{
    bitmap::{Bitmap, ByteBitmap},
    error::{Error, Operation},
    false_positive_probability, serialisation, SeededHasher, XxSeeded,
};

/// The filter size used by [`BloomFilterBuilder`] unless changed, 1MiB bits
/// (128KiB of storage).
pub const DEFAULT_BITS: usize = 1 << 20;

/// Construct [`BloomFilter`] instances with varying parameters.
///
/// ```rust
/// use bitdump::{BloomFilterBuilder, XxSeeded};
///
/// let mut filter = BloomFilterBuilder::default()
///                     .bits(1 << 16)
///                     .hasher(XxSeeded::new(1204))
///                     .hasher(XxSeeded::new(666))
///                     .build()
///                     .expect("valid filter parameters");
///
/// filter.insert("success!");
/// assert!(filter.contains("success!"));
/// ```
#[derive(Debug, Clone)]
pub struct BloomFilterBuilder<H> {
    bits: usize,
    hashers: Vec<H>,
}

/// Initialise a `BloomFilterBuilder` that unless changed, will construct a
/// [`BloomFilter`] of [`DEFAULT_BITS`] bits.
///
/// At least one hash function must be added before calling
/// [`build`](BloomFilterBuilder::build).
impl<H> std::default::Default for BloomFilterBuilder<H> {
    fn default() -> Self {
        Self {
            bits: DEFAULT_BITS,
            hashers: Vec::new(),
        }
    }
}

impl<H> BloomFilterBuilder<H>
where
    H: SeededHasher,
{
    /// Set the number of addressable bits.
    ///
    /// See [`BloomFilter::new`] for how values that are not a multiple of 8
    /// are handled.
    pub fn bits(self, bits: usize) -> Self {
        Self { bits, ..self }
    }

    /// Append a hash function.
    pub fn hasher(mut self, hasher: H) -> Self {
        self.hashers.push(hasher);
        self
    }

    /// Append each hash function in `hashers`, in order.
    pub fn hashers(mut self, hashers: impl IntoIterator<Item = H>) -> Self {
        self.hashers.extend(hashers);
        self
    }

    /// Initialise the [`BloomFilter`] instance with the provided parameters.
    pub fn build(self) -> Result<BloomFilter<H>, Error> {
        BloomFilter::new(self.bits, self.hashers)
    }
}

impl BloomFilterBuilder<XxSeeded> {
    /// Append one [`XxSeeded`] hash function for each of `seeds`, in order.
    ///
    /// ```rust
    /// use bitdump::BloomFilterBuilder;
    ///
    /// let filter = BloomFilterBuilder::default()
    ///     .seeds([1204, 666, 19])
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(filter.hash_count(), 3);
    /// ```
    pub fn seeds(self, seeds: impl IntoIterator<Item = u64>) -> Self {
        self.hashers(seeds.into_iter().map(XxSeeded::new))
    }
}

/// A bloom filter backed by a fixed size, byte-packed bitmap and `k`
/// independently seeded hash functions.
///
/// Each inserted element sets one bit per hash function, at index
/// `hash(element) % bit_count`. A lookup checks the same bits:
///
/// ```rust
/// use bitdump::{BloomFilter, XxSeeded};
///
/// let hashers = [1204, 666, 19].iter().map(|&s| XxSeeded::new(s));
/// let mut b = BloomFilter::new(1 << 20, hashers).unwrap();
///
/// b.insert("hello 🐐");
/// assert!(b.contains("hello 🐐"));
/// assert!(!b.contains("goodbye 🐐"));
/// ```
///
/// If [`contains`](BloomFilter::contains) returns false, the element has
/// **definitely not** been inserted. If it returns true the element has
/// **probably** been inserted; see
/// [`false_positive_probability`](crate::false_positive_probability) for the
/// expected error rate.
///
/// The contents of a filter can be written to a file with
/// [`dump`](BloomFilter::dump) and restored into another filter of the same
/// size with [`load`](BloomFilter::load). The hash functions are not part of
/// the dump; the loading filter must be constructed with the same hash
/// functions, in the same order, to give the same answers.
///
/// A `BloomFilter` performs no internal synchronisation. Sharing one between
/// threads that insert requires external locking, such as a `Mutex`.
#[derive(Debug, Clone, PartialEq)]
pub struct BloomFilter<H = XxSeeded> {
    hashers: Vec<H>,
    bitmap: ByteBitmap,
    bit_count: usize,
}

impl<H> BloomFilter<H>
where
    H: SeededHasher,
{
    /// Initialise an empty filter addressing `bit_len` bits, using `hashers`
    /// to derive the bit indexes of each element.
    ///
    /// Storage is allocated in whole bytes: a `bit_len` that is not a multiple
    /// of 8 is rounded down to the nearest multiple of 8, and the rounded value
    /// becomes the [`bit_count`](BloomFilter::bit_count) of the filter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoHashers`] if `hashers` is empty and
    /// [`Error::BitLength`] if `bit_len` is less than 8.
    pub fn new(bit_len: usize, hashers: impl IntoIterator<Item = H>) -> Result<Self, Error> {
        let hashers = hashers.into_iter().collect::<Vec<_>>();
        if hashers.is_empty() {
            return Err(Error::NoHashers);
        }

        let bytes = bit_len / 8;
        if bytes == 0 {
            return Err(Error::BitLength(bit_len));
        }

        let bit_count = bytes * 8;
        if bit_count != bit_len {
            warn!(
                requested = bit_len,
                bit_count, "filter bit length is not a multiple of 8, rounding down"
            );
        }

        Ok(Self {
            hashers,
            bitmap: ByteBitmap::with_byte_len(bytes),
            bit_count,
        })
    }

    /// Insert places `data` into the bloom filter.
    ///
    /// Any subsequent calls to [`contains`](BloomFilter::contains) for the
    /// same `data` will always return true.
    ///
    /// The `data` provided can be anything that can be viewed as bytes:
    ///
    /// ```rust
    /// # use bitdump::BloomFilterBuilder;
    /// # let mut b = BloomFilterBuilder::default().seeds([1, 2]).build().unwrap();
    /// b.insert("昔人已乘黃鶴去");
    /// b.insert(&String::from("此地空餘黃鶴樓"));
    /// b.insert(&[1_u8, 2, 3, 42]);
    ///
    /// assert!(b.contains("昔人已乘黃鶴去"));
    /// assert!(b.contains(&[1_u8, 2, 3, 42]));
    /// ```
    pub fn insert<T>(&mut self, data: &T)
    where
        T: AsRef<[u8]> + ?Sized,
    {
        let data = data.as_ref();
        for h in &self.hashers {
            let key = key_for(h, data, self.bit_count);
            self.bitmap.set(key);
        }
    }

    /// Checks if `data` exists in the filter.
    ///
    /// If `contains` returns true, `data` has **probably** been inserted
    /// previously. If `contains` returns false, `data` has **definitely not**
    /// been inserted into the filter.
    pub fn contains<T>(&self, data: &T) -> bool
    where
        T: AsRef<[u8]> + ?Sized,
    {
        let data = data.as_ref();
        self.hashers
            .iter()
            .all(|h| self.bitmap.get(key_for(h, data, self.bit_count)))
    }

    /// The number of addressable bits in this filter.
    pub fn bit_count(&self) -> usize {
        self.bit_count
    }

    /// The number of hash functions (`k`) used for each element.
    pub fn hash_count(&self) -> usize {
        self.hashers.len()
    }

    /// Return the byte size of this filter's storage.
    pub fn byte_size(&self) -> usize {
        self.bitmap.byte_size()
    }

    /// The raw storage bytes, least significant bit first within each byte.
    pub fn as_bytes(&self) -> &[u8] {
        self.bitmap.as_bytes()
    }

    /// The number of bits currently set.
    pub fn count_ones(&self) -> usize {
        self.bitmap.count_ones()
    }

    /// The approximate false-positive probability of this filter once `n`
    /// distinct elements have been inserted.
    pub fn estimated_fpp(&self, n: usize) -> f64 {
        false_positive_probability(self.bit_count, self.hashers.len(), n)
    }

    /// Write the filter contents to `w` in the text dump format.
    ///
    /// See the [`serialisation`](crate::serialisation) module for the format.
    pub fn dump_to<W: std::io::Write>(&self, w: W) -> Result<(), Error> {
        serialisation::encode(self.bit_count, self.bitmap.as_bytes(), w)
    }

    /// Write the filter contents to the file at `path`, creating or
    /// truncating it.
    ///
    /// A failed dump may leave a partially written file behind. Every error
    /// returned names `path`.
    pub fn dump(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();

        let file = File::create(path).map_err(|source| Error::Io {
            op: Operation::Dump,
            path: path.to_path_buf(),
            source,
        })?;

        self.dump_to(BufWriter::new(file))
            .map_err(|e| e.at_path(path))?;

        debug!(
            path = %path.display(),
            bit_count = self.bit_count,
            bytes = self.bitmap.byte_size(),
            "dumped bloom filter"
        );

        Ok(())
    }

    /// Replace the filter contents with the dump read from `r`.
    ///
    /// The dump must have been produced by a filter with the same
    /// [`bit_count`](BloomFilter::bit_count). The contents are only replaced
    /// once the whole dump is successfully decoded; on error the filter is
    /// left unchanged.
    pub fn load_from<R: std::io::BufRead>(&mut self, r: R) -> Result<(), Error> {
        let bytes = serialisation::decode(r, self.bit_count).map_err(|e| {
            warn!(error = %e, bit_count = self.bit_count, "rejected bloom filter dump");
            e
        })?;

        self.bitmap = ByteBitmap::from_bytes(bytes);
        Ok(())
    }

    /// Replace the filter contents with the dump stored in the file at
    /// `path`.
    ///
    /// See [`load_from`](BloomFilter::load_from). Every error returned names
    /// `path`: I/O failures as [`Error::Io`], and format or consistency
    /// failures wrapped in [`Error::File`] (see [`Error::cause`]).
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|source| Error::Io {
            op: Operation::Load,
            path: path.to_path_buf(),
            source,
        })?;

        self.load_from(BufReader::new(file))
            .map_err(|e| e.at_path(path))?;

        debug!(
            path = %path.display(),
            bit_count = self.bit_count,
            bytes = self.bitmap.byte_size(),
            "loaded bloom filter"
        );

        Ok(())
    }
}

/// Reduce the hash of `data` into the bit index range of a filter of
/// `bit_count` bits.
#[inline(always)]
fn key_for<H: SeededHasher>(hasher: &H, data: &[u8], bit_count: usize) -> usize {
    (hasher.hash(data) % bit_count as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{from_fn, ErrorKind};
    use quickcheck_macros::quickcheck;
    use std::cell::RefCell;

    /// A hasher returning a fixed value and recording every input.
    #[derive(Debug, Default)]
    struct MockHasher {
        return_hash: u64,
        calls: RefCell<Vec<Vec<u8>>>,
    }

    impl SeededHasher for MockHasher {
        fn hash(&self, data: &[u8]) -> u64 {
            self.calls.borrow_mut().push(data.to_vec());
            self.return_hash
        }
    }

    fn mock(return_hash: u64) -> MockHasher {
        MockHasher {
            return_hash,
            ..Default::default()
        }
    }

    fn seeded(bits: usize) -> BloomFilter<XxSeeded> {
        BloomFilterBuilder::default()
            .bits(bits)
            .seeds([1204, 666, 19])
            .build()
            .expect("valid filter")
    }

    #[test]
    fn test_no_hashers() {
        let err = BloomFilter::<XxSeeded>::new(64, vec![]).expect_err("no hashers");
        assert!(matches!(err, Error::NoHashers));
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = BloomFilterBuilder::<XxSeeded>::default()
            .build()
            .expect_err("no hashers");
        assert!(matches!(err, Error::NoHashers));
    }

    #[test]
    fn test_bit_length_too_small() {
        let err = BloomFilter::new(7, vec![XxSeeded::new(1)]).expect_err("too small");
        assert!(matches!(err, Error::BitLength(7)));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_bit_length_rounded_down() {
        let b = BloomFilter::new(100, vec![XxSeeded::new(1)]).unwrap();
        assert_eq!(b.bit_count(), 96);
        assert_eq!(b.byte_size(), 12);

        let b = BloomFilter::new(64, vec![XxSeeded::new(1)]).unwrap();
        assert_eq!(b.bit_count(), 64);
        assert_eq!(b.byte_size(), 8);
    }

    #[test]
    fn test_builder_defaults() {
        let b = BloomFilterBuilder::default().seeds([1]).build().unwrap();
        assert_eq!(b.bit_count(), DEFAULT_BITS);
        assert_eq!(b.byte_size(), DEFAULT_BITS / 8);
        assert_eq!(b.hash_count(), 1);
        assert_eq!(b.count_ones(), 0);
    }

    #[test]
    fn test_insert_sets_one_bit_per_hasher() {
        let mut b = BloomFilter::new(64, vec![mock(3), mock(64 + 9), mock(u64::MAX)]).unwrap();

        b.insert("bananas");

        // u64::MAX % 64 == 63
        let mut want = vec![0; 8];
        want[0] = 0b0000_1000;
        want[1] = 0b0000_0010;
        want[7] = 0b1000_0000;
        assert_eq!(b.as_bytes(), want.as_slice());
        assert_eq!(b.count_ones(), 3);

        for h in &b.hashers {
            assert_eq!(*h.calls.borrow(), vec![b"bananas".to_vec()]);
        }
    }

    #[test]
    fn test_contains_short_circuits() {
        let mut b = BloomFilter::new(64, vec![mock(1), mock(2)]).unwrap();
        b.bitmap.set(2);

        assert!(!b.contains("x"));

        // The first hasher maps to an unset bit, so the second is never
        // consulted.
        assert_eq!(b.hashers[0].calls.borrow().len(), 1);
        assert!(b.hashers[1].calls.borrow().is_empty());
    }

    #[test]
    fn test_contains_requires_all_bits() {
        let mut b = BloomFilter::new(64, vec![mock(1), mock(2)]).unwrap();
        b.bitmap.set(1);
        assert!(!b.contains("x"));

        b.bitmap.set(2);
        assert!(b.contains("x"));
    }

    #[test]
    fn test_insert_is_monotonic() {
        let mut b = seeded(1 << 10);
        let mut last = b.as_bytes().to_vec();

        for i in 0..200 {
            b.insert(&format!("element-{}", i));

            // No bit set before may be cleared.
            for (before, after) in last.iter().zip(b.as_bytes()) {
                assert_eq!(before & after, *before);
            }
            last = b.as_bytes().to_vec();
        }
    }

    #[test]
    fn test_concrete_scenario() {
        let mut b = seeded(1 << 20);

        let (a, bb, c, d) = ("昔人已乘黃鶴去", "此地空餘黃鶴樓", "黃鶴一去不復返", "白雲千載空悠悠");
        b.insert(a);
        b.insert(bb);

        assert!(!b.contains(c));
        assert!(!b.contains(d));
        assert!(b.contains(a));
        assert!(b.contains(bb));
    }

    #[test]
    fn test_boxed_hashers() {
        let hashers: Vec<Box<dyn SeededHasher>> = vec![
            Box::new(XxSeeded::new(42)),
            Box::new(from_fn(|data: &[u8]| data.len() as u64)),
        ];

        let mut b = BloomFilter::new(1024, hashers).unwrap();
        b.insert("platypus");
        assert!(b.contains("platypus"));
        assert_eq!(b.hash_count(), 2);
    }

    #[test]
    fn test_load_from_mismatch_leaves_store() {
        let mut b = seeded(64);
        b.insert("kept");
        let before = b.clone();

        let err = b
            .load_from("bitCount: 32\n00000000: [00000000 00000000 00000000 00000000]\n".as_bytes())
            .expect_err("size mismatch");
        assert_eq!(err.kind(), ErrorKind::Consistency);
        assert_eq!(b, before);
    }

    #[test]
    fn test_load_from_bad_line_leaves_store() {
        let mut b = seeded(64);
        b.insert("kept");
        let before = b.clone();

        let err = b
            .load_from(
                "bitCount: 64\n\
                 00000000: [11111111 11111111 11111111 11111111]\n\
                 00000004: [11111111 2]\n"
                    .as_bytes(),
            )
            .expect_err("bad token");
        assert_eq!(err.kind(), ErrorKind::Format);
        assert_eq!(b, before);
    }

    #[test]
    fn test_dump_load_in_memory() {
        let mut a = seeded(1 << 12);
        for i in 0..100 {
            a.insert(&format!("{}", i));
        }

        let mut buf = Vec::new();
        a.dump_to(&mut buf).unwrap();

        let mut b = seeded(1 << 12);
        b.load_from(buf.as_slice()).unwrap();
        assert_eq!(a, b);

        for i in 0..100 {
            assert!(b.contains(&format!("{}", i)));
        }
    }

    #[quickcheck]
    fn prop_no_false_negatives(vals: Vec<String>) -> bool {
        let mut b = seeded(1 << 8);
        for v in &vals {
            b.insert(v);
        }

        vals.iter().all(|v| b.contains(v))
    }
}
