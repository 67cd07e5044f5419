//! bitdump implements a classic bloom filter over a fixed size, byte-packed
//! bitmap, using `k` independently seeded hash functions, with a
//! deterministic, diffable text dump format.
//!
//! A bloom filter answers "has this element possibly been inserted?" with no
//! false negatives and a bounded false-positive rate (see
//! [`false_positive_probability`]).
//!
//! ```rust
//! use bitdump::BloomFilterBuilder;
//!
//! let mut filter = BloomFilterBuilder::default()
//!     .bits(1 << 20)
//!     .seeds([1204, 666, 19])
//!     .build()
//!     .unwrap();
//!
//! filter.insert("昔人已乘黃鶴去");
//! assert!(filter.contains("昔人已乘黃鶴去"));
//! assert!(!filter.contains("白雲千載空悠悠"));
//! ```
//!
//! The filter contents round-trip through a line-oriented text file with
//! [`BloomFilter::dump`] and [`BloomFilter::load`]; see [`serialisation`] for
//! the format.
//!
//! Hash functions are injected through the [`SeededHasher`] trait. The
//! default, [`XxSeeded`], is XXH64 with a fixed seed.
//!
//! ## Features
//!
//! * `serde` - derive serialisation of [`ByteBitmap`] and [`XxSeeded`] with
//!   [serde], disabled by default
//!
//! [serde]: (https://github.com/serde-rs/serde)

mod bitmap;
mod bloom;
mod error;
mod filter_size;
mod hasher;
pub mod serialisation;

pub use bitmap::*;
pub use bloom::*;
pub use error::*;
pub use filter_size::*;
pub use hasher::*;
