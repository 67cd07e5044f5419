//! False-positive maths for sizing a [`BloomFilter`](crate::BloomFilter).
//!
//! For a filter of `m` bits using `k` hash functions, after inserting `n`
//! distinct elements the probability of a false positive is approximately:
//!
//! ```text
//!     p = (1 - e^(-kn/m))^k
//! ```
//!
//! False negatives are never possible - bits are only ever set.

/// Return the approximate false-positive probability of a filter of `bits`
/// bits, using `hash_count` hash functions, once `n` elements are inserted.
///
/// ```rust
/// use bitdump::false_positive_probability;
///
/// let p = false_positive_probability(1 << 20, 3, 0);
/// assert_eq!(p, 0.0);
///
/// let p = false_positive_probability(1 << 20, 3, 100_000);
/// assert!(p > 0.01 && p < 0.02);
/// ```
pub fn false_positive_probability(bits: usize, hash_count: usize, n: usize) -> f64 {
    if bits == 0 {
        return 1.0;
    }

    let k = hash_count as f64;
    let exponent = -k * n as f64 / bits as f64;
    (1.0 - exponent.exp()).powf(k)
}

/// Return the number of hash functions minimising the false-positive
/// probability of a filter of `bits` bits holding `n` elements.
///
/// This is `(m / n) * ln(2)`, rounded and clamped to at least 1.
pub fn optimal_hash_count(bits: usize, n: usize) -> usize {
    if n == 0 {
        return 1;
    }

    let k = (bits as f64 / n as f64) * std::f64::consts::LN_2;
    (k.round() as usize).max(1)
}
