// crates/fastpred-core/src/similarity.rs

/// Set-bit count of every byte value.
pub const POPCOUNT_TABLE: [u8; 256] = build_table();

const fn build_table() -> [u8; 256] {
    let mut t = [0u8; 256];
    let mut i = 1;
    while i < 256 {
        t[i] = (i & 1) as u8 + t[i >> 1];
        i += 1;
    }
    t
}

#[inline]
pub fn popcount(byte: u8) -> u32 {
    POPCOUNT_TABLE[byte as usize] as u32
}

pub fn popcount_slice(bytes: &[u8]) -> u64 {
    bytes.iter().map(|&b| popcount(b) as u64).sum()
}

/// Set bits common to `a` and `b`.
pub fn intersection(a: &[u8], b: &[u8]) -> u64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(&x, &y)| popcount(x & y) as u64).sum()
}

/// Tanimoto from bit counts: `common` shared bits, `a` and `b` set bits.
///
/// Counts are `u64`: a `u32` bit length allows payloads whose popcount sum
/// does not fit in 32 bits.
pub fn tanimoto_counts(common: u64, a: u64, b: u64) -> f64 {
    let union = a + b - common;
    common as f64 / union as f64
}

/// Tanimoto coefficient `|a∩b| / (|a| + |b| - |a∩b|)`.
///
/// Two all-zero fingerprints give `0/0`, i.e. NaN. That is the expected
/// value, not an error.
pub fn tanimoto(a: &[u8], b: &[u8]) -> f64 {
    QueryBits::new(a).score(b)
}

/// A query fingerprint with its popcount computed once, scored against many
/// reference payloads of the same byte length.
#[derive(Clone, Copy, Debug)]
pub struct QueryBits<'a> {
    bytes: &'a [u8],
    count: u64,
}

impl<'a> QueryBits<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, count: popcount_slice(bytes) }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn score(&self, other: &[u8]) -> f64 {
        tanimoto_counts(intersection(self.bytes, other), self.count, popcount_slice(other))
    }
}
