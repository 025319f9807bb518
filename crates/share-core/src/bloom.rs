//! `ShareBloom` — a k-hash bloom filter over lowercased tokens, used to
//! short-circuit search queries that can't possibly match anything shared.
//!
//! Uses double hashing (Kirsch/Mitzenmacher) over a 128-bit xxh3 digest
//! instead of k independent hash functions, the same construction
//! `fjall-rs`'s `BloomFilter` uses for its segment filters.

use xxhash_rust::xxh3::xxh3_128;

/// Number of derived hash probes per element. The original's
/// `BloomFilter<5>` fixes this at compile time; five probes keeps the
/// false-positive rate low without growing the bit array unreasonably for
/// the handful-of-tokens-per-query workload this filter serves.
const HASH_COUNT: u64 = 5;

type CompositeHash = (u64, u64);

#[derive(Debug)]
pub struct ShareBloom {
    bits: Vec<u8>,
    bit_count: u64,
    /// Tracks how many elements have been added since the filter was sized,
    /// so the refresh subsystem can decide when the false-positive rate has
    /// risen enough to warrant a full rebuild (policy lives outside this
    /// type; it only exposes the counter).
    len: usize,
}

impl ShareBloom {
    /// Size a filter for roughly `expected_items` tokens (directory + file
    /// names, lowercased) at a sane bits-per-key default.
    pub fn with_expected_items(expected_items: usize) -> Self {
        const BITS_PER_KEY: usize = 10;
        let bit_count = (expected_items.max(1) * BITS_PER_KEY).next_power_of_two();
        Self {
            bits: vec![0u8; bit_count / 8],
            bit_count: bit_count as u64,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn hash(key: &str) -> CompositeHash {
        let h0 = xxh3_128(key.as_bytes());
        ((h0 >> 64) as u64, h0 as u64)
    }

    fn get_bit(&self, idx: u64) -> bool {
        let byte = self.bits[(idx / 8) as usize];
        (byte & (1 << (idx % 8))) != 0
    }

    fn set_bit(&mut self, idx: u64) {
        let byte = &mut self.bits[(idx / 8) as usize];
        *byte |= 1 << (idx % 8);
    }

    /// Feed a lowercased name into the filter. Append-only: there is no way
    /// to unset bits belonging to a removed name short of a full rebuild.
    pub fn add(&mut self, lower_name: &str) {
        let (mut h1, mut h2) = Self::hash(lower_name);
        for i in 0..HASH_COUNT {
            let idx = h1 % self.bit_count;
            self.set_bit(idx);
            h1 = h1.wrapping_add(h2);
            h2 = h2.wrapping_add(i);
        }
        self.len += 1;
    }

    /// Returns `true` if every token might be present (never a false
    /// negative); `false` means the name was definitely never added.
    pub fn contains(&self, lower_name: &str) -> bool {
        let (mut h1, mut h2) = Self::hash(lower_name);
        for i in 0..HASH_COUNT {
            let idx = h1 % self.bit_count;
            if !self.get_bit(idx) {
                return false;
            }
            h1 = h1.wrapping_add(h2);
            h2 = h2.wrapping_add(i);
        }
        true
    }

    /// A query's include tokens all have to pass the filter before the
    /// (expensive) tree walk runs at all.
    pub fn contains_all<'a>(&self, tokens: impl IntoIterator<Item = &'a str>) -> bool {
        tokens.into_iter().all(|t| self.contains(t))
    }
}
