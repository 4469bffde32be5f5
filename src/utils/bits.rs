//! Bit manipulation utilities for hypercube vertex codes.

/// Compute Hamming distance between two vertex codes.
#[inline]
pub fn hamming_distance_u32(a: u32, b: u32) -> u32 {
    (a ^ b).count_ones()
}

/// Mask with the lowest `bits` bits set.
#[inline]
pub fn low_bits_mask(bits: usize) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Next larger integer with the same number of set bits (Gosper's hack).
///
/// Returns `None` when `x` is zero or the result would overflow.
#[inline]
pub fn next_same_popcount(x: u64) -> Option<u64> {
    if x == 0 {
        return None;
    }
    let lowest = x & x.wrapping_neg();
    let ripple = x.checked_add(lowest)?;
    let ones = ((x ^ ripple) >> 2) / lowest;
    Some(ripple | ones)
}

/// Iterator over every `width`-bit mask, ordered by popcount and then by value.
///
/// XOR-ing these masks onto a vertex code enumerates the hypercube vertices in
/// increasing Hamming distance from it.
#[derive(Debug, Clone)]
pub struct HammingMasks {
    width: usize,
    limit: u64,
    popcount: usize,
    current: Option<u64>,
}

impl HammingMasks {
    /// Create an iterator over masks of `width` bits (at most 63).
    pub fn new(width: usize) -> Self {
        debug_assert!(width < 64);
        Self {
            width,
            limit: low_bits_mask(width),
            popcount: 0,
            current: Some(0),
        }
    }

    /// Popcount of the masks currently being produced.
    pub fn popcount(&self) -> usize {
        self.popcount
    }
}

impl Iterator for HammingMasks {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        let mask = self.current?;

        let successor = next_same_popcount(mask).filter(|&m| m <= self.limit);
        self.current = match successor {
            Some(m) => Some(m),
            None if self.popcount < self.width => {
                self.popcount += 1;
                Some(low_bits_mask(self.popcount))
            }
            None => None,
        };

        Some(mask)
    }
}
