//! Adler-32 checksum (RFC 1950).
//!
//! Two 16-bit sums over the data, `s1 = 1 + Σ byte` and `s2 = Σ s1`, both
//! modulo 65521. The modulo is taken once per [`NMAX`] bytes: 5552 is the
//! largest `n` for which `255·n·(n+1)/2 + (n+1)·65520` still fits in a
//! `u32`, so `s2` cannot wrap before the reduction.

/// Largest prime below 2^16.
pub const ADLER_MOD: u32 = 65521;

/// Largest number of bytes summed between reductions.
pub const NMAX: usize = 5552;

/// Fold `data` into a running Adler-32 value.
///
/// Start from `1` for a fresh checksum. Updating is additive: feeding a
/// buffer in any partition gives the same result as feeding it whole.
pub fn adler32(adler: u32, data: &[u8]) -> u32 {
    let mut s1 = adler & 0xFFFF;
    let mut s2 = adler >> 16;

    for chunk in data.chunks(NMAX) {
        let mut quads = chunk.chunks_exact(4);
        for q in quads.by_ref() {
            s1 += q[0] as u32;
            s2 += s1;
            s1 += q[1] as u32;
            s2 += s1;
            s1 += q[2] as u32;
            s2 += s1;
            s1 += q[3] as u32;
            s2 += s1;
        }
        for &b in quads.remainder() {
            s1 += b as u32;
            s2 += s1;
        }
        s1 %= ADLER_MOD;
        s2 %= ADLER_MOD;
    }

    (s2 << 16) | s1
}

/// Running Adler-32 accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adler32 {
    value: u32,
}

impl Adler32 {
    /// Create a fresh accumulator (value 1).
    pub const fn new() -> Self {
        Self { value: 1 }
    }

    /// Resume from a previously returned value.
    pub const fn from_value(value: u32) -> Self {
        Self { value }
    }

    /// Fold more bytes into the checksum.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        if !data.is_empty() {
            self.value = adler32(self.value, data);
        }
    }

    /// Current checksum value.
    #[inline]
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Back to the initial value.
    pub fn reset(&mut self) {
        self.value = 1;
    }
}

impl Default for Adler32 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference: one reduction per byte.
    fn adler32_naive(data: &[u8]) -> u32 {
        let mut a: u32 = 1;
        let mut b: u32 = 0;
        for &byte in data {
            a = (a + byte as u32) % ADLER_MOD;
            b = (b + a) % ADLER_MOD;
        }
        (b << 16) | a
    }

    #[test]
    fn test_adler32_vectors() {
        assert_eq!(adler32(1, b""), 1);
        assert_eq!(adler32(1, b"a"), 0x00620062);
        assert_eq!(adler32(1, b"abc"), 0x024d0127);
        assert_eq!(adler32(1, b"Wikipedia"), 0x11E60398);
        assert_eq!(adler32(1, b"wikipedia"), 0x130603B8);
    }

    #[test]
    fn test_all_ff_past_nmax() {
        // Worst case for s2 growth: every byte at its maximum value.
        for size in [NMAX - 1, NMAX, NMAX + 1, 3 * NMAX + 7, 100_000] {
            let data = vec![0xFFu8; size];
            assert_eq!(adler32(1, &data), adler32_naive(&data), "size {}", size);
        }
    }

    #[test]
    fn test_partitioned_update() {
        let data: Vec<u8> = (0..20_000u32).map(|i| (i * 31 + 7) as u8).collect();
        let whole = adler32(1, &data);
        let mut acc = Adler32::new();
        for piece in data.chunks(333) {
            acc.update(piece);
        }
        assert_eq!(acc.value(), whole);
    }

    #[test]
    fn test_resume_from_value() {
        let mut acc = Adler32::from_value(adler32(1, b"Wiki"));
        acc.update(b"pedia");
        assert_eq!(acc.value(), 0x11E60398);
        acc.reset();
        assert_eq!(acc.value(), 1);
    }
}
