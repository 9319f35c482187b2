//! Feature hashing primitives
//!
//! Every hash produced by the parser goes through one of the functions here. The values
//! are consumed bit-for-bit by the learner, so the arithmetic (32-bit murmur widened to
//! 64 bits, wrapping adds and multiplies) must not change.

/// Multiplier used for quadratic interactions and dictionary keys.
pub const QUADRATIC_CONSTANT: u64 = 27942141;
/// Base multiplier for affix feature hashes.
pub const AFFIX_CONSTANT: u64 = 13903957;

/// Signature shared by the feature hashers.
pub type HashFn = fn(&[u8], u64) -> u64;

/// Which hasher turns feature names into hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashStrategy {
    /// All-digit tokens hash to their numeric value plus the seed.
    #[default]
    Strings,
    /// Every token is hashed as raw bytes.
    All,
}

impl HashStrategy {
    pub fn hasher(self) -> HashFn {
        match self {
            HashStrategy::Strings => hash_string,
            HashStrategy::All => hash_all,
        }
    }
}

#[inline]
fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

/// MurmurHash3, x86 32-bit variant.
pub fn murmurhash3_x86_32(data: &[u8], seed: u32) -> u32 {
    const C1: u32 = 0xcc9e_2d51;
    const C2: u32 = 0x1b87_3593;

    let mut h1 = seed;
    let mut blocks = data.chunks_exact(4);
    for block in &mut blocks {
        let mut k1 = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
        k1 = k1.wrapping_mul(C1);
        k1 = k1.rotate_left(15);
        k1 = k1.wrapping_mul(C2);

        h1 ^= k1;
        h1 = h1.rotate_left(13);
        h1 = h1.wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    let tail = blocks.remainder();
    let mut k1: u32 = 0;
    if tail.len() >= 3 {
        k1 ^= (tail[2] as u32) << 16;
    }
    if tail.len() >= 2 {
        k1 ^= (tail[1] as u32) << 8;
    }
    if !tail.is_empty() {
        k1 ^= tail[0] as u32;
        k1 = k1.wrapping_mul(C1);
        k1 = k1.rotate_left(15);
        k1 = k1.wrapping_mul(C2);
        h1 ^= k1;
    }

    h1 ^= data.len() as u32;
    fmix32(h1)
}

/// Murmur of the bytes, seed truncated to 32 bits.
#[inline]
pub fn uniform_hash(data: &[u8], seed: u64) -> u64 {
    murmurhash3_x86_32(data, seed as u32) as u64
}

/// Numeric-aware string hash.
///
/// Surrounding ASCII whitespace and control bytes are trimmed first. A token made only of
/// decimal digits hashes to its value plus `seed`, anything else to [`uniform_hash`].
pub fn hash_string(data: &[u8], seed: u64) -> u64 {
    let is_blank = |b: &u8| *b <= 0x20;
    let start = data.iter().position(|b| !is_blank(b)).unwrap_or(data.len());
    let end = data
        .iter()
        .rposition(|b| !is_blank(b))
        .map_or(start, |i| i + 1);
    let trimmed = &data[start..end];

    let mut ret: u64 = 0;
    for &b in trimmed {
        if b.is_ascii_digit() {
            ret = ret.wrapping_mul(10).wrapping_add((b - b'0') as u64);
        } else {
            return uniform_hash(trimmed, seed);
        }
    }
    ret.wrapping_add(seed)
}

/// Plain byte hash, no trimming and no numeric shortcut.
#[inline]
pub fn hash_all(data: &[u8], seed: u64) -> u64 {
    uniform_hash(data, seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn murmur_matches_reference_vectors() {
        assert_eq!(murmurhash3_x86_32(b"", 0), 0);
        assert_eq!(murmurhash3_x86_32(b"", 1), 0x514e_28b7);
        assert_eq!(murmurhash3_x86_32(b"", 0xffff_ffff), 0x81f1_6f39);
        assert_eq!(murmurhash3_x86_32(b"test", 0), 0xba6b_d213);
        assert_eq!(
            murmurhash3_x86_32(b"The quick brown fox jumps over the lazy dog", 0),
            0x2e4f_f723
        );
    }

    #[test]
    fn uniform_hash_truncates_seed() {
        assert_eq!(uniform_hash(b"abc", 7), uniform_hash(b"abc", (1u64 << 32) + 7));
    }

    #[test]
    fn digits_hash_to_their_value() {
        assert_eq!(hash_string(b"1234", 0), 1234);
        assert_eq!(hash_string(b"  42 ", 10), 52);
        assert_eq!(hash_string(b"", 99), 99);
    }

    #[test]
    fn non_digits_use_murmur_on_trimmed_text() {
        assert_eq!(hash_string(b" abc ", 3), uniform_hash(b"abc", 3));
        assert_eq!(hash_string(b"12a", 0), uniform_hash(b"12a", 0));
    }

    #[test]
    fn hash_all_ignores_numeric_shortcut() {
        assert_eq!(hash_all(b"1234", 0), uniform_hash(b"1234", 0));
        assert_ne!(hash_all(b"1234", 0), 1234);
    }

    #[test]
    fn strategy_selects_hasher() {
        assert_eq!((HashStrategy::Strings.hasher())(b"7", 1), 8);
        assert_eq!((HashStrategy::All.hasher())(b"7", 1), uniform_hash(b"7", 1));
    }
}
