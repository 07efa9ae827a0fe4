//! String hashing owned by the table.
//!
//! Bucket placement must not depend on process-wide hashing state, so the
//! table never goes through `std::hash::Hash`. Instead it asks a
//! [`KeyHasher`] for a 64-bit digest of the raw key bytes.

/// A pure function from key bytes to a 64-bit digest.
///
/// Implementations must return the same digest for the same bytes for the
/// whole lifetime of every table using them. Randomly seeded hashers break
/// the "same key, same bucket" invariant and must not be used here.
pub trait KeyHasher {
    fn hash(&self, key: &[u8]) -> u64;
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a.
///
/// Cheap for short identifiers like `P000123` and spreads sequential ids
/// well over prime bucket counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fnv1a;

impl KeyHasher for Fnv1a {
    #[inline]
    fn hash(&self, key: &[u8]) -> u64 {
        let mut h = FNV_OFFSET_BASIS;
        for &b in key {
            h ^= b as u64;
            h = h.wrapping_mul(FNV_PRIME);
        }
        h
    }
}

impl<F> KeyHasher for F
where
    F: Fn(&[u8]) -> u64,
{
    #[inline]
    fn hash(&self, key: &[u8]) -> u64 {
        self(key)
    }
}
