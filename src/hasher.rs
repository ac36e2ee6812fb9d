//! Two-to-one digest functions
//!
//! A [`Hasher`] folds two 32-byte digests into one. Roots and proofs are only
//! comparable between trees built with the same hasher, so the hasher is a
//! type parameter of [`Node`](crate::Node) and [`Tree`](crate::Tree) rather
//! than a runtime value.
//!
//! [`KeccakHasher`] is the reference: Keccak-256 (original padding) of the
//! 64-byte concatenation `left || right`.

use crate::model::{Hash, BYTES_PER_CHUNK};
use crate::trie::ZeroCache;
use crate::{Error, Result};

/// A deterministic, collision-resistant `(32 bytes, 32 bytes) -> 32 bytes` function
pub trait Hasher: Sized + Send + Sync + 'static {
    /// Short identifier, used in CLI output
    const NAME: &'static str;

    /// Hash `left || right`
    fn digest_pair(left: &Hash, right: &Hash) -> Hash;

    /// The process-wide zero-subtree cache for trees using this hasher
    ///
    /// The default looks the cache up in a registry keyed by the hasher's
    /// type. Implementors may return their own `static` instead to skip
    /// that lookup.
    fn zero_cache() -> &'static ZeroCache<Self> {
        crate::trie::registered_zero_cache::<Self>()
    }
}

/// Keccak-256 over the two concatenated digests
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeccakHasher;

impl Hasher for KeccakHasher {
    const NAME: &'static str = "keccak256";

    fn digest_pair(left: &Hash, right: &Hash) -> Hash {
        use sha3::{Digest, Keccak256};

        let mut hasher = Keccak256::new();
        hasher.update(left.as_bytes());
        hasher.update(right.as_bytes());
        let mut out = [0u8; BYTES_PER_CHUNK];
        out.copy_from_slice(&hasher.finalize());
        Hash::from_bytes(out)
    }

    fn zero_cache() -> &'static ZeroCache<Self> {
        static CACHE: ZeroCache<KeccakHasher> = ZeroCache::new();
        &CACHE
    }
}

/// BLAKE3 over the two concatenated digests
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Blake3Hasher;

impl Hasher for Blake3Hasher {
    const NAME: &'static str = "blake3";

    fn digest_pair(left: &Hash, right: &Hash) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(left.as_bytes());
        hasher.update(right.as_bytes());
        Hash::from_bytes(*hasher.finalize().as_bytes())
    }

    fn zero_cache() -> &'static ZeroCache<Self> {
        static CACHE: ZeroCache<Blake3Hasher> = ZeroCache::new();
        &CACHE
    }
}

/// Hash two raw digests, checking that both are exactly 32 bytes
pub fn digest_two<H: Hasher>(left: &[u8], right: &[u8]) -> Result<Hash> {
    for part in [left, right] {
        if part.len() != BYTES_PER_CHUNK {
            return Err(Error::InvalidDigestLength(part.len()));
        }
    }
    Ok(H::digest_pair(&Hash::from_slice(left)?, &Hash::from_slice(right)?))
}
