//! 32-byte chunk and digest type

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of bytes in one chunk of merkleized content
pub const BYTES_PER_CHUNK: usize = 32;

/// A 32-byte value: either a leaf chunk or the root digest of a subtree
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash([u8; BYTES_PER_CHUNK]);

impl Hash {
    /// The all-zero chunk (the payload of the depth-0 zero subtree)
    pub const ZERO: Hash = Hash([0u8; BYTES_PER_CHUNK]);

    /// Create a hash from raw bytes
    pub const fn from_bytes(bytes: [u8; BYTES_PER_CHUNK]) -> Self {
        Hash(bytes)
    }

    /// Create a hash from a slice that must be exactly 32 bytes long
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; BYTES_PER_CHUNK] = bytes
            .try_into()
            .map_err(|_| Error::InvalidDigestLength(bytes.len()))?;
        Ok(Hash(arr))
    }

    /// A chunk with every byte set to `byte`
    pub const fn repeat(byte: u8) -> Self {
        Hash([byte; BYTES_PER_CHUNK])
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; BYTES_PER_CHUNK] {
        &self.0
    }

    /// Mutable access, only used while assembling a fresh chunk
    pub(crate) fn as_mut_bytes(&mut self) -> &mut [u8; BYTES_PER_CHUNK] {
        &mut self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string, with or without a `0x` prefix
    pub fn from_hex(s: &str) -> std::result::Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        if bytes.len() != BYTES_PER_CHUNK {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; BYTES_PER_CHUNK];
        arr.copy_from_slice(&bytes);
        Ok(Hash(arr))
    }

    /// Get a short prefix for display (first 8 hex chars)
    pub fn short(&self) -> String {
        self.to_hex()[..8].to_string()
    }

    /// Check if this is the zero chunk
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; BYTES_PER_CHUNK]
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.short())
    }
}

impl Default for Hash {
    fn default() -> Self {
        Hash::ZERO
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; BYTES_PER_CHUNK]> for Hash {
    fn from(bytes: [u8; BYTES_PER_CHUNK]) -> Self {
        Hash(bytes)
    }
}
