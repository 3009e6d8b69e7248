use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::Digest as _;

use crate::address::Address;
use crate::error::TypeError;

/// The digest function used to derive block addresses.
///
/// The digest is a configuration choice of each backend instance, never a
/// compile-time constant. The address width follows the digest and stays
/// fixed for the lifetime of the instance: a 128-bit digest yields 32 hex
/// characters, a 256-bit digest yields 64. Mixing widths fails fast at open
/// time rather than corrupting indirect block layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DigestKind {
    /// BLAKE3 truncated to 128 bits (32 hex characters). The default.
    Blake3_128,
    /// Full 256-bit BLAKE3 (64 hex characters).
    Blake3_256,
    /// SHA-256 truncated to 128 bits (32 hex characters).
    Sha256_128,
    /// Full SHA-256 (64 hex characters).
    Sha256_256,
}

impl DigestKind {
    /// Digest output length in bytes.
    pub fn digest_len(&self) -> usize {
        match self {
            Self::Blake3_128 | Self::Sha256_128 => 16,
            Self::Blake3_256 | Self::Sha256_256 => 32,
        }
    }

    /// Width of the hex-encoded address this digest produces.
    pub fn addr_width(&self) -> usize {
        self.digest_len() * 2
    }

    /// Compute the address of a block given its parts (header, payload).
    ///
    /// Parts are hashed in order with no separator, so the address is the
    /// digest of the exact bytes the backend stores.
    pub fn address_of(&self, parts: &[&[u8]]) -> Address {
        match self {
            Self::Blake3_128 | Self::Blake3_256 => {
                let mut hasher = blake3::Hasher::new();
                for part in parts {
                    hasher.update(part);
                }
                let hash = hasher.finalize();
                Address::from_digest_bytes(&hash.as_bytes()[..self.digest_len()])
            }
            Self::Sha256_128 | Self::Sha256_256 => {
                let mut hasher = sha2::Sha256::new();
                for part in parts {
                    hasher.update(part);
                }
                let hash = hasher.finalize();
                Address::from_digest_bytes(&hash[..self.digest_len()])
            }
        }
    }

    /// Canonical name, as accepted by [`FromStr`].
    pub fn name(&self) -> &'static str {
        match self {
            Self::Blake3_128 => "blake3-128",
            Self::Blake3_256 => "blake3-256",
            Self::Sha256_128 => "sha256-128",
            Self::Sha256_256 => "sha256-256",
        }
    }
}

impl Default for DigestKind {
    fn default() -> Self {
        Self::Blake3_128
    }
}

impl FromStr for DigestKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blake3-128" => Ok(Self::Blake3_128),
            "blake3-256" => Ok(Self::Blake3_256),
            "sha256-128" => Ok(Self::Sha256_128),
            "sha256-256" => Ok(Self::Sha256_256),
            other => Err(TypeError::UnknownDigest(other.to_string())),
        }
    }
}
