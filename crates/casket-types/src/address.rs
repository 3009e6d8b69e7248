use std::fmt;

use crate::error::TypeError;

/// Content-addressed identifier for a stored block.
///
/// An `Address` is the lowercase-hex encoding of a digest computed over a
/// block's header and payload bytes. Identical block bytes always produce the
/// same `Address`, making blocks deduplicatable and verifiable. The encoded
/// width is fixed per backend instance and determined by the configured
/// [`DigestKind`](crate::DigestKind).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(String);

impl Address {
    /// Build an `Address` from raw digest output.
    pub fn from_digest_bytes(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    /// Parse from a hex string. Only lowercase hex is canonical; anything
    /// else is rejected so that one block never has two spellings.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        if s.is_empty() || s.len() % 2 != 0 {
            return Err(TypeError::InvalidLength {
                expected: s.len() + s.len() % 2,
                actual: s.len(),
            });
        }
        if !s
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(TypeError::InvalidHex(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// The hex string form, as packed into indirect block payloads and used
    /// as the filesystem backend's object name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The hex string as raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Encoded width in bytes (hex characters).
    pub fn width(&self) -> usize {
        self.0.len()
    }

    /// Short form (first 8 hex characters) for logs and display.
    pub fn short_hex(&self) -> &str {
        &self.0[..self.0.len().min(8)]
    }
}

impl serde::Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

// Deserialization validates through `from_hex`: addresses arriving off the
// wire name filesystem objects, so nothing but lowercase hex may get through.
impl<'de> serde::Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.short_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
