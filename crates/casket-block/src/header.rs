use casket_types::Geometry;

use crate::error::{BlockError, BlockResult};

/// Filler byte for header padding and unused payload bytes.
pub const FILL: u8 = b'-';

/// The two block kinds, identified by a four-byte ASCII tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    /// Payload is a literal slice of the original stream.
    Data,
    /// Payload is an ordered, packed run of child addresses.
    Indirect,
}

impl BlockKind {
    /// The wire tag for this kind.
    pub fn tag(&self) -> &'static [u8; 4] {
        match self {
            Self::Data => b"DATA",
            Self::Indirect => b"INDB",
        }
    }

    /// Parse a wire tag. Returns `None` for unrecognized tags so the caller
    /// can report the tag it actually saw.
    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"DATA" => Some(Self::Data),
            b"INDB" => Some(Self::Indirect),
            _ => None,
        }
    }
}

/// Decoded form of the fixed-size block header.
///
/// Layout: 4 hex chars of salt, the 4-char kind tag, 4 hex chars of payload
/// length, then `-` padding out to `header_size`. Encoding is deterministic:
/// the same header fields always produce the same bytes, which keeps block
/// addresses stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    pub kind: BlockKind,
    pub payload_len: u16,
    pub salt: u16,
}

impl BlockHeader {
    pub fn new(kind: BlockKind, payload_len: u16, salt: u16) -> Self {
        Self {
            kind,
            payload_len,
            salt,
        }
    }

    /// Serialize to exactly `geometry.header_size` bytes.
    pub fn encode(&self, geometry: &Geometry) -> Vec<u8> {
        let mut head = Vec::with_capacity(geometry.header_size);
        head.extend_from_slice(format!("{:04x}", self.salt).as_bytes());
        head.extend_from_slice(self.kind.tag());
        head.extend_from_slice(format!("{:04x}", self.payload_len).as_bytes());
        head.resize(geometry.header_size, FILL);
        head
    }

    /// Parse header bytes.
    ///
    /// Fails with [`BlockError::MalformedHeader`] on wrong length, an
    /// unparseable numeric field, or a payload length beyond capacity, and
    /// with [`BlockError::UnsupportedBlockType`] on an unknown tag.
    pub fn decode(bytes: &[u8], geometry: &Geometry) -> BlockResult<Self> {
        if bytes.len() != geometry.header_size {
            return Err(BlockError::MalformedHeader(format!(
                "expected {} header bytes, got {}",
                geometry.header_size,
                bytes.len()
            )));
        }

        let salt = parse_hex_field(&bytes[0..4], "salt")?;

        let tag = &bytes[4..8];
        let kind = BlockKind::from_tag(tag).ok_or_else(|| BlockError::UnsupportedBlockType {
            tag: String::from_utf8_lossy(tag).into_owned(),
        })?;

        let payload_len = parse_hex_field(&bytes[8..12], "payload length")?;
        if payload_len as usize > geometry.payload_capacity() {
            return Err(BlockError::MalformedHeader(format!(
                "payload length {} exceeds capacity {}",
                payload_len,
                geometry.payload_capacity()
            )));
        }

        Ok(Self {
            kind,
            payload_len,
            salt,
        })
    }
}

fn parse_hex_field(bytes: &[u8], what: &str) -> BlockResult<u16> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| BlockError::MalformedHeader(format!("{what} field is not ASCII")))?;
    u16::from_str_radix(text, 16)
        .map_err(|_| BlockError::MalformedHeader(format!("{what} field {text:?} is not hex")))
}
