use serde::{Deserialize, Serialize};

use crate::digest::DigestKind;

/// Minimum header size: 4 hex chars of salt, a 4-char type tag, and 4 hex
/// chars of payload length.
pub const MIN_HEADER_SIZE: usize = 12;

/// Per-instance block layout configuration.
///
/// Every store, writer, and reader operates against one `Geometry` value.
/// Nothing in Casket reads layout parameters from globals: two stores with
/// different geometries can coexist in one process, and a reader opened with
/// the wrong geometry fails fast instead of misparsing blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    /// Total stored block size in bytes (header + padded payload).
    pub block_size: usize,
    /// Header size in bytes; the remainder of the block is payload.
    pub header_size: usize,
    /// Digest function deriving block addresses.
    pub digest: DigestKind,
    /// Salt written into every block header produced under this geometry.
    /// Changing the salt perturbs every address without changing content.
    pub salt: u16,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            block_size: 1024,
            header_size: 32,
            digest: DigestKind::default(),
            salt: 0,
        }
    }
}

impl Geometry {
    /// Payload bytes available in each block.
    pub fn payload_capacity(&self) -> usize {
        self.block_size - self.header_size
    }

    /// Hex width of addresses under the configured digest.
    pub fn addr_width(&self) -> usize {
        self.digest.addr_width()
    }

    /// Number of child addresses one indirect block can hold.
    pub fn indirect_capacity(&self) -> usize {
        self.payload_capacity() / self.addr_width()
    }

    /// Check that the layout is internally consistent.
    ///
    /// An indirect capacity below two would make the address fold unable to
    /// make progress, so it is rejected here rather than looping forever at
    /// write time.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.header_size < MIN_HEADER_SIZE {
            return Err(GeometryError::HeaderTooSmall {
                min: MIN_HEADER_SIZE,
                actual: self.header_size,
            });
        }
        if self.block_size <= self.header_size {
            return Err(GeometryError::BlockTooSmall {
                block_size: self.block_size,
                header_size: self.header_size,
            });
        }
        if self.payload_capacity() > u16::MAX as usize {
            return Err(GeometryError::CapacityOverflow {
                capacity: self.payload_capacity(),
                max: u16::MAX as usize,
            });
        }
        if self.indirect_capacity() < 2 {
            return Err(GeometryError::IndirectCapacityTooSmall {
                capacity: self.indirect_capacity(),
            });
        }
        Ok(())
    }
}

/// Errors from geometry validation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("header size {actual} below minimum {min}")]
    HeaderTooSmall { min: usize, actual: usize },

    #[error("block size {block_size} leaves no payload after {header_size}-byte header")]
    BlockTooSmall {
        block_size: usize,
        header_size: usize,
    },

    #[error("payload capacity {capacity} exceeds the {max}-byte header length field")]
    CapacityOverflow { capacity: usize, max: usize },

    #[error("indirect capacity {capacity} cannot fold; need at least 2 children per block")]
    IndirectCapacityTooSmall { capacity: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_constants() {
        let geo = Geometry::default();
        assert_eq!(geo.block_size, 1024);
        assert_eq!(geo.header_size, 32);
        assert_eq!(geo.payload_capacity(), 992);
        assert_eq!(geo.addr_width(), 32);
        assert_eq!(geo.indirect_capacity(), 31);
        geo.validate().unwrap();
    }

    #[test]
    fn wide_digest_shrinks_indirect_capacity() {
        let geo = Geometry {
            digest: DigestKind::Blake3_256,
            ..Geometry::default()
        };
        assert_eq!(geo.addr_width(), 64);
        assert_eq!(geo.indirect_capacity(), 15);
        geo.validate().unwrap();
    }

    #[test]
    fn rejects_tiny_header() {
        let geo = Geometry {
            header_size: 8,
            ..Geometry::default()
        };
        assert!(matches!(
            geo.validate(),
            Err(GeometryError::HeaderTooSmall { .. })
        ));
    }

    #[test]
    fn rejects_block_without_payload() {
        let geo = Geometry {
            block_size: 32,
            header_size: 32,
            ..Geometry::default()
        };
        assert!(matches!(
            geo.validate(),
            Err(GeometryError::BlockTooSmall { .. })
        ));
    }

    #[test]
    fn rejects_capacity_beyond_length_field() {
        let geo = Geometry {
            block_size: 70_000,
            ..Geometry::default()
        };
        assert!(matches!(
            geo.validate(),
            Err(GeometryError::CapacityOverflow { .. })
        ));
    }

    #[test]
    fn rejects_unfoldable_indirect_capacity() {
        // 63-byte payload holds at most one 32-char address: the fold could
        // never reduce the pending list.
        let geo = Geometry {
            block_size: 95,
            header_size: 32,
            ..Geometry::default()
        };
        assert!(matches!(
            geo.validate(),
            Err(GeometryError::IndirectCapacityTooSmall { .. })
        ));
    }
}
