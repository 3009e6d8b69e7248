use casket_types::{Address, Geometry};

use crate::error::{BlockError, BlockResult};
use crate::header::{BlockHeader, BlockKind, FILL};

/// One fully-assembled block: a decoded header plus the payload padded to
/// capacity. The header's `payload_len` bounds the live region; padding bytes
/// are stored and hashed but never read back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    header: BlockHeader,
    payload: Vec<u8>,
}

impl Block {
    /// Build a DATA block from a chunk of stream bytes.
    pub fn data(chunk: &[u8], geometry: &Geometry) -> BlockResult<Self> {
        let capacity = geometry.payload_capacity();
        if chunk.len() > capacity {
            return Err(BlockError::PayloadTooLarge {
                len: chunk.len(),
                capacity,
            });
        }
        let mut payload = vec![FILL; capacity];
        payload[..chunk.len()].copy_from_slice(chunk);
        Ok(Self {
            header: BlockHeader::new(BlockKind::Data, chunk.len() as u16, geometry.salt),
            payload,
        })
    }

    /// Build an INDIRECT block packing `children` in order.
    pub fn indirect(children: &[Address], geometry: &Geometry) -> BlockResult<Self> {
        let capacity = geometry.indirect_capacity();
        if children.len() > capacity {
            return Err(BlockError::TooManyChildren {
                count: children.len(),
                capacity,
            });
        }
        let width = geometry.addr_width();
        let mut payload = vec![FILL; geometry.payload_capacity()];
        for (i, child) in children.iter().enumerate() {
            if child.width() != width {
                return Err(BlockError::AddressWidth {
                    expected: width,
                    actual: child.width(),
                });
            }
            payload[i * width..(i + 1) * width].copy_from_slice(child.as_bytes());
        }
        Ok(Self {
            header: BlockHeader::new(
                BlockKind::Indirect,
                (children.len() * width) as u16,
                geometry.salt,
            ),
            payload,
        })
    }

    /// Parse raw stored bytes back into a block.
    pub fn parse(bytes: &[u8], geometry: &Geometry) -> BlockResult<Self> {
        if bytes.len() != geometry.block_size {
            return Err(BlockError::WrongBlockLength {
                expected: geometry.block_size,
                actual: bytes.len(),
            });
        }
        let header = BlockHeader::decode(&bytes[..geometry.header_size], geometry)?;
        Ok(Self {
            header,
            payload: bytes[geometry.header_size..].to_vec(),
        })
    }

    pub fn kind(&self) -> BlockKind {
        self.header.kind
    }

    pub fn payload_len(&self) -> usize {
        self.header.payload_len as usize
    }

    /// The live payload region.
    pub fn payload(&self) -> &[u8] {
        &self.payload[..self.payload_len()]
    }

    /// The full, padded payload as stored on disk.
    pub fn padded_payload(&self) -> &[u8] {
        &self.payload
    }

    /// The serialized header for this block.
    pub fn header_bytes(&self, geometry: &Geometry) -> Vec<u8> {
        self.header.encode(geometry)
    }

    /// Ordered child addresses of an indirect block.
    pub fn child_addresses(&self, geometry: &Geometry) -> BlockResult<Vec<Address>> {
        if self.header.kind != BlockKind::Indirect {
            return Err(BlockError::NotIndirect);
        }
        let width = geometry.addr_width();
        let live = self.payload();
        if live.len() % width != 0 {
            return Err(BlockError::MalformedPayload(format!(
                "live region of {} bytes is not a multiple of address width {}",
                live.len(),
                width
            )));
        }
        live.chunks(width)
            .map(|raw| {
                let text = std::str::from_utf8(raw)
                    .map_err(|_| BlockError::MalformedPayload("address is not ASCII".into()))?;
                Address::from_hex(text).map_err(|e| BlockError::MalformedPayload(e.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casket_types::DigestKind;

    fn geo() -> Geometry {
        Geometry::default()
    }

    fn addr(seed: u8) -> Address {
        DigestKind::Blake3_128.address_of(&[&[seed]])
    }

    #[test]
    fn data_block_pads_to_capacity() {
        let block = Block::data(b"hello", &geo()).unwrap();
        assert_eq!(block.kind(), BlockKind::Data);
        assert_eq!(block.payload(), b"hello");
        assert_eq!(block.padded_payload().len(), 992);
        assert!(block.padded_payload()[5..].iter().all(|&b| b == FILL));
    }

    #[test]
    fn data_block_rejects_oversized_chunk() {
        let chunk = vec![0u8; 993];
        let err = Block::data(&chunk, &geo()).unwrap_err();
        assert!(matches!(err, BlockError::PayloadTooLarge { .. }));
    }

    #[test]
    fn full_capacity_data_block() {
        let chunk = vec![7u8; 992];
        let block = Block::data(&chunk, &geo()).unwrap();
        assert_eq!(block.payload_len(), 992);
        assert_eq!(block.payload(), chunk.as_slice());
    }

    #[test]
    fn indirect_packs_children_in_order() {
        let children = vec![addr(1), addr(2), addr(3)];
        let block = Block::indirect(&children, &geo()).unwrap();
        assert_eq!(block.kind(), BlockKind::Indirect);
        assert_eq!(block.payload_len(), 3 * 32);
        assert_eq!(block.child_addresses(&geo()).unwrap(), children);
    }

    #[test]
    fn indirect_rejects_overfull_batch() {
        let children: Vec<Address> = (0u8..32).map(addr).collect();
        let err = Block::indirect(&children, &geo()).unwrap_err();
        assert!(matches!(err, BlockError::TooManyChildren { .. }));
    }

    #[test]
    fn indirect_rejects_width_mismatch() {
        let wide = DigestKind::Blake3_256.address_of(&[b"wide"]);
        let err = Block::indirect(&[wide], &geo()).unwrap_err();
        assert_eq!(
            err,
            BlockError::AddressWidth {
                expected: 32,
                actual: 64
            }
        );
    }

    #[test]
    fn parse_roundtrip() {
        let original = Block::data(b"roundtrip", &geo()).unwrap();
        let mut bytes = original.header_bytes(&geo());
        bytes.extend_from_slice(original.padded_payload());
        let parsed = Block::parse(&bytes, &geo()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let err = Block::parse(&[0u8; 100], &geo()).unwrap_err();
        assert!(matches!(err, BlockError::WrongBlockLength { .. }));
    }

    #[test]
    fn children_of_data_block_is_an_error() {
        let block = Block::data(b"not a tree", &geo()).unwrap();
        assert_eq!(block.child_addresses(&geo()).unwrap_err(), BlockError::NotIndirect);
    }

    #[test]
    fn child_extraction_rejects_garbage_payload() {
        // Hand-build an indirect block whose live region is not hex.
        let mut bytes = BlockHeader::new(BlockKind::Indirect, 32, 0).encode(&geo());
        bytes.extend_from_slice(&vec![b'!'; 992]);
        let block = Block::parse(&bytes, &geo()).unwrap();
        let err = block.child_addresses(&geo()).unwrap_err();
        assert!(matches!(err, BlockError::MalformedPayload(_)));
    }

    #[test]
    fn child_extraction_rejects_ragged_live_region() {
        let mut bytes = BlockHeader::new(BlockKind::Indirect, 33, 0).encode(&geo());
        bytes.extend_from_slice(&vec![b'a'; 992]);
        let block = Block::parse(&bytes, &geo()).unwrap();
        let err = block.child_addresses(&geo()).unwrap_err();
        assert!(matches!(err, BlockError::MalformedPayload(_)));
    }
}
