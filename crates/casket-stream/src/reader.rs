use std::collections::VecDeque;
use std::io::Write;
use std::sync::Arc;

use casket_block::{Block, BlockKind};
use casket_store::BlockStore;
use casket_types::{Address, Lifecycle};

use crate::error::{StreamError, StreamResult};

/// Reconstructs a stream from its root address.
///
/// Traversal is an explicit FIFO queue, never recursion: the writer's fold
/// packs children of one indirect block consecutively and in original order,
/// and indirect blocks themselves are produced and referenced in original
/// order, so breadth-first dequeue order is exactly original byte order —
/// for trees of any depth and width, with no call-stack bound.
pub struct StreamReader {
    store: Arc<dyn BlockStore>,
    queue: VecDeque<Address>,
    state: Lifecycle,
}

impl std::fmt::Debug for StreamReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamReader")
            .field("queue", &self.queue)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl StreamReader {
    /// Seed a reader with a stream's root address.
    ///
    /// Fails fast with [`StreamError::AddressWidth`] when the root was minted
    /// under a different digest than the store's geometry.
    pub fn new(store: Arc<dyn BlockStore>, root: Address) -> StreamResult<Self> {
        let expected = store.geometry().addr_width();
        if root.width() != expected {
            return Err(StreamError::AddressWidth {
                expected,
                actual: root.width(),
            });
        }
        let mut queue = VecDeque::new();
        queue.push_back(root);
        Ok(Self {
            store,
            queue,
            state: Lifecycle::Open,
        })
    }

    /// Walk the tree and write the original stream bytes into `sink`.
    /// Returns the number of payload bytes written.
    ///
    /// The queue is consumed as it is walked; a second call returns 0.
    pub fn read(&mut self, mut sink: impl Write) -> StreamResult<u64> {
        self.ensure_open()?;
        let geometry = *self.store.geometry();
        let mut bytes_read = 0u64;

        while let Some(address) = self.queue.pop_front() {
            let bytes = self.store.get(&address)?;
            let block = Block::parse(&bytes, &geometry)?;
            match block.kind() {
                BlockKind::Data => {
                    sink.write_all(block.payload())?;
                    bytes_read += block.payload_len() as u64;
                }
                BlockKind::Indirect => {
                    for child in block.child_addresses(&geometry)? {
                        self.queue.push_back(child);
                    }
                }
            }
        }

        sink.flush()?;
        Ok(bytes_read)
    }

    /// Close the reader and drop any unwalked addresses. Terminal.
    pub fn close(&mut self) -> StreamResult<()> {
        self.ensure_open()?;
        self.queue.clear();
        self.state = Lifecycle::Closed;
        Ok(())
    }

    fn ensure_open(&self) -> StreamResult<()> {
        if self.state.is_open() {
            Ok(())
        } else {
            Err(StreamError::NotOpen("reader"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::StreamWriter;
    use casket_block::{BlockError, BlockHeader};
    use casket_store::{MemoryBlockStore, StoreError};
    use casket_types::{DigestKind, Geometry};
    use proptest::prelude::*;

    fn open_store() -> Arc<MemoryBlockStore> {
        Arc::new(MemoryBlockStore::new(Geometry::default()).unwrap())
    }

    /// 96-byte blocks with two-child indirect blocks: deep trees from a few
    /// hundred bytes of input.
    fn tiny_geometry() -> Geometry {
        Geometry {
            block_size: 96,
            header_size: 32,
            ..Geometry::default()
        }
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn roundtrip(store: Arc<MemoryBlockStore>, content: &[u8]) -> Vec<u8> {
        let receipt = StreamWriter::new(store.clone()).write(content).unwrap();
        let mut out = Vec::new();
        let mut reader = StreamReader::new(store, receipt.root).unwrap();
        let n = reader.read(&mut out).unwrap();
        assert_eq!(n, content.len() as u64);
        out
    }

    #[test]
    fn roundtrip_single_block() {
        let content = pattern(992);
        assert_eq!(roundtrip(open_store(), &content), content);
    }

    #[test]
    fn roundtrip_two_blocks_in_order() {
        let content = pattern(993);
        assert_eq!(roundtrip(open_store(), &content), content);
    }

    #[test]
    fn roundtrip_empty_stream() {
        assert_eq!(roundtrip(open_store(), &[]), Vec::<u8>::new());
    }

    #[test]
    fn roundtrip_multi_round_fold() {
        // 32 data blocks: two indirect rounds under the default geometry.
        let content = pattern(992 * 31 + 17);
        assert_eq!(roundtrip(open_store(), &content), content);
    }

    #[test]
    fn roundtrip_deep_tree_with_tiny_blocks() {
        let store = Arc::new(MemoryBlockStore::new(tiny_geometry()).unwrap());
        // 64-byte payloads, 2-child indirects: several fold rounds deep.
        let content = pattern(64 * 40 + 5);
        assert_eq!(roundtrip(store, &content), content);
    }

    #[test]
    fn second_read_yields_nothing() {
        let store = open_store();
        let receipt = StreamWriter::new(store.clone())
            .write(pattern(993).as_slice())
            .unwrap();

        let mut reader = StreamReader::new(store, receipt.root).unwrap();
        let mut out = Vec::new();
        assert_eq!(reader.read(&mut out).unwrap(), 993);
        assert_eq!(reader.read(&mut out).unwrap(), 0);
    }

    #[test]
    fn missing_root_aborts_with_not_found() {
        let store = open_store();
        let root = Geometry::default().digest.address_of(&[b"never stored"]);
        let mut reader = StreamReader::new(store, root).unwrap();
        let err = reader.read(&mut Vec::new()).unwrap_err();
        assert!(matches!(err, StreamError::Store(StoreError::NotFound(_))));
    }

    #[test]
    fn unknown_block_type_aborts() {
        let store = open_store();
        let geometry = Geometry::default();

        let mut header = BlockHeader::new(BlockKind::Data, 4, 0).encode(&geometry);
        header[4..8].copy_from_slice(b"HUHW");
        let payload = vec![b'-'; geometry.payload_capacity()];
        let root = store.put(&header, &payload).unwrap();

        let mut reader = StreamReader::new(store, root).unwrap();
        let err = reader.read(&mut Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            StreamError::Block(BlockError::UnsupportedBlockType { .. })
        ));
    }

    #[test]
    fn malformed_header_aborts() {
        let store = open_store();
        let geometry = Geometry::default();

        let mut header = BlockHeader::new(BlockKind::Data, 4, 0).encode(&geometry);
        header[8..12].copy_from_slice(b"????");
        let payload = vec![b'-'; geometry.payload_capacity()];
        let root = store.put(&header, &payload).unwrap();

        let mut reader = StreamReader::new(store, root).unwrap();
        let err = reader.read(&mut Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            StreamError::Block(BlockError::MalformedHeader(_))
        ));
    }

    #[test]
    fn root_width_mismatch_fails_at_open() {
        let store = open_store();
        let wide_root = DigestKind::Blake3_256.address_of(&[b"wide"]);
        let err = StreamReader::new(store, wide_root).unwrap_err();
        assert!(matches!(
            err,
            StreamError::AddressWidth {
                expected: 32,
                actual: 64
            }
        ));
    }

    #[test]
    fn closed_reader_rejects_reads() {
        let store = open_store();
        let receipt = StreamWriter::new(store.clone())
            .write(pattern(10).as_slice())
            .unwrap();

        let mut reader = StreamReader::new(store, receipt.root).unwrap();
        reader.close().unwrap();

        assert!(matches!(
            reader.read(&mut Vec::new()).unwrap_err(),
            StreamError::NotOpen(_)
        ));
        assert!(matches!(
            reader.close().unwrap_err(),
            StreamError::NotOpen(_)
        ));
    }

    #[test]
    fn closing_the_backend_fails_the_reader_explicitly() {
        let store = open_store();
        let receipt = StreamWriter::new(store.clone())
            .write(pattern(10).as_slice())
            .unwrap();

        let mut reader = StreamReader::new(store.clone(), receipt.root).unwrap();
        store.close().unwrap();
        let err = reader.read(&mut Vec::new()).unwrap_err();
        assert!(matches!(err, StreamError::Store(StoreError::NotOpen(_))));
    }

    #[test]
    fn sink_errors_abort_the_read() {
        struct Failing;
        impl Write for Failing {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("sink broke"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let store = open_store();
        let receipt = StreamWriter::new(store.clone())
            .write(pattern(10).as_slice())
            .unwrap();
        let mut reader = StreamReader::new(store, receipt.root).unwrap();
        let err = reader.read(Failing).unwrap_err();
        assert!(matches!(err, StreamError::Io(_)));
    }

    proptest! {
        /// The round-trip property: any byte sequence reconstructs exactly,
        /// including lengths that require several fold rounds.
        #[test]
        fn roundtrip_arbitrary_bytes(content in proptest::collection::vec(any::<u8>(), 0..4096)) {
            let store = Arc::new(MemoryBlockStore::new(tiny_geometry()).unwrap());
            let receipt = StreamWriter::new(store.clone()).write(content.as_slice()).unwrap();
            prop_assert_eq!(receipt.bytes_written, content.len() as u64);

            let mut out = Vec::new();
            let mut reader = StreamReader::new(store, receipt.root).unwrap();
            reader.read(&mut out).unwrap();
            prop_assert_eq!(out, content);
        }

        /// Determinism: the same bytes always produce the same root.
        #[test]
        fn root_is_deterministic(content in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let store_a = Arc::new(MemoryBlockStore::new(tiny_geometry()).unwrap());
            let store_b = Arc::new(MemoryBlockStore::new(tiny_geometry()).unwrap());
            let a = StreamWriter::new(store_a).write(content.as_slice()).unwrap();
            let b = StreamWriter::new(store_b).write(content.as_slice()).unwrap();
            prop_assert_eq!(a.root, b.root);
        }
    }
}
