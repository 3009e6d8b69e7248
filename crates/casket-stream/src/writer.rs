use std::io::Read;
use std::sync::Arc;

use casket_block::Block;
use casket_store::BlockStore;
use casket_types::{Address, Geometry, Lifecycle};

use crate::error::{StreamError, StreamResult};

/// Result of storing one stream.
#[derive(Clone, Debug)]
pub struct WriteReceipt {
    /// The single address identifying the whole stream.
    pub root: Address,
    /// Original stream bytes stored, not counting padding.
    pub bytes_written: u64,
    /// DATA blocks produced.
    pub data_blocks: u64,
    /// INDIRECT blocks produced across all fold rounds.
    pub indirect_blocks: u64,
}

/// Chunks a byte stream into data blocks and folds their addresses into a
/// tree rooted at a single address.
///
/// Each `write` call stores one complete, self-contained stream; the writer
/// may be reused for further streams until it is closed.
pub struct StreamWriter {
    store: Arc<dyn BlockStore>,
    state: Lifecycle,
}

impl StreamWriter {
    pub fn new(store: Arc<dyn BlockStore>) -> Self {
        Self {
            store,
            state: Lifecycle::Open,
        }
    }

    /// Store everything `src` yields and return the root address plus byte
    /// and block counts.
    ///
    /// A zero-length stream stores a single empty DATA block whose address is
    /// the root, so every stream — including the empty one — round-trips
    /// through the ordinary read path.
    pub fn write(&mut self, mut src: impl Read) -> StreamResult<WriteReceipt> {
        self.ensure_open()?;
        let geometry = *self.store.geometry();
        let capacity = geometry.payload_capacity();

        let mut chunk = vec![0u8; capacity];
        let mut pending: Vec<Address> = Vec::new();
        let mut bytes_written = 0u64;
        let mut data_blocks = 0u64;

        loop {
            let n = read_fill(&mut src, &mut chunk)?;
            if n == 0 && !pending.is_empty() {
                // Source length was an exact multiple of capacity.
                break;
            }
            let block = Block::data(&chunk[..n], &geometry)?;
            let address = self
                .store
                .put(&block.header_bytes(&geometry), block.padded_payload())?;
            pending.push(address);
            data_blocks += 1;
            bytes_written += n as u64;
            if n < capacity {
                break;
            }
        }

        let (root, indirect_blocks) = self.fold(pending, &geometry)?;
        tracing::debug!(
            root = %root,
            bytes = bytes_written,
            data_blocks,
            indirect_blocks,
            "stream stored"
        );
        Ok(WriteReceipt {
            root,
            bytes_written,
            data_blocks,
            indirect_blocks,
        })
    }

    /// Fold the pending address list into indirect blocks, round by round,
    /// until exactly one address remains.
    ///
    /// Round k takes m addresses and emits ceil(m / indirect_capacity)
    /// indirect blocks, each packing up to capacity children in order; the
    /// round's outputs are the next round's inputs. A one-element list is
    /// already the root.
    fn fold(
        &self,
        mut pending: Vec<Address>,
        geometry: &Geometry,
    ) -> StreamResult<(Address, u64)> {
        let capacity = geometry.indirect_capacity();
        let mut indirect_blocks = 0u64;

        while pending.len() > 1 {
            let mut next = Vec::with_capacity(pending.len().div_ceil(capacity));
            for batch in pending.chunks(capacity) {
                let block = Block::indirect(batch, geometry)?;
                let address = self
                    .store
                    .put(&block.header_bytes(geometry), block.padded_payload())?;
                next.push(address);
                indirect_blocks += 1;
            }
            pending = next;
        }

        Ok((pending.remove(0), indirect_blocks))
    }

    /// Close the writer. Terminal; later operations fail with
    /// [`StreamError::NotOpen`].
    pub fn close(&mut self) -> StreamResult<()> {
        self.ensure_open()?;
        self.state = Lifecycle::Closed;
        Ok(())
    }

    fn ensure_open(&self) -> StreamResult<()> {
        if self.state.is_open() {
            Ok(())
        } else {
            Err(StreamError::NotOpen("writer"))
        }
    }
}

/// Fill `buf` from `src`, tolerating short reads. Returns the number of bytes
/// placed in `buf`; less than `buf.len()` means EOF was reached.
fn read_fill(src: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match src.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
