use casket_types::{Address, Geometry};

use crate::error::{StoreError, StoreResult};

/// Content-addressed block store.
///
/// All implementations must satisfy these invariants:
/// - Blocks are immutable once written. Content-addressing guarantees this:
///   the same bytes always produce the same address.
/// - `put` is idempotent — storing a block that already exists is a no-op
///   that returns the same address, never an error.
/// - Every stored block is exactly `geometry().block_size` bytes.
/// - Concurrent reads are always safe (blocks are immutable); concurrent
///   puts of identical content must not corrupt storage.
/// - All I/O errors are propagated, never silently ignored.
/// - After `close()`, every operation (including a second `close`) fails
///   with [`StoreError::NotOpen`].
pub trait BlockStore: Send + Sync {
    /// The block layout this store was opened with.
    fn geometry(&self) -> &Geometry;

    /// Store one block given its header and padded payload; returns the
    /// content address the block lives under.
    fn put(&self, header: &[u8], payload: &[u8]) -> StoreResult<Address>;

    /// Fetch the full block bytes at an address.
    ///
    /// Returns [`StoreError::NotFound`] if no block exists there and
    /// [`StoreError::Corrupt`] if the stored object is not exactly one
    /// block long.
    fn get(&self, address: &Address) -> StoreResult<Vec<u8>>;

    /// Check whether a block exists.
    ///
    /// The default implementation fetches the block and discards it;
    /// backends override it with a cheaper probe where one exists.
    fn contains(&self, address: &Address) -> StoreResult<bool> {
        match self.get(address) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Release the store's connection or handle. Terminal: the store cannot
    /// be reopened, and later operations fail with [`StoreError::NotOpen`].
    fn close(&self) -> StoreResult<()>;
}

/// Validate that a put's parts assemble into exactly one block.
pub(crate) fn check_block_shape(
    geometry: &Geometry,
    header: &[u8],
    payload: &[u8],
) -> StoreResult<()> {
    if header.len() != geometry.header_size {
        return Err(StoreError::BlockSize {
            expected: geometry.header_size,
            actual: header.len(),
        });
    }
    if header.len() + payload.len() != geometry.block_size {
        return Err(StoreError::BlockSize {
            expected: geometry.block_size,
            actual: header.len() + payload.len(),
        });
    }
    Ok(())
}
