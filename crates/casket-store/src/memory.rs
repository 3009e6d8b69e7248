use std::collections::HashMap;
use std::sync::RwLock;

use casket_types::{Address, Geometry, Lifecycle};

use crate::error::{StoreError, StoreResult};
use crate::traits::{check_block_shape, BlockStore};

/// In-memory, HashMap-based block store.
///
/// Intended for tests and embedding. All blocks are held in memory behind a
/// `RwLock` for safe concurrent access.
pub struct MemoryBlockStore {
    blocks: RwLock<HashMap<Address, Vec<u8>>>,
    geometry: Geometry,
    state: RwLock<Lifecycle>,
}

impl MemoryBlockStore {
    /// Create a new empty in-memory store.
    pub fn new(geometry: Geometry) -> StoreResult<Self> {
        geometry
            .validate()
            .map_err(|e| StoreError::Config(e.to_string()))?;
        Ok(Self {
            blocks: RwLock::new(HashMap::new()),
            geometry,
            state: RwLock::new(Lifecycle::Open),
        })
    }

    /// Number of blocks currently stored.
    pub fn len(&self) -> usize {
        self.blocks.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blocks.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored blocks.
    pub fn total_bytes(&self) -> u64 {
        self.blocks
            .read()
            .expect("lock poisoned")
            .values()
            .map(|block| block.len() as u64)
            .sum()
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.state.read().expect("lock poisoned").is_open() {
            Ok(())
        } else {
            Err(StoreError::NotOpen("memory"))
        }
    }
}

impl BlockStore for MemoryBlockStore {
    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn put(&self, header: &[u8], payload: &[u8]) -> StoreResult<Address> {
        self.ensure_open()?;
        check_block_shape(&self.geometry, header, payload)?;

        let address = self.geometry.digest.address_of(&[header, payload]);
        let mut blocks = self.blocks.write().expect("lock poisoned");
        // Idempotent: identical bytes always map to the same address.
        blocks.entry(address.clone()).or_insert_with(|| {
            let mut block = Vec::with_capacity(self.geometry.block_size);
            block.extend_from_slice(header);
            block.extend_from_slice(payload);
            block
        });
        Ok(address)
    }

    fn get(&self, address: &Address) -> StoreResult<Vec<u8>> {
        self.ensure_open()?;
        let blocks = self.blocks.read().expect("lock poisoned");
        blocks
            .get(address)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(address.clone()))
    }

    fn contains(&self, address: &Address) -> StoreResult<bool> {
        self.ensure_open()?;
        let blocks = self.blocks.read().expect("lock poisoned");
        Ok(blocks.contains_key(address))
    }

    fn close(&self) -> StoreResult<()> {
        let mut state = self.state.write().expect("lock poisoned");
        if !state.is_open() {
            return Err(StoreError::NotOpen("memory"));
        }
        *state = Lifecycle::Closed;
        Ok(())
    }
}

impl std::fmt::Debug for MemoryBlockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBlockStore")
            .field("block_count", &self.len())
            .field("geometry", &self.geometry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryBlockStore {
        MemoryBlockStore::new(Geometry::default()).unwrap()
    }

    fn block_parts(fill: u8) -> (Vec<u8>, Vec<u8>) {
        (vec![b'0'; 32], vec![fill; 992])
    }

    // -----------------------------------------------------------------------
    // Core contract
    // -----------------------------------------------------------------------

    #[test]
    fn put_and_get_roundtrip() {
        let store = store();
        let (header, payload) = block_parts(b'a');
        let address = store.put(&header, &payload).unwrap();

        let bytes = store.get(&address).unwrap();
        assert_eq!(bytes.len(), 1024);
        assert_eq!(&bytes[..32], header.as_slice());
        assert_eq!(&bytes[32..], payload.as_slice());
    }

    #[test]
    fn same_content_produces_same_address() {
        let store = store();
        let (header, payload) = block_parts(b'b');
        let first = store.put(&header, &payload).unwrap();
        let second = store.put(&header, &payload).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn different_content_produces_different_addresses() {
        let store = store();
        let (header, a) = block_parts(b'a');
        let (_, b) = block_parts(b'b');
        assert_ne!(
            store.put(&header, &a).unwrap(),
            store.put(&header, &b).unwrap()
        );
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn get_missing_block() {
        let store = store();
        let address = Geometry::default().digest.address_of(&[b"missing"]);
        let err = store.get(&address).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn contains_reflects_storage() {
        let store = store();
        let (header, payload) = block_parts(b'c');
        let address = store.put(&header, &payload).unwrap();
        assert!(store.contains(&address).unwrap());

        let absent = Geometry::default().digest.address_of(&[b"absent"]);
        assert!(!store.contains(&absent).unwrap());
    }

    #[test]
    fn put_rejects_wrong_shape() {
        let store = store();
        let err = store.put(&[b'0'; 32], &[b'x'; 991]).unwrap_err();
        assert!(matches!(err, StoreError::BlockSize { .. }));
    }

    #[test]
    fn new_rejects_bad_geometry() {
        let bad = Geometry {
            header_size: 4,
            ..Geometry::default()
        };
        assert!(matches!(
            MemoryBlockStore::new(bad).unwrap_err(),
            StoreError::Config(_)
        ));
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    #[test]
    fn closed_store_rejects_everything() {
        let store = store();
        let (header, payload) = block_parts(b'd');
        let address = store.put(&header, &payload).unwrap();

        store.close().unwrap();

        assert!(matches!(
            store.put(&header, &payload).unwrap_err(),
            StoreError::NotOpen(_)
        ));
        assert!(matches!(
            store.get(&address).unwrap_err(),
            StoreError::NotOpen(_)
        ));
        assert!(matches!(store.close().unwrap_err(), StoreError::NotOpen(_)));
    }

    // -----------------------------------------------------------------------
    // Utility and concurrency
    // -----------------------------------------------------------------------

    #[test]
    fn len_and_total_bytes() {
        let store = store();
        assert!(store.is_empty());
        let (header, payload) = block_parts(b'e');
        store.put(&header, &payload).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.total_bytes(), 1024);
    }

    #[test]
    fn concurrent_puts_of_identical_content_are_benign() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(store());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let (header, payload) = block_parts(b'f');
                    store.put(&header, &payload).unwrap()
                })
            })
            .collect();

        let addresses: Vec<Address> = handles
            .into_iter()
            .map(|h| h.join().expect("thread should not panic"))
            .collect();
        assert!(addresses.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn debug_format() {
        let store = store();
        let debug = format!("{store:?}");
        assert!(debug.contains("MemoryBlockStore"));
        assert!(debug.contains("block_count"));
    }
}
