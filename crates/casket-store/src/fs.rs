use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use casket_types::{Address, Geometry, Lifecycle};

use crate::error::{StoreError, StoreResult};
use crate::traits::{check_block_shape, BlockStore};

/// Filesystem-backed block store: one file per block, named by the block's
/// address, under a configured root directory.
///
/// `put` is "write if absent": the file is created with `create_new`, so two
/// processes racing to store the same block cannot corrupt it — the loser
/// simply observes that the block already exists.
#[derive(Debug)]
pub struct FsBlockStore {
    root: PathBuf,
    geometry: Geometry,
    state: RwLock<Lifecycle>,
}

impl FsBlockStore {
    /// Open a store over an existing directory.
    ///
    /// Fails with [`StoreError::Config`] if the geometry is inconsistent or
    /// the root does not exist or is not a directory.
    pub fn open(root: impl AsRef<Path>, geometry: Geometry) -> StoreResult<Self> {
        geometry
            .validate()
            .map_err(|e| StoreError::Config(e.to_string()))?;
        let root = root.as_ref().to_path_buf();
        match std::fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(StoreError::Config(format!(
                    "root {} is not a directory",
                    root.display()
                )))
            }
            Err(e) => {
                return Err(StoreError::Config(format!(
                    "bad root {}: {e}",
                    root.display()
                )))
            }
        }
        Ok(Self {
            root,
            geometry,
            state: RwLock::new(Lifecycle::Open),
        })
    }

    /// The root directory blocks are stored under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.state.read().expect("lock poisoned").is_open() {
            Ok(())
        } else {
            Err(StoreError::NotOpen("filesystem"))
        }
    }

    fn block_path(&self, address: &Address) -> PathBuf {
        self.root.join(address.as_str())
    }
}

impl BlockStore for FsBlockStore {
    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn put(&self, header: &[u8], payload: &[u8]) -> StoreResult<Address> {
        self.ensure_open()?;
        check_block_shape(&self.geometry, header, payload)?;

        let address = self.geometry.digest.address_of(&[header, payload]);
        let path = self.block_path(&address);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(mut file) => {
                file.write_all(header)?;
                file.write_all(payload)?;
                tracing::debug!(address = %address, "stored block");
            }
            // Someone else (or an earlier put) already stored these bytes;
            // content-addressing makes the existing file identical.
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e.into()),
        }

        Ok(address)
    }

    fn get(&self, address: &Address) -> StoreResult<Vec<u8>> {
        self.ensure_open()?;
        let path = self.block_path(address);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(address.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        if bytes.len() != self.geometry.block_size {
            return Err(StoreError::Corrupt {
                address: address.clone(),
                reason: format!(
                    "stored object is {} bytes, expected {}",
                    bytes.len(),
                    self.geometry.block_size
                ),
            });
        }
        Ok(bytes)
    }

    fn contains(&self, address: &Address) -> StoreResult<bool> {
        self.ensure_open()?;
        Ok(self.block_path(address).exists())
    }

    fn close(&self) -> StoreResult<()> {
        let mut state = self.state.write().expect("lock poisoned");
        if !state.is_open() {
            return Err(StoreError::NotOpen("filesystem"));
        }
        *state = Lifecycle::Closed;
        Ok(())
    }
}
