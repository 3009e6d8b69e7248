//! Content-addressed block storage for Casket.
//!
//! Every block is stored under the address derived by digesting its exact
//! bytes (header then payload). The store never interprets block contents —
//! it is a pure address-keyed block device; chunking and tree structure live
//! in `casket-stream`.
//!
//! # Backends
//!
//! All backends implement the [`BlockStore`] trait:
//!
//! - [`FsBlockStore`] — one file per block under a root directory
//! - [`MemoryBlockStore`] — `HashMap`-based store for tests and embedding
//! - [`RemoteBlockStore`] — client for a `casket-server` over TCP
//!
//! # Design Rules
//!
//! 1. Blocks are immutable once written (content-addressing guarantees this).
//! 2. Puts are idempotent: a block that already exists is never an error.
//! 3. Concurrent reads are always safe; concurrent puts of identical content
//!    race benignly on an atomic create-if-absent.
//! 4. All I/O errors are propagated, never silently ignored.
//! 5. A closed store answers every operation with a typed not-open error.

pub mod error;
pub mod fs;
pub mod memory;
pub mod remote;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsBlockStore;
pub use memory::MemoryBlockStore;
pub use remote::RemoteBlockStore;
pub use traits::BlockStore;
