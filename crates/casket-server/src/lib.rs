//! TCP block server for Casket.
//!
//! [`BlockServer`] exposes any [`BlockStore`](casket_store::BlockStore) over
//! the `casket-protocol` wire format: a version/geometry handshake followed
//! by put/get exchanges. I/O is blocking, one thread per connection; the
//! stores underneath are `Send + Sync` and puts of identical content race
//! benignly, so no coordination beyond the store's own is needed.

pub mod error;
pub mod server;

pub use error::{ServerError, ServerResult};
pub use server::BlockServer;
