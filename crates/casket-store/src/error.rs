use casket_types::Address;

/// Errors from block store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store's target (root directory, endpoint) or geometry is invalid.
    #[error("invalid store configuration: {0}")]
    Config(String),

    /// Operation on a store that is closed.
    #[error("{0} store is not open")]
    NotOpen(&'static str),

    /// No block stored at the requested address.
    #[error("block not found: {0}")]
    NotFound(Address),

    /// I/O error from the underlying storage or transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored object that is not exactly one block long.
    #[error("corrupt block {address}: {reason}")]
    Corrupt { address: Address, reason: String },

    /// A put whose header+payload do not add up to one block.
    #[error("block must be exactly {expected} bytes, got {actual}")]
    BlockSize { expected: usize, actual: usize },

    /// Wire protocol failure talking to a remote store.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// An error reported by the remote server.
    #[error("remote error {code}: {message}")]
    Remote { code: u32, message: String },
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
