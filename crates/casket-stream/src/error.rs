use casket_block::BlockError;
use casket_store::StoreError;

/// Errors from stream writing and reading.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Operation on a closed writer or reader.
    #[error("{0} is not open")]
    NotOpen(&'static str),

    /// The backend failed or was closed underneath us.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A block could not be assembled or parsed.
    #[error("block error: {0}")]
    Block(#[from] BlockError),

    /// The source or sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A root address whose width does not match the store's geometry.
    #[error("root address width {actual} does not match store geometry width {expected}")]
    AddressWidth { expected: usize, actual: usize },
}

/// Result alias for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;
