use thiserror::Error;

/// Errors from block encoding, decoding, and assembly.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockError {
    /// Header bytes are the wrong length or a numeric field is unparseable.
    #[error("malformed block header: {0}")]
    MalformedHeader(String),

    /// The header carries a type tag this implementation does not know.
    #[error("unsupported block type: {tag:?}")]
    UnsupportedBlockType { tag: String },

    /// A data chunk larger than the block's payload capacity.
    #[error("payload of {len} bytes exceeds capacity {capacity}")]
    PayloadTooLarge { len: usize, capacity: usize },

    /// More children than one indirect block can hold.
    #[error("{count} children exceed indirect capacity {capacity}")]
    TooManyChildren { count: usize, capacity: usize },

    /// A child address whose width does not match the geometry.
    #[error("address width mismatch: expected {expected}, got {actual}")]
    AddressWidth { expected: usize, actual: usize },

    /// Raw block bytes that are not exactly one block long.
    #[error("block must be exactly {expected} bytes, got {actual}")]
    WrongBlockLength { expected: usize, actual: usize },

    /// An indirect payload that cannot be split into addresses.
    #[error("malformed indirect payload: {0}")]
    MalformedPayload(String),

    /// Child addresses requested from a non-indirect block.
    #[error("block is not an indirect block")]
    NotIndirect,
}

/// Result alias for block operations.
pub type BlockResult<T> = Result<T, BlockError>;
