use thiserror::Error;

/// Errors from running the block server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The bind address is invalid or unavailable.
    #[error("invalid server configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] casket_protocol::ProtocolError),
}

/// Result alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
