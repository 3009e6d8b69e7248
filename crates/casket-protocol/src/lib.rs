//! Wire protocol for the Casket block service.
//!
//! A remote block store and the block server speak a small request/response
//! protocol over a byte stream: a `Hello`/`HelloAck` handshake agreeing on
//! protocol version and block geometry, then `Put`/`Get` exchanges keyed by
//! address. Framing is `[4-byte BE length][1-byte tag][bincode payload]`.
//!
//! The protocol carries the same contract the local backends honor: puts are
//! idempotent, gets of absent blocks answer with error code 404.

pub mod codec;
pub mod error;
pub mod message;

pub use codec::CasketCodec;
pub use error::{ProtocolError, ProtocolResult};
pub use message::{codes, CasketMessage, MAX_MESSAGE_SIZE, PROTOCOL_VERSION};
