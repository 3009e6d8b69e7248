use serde::{Deserialize, Serialize};

use casket_types::{Address, Geometry};

pub const PROTOCOL_VERSION: u32 = 1;

/// Hard cap on one framed message. Blocks are bounded by the 16-bit payload
/// length field, so this is generous headroom, not a tuning knob.
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// All message types in the Casket block protocol.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum CasketMessage {
    /// Client opener: protocol version and the geometry the client expects.
    Hello { version: u32, geometry: Geometry },
    /// Server reply carrying the geometry it actually serves.
    HelloAck { version: u32, geometry: Geometry },
    /// Store one block: header and padded payload, exactly one block total.
    PutRequest { header: Vec<u8>, payload: Vec<u8> },
    /// The content address the block was stored under.
    PutResponse { address: Address },
    /// Fetch the block at an address.
    GetRequest { address: Address },
    /// The full stored block bytes.
    GetResponse { block: Vec<u8> },
    /// Any failure; `code` follows the [`codes`] table.
    Error { code: u32, message: String },
}

impl CasketMessage {
    pub fn type_tag(&self) -> u8 {
        match self {
            Self::Hello { .. } => 1,
            Self::HelloAck { .. } => 2,
            Self::PutRequest { .. } => 3,
            Self::PutResponse { .. } => 4,
            Self::GetRequest { .. } => 5,
            Self::GetResponse { .. } => 6,
            Self::Error { .. } => 255,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Hello { .. } => "Hello",
            Self::HelloAck { .. } => "HelloAck",
            Self::PutRequest { .. } => "PutRequest",
            Self::PutResponse { .. } => "PutResponse",
            Self::GetRequest { .. } => "GetRequest",
            Self::GetResponse { .. } => "GetResponse",
            Self::Error { .. } => "Error",
        }
    }
}

/// Error codes carried by [`CasketMessage::Error`].
pub mod codes {
    /// Malformed or out-of-sequence request.
    pub const BAD_REQUEST: u32 = 400;
    /// No block stored at the requested address.
    pub const NOT_FOUND: u32 = 404;
    /// Client and server geometries disagree.
    pub const GEOMETRY_MISMATCH: u32 = 409;
    /// The server's backend failed.
    pub const BACKEND: u32 = 500;
}
