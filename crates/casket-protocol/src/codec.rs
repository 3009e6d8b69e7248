use std::io::{Read, Write};

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{CasketMessage, MAX_MESSAGE_SIZE};

/// Codec for encoding/decoding Casket protocol messages.
pub struct CasketCodec;

impl CasketCodec {
    /// Encode a message with framing: [4 bytes len][1 byte tag][payload].
    pub fn encode(msg: &CasketMessage) -> ProtocolResult<Vec<u8>> {
        let payload =
            bincode::serialize(msg).map_err(|e| ProtocolError::Serialization(e.to_string()))?;
        if payload.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: payload.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }
        let len = (payload.len() + 1) as u32;
        let mut buf = Vec::with_capacity(4 + 1 + payload.len());
        buf.extend_from_slice(&len.to_be_bytes());
        buf.push(msg.type_tag());
        buf.extend_from_slice(&payload);
        Ok(buf)
    }

    /// Decode a framed message from a buffer. Returns (message, bytes_consumed).
    pub fn decode(data: &[u8]) -> ProtocolResult<(CasketMessage, usize)> {
        if data.len() < 5 {
            return Err(ProtocolError::FramingError("too short".into()));
        }
        let len = u32::from_be_bytes(data[0..4].try_into().expect("4-byte slice")) as usize;
        if len < 1 {
            return Err(ProtocolError::FramingError("zero-length frame".into()));
        }
        if len - 1 > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: len - 1,
                max: MAX_MESSAGE_SIZE,
            });
        }
        let total = 4 + len;
        if data.len() < total {
            return Err(ProtocolError::FramingError(format!(
                "incomplete: have {}, need {}",
                data.len(),
                total
            )));
        }
        let payload = &data[5..total];
        let msg: CasketMessage = bincode::deserialize(payload)
            .map_err(|e| ProtocolError::Deserialization(e.to_string()))?;
        Ok((msg, total))
    }

    /// Write one framed message to a blocking stream.
    pub fn write_message(writer: &mut impl Write, msg: &CasketMessage) -> ProtocolResult<()> {
        let frame = Self::encode(msg)?;
        writer.write_all(&frame)?;
        writer.flush()?;
        Ok(())
    }

    /// Read one framed message from a blocking stream.
    pub fn read_message(reader: &mut impl Read) -> ProtocolResult<CasketMessage> {
        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf)?;
        let len = u32::from_be_bytes(len_buf) as usize;
        if len < 1 {
            return Err(ProtocolError::FramingError("zero-length frame".into()));
        }
        if len - 1 > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: len - 1,
                max: MAX_MESSAGE_SIZE,
            });
        }
        let mut body = vec![0u8; len];
        reader.read_exact(&mut body)?;
        bincode::deserialize(&body[1..]).map_err(|e| ProtocolError::Deserialization(e.to_string()))
    }
}
