use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Mutex;

use casket_protocol::{codes, CasketCodec, CasketMessage, ProtocolError, PROTOCOL_VERSION};
use casket_types::{Address, Geometry};

use crate::error::{StoreError, StoreResult};
use crate::traits::{check_block_shape, BlockStore};

/// Client for a Casket block server over TCP.
///
/// Honors the same contract as the local backends: idempotent puts, not-found
/// on absent gets. One connection per store; requests on a single store are
/// serialized behind a mutex, matching the one-stream-per-writer model.
#[derive(Debug)]
pub struct RemoteBlockStore {
    endpoint: String,
    geometry: Geometry,
    conn: Mutex<Option<TcpStream>>,
}

impl RemoteBlockStore {
    /// Connect and perform the version/geometry handshake.
    ///
    /// An unparseable endpoint or a geometry the server does not serve fails
    /// with [`StoreError::Config`]; an unreachable server fails with
    /// [`StoreError::Io`].
    pub fn connect(endpoint: &str, geometry: Geometry) -> StoreResult<Self> {
        geometry
            .validate()
            .map_err(|e| StoreError::Config(e.to_string()))?;
        if endpoint
            .to_socket_addrs()
            .map(|mut addrs| addrs.next().is_none())
            .unwrap_or(true)
        {
            return Err(StoreError::Config(format!("bad endpoint: {endpoint}")));
        }

        let mut stream = TcpStream::connect(endpoint)?;
        CasketCodec::write_message(
            &mut stream,
            &CasketMessage::Hello {
                version: PROTOCOL_VERSION,
                geometry,
            },
        )
        .map_err(protocol_failure)?;

        match CasketCodec::read_message(&mut stream).map_err(protocol_failure)? {
            CasketMessage::HelloAck {
                version,
                geometry: remote,
            } => {
                if version != PROTOCOL_VERSION {
                    return Err(StoreError::Config(format!(
                        "server speaks protocol version {version}, expected {PROTOCOL_VERSION}"
                    )));
                }
                if remote != geometry {
                    return Err(StoreError::Config(format!(
                        "server geometry {remote:?} does not match requested {geometry:?}"
                    )));
                }
            }
            CasketMessage::Error { code, message } => return Err(remote_failure(code, message)),
            other => {
                return Err(StoreError::Protocol(format!(
                    "expected HelloAck, got {}",
                    other.type_name()
                )))
            }
        }

        tracing::debug!(endpoint, "connected to block server");
        Ok(Self {
            endpoint: endpoint.to_string(),
            geometry,
            conn: Mutex::new(Some(stream)),
        })
    }

    /// The endpoint this store was connected to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.conn.lock().expect("lock poisoned").is_some() {
            Ok(())
        } else {
            Err(StoreError::NotOpen("remote"))
        }
    }

    fn request(&self, msg: &CasketMessage) -> StoreResult<CasketMessage> {
        let mut guard = self.conn.lock().expect("lock poisoned");
        let stream = guard.as_mut().ok_or(StoreError::NotOpen("remote"))?;
        CasketCodec::write_message(stream, msg).map_err(protocol_failure)?;
        CasketCodec::read_message(stream).map_err(protocol_failure)
    }
}

impl BlockStore for RemoteBlockStore {
    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn put(&self, header: &[u8], payload: &[u8]) -> StoreResult<Address> {
        self.ensure_open()?;
        check_block_shape(&self.geometry, header, payload)?;
        let reply = self.request(&CasketMessage::PutRequest {
            header: header.to_vec(),
            payload: payload.to_vec(),
        })?;
        match reply {
            CasketMessage::PutResponse { address } => Ok(address),
            CasketMessage::Error { code, message } => Err(remote_failure(code, message)),
            other => Err(StoreError::Protocol(format!(
                "expected PutResponse, got {}",
                other.type_name()
            ))),
        }
    }

    fn get(&self, address: &Address) -> StoreResult<Vec<u8>> {
        self.ensure_open()?;
        let reply = self.request(&CasketMessage::GetRequest {
            address: address.clone(),
        })?;
        match reply {
            CasketMessage::GetResponse { block } => {
                if block.len() != self.geometry.block_size {
                    return Err(StoreError::Corrupt {
                        address: address.clone(),
                        reason: format!(
                            "server returned {} bytes, expected {}",
                            block.len(),
                            self.geometry.block_size
                        ),
                    });
                }
                Ok(block)
            }
            CasketMessage::Error { code, .. } if code == codes::NOT_FOUND => {
                Err(StoreError::NotFound(address.clone()))
            }
            CasketMessage::Error { code, message } => Err(remote_failure(code, message)),
            other => Err(StoreError::Protocol(format!(
                "expected GetResponse, got {}",
                other.type_name()
            ))),
        }
    }

    fn close(&self) -> StoreResult<()> {
        let mut guard = self.conn.lock().expect("lock poisoned");
        if guard.take().is_none() {
            return Err(StoreError::NotOpen("remote"));
        }
        tracing::debug!(endpoint = %self.endpoint, "closed connection to block server");
        Ok(())
    }
}

fn protocol_failure(e: ProtocolError) -> StoreError {
    match e {
        ProtocolError::Io(io) => StoreError::Io(io),
        other => StoreError::Protocol(other.to_string()),
    }
}

fn remote_failure(code: u32, message: String) -> StoreError {
    match code {
        codes::GEOMETRY_MISMATCH => StoreError::Config(message),
        _ => StoreError::Remote { code, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Wire-level behavior is covered end-to-end in casket-server's tests;
    // here only the fail-fast paths that need no peer.

    #[test]
    fn connect_rejects_bad_endpoint() {
        let err = RemoteBlockStore::connect("not an endpoint", Geometry::default()).unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn connect_rejects_bad_geometry() {
        let bad = Geometry {
            block_size: 33,
            ..Geometry::default()
        };
        let err = RemoteBlockStore::connect("127.0.0.1:9", bad).unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }
}
