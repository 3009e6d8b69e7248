use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use casket_protocol::{codes, CasketCodec, CasketMessage, ProtocolError, PROTOCOL_VERSION};
use casket_store::{BlockStore, StoreError};

use crate::error::{ServerError, ServerResult};

/// Casket block server.
///
/// Serves one [`BlockStore`] to any number of clients. Each connection is
/// handled on its own thread and starts with a `Hello` handshake; a client
/// whose geometry differs from the store's is refused with error code 409
/// before any blocks move.
pub struct BlockServer {
    listener: TcpListener,
    store: Arc<dyn BlockStore>,
}

impl BlockServer {
    /// Bind to `addr` and prepare to serve `store`.
    pub fn bind(addr: &str, store: Arc<dyn BlockStore>) -> ServerResult<Self> {
        let listener = TcpListener::bind(addr)
            .map_err(|e| ServerError::Config(format!("cannot bind {addr}: {e}")))?;
        Ok(Self { listener, store })
    }

    /// The address actually bound (useful with port 0).
    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept and serve connections until the process exits.
    pub fn serve(self) -> ServerResult<()> {
        tracing::info!(addr = %self.listener.local_addr()?, "block server listening");
        for conn in self.listener.incoming() {
            match conn {
                Ok(stream) => {
                    let store = Arc::clone(&self.store);
                    thread::spawn(move || {
                        let peer = stream
                            .peer_addr()
                            .map(|a| a.to_string())
                            .unwrap_or_else(|_| "unknown".into());
                        tracing::debug!(peer = %peer, "client connected");
                        if let Err(e) = handle_connection(stream, store) {
                            tracing::warn!(peer = %peer, error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => tracing::warn!(error = %e, "accept failed"),
            }
        }
        Ok(())
    }
}

fn handle_connection(mut stream: TcpStream, store: Arc<dyn BlockStore>) -> ServerResult<()> {
    match CasketCodec::read_message(&mut stream)? {
        CasketMessage::Hello { version, geometry } => {
            if version != PROTOCOL_VERSION {
                return refuse(
                    &mut stream,
                    codes::BAD_REQUEST,
                    format!("unsupported protocol version {version}"),
                );
            }
            if geometry != *store.geometry() {
                return refuse(
                    &mut stream,
                    codes::GEOMETRY_MISMATCH,
                    format!("server serves geometry {:?}", store.geometry()),
                );
            }
            CasketCodec::write_message(
                &mut stream,
                &CasketMessage::HelloAck {
                    version: PROTOCOL_VERSION,
                    geometry: *store.geometry(),
                },
            )?;
        }
        other => {
            return refuse(
                &mut stream,
                codes::BAD_REQUEST,
                format!("expected Hello, got {}", other.type_name()),
            )
        }
    }

    loop {
        let msg = match CasketCodec::read_message(&mut stream) {
            Ok(msg) => msg,
            Err(ProtocolError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                tracing::debug!("client disconnected");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let reply = match msg {
            CasketMessage::PutRequest { header, payload } => {
                match store.put(&header, &payload) {
                    Ok(address) => CasketMessage::PutResponse { address },
                    Err(e) => error_reply(&e),
                }
            }
            CasketMessage::GetRequest { address } => match store.get(&address) {
                Ok(block) => CasketMessage::GetResponse { block },
                Err(e) => error_reply(&e),
            },
            other => CasketMessage::Error {
                code: codes::BAD_REQUEST,
                message: format!("unexpected {}", other.type_name()),
            },
        };
        CasketCodec::write_message(&mut stream, &reply)?;
    }
}

fn refuse(stream: &mut TcpStream, code: u32, message: String) -> ServerResult<()> {
    CasketCodec::write_message(stream, &CasketMessage::Error { code, message })?;
    Ok(())
}

fn error_reply(e: &StoreError) -> CasketMessage {
    let code = match e {
        StoreError::NotFound(_) => codes::NOT_FOUND,
        StoreError::BlockSize { .. } => codes::BAD_REQUEST,
        _ => codes::BACKEND,
    };
    CasketMessage::Error {
        code,
        message: e.to_string(),
    }
}
