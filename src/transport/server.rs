//! Tool service - TCP server exposing the registry over the wire protocol
//!
//! Accepts any number of concurrent clients; each connection runs its own
//! JSON-lines loop. Responses carry the request id they answer. A line
//! that fails to parse is answered with a parse error under id 0.

use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use crate::error::Result;
use crate::tools::{InvocationRequest, ToolRegistry};
use crate::transport::messages::{Methods, TransportError, TransportRequest, TransportResponse};

/// TCP server that serves a [`ToolRegistry`] to gateway clients.
pub struct ToolServer {
    registry: Arc<ToolRegistry>,
    listener: TcpListener,
    shutdown_tx: mpsc::Sender<()>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl ToolServer {
    /// Bind the server to an address. Use port 0 to pick a free port.
    pub async fn bind(addr: &str, registry: ToolRegistry) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        Ok(Self {
            registry: Arc::new(registry),
            listener,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// The address the server is actually listening on.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle that signals the accept loop to stop.
    pub fn shutdown_handle(&self) -> mpsc::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Accept connections until shutdown is signalled.
    pub async fn run(mut self) -> Result<()> {
        info!("tool service listening on {}", self.local_addr()?);

        loop {
            tokio::select! {
                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((stream, addr)) => {
                            debug!("client connected from {addr}");
                            let registry = Arc::clone(&self.registry);
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, registry).await {
                                    warn!("connection from {addr} ended with error: {e}");
                                }
                            });
                        }
                        Err(e) => {
                            warn!("accept error: {e}");
                        }
                    }
                }
                _ = self.shutdown_rx.recv() => {
                    info!("tool service shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Serve one client connection until it disconnects.
async fn handle_connection(stream: TcpStream, registry: Arc<ToolRegistry>) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            break; // EOF - client disconnected
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<TransportRequest>(trimmed) {
            Ok(request) => dispatch(request, &registry).await,
            Err(e) => TransportResponse::error(0, TransportError::parse_error(format!("invalid request: {e}"))),
        };

        let json = serde_json::to_string(&response)?;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Route one request to the registry.
///
/// Tool failures (unknown tool, bad arguments, handler errors) are carried
/// inside the invocation result, not as transport errors.
async fn dispatch(request: TransportRequest, registry: &ToolRegistry) -> TransportResponse {
    match request.method.as_str() {
        Methods::LIST_TOOLS => match serde_json::to_value(registry.list_tools()) {
            Ok(tools) => TransportResponse::success(request.id, tools),
            Err(e) => TransportResponse::error(request.id, TransportError::internal_error(e.to_string())),
        },
        Methods::INVOKE => match serde_json::from_value::<InvocationRequest>(request.params) {
            Ok(invocation) => {
                debug!("invoking tool '{}'", invocation.tool_name);
                let result = registry.invoke(&invocation).await;
                match serde_json::to_value(result) {
                    Ok(value) => TransportResponse::success(request.id, value),
                    Err(e) => TransportResponse::error(request.id, TransportError::internal_error(e.to_string())),
                }
            }
            Err(e) => TransportResponse::error(
                request.id,
                TransportError::invalid_params(format!("invalid invoke params: {e}")),
            ),
        },
        other => TransportResponse::error(request.id, TransportError::method_not_found(other)),
    }
}
