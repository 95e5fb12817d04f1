//! Transport client used by the gateway to reach the tool service.
//!
//! Connects lazily on first use and reconnects after the connection drops.
//! Requests are correlated to responses by id through a pending map, so a
//! single connection can carry interleaved requests. Every failure path
//! surfaces as `TransportUnavailable` so callers can tell "the tool service
//! is unreachable" apart from "the tool ran and failed".

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use log::debug;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{Mutex, oneshot};

use crate::error::{Result, ToolhopError};
use crate::tools::{InvocationRequest, InvocationResult, ToolDefinition};
use crate::transport::messages::{Methods, TransportRequest, TransportResponse};

/// Configuration for the transport client.
#[derive(Debug, Clone)]
pub struct ToolClientConfig {
    /// Address of the tool service.
    pub addr: String,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for ToolClientConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8001".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

impl ToolClientConfig {
    /// Create config for a custom address.
    pub fn with_addr(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            ..Default::default()
        }
    }
}

/// Client for the tool service wire protocol.
pub struct ToolClient {
    config: ToolClientConfig,
    writer: Arc<Mutex<Option<OwnedWriteHalf>>>,
    pending: Arc<Mutex<HashMap<u64, oneshot::Sender<TransportResponse>>>>,
    next_id: AtomicU64,
    connected: Arc<AtomicBool>,
}

impl ToolClient {
    /// Create a new client with config. Does not connect yet.
    pub fn new(config: ToolClientConfig) -> Self {
        Self {
            config,
            writer: Arc::new(Mutex::new(None)),
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a client for the given address with default timeouts.
    pub fn with_addr(addr: impl Into<String>) -> Self {
        Self::new(ToolClientConfig::with_addr(addr))
    }

    /// Whether the last known connection state is up.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Address of the tool service this client talks to.
    pub fn addr(&self) -> &str {
        &self.config.addr
    }

    /// Fetch the tool catalog, in the service's registration order.
    pub async fn list_tools(&self) -> Result<Vec<ToolDefinition>> {
        let result = self.request(Methods::LIST_TOOLS, serde_json::json!({})).await?;
        serde_json::from_value(result)
            .map_err(|e| ToolhopError::TransportUnavailable(format!("malformed catalog payload: {e}")))
    }

    /// Invoke a tool. Tool failures come back inside the result; an `Err`
    /// here means the service itself could not be reached.
    pub async fn invoke(&self, request: &InvocationRequest) -> Result<InvocationResult> {
        let params = serde_json::to_value(request)?;
        let result = self.request(Methods::INVOKE, params).await?;
        serde_json::from_value(result)
            .map_err(|e| ToolhopError::TransportUnavailable(format!("malformed invocation payload: {e}")))
    }

    /// Drop the connection. The next request reconnects.
    pub async fn disconnect(&self) {
        *self.writer.lock().await = None;
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Send a request and wait for the correlated response.
    async fn request(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        self.ensure_connected().await?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = TransportRequest::new(id, method, params);

        let (tx, rx) = oneshot::channel();
        {
            self.pending.lock().await.insert(id, tx);
        }

        if let Err(e) = self.send(&request).await {
            self.pending.lock().await.remove(&id);
            return Err(e);
        }

        let timeout = Duration::from_millis(self.config.request_timeout_ms);
        let response = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => {
                // Reader task dropped the sender: connection died mid-request
                return Err(ToolhopError::TransportUnavailable(
                    "connection closed before response".to_string(),
                ));
            }
            Err(_) => {
                self.pending.lock().await.remove(&id);
                return Err(ToolhopError::TransportUnavailable(format!(
                    "no response after {} ms",
                    self.config.request_timeout_ms
                )));
            }
        };

        if let Some(error) = response.error {
            return Err(ToolhopError::TransportUnavailable(format!(
                "tool service error {}: {}",
                error.code, error.message
            )));
        }
        response
            .result
            .ok_or_else(|| ToolhopError::TransportUnavailable("response missing result".to_string()))
    }

    /// Connect if not already connected, spawning the reader task.
    async fn ensure_connected(&self) -> Result<()> {
        let mut writer = self.writer.lock().await;
        if writer.is_some() && self.connected.load(Ordering::SeqCst) {
            return Ok(());
        }

        let stream = TcpStream::connect(&self.config.addr)
            .await
            .map_err(|e| ToolhopError::TransportUnavailable(format!("connect to {}: {e}", self.config.addr)))?;
        debug!("connected to tool service at {}", self.config.addr);

        let (read_half, write_half) = stream.into_split();
        *writer = Some(write_half);
        self.connected.store(true, Ordering::SeqCst);

        let pending = Arc::clone(&self.pending);
        let connected = Arc::clone(&self.connected);

        tokio::spawn(async move {
            let mut reader = BufReader::new(read_half);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<TransportResponse>(trimmed) {
                            Ok(response) => {
                                if let Some(tx) = pending.lock().await.remove(&response.id) {
                                    let _ = tx.send(response);
                                }
                            }
                            Err(e) => debug!("discarding unparseable line from tool service: {e}"),
                        }
                    }
                }
            }

            connected.store(false, Ordering::SeqCst);
            // Dropping the senders fails any request still in flight
            pending.lock().await.clear();
        });

        Ok(())
    }

    /// Write one request line to the connection.
    async fn send(&self, request: &TransportRequest) -> Result<()> {
        let json = serde_json::to_string(request)?;

        let mut writer = self.writer.lock().await;
        let Some(w) = writer.as_mut() else {
            self.connected.store(false, Ordering::SeqCst);
            return Err(ToolhopError::TransportUnavailable("not connected".to_string()));
        };

        let write = async {
            w.write_all(json.as_bytes()).await?;
            w.write_all(b"\n").await?;
            w.flush().await
        };
        if let Err(e) = write.await {
            *writer = None;
            self.connected.store(false, Ordering::SeqCst);
            return Err(ToolhopError::TransportUnavailable(format!("write failed: {e}")));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ToolClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolClient")
            .field("addr", &self.config.addr)
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::default_registry;
    use crate::transport::server::ToolServer;
    use serde_json::json;

    async fn start_server() -> std::net::SocketAddr {
        let server = ToolServer::bind("127.0.0.1:0", default_registry().unwrap())
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run());
        addr
    }

    #[test]
    fn test_config_default() {
        let config = ToolClientConfig::default();
        assert_eq!(config.addr, "127.0.0.1:8001");
        assert_eq!(config.request_timeout_ms, 10_000);
    }

    #[test]
    fn test_config_with_addr() {
        let config = ToolClientConfig::with_addr("10.0.0.1:9000");
        assert_eq!(config.addr, "10.0.0.1:9000");
        assert_eq!(config.request_timeout_ms, 10_000);
    }

    #[test]
    fn test_client_starts_disconnected() {
        let client = ToolClient::new(ToolClientConfig::default());
        assert!(!client.is_connected());
        assert_eq!(client.addr(), "127.0.0.1:8001");
    }

    #[test]
    fn test_next_id_increments() {
        let client = ToolClient::new(ToolClientConfig::default());
        assert_eq!(client.next_id.fetch_add(1, Ordering::SeqCst), 1);
        assert_eq!(client.next_id.fetch_add(1, Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_unavailable() {
        // Port 1 is never listening in the test environment
        let client = ToolClient::with_addr("127.0.0.1:1");
        let err = client.list_tools().await.unwrap_err();
        assert!(matches!(err, ToolhopError::TransportUnavailable(_)));
    }

    #[tokio::test]
    async fn test_list_tools_round_trip() {
        let addr = start_server().await;
        let client = ToolClient::with_addr(addr.to_string());

        let tools = client.list_tools().await.unwrap();
        assert_eq!(tools.len(), 7);
        assert_eq!(tools[0].name, "calculate_bmi");
        assert!(client.is_connected());
    }

    #[tokio::test]
    async fn test_invoke_round_trip() {
        let addr = start_server().await;
        let client = ToolClient::with_addr(addr.to_string());

        let mut arguments = serde_json::Map::new();
        arguments.insert("weight".to_string(), json!(70));
        arguments.insert("height".to_string(), json!(1.75));
        let result = client
            .invoke(&InvocationRequest::new("calculate_bmi", arguments))
            .await
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.value.unwrap()["category"], "Normal weight");
    }

    #[tokio::test]
    async fn test_unknown_tool_returns_ok_with_failure_result() {
        let addr = start_server().await;
        let client = ToolClient::with_addr(addr.to_string());

        let result = client.invoke(&InvocationRequest::bare("nope")).await.unwrap();
        assert!(!result.is_success());
        assert_eq!(result.error.unwrap().kind.as_str(), "unknown_tool");
    }

    #[tokio::test]
    async fn test_requests_share_one_connection() {
        let addr = start_server().await;
        let client = ToolClient::with_addr(addr.to_string());

        for _ in 0..3 {
            let tools = client.list_tools().await.unwrap();
            assert_eq!(tools.len(), 7);
        }
        // ids keep increasing across requests on the same connection
        assert!(client.next_id.load(Ordering::SeqCst) >= 4);
    }

    #[tokio::test]
    async fn test_stalled_service_times_out() {
        // A listener that accepts but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let mut config = ToolClientConfig::with_addr(addr.to_string());
        config.request_timeout_ms = 100;
        let client = ToolClient::new(config);

        let err = client.list_tools().await.unwrap_err();
        match err {
            ToolhopError::TransportUnavailable(msg) => assert!(msg.contains("no response")),
            other => panic!("expected TransportUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connection_dropped_mid_request() {
        // A listener that accepts and immediately hangs up
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });

        let mut config = ToolClientConfig::with_addr(addr.to_string());
        config.request_timeout_ms = 200;
        let client = ToolClient::new(config);

        let err = client.list_tools().await.unwrap_err();
        assert!(matches!(err, ToolhopError::TransportUnavailable(_)));
    }

    #[tokio::test]
    async fn test_reconnects_after_disconnect() {
        let addr = start_server().await;
        let client = ToolClient::with_addr(addr.to_string());

        assert_eq!(client.list_tools().await.unwrap().len(), 7);
        client.disconnect().await;
        assert!(!client.is_connected());

        // Next request transparently reconnects
        assert_eq!(client.list_tools().await.unwrap().len(), 7);
        assert!(client.is_connected());
    }
}
