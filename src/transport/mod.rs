//! Tool transport - line-delimited JSON over TCP between gateway and tool service
//!
//! Strictly request/response: every request carries an id and gets exactly
//! one response with the same id, so requests can interleave on one
//! connection. Tool failures travel inside the result payload; an error at
//! this layer means the tool service itself is unreachable or broken.

mod client;
mod messages;
mod server;

pub use client::{ToolClient, ToolClientConfig};
pub use messages::{ErrorCode, Methods, TransportError, TransportRequest, TransportResponse};
pub use server::ToolServer;

use async_trait::async_trait;

use crate::error::Result;
use crate::tools::{InvocationRequest, InvocationResult, ToolDefinition};

/// Seam between the orchestrator and whatever carries tool traffic.
///
/// Implementations must keep tool failures inside [`InvocationResult`];
/// `Err` is reserved for the transport itself being unavailable.
#[async_trait]
pub trait ToolTransport: Send + Sync {
    /// Fetch the tool catalog in registration order.
    async fn list_tools(&self) -> Result<Vec<ToolDefinition>>;

    /// Dispatch one invocation and return its outcome.
    async fn invoke(&self, request: InvocationRequest) -> Result<InvocationResult>;
}

#[async_trait]
impl ToolTransport for ToolClient {
    async fn list_tools(&self) -> Result<Vec<ToolDefinition>> {
        ToolClient::list_tools(self).await
    }

    async fn invoke(&self, request: InvocationRequest) -> Result<InvocationResult> {
        ToolClient::invoke(self, &request).await
    }
}
