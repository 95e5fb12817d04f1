//! Wire messages for gateway ↔ tool service communication.
//!
//! Uses JSON Lines (newline-delimited JSON) over a TCP stream. The schema
//! uses familiar field names (id, method, params, result, error) but is
//! not JSON-RPC 2.0. Every request receives exactly one response carrying
//! the same id.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request sent from the gateway to the tool service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportRequest {
    /// Unique request ID for correlating responses.
    pub id: u64,
    /// Method name ("list_tools" or "invoke").
    pub method: String,
    /// Method parameters as JSON value.
    #[serde(default)]
    pub params: Value,
}

impl TransportRequest {
    /// Create a new request with the given method and params.
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            id,
            method: method.into(),
            params,
        }
    }

    /// Create a request with no parameters.
    pub fn no_params(id: u64, method: impl Into<String>) -> Self {
        Self::new(id, method, Value::Object(Default::default()))
    }
}

/// Response sent from the tool service back to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportResponse {
    /// Request ID this response corresponds to.
    pub id: u64,
    /// Result value on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error details on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TransportError>,
}

impl TransportResponse {
    /// Create a success response.
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: u64, error: TransportError) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Check if this response indicates success.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Protocol-level error in a transport response.
///
/// Distinct from a tool failure: a tool that runs and fails reports that
/// inside the result payload. A `TransportError` means the request itself
/// could not be served.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportError {
    /// Error code.
    pub code: i32,
    /// Human-readable error message.
    pub message: String,
}

impl TransportError {
    /// Create a new error.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Parse error (-32700).
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PARSE_ERROR, message)
    }

    /// Method not found error (-32601).
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::METHOD_NOT_FOUND,
            format!("Unknown method: {}", method.into()),
        )
    }

    /// Invalid params error (-32602).
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::INVALID_PARAMS, message)
    }

    /// Internal error (-32603).
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::INTERNAL_ERROR, message)
    }
}

/// Standard error codes.
pub struct ErrorCode;

impl ErrorCode {
    /// Invalid JSON.
    pub const PARSE_ERROR: i32 = -32700;
    /// Unknown method.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid parameters.
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal tool service error.
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// Known method names as constants.
pub struct Methods;

impl Methods {
    /// Fetch the tool catalog.
    pub const LIST_TOOLS: &'static str = "list_tools";
    /// Invoke a tool by name.
    pub const INVOKE: &'static str = "invoke";
}
