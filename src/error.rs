//! Error types for toolhop
//!
//! Centralized error handling using thiserror.
//!
//! Tool-level failures (unknown tool, invalid arguments, execution error)
//! are *data*: they travel inside `tools::InvocationResult` and never
//! appear here. This enum covers everything that aborts an operation:
//! registration problems, an unreachable tool transport, a failing model
//! call, and turn timeouts.

use thiserror::Error;

/// All error types that can occur in toolhop
#[derive(Debug, Error)]
pub enum ToolhopError {
    /// A tool with this name is already registered
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    /// The tool definition violates a schema invariant
    #[error("Invalid tool definition: {0}")]
    InvalidDefinition(String),

    /// The tool transport channel could not be used; the tool never ran
    #[error("Tool transport unavailable: {0}")]
    TransportUnavailable(String),

    /// The language model call failed
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// An operation exceeded its deadline
    #[error("Timed out after {0} ms")]
    Timeout(u64),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for toolhop operations
pub type Result<T> = std::result::Result<T, ToolhopError>;
