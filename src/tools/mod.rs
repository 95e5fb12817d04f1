//! Tool system - definitions, the ordered registry, and the builtin catalog

mod builtin;
mod definition;
mod registry;

pub use builtin::default_registry;
pub use definition::{
    InvocationRequest, InvocationResult, ParamSpec, ParamType, ToolDefinition, ToolError, ToolErrorKind,
};
pub use registry::{HandlerResult, ToolHandler, ToolRegistry};
