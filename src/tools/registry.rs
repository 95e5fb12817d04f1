//! Tool registry: ordered catalog plus validated execution
//!
//! The registry owns every [`ToolDefinition`] and the async handler bound to
//! it. Registration happens once at startup (`register` takes `&mut self`);
//! after that the registry is shared immutably behind an `Arc` and `invoke`
//! is safe for any number of concurrent callers.
//!
//! `invoke` never returns `Err`: lookup failures, argument validation
//! failures, and handler failures all come back as
//! `InvocationResult { success: false, .. }` so they can cross the transport
//! as plain data.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use log::debug;
use serde_json::{Map, Number, Value};

use crate::error::{Result, ToolhopError};

use super::definition::{InvocationRequest, InvocationResult, ParamType, ToolDefinition, ToolErrorKind};

/// What a handler produces: a JSON payload, or a failure message that the
/// registry converts to an `execution_error`.
pub type HandlerResult = std::result::Result<Value, String>;

/// Async implementation bound to a tool definition. Receives the validated,
/// defaulted argument map.
pub type ToolHandler = Arc<dyn Fn(Map<String, Value>) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

struct RegisteredTool {
    definition: ToolDefinition,
    handler: ToolHandler,
}

/// Catalog of tools in registration order
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool definition with its handler.
    ///
    /// Fails with `DuplicateTool` if the name is taken and
    /// `InvalidDefinition` if the definition breaks a schema invariant.
    pub fn register(&mut self, definition: ToolDefinition, handler: ToolHandler) -> Result<()> {
        if let Some(violation) = definition.schema_violation() {
            return Err(ToolhopError::InvalidDefinition(format!(
                "{}: {}",
                definition.name, violation
            )));
        }
        if self.contains(&definition.name) {
            return Err(ToolhopError::DuplicateTool(definition.name.clone()));
        }
        debug!("registered tool: {}", definition.name);
        self.tools.push(RegisteredTool { definition, handler });
        Ok(())
    }

    /// Snapshot of the catalog, in registration order
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition.clone()).collect()
    }

    /// Whether a tool with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.definition.name == name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute one invocation request against the catalog.
    ///
    /// Order of checks: tool lookup, then argument validation (unknown
    /// names, required presence, types with numeric-string coercion), then
    /// the handler with defaults applied. The handler does not run unless
    /// validation passed.
    pub async fn invoke(&self, request: &InvocationRequest) -> InvocationResult {
        let Some(tool) = self.tools.iter().find(|t| t.definition.name == request.tool_name) else {
            return InvocationResult::failure(
                ToolErrorKind::UnknownTool,
                format!("no tool named '{}'", request.tool_name),
            );
        };

        let arguments = match validate_arguments(&tool.definition, &request.arguments) {
            Ok(validated) => validated,
            Err(detail) => return InvocationResult::failure(ToolErrorKind::InvalidArguments, detail),
        };

        match (tool.handler)(arguments).await {
            Ok(value) => InvocationResult::success(value),
            Err(message) => InvocationResult::failure(ToolErrorKind::ExecutionError, message),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.tools.iter().map(|t| t.definition.name.as_str()).collect();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}

/// Check arguments against the parameter specs and build the map the
/// handler sees: validated values plus defaults for absent optionals.
fn validate_arguments(
    definition: &ToolDefinition,
    arguments: &Map<String, Value>,
) -> std::result::Result<Map<String, Value>, String> {
    for name in arguments.keys() {
        if definition.param(name).is_none() {
            return Err(format!("unknown argument '{name}'"));
        }
    }

    let mut validated = Map::new();
    for param in &definition.parameters {
        match arguments.get(&param.name) {
            Some(value) => {
                let value = coerce(value, param.param_type).ok_or_else(|| {
                    format!("argument '{}' must be a {}", param.name, param.param_type.as_str())
                })?;
                validated.insert(param.name.clone(), value);
            }
            None if param.required => {
                return Err(format!("missing required argument '{}'", param.name));
            }
            None => {
                if let Some(default) = &param.default {
                    validated.insert(param.name.clone(), default.clone());
                }
            }
        }
    }
    Ok(validated)
}

/// Accept a value for the given type. The one coercion: models emit numbers
/// as text, so a string parsing as a finite f64 passes for `number`.
fn coerce(value: &Value, param_type: ParamType) -> Option<Value> {
    if param_type.accepts(value) {
        return Some(value.clone());
    }
    if param_type == ParamType::Number {
        if let Value::String(s) = value {
            if let Ok(parsed) = s.trim().parse::<f64>() {
                return Number::from_f64(parsed).map(Value::Number);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::definition::ParamSpec;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Handler that echoes the argument map it received
    fn echo_handler() -> ToolHandler {
        Arc::new(|args| Box::pin(async move { Ok(Value::Object(args)) }))
    }

    fn echo_definition() -> ToolDefinition {
        ToolDefinition::new("echo", "Echo validated arguments back")
            .with_param(ParamSpec::required("text", ParamType::String))
            .with_param(ParamSpec::optional("repeat", ParamType::Number).with_default(1))
            .with_param(ParamSpec::optional("loud", ParamType::Boolean))
    }

    fn registry_with_echo() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(echo_definition(), echo_handler()).unwrap();
        registry
    }

    fn args(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_register_and_list_order() {
        let mut registry = ToolRegistry::new();
        registry
            .register(ToolDefinition::new("beta", "Second tool"), echo_handler())
            .unwrap();
        registry
            .register(ToolDefinition::new("alpha", "First tool"), echo_handler())
            .unwrap();

        let names: Vec<String> = registry.list_tools().into_iter().map(|t| t.name).collect();
        // Registration order, not alphabetical
        assert_eq!(names, vec!["beta", "alpha"]);
    }

    #[test]
    fn test_list_tools_idempotent() {
        let registry = registry_with_echo();
        let first: Vec<String> = registry.list_tools().into_iter().map(|t| t.name).collect();
        let second: Vec<String> = registry.list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_register_duplicate_name() {
        let mut registry = registry_with_echo();
        let err = registry.register(echo_definition(), echo_handler()).unwrap_err();
        assert!(matches!(err, ToolhopError::DuplicateTool(name) if name == "echo"));
    }

    #[test]
    fn test_register_invalid_definition() {
        let mut registry = ToolRegistry::new();
        let bad = ToolDefinition::new("bad", "Default on required")
            .with_param(ParamSpec::required("x", ParamType::Number).with_default(3));
        let err = registry.register(bad, echo_handler()).unwrap_err();
        assert!(matches!(err, ToolhopError::InvalidDefinition(_)));
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool() {
        let registry = registry_with_echo();
        let result = registry.invoke(&InvocationRequest::bare("frobnicate")).await;
        assert!(!result.is_success());
        assert_eq!(result.error_kind(), Some(ToolErrorKind::UnknownTool));
        // Catalog unaffected
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_invoke_missing_required_never_runs_handler() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let handler: ToolHandler = Arc::new(move |_args| {
            let seen = seen.clone();
            Box::pin(async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(json!("ran"))
            })
        });

        let mut registry = ToolRegistry::new();
        registry
            .register(
                ToolDefinition::new("strict", "Requires x").with_param(ParamSpec::required("x", ParamType::Number)),
                handler,
            )
            .unwrap();

        let result = registry.invoke(&InvocationRequest::bare("strict")).await;
        assert_eq!(result.error_kind(), Some(ToolErrorKind::InvalidArguments));
        assert!(result.error.unwrap().message.contains("missing required argument 'x'"));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invoke_rejects_unknown_argument() {
        let registry = registry_with_echo();
        let request = InvocationRequest::new("echo", args(&[("text", json!("hi")), ("volume", json!(11))]));
        let result = registry.invoke(&request).await;
        assert_eq!(result.error_kind(), Some(ToolErrorKind::InvalidArguments));
        assert!(result.error.unwrap().message.contains("unknown argument 'volume'"));
    }

    #[tokio::test]
    async fn test_invoke_rejects_wrong_type() {
        let registry = registry_with_echo();
        let request = InvocationRequest::new("echo", args(&[("text", json!(42))]));
        let result = registry.invoke(&request).await;
        assert_eq!(result.error_kind(), Some(ToolErrorKind::InvalidArguments));
        assert!(result.error.unwrap().message.contains("'text' must be a string"));
    }

    #[tokio::test]
    async fn test_invoke_coerces_numeric_string() {
        let registry = registry_with_echo();
        let request = InvocationRequest::new("echo", args(&[("text", json!("hi")), ("repeat", json!("3.5"))]));
        let result = registry.invoke(&request).await;
        assert!(result.is_success());
        assert_eq!(result.value.unwrap()["repeat"], json!(3.5));
    }

    #[tokio::test]
    async fn test_invoke_rejects_non_numeric_string_for_number() {
        let registry = registry_with_echo();
        let request = InvocationRequest::new("echo", args(&[("text", json!("hi")), ("repeat", json!("lots"))]));
        let result = registry.invoke(&request).await;
        assert_eq!(result.error_kind(), Some(ToolErrorKind::InvalidArguments));
    }

    #[tokio::test]
    async fn test_invoke_does_not_coerce_boolean_strings() {
        let registry = registry_with_echo();
        let request = InvocationRequest::new("echo", args(&[("text", json!("hi")), ("loud", json!("true"))]));
        let result = registry.invoke(&request).await;
        assert_eq!(result.error_kind(), Some(ToolErrorKind::InvalidArguments));
    }

    #[tokio::test]
    async fn test_invoke_applies_defaults() {
        let registry = registry_with_echo();
        let request = InvocationRequest::new("echo", args(&[("text", json!("hi"))]));
        let result = registry.invoke(&request).await;
        assert!(result.is_success());
        let value = result.value.unwrap();
        assert_eq!(value["repeat"], json!(1));
        // Optional without default stays absent
        assert!(value.get("loud").is_none());
    }

    #[tokio::test]
    async fn test_invoke_execution_error() {
        let failing: ToolHandler = Arc::new(|_args| Box::pin(async move { Err("upstream unreachable".to_string()) }));
        let mut registry = ToolRegistry::new();
        registry
            .register(ToolDefinition::new("flaky", "Always fails"), failing)
            .unwrap();

        let result = registry.invoke(&InvocationRequest::bare("flaky")).await;
        assert_eq!(result.error_kind(), Some(ToolErrorKind::ExecutionError));
        assert_eq!(result.error.unwrap().message, "upstream unreachable");
    }

    #[tokio::test]
    async fn test_invoke_success_wraps_value() {
        let registry = registry_with_echo();
        let request = InvocationRequest::new("echo", args(&[("text", json!("payload"))]));
        let result = registry.invoke(&request).await;
        assert!(result.is_success());
        assert_eq!(result.value.unwrap()["text"], json!("payload"));
    }

    #[test]
    fn test_contains_and_len() {
        let registry = registry_with_echo();
        assert!(registry.contains("echo"));
        assert!(!registry.contains("missing"));
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
        assert!(ToolRegistry::new().is_empty());
    }

    #[test]
    fn test_debug_lists_tool_names() {
        let registry = registry_with_echo();
        let debug = format!("{registry:?}");
        assert!(debug.contains("echo"));
    }
}
