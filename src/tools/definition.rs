//! Tool definitions and invocation payloads
//!
//! A [`ToolDefinition`] describes one callable tool: its name, a description
//! for the model, and an ordered list of typed parameters. Definitions are
//! built at startup, validated on registration, and never mutated after.
//!
//! Invocation traffic uses [`InvocationRequest`] and [`InvocationResult`].
//! Tool-level failures (unknown tool, invalid arguments, execution error)
//! ride *inside* the result as data; they are never raised across the
//! transport boundary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Runtime type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
}

impl ParamType {
    /// JSON-Schema type name for this parameter type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }

    /// Strict runtime check: does this JSON value already have the right type?
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

/// One typed parameter of a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name, unique within a definition
    pub name: String,
    /// Runtime type
    #[serde(rename = "type")]
    pub param_type: ParamType,
    /// Whether the caller must supply this parameter
    #[serde(default)]
    pub required: bool,
    /// Value used when an optional parameter is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Description surfaced in the schema shown to the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ParamSpec {
    /// Create a required parameter
    pub fn required(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: true,
            default: None,
            description: None,
        }
    }

    /// Create an optional parameter
    pub fn optional(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: false,
            default: None,
            description: None,
        }
    }

    /// Set the default value (only meaningful on optional parameters)
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Set the model-facing description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A registered tool: name, description, ordered parameter schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (e.g. "calculate_bmi"), unique within the catalog
    pub name: String,
    /// Human-readable description for the model
    pub description: String,
    /// Parameters in declaration order
    #[serde(default)]
    pub parameters: Vec<ParamSpec>,
}

impl ToolDefinition {
    /// Create a definition with no parameters
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    /// Append a parameter
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.parameters.push(param);
        self
    }

    /// Look up a parameter by name
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Check the schema invariants: parameter names unique, defaults only
    /// on optional parameters. Returns a human-readable violation if any.
    pub fn schema_violation(&self) -> Option<String> {
        for (i, param) in self.parameters.iter().enumerate() {
            if self.parameters[..i].iter().any(|p| p.name == param.name) {
                return Some(format!("duplicate parameter '{}'", param.name));
            }
            if param.required && param.default.is_some() {
                return Some(format!("required parameter '{}' has a default", param.name));
            }
        }
        None
    }

    /// JSON-Schema object describing the parameters
    pub fn parameters_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            let mut prop = Map::new();
            prop.insert("type".to_string(), json!(param.param_type.as_str()));
            if let Some(desc) = &param.description {
                prop.insert("description".to_string(), json!(desc));
            }
            if let Some(default) = &param.default {
                prop.insert("default".to_string(), default.clone());
            }
            properties.insert(param.name.clone(), Value::Object(prop));

            if param.required {
                required.push(json!(param.name));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// OpenAI-style function schema for the tools array of a completion call
    pub fn to_function_schema(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters_schema(),
            }
        })
    }
}

/// One tool-call attempt: which tool, with which arguments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub tool_name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl InvocationRequest {
    pub fn new(tool_name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }

    /// Request with no arguments
    pub fn bare(tool_name: impl Into<String>) -> Self {
        Self::new(tool_name, Map::new())
    }
}

/// Classification of a tool-level failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    /// No tool with the requested name is registered
    UnknownTool,
    /// Arguments failed schema validation; the handler never ran
    InvalidArguments,
    /// The handler ran and reported a failure
    ExecutionError,
}

impl ToolErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownTool => "unknown_tool",
            Self::InvalidArguments => "invalid_arguments",
            Self::ExecutionError => "execution_error",
        }
    }
}

/// A tool-level failure, carried as data inside [`InvocationResult`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
}

/// Outcome of one invocation. Exactly one of `value`/`error` is populated,
/// matching `success`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
}

impl InvocationResult {
    /// Successful invocation wrapping the handler's payload
    pub fn success(value: Value) -> Self {
        Self {
            success: true,
            value: Some(value),
            error: None,
        }
    }

    /// Failed invocation with a classified error
    pub fn failure(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            value: None,
            error: Some(ToolError {
                kind,
                message: message.into(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Error kind, if this is a failure
    pub fn error_kind(&self) -> Option<ToolErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}
