//! Handlers for the gateway endpoints.
//!
//! `/chat` is the main entry: one user message in, one turn through the
//! orchestrator, one answer out. The remaining endpoints expose the tool
//! catalog, direct tool invocation for debugging, and service status.

use axum::Json;
use axum::extract::{Path, State};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::tools::{InvocationRequest, InvocationResult};

use super::AppState;
use super::error::ApiError;

/// Body of `POST /chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_session_id")]
    pub session_id: String,
}

fn default_session_id() -> String {
    "default".to_string()
}

/// Reply to `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub tools_used: Vec<String>,
}

/// `GET /` - service banner.
pub async fn root() -> Json<Value> {
    Json(json!({
        "service": "toolhop",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

/// `GET /health` - per-component status.
///
/// Always 200; degradation is reported in the body so a probe can tell
/// "process up" apart from "everything reachable".
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let transport = match state.transport.list_tools().await {
        Ok(_) => "connected",
        Err(_) => "unreachable",
    };
    let model = if state.llm.is_ready() { "ready" } else { "not_ready" };
    let status = if transport == "connected" && model == "ready" {
        "ok"
    } else {
        "degraded"
    };

    Json(json!({
        "status": status,
        "components": {
            "transport": transport,
            "model": model,
        }
    }))
}

/// `GET /tools` - the live tool catalog, fetched from the tool service.
pub async fn list_tools(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let tools = state.transport.list_tools().await?;
    let count = tools.len();
    Ok(Json(json!({
        "tools": tools,
        "count": count,
    })))
}

/// `POST /chat` - run one conversation turn.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }

    debug!("chat turn for session '{}'", request.session_id);
    let turn = state.orchestrator.run_turn(&request.message).await?;
    let tools_used = turn.tools_used();

    Ok(Json(ChatResponse {
        response: turn.final_answer,
        session_id: request.session_id,
        tools_used,
    }))
}

/// `POST /tools/test/:tool_name` - invoke a tool directly, no model in the
/// loop. Tool-level failures come back as data with a 200; only an
/// unreachable tool service turns into an HTTP error.
pub async fn test_tool(
    State(state): State<AppState>,
    Path(tool_name): Path<String>,
    body: Option<Json<Map<String, Value>>>,
) -> Result<Json<InvocationResult>, ApiError> {
    let arguments = body.map(|Json(map)| map).unwrap_or_default();
    let result = state
        .transport
        .invoke(InvocationRequest::new(tool_name, arguments))
        .await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, ToolhopError};
    use crate::llm::{MockLlmClient, ToolCall};
    use crate::tools::{ToolDefinition, ToolErrorKind};
    use crate::transport::ToolTransport;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    /// Transport double with a scripted catalog and invocation outcome.
    struct StubTransport {
        catalog: std::result::Result<Vec<ToolDefinition>, String>,
        outcome: std::result::Result<InvocationResult, String>,
    }

    impl StubTransport {
        fn up() -> Self {
            Self {
                catalog: Ok(vec![ToolDefinition::new("get_random_quote", "Get a quote")]),
                outcome: Ok(InvocationResult::success(json!({"quote": "Stay hungry."}))),
            }
        }

        fn down() -> Self {
            Self {
                catalog: Err("connection refused".to_string()),
                outcome: Err("connection refused".to_string()),
            }
        }

        fn with_outcome(mut self, outcome: InvocationResult) -> Self {
            self.outcome = Ok(outcome);
            self
        }
    }

    #[async_trait]
    impl ToolTransport for StubTransport {
        async fn list_tools(&self) -> Result<Vec<ToolDefinition>> {
            match &self.catalog {
                Ok(tools) => Ok(tools.clone()),
                Err(e) => Err(ToolhopError::TransportUnavailable(e.clone())),
            }
        }

        async fn invoke(&self, _request: InvocationRequest) -> Result<InvocationResult> {
            match &self.outcome {
                Ok(outcome) => Ok(outcome.clone()),
                Err(e) => Err(ToolhopError::TransportUnavailable(e.clone())),
            }
        }
    }

    fn state_with(llm: MockLlmClient, transport: StubTransport) -> AppState {
        AppState::new(Arc::new(llm), Arc::new(transport), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_root_banner() {
        let banner = root().await.0;
        assert_eq!(banner["service"], "toolhop");
        assert_eq!(banner["status"], "running");
        assert!(banner["version"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_health_ok_when_all_components_up() {
        let state = state_with(MockLlmClient::new(), StubTransport::up());
        let body = health(State(state)).await.0;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["components"]["transport"], "connected");
        assert_eq!(body["components"]["model"], "ready");
    }

    #[tokio::test]
    async fn test_health_degraded_when_transport_down() {
        let state = state_with(MockLlmClient::new(), StubTransport::down());
        let body = health(State(state)).await.0;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["components"]["transport"], "unreachable");
    }

    #[tokio::test]
    async fn test_list_tools_returns_catalog_and_count() {
        let state = state_with(MockLlmClient::new(), StubTransport::up());
        let body = list_tools(State(state)).await.unwrap().0;
        assert_eq!(body["count"], 1);
        assert_eq!(body["tools"][0]["name"], "get_random_quote");
    }

    #[tokio::test]
    async fn test_list_tools_maps_outage_to_service_unavailable() {
        let state = state_with(MockLlmClient::new(), StubTransport::down());
        let err = list_tools(State(state)).await.unwrap_err();
        assert!(matches!(err, ApiError::ToolServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_chat_rejects_empty_message() {
        let state = state_with(MockLlmClient::new(), StubTransport::up());
        let request = ChatRequest {
            message: "   ".to_string(),
            session_id: "s1".to_string(),
        };
        let err = chat(State(state), Json(request)).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_chat_direct_answer() {
        let llm = MockLlmClient::new().with_text("Hello there!");
        let state = state_with(llm, StubTransport::up());
        let request = ChatRequest {
            message: "hi".to_string(),
            session_id: "s1".to_string(),
        };

        let reply = chat(State(state), Json(request)).await.unwrap().0;
        assert_eq!(reply.response, "Hello there!");
        assert_eq!(reply.session_id, "s1");
        assert!(reply.tools_used.is_empty());
    }

    #[tokio::test]
    async fn test_chat_reports_tool_used() {
        let llm = MockLlmClient::new()
            .with_tool_call(ToolCall::new("call_1", "get_random_quote", json!({})))
            .with_text("Here is a quote: Stay hungry.");
        let state = state_with(llm, StubTransport::up());
        let request = ChatRequest {
            message: "inspire me".to_string(),
            session_id: "s2".to_string(),
        };

        let reply = chat(State(state), Json(request)).await.unwrap().0;
        assert_eq!(reply.tools_used, vec!["get_random_quote".to_string()]);
        assert!(reply.response.contains("Stay hungry"));
    }

    #[tokio::test]
    async fn test_chat_model_failure_maps_to_bad_gateway() {
        let llm = MockLlmClient::new().with_failure("API error 500: upstream exploded");
        let state = state_with(llm, StubTransport::up());
        let request = ChatRequest {
            message: "hi".to_string(),
            session_id: "s1".to_string(),
        };

        let err = chat(State(state), Json(request)).await.unwrap_err();
        assert!(matches!(err, ApiError::ModelUnavailable(_)));
    }

    #[tokio::test]
    async fn test_chat_session_id_defaults_in_deserialization() {
        let request: ChatRequest = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
        assert_eq!(request.session_id, "default");
    }

    #[tokio::test]
    async fn test_test_tool_returns_result_as_data() {
        let state = state_with(MockLlmClient::new(), StubTransport::up());
        let result = test_tool(
            State(state),
            Path("get_random_quote".to_string()),
            Some(Json(Map::new())),
        )
        .await
        .unwrap()
        .0;
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_test_tool_failure_is_still_data() {
        let transport = StubTransport::up().with_outcome(InvocationResult::failure(
            ToolErrorKind::UnknownTool,
            "no tool named 'frobnicate'",
        ));
        let state = state_with(MockLlmClient::new(), transport);

        let result = test_tool(State(state), Path("frobnicate".to_string()), None)
            .await
            .unwrap()
            .0;
        assert!(!result.is_success());
        assert_eq!(result.error_kind(), Some(ToolErrorKind::UnknownTool));
    }

    #[tokio::test]
    async fn test_test_tool_outage_maps_to_service_unavailable() {
        let state = state_with(MockLlmClient::new(), StubTransport::down());
        let err = test_tool(State(state), Path("get_random_quote".to_string()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ToolServiceUnavailable(_)));
    }
}
