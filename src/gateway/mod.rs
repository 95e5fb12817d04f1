//! HTTP gateway - the axum front door of the assistant.
//!
//! Endpoints:
//! - `GET  /`                      service banner
//! - `GET  /health`                component status
//! - `GET  /tools`                 live tool catalog
//! - `POST /chat`                  one conversation turn
//! - `POST /tools/test/:tool_name` direct tool invocation (debugging)

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::{ChatRequest, ChatResponse};

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use log::info;

use crate::agent::Orchestrator;
use crate::error::Result;
use crate::llm::LlmClient;
use crate::transport::ToolTransport;

/// Shared state handed to every handler. Cheap to clone; everything is
/// behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator<dyn LlmClient, dyn ToolTransport>>,
    pub llm: Arc<dyn LlmClient>,
    pub transport: Arc<dyn ToolTransport>,
}

impl AppState {
    /// Wire an orchestrator around the given model and transport.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        transport: Arc<dyn ToolTransport>,
        turn_timeout: Duration,
    ) -> Self {
        let orchestrator = Arc::new(
            Orchestrator::new(Arc::clone(&llm), Arc::clone(&transport))
                .with_turn_timeout(turn_timeout),
        );
        Self {
            orchestrator,
            llm,
            transport,
        }
    }
}

/// Build the gateway router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/tools", get(handlers::list_tools))
        .route("/chat", post(handlers::chat))
        .route("/tools/test/:tool_name", post(handlers::test_tool))
        .with_state(state)
}

/// Bind `addr` and serve the gateway until the process is stopped.
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Gateway listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use crate::tools::{InvocationRequest, InvocationResult, ToolDefinition, ToolErrorKind};
    use async_trait::async_trait;

    struct NullTransport;

    #[async_trait]
    impl ToolTransport for NullTransport {
        async fn list_tools(&self) -> Result<Vec<ToolDefinition>> {
            Ok(Vec::new())
        }

        async fn invoke(&self, request: InvocationRequest) -> Result<InvocationResult> {
            Ok(InvocationResult::failure(
                ToolErrorKind::UnknownTool,
                format!("no tool named '{}'", request.tool_name),
            ))
        }
    }

    #[test]
    fn test_app_state_wires_turn_timeout() {
        let state = AppState::new(
            Arc::new(MockLlmClient::new()),
            Arc::new(NullTransport),
            Duration::from_secs(7),
        );
        assert_eq!(state.orchestrator.turn_timeout(), Duration::from_secs(7));
    }

    #[test]
    fn test_app_state_clone_shares_components() {
        let state = AppState::new(
            Arc::new(MockLlmClient::new()),
            Arc::new(NullTransport),
            Duration::from_secs(1),
        );
        let cloned = state.clone();
        assert!(Arc::ptr_eq(&state.transport, &cloned.transport));
        assert!(Arc::ptr_eq(&state.orchestrator, &cloned.orchestrator));
    }

    #[test]
    fn test_router_builds_with_state() {
        let state = AppState::new(
            Arc::new(MockLlmClient::new()),
            Arc::new(NullTransport),
            Duration::from_secs(1),
        );
        let _app = router(state);
    }
}
