//! Turn orchestrator - one user message in, one final answer out
//!
//! A turn makes at most one tool hop. The model either answers directly or
//! picks a single tool; the tool's outcome (success or failure, as data) is
//! fed back for a synthesis pass that offers no tools, so the model must
//! answer in text. The whole turn runs under a deadline.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use serde_json::{Map, Value};

use crate::error::{Result, ToolhopError};
use crate::llm::{CompletionRequest, LlmClient, ToolCall};
use crate::tools::{InvocationRequest, InvocationResult, ToolErrorKind};
use crate::transport::ToolTransport;

use super::turn::{ConversationTurn, ModelDecision};

/// System prompt for the assistant
const SYSTEM_PROMPT: &str = r#"You are a helpful AI assistant with access to various tools.

You can help users with:
- Health calculations (BMI)
- Weather information for cities around the world
- Inspirational quotes
- Financial calculations (compound interest, tip splitting)
- Password generation
- Temperature conversions

Use the available tools whenever the user's request calls for them. If a tool returns an error, explain the issue to the user in plain language and suggest how to fix the request.

Be conversational and friendly while maintaining professionalism."#;

/// Default per-turn deadline
const DEFAULT_TURN_TIMEOUT_SECS: u64 = 60;

/// Answer of last resort; a turn never ends with empty text
const EMPTY_ANSWER_FALLBACK: &str =
    "I wasn't able to put together an answer this time. Please try rephrasing your question.";

/// Drives one conversation turn against a model and a tool transport.
///
/// Generic over both seams; `?Sized` so trait objects work when the
/// concrete types are chosen at runtime.
pub struct Orchestrator<L: ?Sized, T: ?Sized> {
    llm: Arc<L>,
    transport: Arc<T>,
    turn_timeout: Duration,
}

impl<L: LlmClient + ?Sized, T: ToolTransport + ?Sized> Orchestrator<L, T> {
    pub fn new(llm: Arc<L>, transport: Arc<T>) -> Self {
        Self {
            llm,
            transport,
            turn_timeout: Duration::from_secs(DEFAULT_TURN_TIMEOUT_SECS),
        }
    }

    /// Override the per-turn deadline.
    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = timeout;
        self
    }

    pub fn turn_timeout(&self) -> Duration {
        self.turn_timeout
    }

    /// Run one turn under the deadline.
    pub async fn run_turn(&self, user_message: &str) -> Result<ConversationTurn> {
        let timeout_ms = self.turn_timeout.as_millis() as u64;
        match tokio::time::timeout(self.turn_timeout, self.turn_inner(user_message)).await {
            Ok(result) => result,
            Err(_) => Err(ToolhopError::Timeout(timeout_ms)),
        }
    }

    async fn turn_inner(&self, user_message: &str) -> Result<ConversationTurn> {
        // An unreachable tool service downgrades the turn to no-tools
        // rather than failing it
        let tools = match self.transport.list_tools().await {
            Ok(tools) => tools,
            Err(e) => {
                warn!("tool catalog unavailable, continuing without tools: {e}");
                Vec::new()
            }
        };

        let request = CompletionRequest::new(SYSTEM_PROMPT)
            .with_user_message(user_message)
            .with_tools(tools);

        let response = self.llm.complete(request.clone()).await?;

        let Some(call) = response.first_tool_call().cloned() else {
            return Ok(ConversationTurn {
                user_message: user_message.to_string(),
                decision: ModelDecision::DirectAnswer,
                tool_outcome: None,
                final_answer: non_empty_answer(response.content),
            });
        };

        if response.tool_calls.len() > 1 {
            debug!(
                "model requested {} tool calls, taking the first ('{}')",
                response.tool_calls.len(),
                call.name
            );
        }

        let invocation = InvocationRequest::new(&call.name, arguments_object(&call));
        let outcome = match self.transport.invoke(invocation).await {
            Ok(outcome) => outcome,
            Err(ToolhopError::TransportUnavailable(e)) => {
                // Feed the outage back to the model as a failed tool run so
                // it can still apologize usefully
                warn!("tool service unreachable during invoke: {e}");
                InvocationResult::failure(
                    ToolErrorKind::ExecutionError,
                    format!("The tool service could not be reached: {e}"),
                )
            }
            Err(e) => return Err(e),
        };

        let synthesis = self.llm.continue_with_tool_result(request, &call, &outcome).await?;

        Ok(ConversationTurn {
            user_message: user_message.to_string(),
            decision: ModelDecision::ToolCall(call),
            tool_outcome: Some(outcome),
            final_answer: non_empty_answer(synthesis.content),
        })
    }
}

/// Arguments as an object map; anything else the model produced is treated
/// as no arguments and left for schema validation to report.
fn arguments_object(call: &ToolCall) -> Map<String, Value> {
    match &call.arguments {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    }
}

fn non_empty_answer(content: String) -> String {
    if content.trim().is_empty() {
        EMPTY_ANSWER_FALLBACK.to_string()
    } else {
        content
    }
}
