//! LLM client trait and a scripted mock for tests
//!
//! The orchestrator only sees [`LlmClient`], so tests swap in
//! [`MockLlmClient`] and the gateway swaps in the real OpenAI client.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Result, ToolhopError};
use crate::llm::types::{CompletionRequest, CompletionResponse, StopReason, ToolCall};
use crate::tools::InvocationResult;

/// Stateless LLM client - each call is independent (fresh context)
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Continue after one tool hop: replay the call the model made plus its
    /// outcome, and ask for a final answer. Implementations must not offer
    /// tools on this step so the model can only synthesize.
    async fn continue_with_tool_result(
        &self,
        request: CompletionRequest,
        call: &ToolCall,
        outcome: &InvocationResult,
    ) -> Result<CompletionResponse>;

    /// Model identifier used for health reporting
    fn model(&self) -> &str;

    /// Whether the client is configured well enough to take requests
    fn is_ready(&self) -> bool;
}

/// Scripted mock client. Queued entries are returned in order; an exhausted
/// script fails loudly so tests notice unexpected extra calls.
pub struct MockLlmClient {
    script: Mutex<VecDeque<std::result::Result<CompletionResponse, String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    model: String,
}

impl MockLlmClient {
    /// Create a mock with an empty script
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            model: "mock-model".to_string(),
        }
    }

    /// Queue a full response
    pub fn with_response(self, response: CompletionResponse) -> Self {
        self.script.lock().unwrap().push_back(Ok(response));
        self
    }

    /// Queue a plain text response
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_response(CompletionResponse::text(text))
    }

    /// Queue a response requesting one tool call
    pub fn with_tool_call(self, call: ToolCall) -> Self {
        self.with_response(CompletionResponse {
            content: String::new(),
            tool_calls: vec![call],
            stop_reason: StopReason::ToolUse,
            usage: Default::default(),
        })
    }

    /// Queue a model failure
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.script.lock().unwrap().push_back(Err(message.into()));
        self
    }

    /// All requests the mock has seen, in order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// How many calls the mock has received
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn next(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.requests.lock().unwrap().push(request);
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(ToolhopError::ModelUnavailable(message)),
            None => Err(ToolhopError::ModelUnavailable("mock script exhausted".to_string())),
        }
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.next(request)
    }

    async fn continue_with_tool_result(
        &self,
        request: CompletionRequest,
        _call: &ToolCall,
        _outcome: &InvocationResult,
    ) -> Result<CompletionResponse> {
        self.next(request)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_ready(&self) -> bool {
        true
    }
}
