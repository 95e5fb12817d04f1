//! OpenAI chat-completions client
//!
//! Implements [`LlmClient`] against the OpenAI API. Tool call arguments
//! arrive as a stringified JSON blob; an unparseable blob degrades to an
//! empty object so argument validation downstream can tell the model what
//! was wrong instead of the turn blowing up here.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::error::{Result, ToolhopError};
use crate::llm::client::LlmClient;
use crate::llm::types::{CompletionRequest, CompletionResponse, StopReason, ToolCall, Usage};
use crate::tools::InvocationResult;

/// Default model to use
const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";

/// Default API base URL
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default max tokens
const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Default sampling temperature (low: tool picking should be boring)
const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Configuration for the OpenAI client
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(30),
        }
    }
}

impl OpenAiConfig {
    /// Create a new config with a specific model
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }
}

/// OpenAI API client
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    config: OpenAiConfig,
    usage: Arc<Mutex<Usage>>,
}

impl OpenAiClient {
    /// Create a new OpenAI client
    ///
    /// Reads OPENAI_API_KEY from environment
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ToolhopError::ModelUnavailable("OPENAI_API_KEY not set".to_string()))?;

        Self::with_api_key(api_key, config)
    }

    /// Create a client with an explicit API key
    pub fn with_api_key(api_key: String, config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ToolhopError::ModelUnavailable(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            config,
            usage: Arc::new(Mutex::new(Usage::default())),
        })
    }

    /// Build the request body for the chat completions endpoint
    fn build_request(&self, request: &CompletionRequest) -> Value {
        let model = request.model.as_ref().unwrap_or(&self.config.model).clone();
        let max_tokens = request.max_tokens.unwrap_or(self.config.max_tokens);
        let temperature = request.temperature.unwrap_or(self.config.temperature);

        let mut messages: Vec<Value> = Vec::with_capacity(request.messages.len() + 1);
        if !request.system.is_empty() {
            messages.push(json!({ "role": "system", "content": request.system }));
        }
        for m in &request.messages {
            messages.push(json!({ "role": m.role.as_str(), "content": m.content }));
        }

        let mut body = json!({
            "model": model,
            "max_tokens": max_tokens,
            "temperature": temperature,
            "messages": messages,
        });

        // Add tools if present
        if !request.tools.is_empty() {
            let tools: Vec<Value> = request.tools.iter().map(|t| t.to_function_schema()).collect();
            body["tools"] = json!(tools);
        }

        body
    }

    /// Build the synthesis request: the original exchange plus the tool call
    /// the model made and its outcome. Offers no tools, so the model can
    /// only answer in text.
    fn build_continuation_request(
        &self,
        request: &CompletionRequest,
        call: &ToolCall,
        outcome: &InvocationResult,
    ) -> Result<Value> {
        let mut body = self.build_request(request);
        if let Some(obj) = body.as_object_mut() {
            obj.remove("tools");
        }

        let arguments = serde_json::to_string(&call.arguments)?;
        let outcome_json = serde_json::to_string(outcome)?;

        if let Some(messages) = body["messages"].as_array_mut() {
            messages.push(json!({
                "role": "assistant",
                "content": Value::Null,
                "tool_calls": [{
                    "id": call.id,
                    "type": "function",
                    "function": { "name": call.name, "arguments": arguments },
                }],
            }));
            messages.push(json!({
                "role": "tool",
                "tool_call_id": call.id,
                "content": outcome_json,
            }));
        }

        Ok(body)
    }

    /// Parse the API response into a CompletionResponse
    fn parse_response(&self, body: Value) -> Result<CompletionResponse> {
        let choice = body["choices"]
            .get(0)
            .ok_or_else(|| ToolhopError::ModelUnavailable("response has no choices".to_string()))?;
        let message = &choice["message"];

        let stop_reason = choice["finish_reason"]
            .as_str()
            .map(StopReason::from_finish_reason)
            .unwrap_or_default();

        let usage = if let Some(u) = body.get("usage") {
            Usage::new(
                u["prompt_tokens"].as_u64().unwrap_or(0),
                u["completion_tokens"].as_u64().unwrap_or(0),
            )
        } else {
            Usage::default()
        };

        // Track cumulative usage
        {
            let mut total = self.usage.lock().unwrap();
            total.add(&usage);
        }

        let content = message["content"].as_str().unwrap_or("").to_string();

        let mut tool_calls = Vec::new();
        if let Some(calls) = message["tool_calls"].as_array() {
            for call in calls {
                let id = call["id"].as_str().unwrap_or("").to_string();
                let name = call["function"]["name"].as_str().unwrap_or("").to_string();
                let arguments = parse_arguments(&call["function"]["arguments"]);
                tool_calls.push(ToolCall::new(id, name, arguments));
            }
        }

        Ok(CompletionResponse {
            content,
            tool_calls,
            stop_reason,
            usage,
        })
    }

    /// Send a request to the chat completions endpoint
    async fn send_request(&self, body: Value) -> Result<Value> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ToolhopError::ModelUnavailable(format!("Request failed: {e}")))?;

        let status = response.status();

        // Handle rate limiting
        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ToolhopError::ModelUnavailable(format!(
                "Rate limited, retry after {retry_after} seconds"
            )));
        }

        // Handle other errors
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ToolhopError::ModelUnavailable(format!("API error {status}: {error_body}")));
        }

        response
            .json()
            .await
            .map_err(|e| ToolhopError::ModelUnavailable(format!("Failed to parse response: {e}")))
    }

    /// Get cumulative token usage
    pub fn total_usage(&self) -> Usage {
        self.usage.lock().unwrap().clone()
    }
}

/// Function arguments arrive stringified; bad JSON degrades to an empty
/// object rather than failing the turn.
fn parse_arguments(raw: &Value) -> Value {
    match raw {
        Value::String(s) => serde_json::from_str(s).unwrap_or_else(|_| json!({})),
        Value::Object(_) => raw.clone(),
        _ => json!({}),
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = self.build_request(&request);
        let response = self.send_request(body).await?;
        self.parse_response(response)
    }

    async fn continue_with_tool_result(
        &self,
        request: CompletionRequest,
        call: &ToolCall,
        outcome: &InvocationResult,
    ) -> Result<CompletionResponse> {
        let body = self.build_continuation_request(&request, call, outcome)?;
        let response = self.send_request(body).await?;
        self.parse_response(response)
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn is_ready(&self) -> bool {
        !self.api_key.is_empty()
    }
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .field("max_tokens", &self.config.max_tokens)
            .finish()
    }
}
