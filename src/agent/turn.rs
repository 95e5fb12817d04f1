//! Record of one completed conversation turn

use crate::llm::ToolCall;
use crate::tools::InvocationResult;

/// What the model decided to do with the user's message
#[derive(Debug, Clone)]
pub enum ModelDecision {
    /// Answered directly, no tool involved
    DirectAnswer,
    /// Requested one tool call
    ToolCall(ToolCall),
}

/// One user message in, one final answer out, with the tool hop (if any)
/// captured in between.
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub user_message: String,
    pub decision: ModelDecision,
    /// Outcome of the tool hop; `None` when the model answered directly
    pub tool_outcome: Option<InvocationResult>,
    /// Never empty
    pub final_answer: String,
}

impl ConversationTurn {
    /// Name of the tool the model called, if any
    pub fn tool_used(&self) -> Option<&str> {
        match &self.decision {
            ModelDecision::ToolCall(call) => Some(&call.name),
            ModelDecision::DirectAnswer => None,
        }
    }

    /// Tool names touched this turn, for response metadata
    pub fn tools_used(&self) -> Vec<String> {
        self.tool_used().map(|name| vec![name.to_string()]).unwrap_or_default()
    }
}
