//! Agent orchestration - one turn, at most one tool hop

mod orchestrator;
mod turn;

pub use orchestrator::Orchestrator;
pub use turn::{ConversationTurn, ModelDecision};
