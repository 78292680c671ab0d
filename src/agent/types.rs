//! Values flowing through one agent invocation.

use serde::Serialize;

/// Parsed instruction to call a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentAction {
    pub tool: String,
    pub input: String,
    /// The full completion the action was parsed from
    pub log: String,
}

/// Parsed terminal answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentFinish {
    pub output: String,
    pub log: String,
}

/// What the model decided to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentDecision {
    Act(AgentAction),
    Finish(AgentFinish),
}

/// A dispatched action and the observation it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntermediateStep {
    pub action: AgentAction,
    pub observation: String,
}

/// Result of a completed invocation.
#[derive(Debug, Clone, Serialize)]
pub struct AgentRun {
    pub output: String,
    pub steps: Vec<IntermediateStep>,
    /// LLM calls made
    pub iterations: usize,
    /// True when the step budget ran out before the model finished
    pub budget_exhausted: bool,
}
