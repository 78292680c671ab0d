//! Agent module - the reasoning loop.
//!
//! The agent follows a Thought/Action/Observation pattern:
//! 1. Render the prompt from the template, tools, history and scratchpad
//! 2. Call the LLM and parse the completion
//! 3. If it names an action, dispatch the tool and append the observation
//! 4. Repeat until the model gives a final answer or the step budget runs out

mod agent_loop;
mod factory;
mod memory;
mod parser;
mod prompt;
mod types;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use agent_loop::{Agent, AgentError, AgentOptions, LoopState, STEP_BUDGET_EXHAUSTED};
pub use factory::{AgentFactory, FactoryError};
pub use memory::{ConversationMemory, ConversationTurn};
pub use parser::{parse, ParseError, FINAL_ANSWER_MARKER};
pub use prompt::{render_scratchpad, render_tool_catalogue, template_for, PromptRenderer};
pub use types::{AgentAction, AgentDecision, AgentFinish, AgentRun, IntermediateStep};

/// How tools are exposed to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStrategy {
    /// The model picks one tool per step.
    #[default]
    Sequential,
    /// A single composite tool runs every lookup concurrently.
    Parallel,
}

impl FromStr for DispatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "parallel" => Ok(Self::Parallel),
            other => Err(format!("expected 'sequential' or 'parallel', got: {}", other)),
        }
    }
}

impl std::fmt::Display for DispatchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Parallel => write!(f, "parallel"),
        }
    }
}
