//! Turns a raw completion into an [`AgentDecision`].
//!
//! Two alternatives, checked in order:
//! 1. `Final Answer:` anywhere in the text -> finish with what follows it
//! 2. `Action: <tool>` then `Action Input: <input>` -> act
//!
//! Anything else is a [`ParseError`]; the caller decides what to do with it.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use super::types::{AgentAction, AgentDecision, AgentFinish};

pub const FINAL_ANSWER_MARKER: &str = "Final Answer:";
pub const OBSERVATION_MARKER: &str = "Observation:";

/// Completion text matching neither grammar alternative.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Could not parse LLM output: `{text}`")]
pub struct ParseError {
    pub text: String,
}

fn action_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)Action: (.*?)\n*Action Input:\s*(.*)").expect("action pattern is valid")
    })
}

/// Classify `text` as an action or a finish.
pub fn parse(text: &str) -> Result<AgentDecision, ParseError> {
    if let Some((_, answer)) = text.rsplit_once(FINAL_ANSWER_MARKER) {
        return Ok(AgentDecision::Finish(AgentFinish {
            output: answer.trim().to_string(),
            log: text.to_string(),
        }));
    }

    let caps = action_pattern().captures(text).ok_or_else(|| ParseError {
        text: text.to_string(),
    })?;

    Ok(AgentDecision::Act(AgentAction {
        tool: caps[1].trim().to_string(),
        input: unquote(caps[2].trim()).to_string(),
        log: text.to_string(),
    }))
}

/// Strip one pair of surrounding double quotes.
fn unquote(input: &str) -> &str {
    input
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(input)
}
