//! # Parts Graph Agent
//!
//! Answers natural-language questions about appliance parts and models by
//! running an LLM reasoning loop over lookup tools backed by a Neo4j graph.
//!
//! This library provides:
//! - A Thought/Action/Observation agent loop with per-agent conversation memory
//! - A graph query tool (LLM-generated, LLM-reviewed Cypher with bounded retry)
//! - A similarity search tool over a vector index
//! - A composite tool running both lookups concurrently
//! - An HTTP API for asking questions
//!
//! ## Architecture
//!
//! Each step of the loop:
//! 1. Render the prompt from the template, tool catalogue, history and scratchpad
//! 2. Call the LLM and parse its output into an action or a final answer
//! 3. For an action, dispatch the named tool and append the observation
//! 4. Repeat until a final answer or the step budget runs out
//!
//! ## Example
//!
//! ```rust,ignore
//! use partsgraph_agent::{agent::AgentFactory, config::Config};
//!
//! let config = Config::from_env()?;
//! let mut agent = AgentFactory::from_config(&config)?.build();
//! let answer = agent.invoke("Is PS11752778 compatible with FPHD2491KF0?").await?;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod graph;
pub mod llm;
pub mod tools;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
