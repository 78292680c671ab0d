//! Lookup tools the agent can call.
//!
//! Every tool takes the free-text `Action Input` and returns a list of
//! [`Match`]es. Three implementations exist:
//! - [`GraphQueryTool`] - LLM-generated Cypher against the graph
//! - [`SimilarityTool`] - vector similarity over embedded entities
//! - [`CombinedTool`] - both of the above, run concurrently and merged

mod combined;
mod query;
mod similarity;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::graph::StoreError;
use crate::llm::LlmError;

pub use combined::CombinedTool;
pub use query::GraphQueryTool;
pub use similarity::SimilarityTool;

/// Attribute keys a [`Match`] may carry. Anything else on a graph entity is dropped.
pub const MATCH_ATTRIBUTES: &[&str] = &[
    "id",
    "name",
    "description",
    "url",
    "price",
    "status",
    "difficulty",
    "repair_time",
    "works_with_products",
    "web_id",
    "model_num",
    "partselect_num",
    "manufacturer_part_num",
    "content",
    "tools",
    "question",
    "answer",
    "date",
];

/// One retrieved entity, projected down to the known attribute vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Match(BTreeMap<String, Value>);

impl Match {
    pub fn new() -> Self {
        Self::default()
    }

    /// Project an entity's properties onto [`MATCH_ATTRIBUTES`].
    pub fn from_entity(entity: &Map<String, Value>) -> Self {
        let attributes = MATCH_ATTRIBUTES
            .iter()
            .filter_map(|key| entity.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect();
        Self(attributes)
    }

    /// Builder-style attribute insertion.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Render tool results as the observation text fed back to the model.
pub fn observation_text(matches: &[Match]) -> String {
    serde_json::to_string(matches).unwrap_or_else(|_| "[]".to_string())
}

/// Errors raised while invoking a tool.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool '{tool}' timed out after {after:?}")]
    Timeout {
        tool: String,
        after: std::time::Duration,
    },

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Graph query failed after {attempts} attempts: {last_error}")]
    RetryExhausted { attempts: u32, last_error: StoreError },

    #[error("Tool '{tool}' failed: {source}")]
    Branch {
        tool: String,
        #[source]
        source: Box<ToolError>,
    },
}

/// A callable lookup tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name used verbatim in `Action:` lines.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    async fn invoke(&self, input: &str) -> Result<Vec<Match>, ToolError>;
}

/// Name and description of a registered tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("A tool named '{0}' is already registered")]
    DuplicateName(String),
}

/// Ordered set of tools available to one agent.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Names must be unique.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        if self.get(tool.name()).is_some() {
            return Err(RegistryError::DuplicateName(tool.name().to_string()));
        }
        self.tools.push(tool);
        Ok(())
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Result<Self, RegistryError> {
        self.register(tool)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Tools in registration order.
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke the named tool with the raw action input.
    pub async fn execute(&self, name: &str, input: &str) -> Result<Vec<Match>, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tracing::debug!(tool = name, "Invoking tool");
        tool.invoke(input).await
    }
}
