//! Graph store access and the Cypher generation pipeline.

mod neo4j;
mod pipeline;
mod retry;
pub mod schema;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub use neo4j::Neo4jHttpStore;
pub use pipeline::{extract_cypher, QueryPipeline, QueryPipelineOptions};
pub use retry::RetryPolicy;

/// One result row keyed by column name.
pub type Row = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Graph store transport error: {0}")]
    Transport(String),

    #[error("Graph store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Graph query failed ({code}): {message}")]
    Query { code: String, message: String },

    #[error("Failed to decode graph store response: {0}")]
    Decode(String),
}

/// Query execution contract.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Run `query` with named `params` (a JSON object) and return its rows.
    async fn execute(&self, query: &str, params: Value) -> Result<Vec<Row>, StoreError>;
}
