//! Similarity search over embedded graph entities.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::{Match, Tool, ToolError};
use crate::graph::GraphStore;
use crate::llm::EmbeddingClient;

pub const SIMILARITY_TOOL_NAME: &str = "Similarity Search";

const VECTOR_QUERY: &str = "CALL db.index.vector.queryNodes($index, $k, $embedding) \
YIELD node, score WHERE score >= $threshold RETURN node";

/// Embeds the input and asks the vector index for the nearest entities.
pub struct SimilarityTool {
    embedder: Arc<dyn EmbeddingClient>,
    store: Arc<dyn GraphStore>,
    model: String,
    index: String,
    threshold: f64,
    top_k: usize,
}

impl SimilarityTool {
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        store: Arc<dyn GraphStore>,
        model: impl Into<String>,
        index: impl Into<String>,
        threshold: f64,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            model: model.into(),
            index: index.into(),
            threshold,
            top_k,
        }
    }
}

#[async_trait]
impl Tool for SimilarityTool {
    fn name(&self) -> &str {
        SIMILARITY_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Use this tool to perform a similarity search in the database"
    }

    async fn invoke(&self, input: &str) -> Result<Vec<Match>, ToolError> {
        let embedding = self.embedder.embed(input, &self.model).await?;
        let params = json!({
            "index": self.index,
            "k": self.top_k,
            "embedding": embedding,
            "threshold": self.threshold,
        });
        let rows = self.store.execute(VECTOR_QUERY, params).await?;

        let matches: Vec<Match> = rows
            .iter()
            .filter_map(|row| row.get("node").and_then(|n| n.as_object()))
            .map(Match::from_entity)
            .collect();
        tracing::debug!(matches = matches.len(), "Similarity search complete");
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FixedEmbedder, FlakyStore};

    #[tokio::test]
    async fn nodes_are_projected_and_params_bound() {
        let row = json!({"node": {"id": "PS11752778", "name": "Door Bin", "embedding": [0.3]}})
            .as_object()
            .cloned()
            .unwrap();
        let store = Arc::new(FlakyStore::new(0, vec![row]));
        let tool = SimilarityTool::new(
            Arc::new(FixedEmbedder(vec![0.5, 0.25])),
            store.clone(),
            "text-embedding-3-small",
            "entity_embeddings",
            0.8,
            10,
        );

        let matches = tool.invoke("door shelf bin").await.unwrap();
        assert_eq!(
            matches,
            vec![Match::new().with("id", "PS11752778").with("name", "Door Bin")]
        );
        assert_eq!(
            store.params()[0],
            json!({
                "index": "entity_embeddings",
                "k": 10,
                "embedding": [0.5, 0.25],
                "threshold": 0.8
            })
        );
    }

    #[tokio::test]
    async fn store_failure_is_surfaced() {
        let store = Arc::new(FlakyStore::new(1, vec![]));
        let tool = SimilarityTool::new(
            Arc::new(FixedEmbedder(vec![0.1])),
            store,
            "m",
            "idx",
            0.8,
            10,
        );
        let err = tool.invoke("anything").await.unwrap_err();
        assert!(matches!(err, ToolError::Store(_)));
    }
}
