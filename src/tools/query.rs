//! Graph query tool: natural language in, matched entities out.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Match, Tool, ToolError};
use crate::graph::QueryPipeline;

pub const QUERY_TOOL_NAME: &str = "Query";

/// Runs the generate/correct/execute pipeline on the action input.
pub struct GraphQueryTool {
    pipeline: Arc<QueryPipeline>,
}

impl GraphQueryTool {
    pub fn new(pipeline: Arc<QueryPipeline>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl Tool for GraphQueryTool {
    fn name(&self) -> &str {
        QUERY_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Use this tool to find entities in the user prompt that can be used to generate queries"
    }

    async fn invoke(&self, input: &str) -> Result<Vec<Match>, ToolError> {
        self.pipeline.run(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::QueryPipelineOptions;
    use crate::testing::{FlakyStore, ScriptedLlm};
    use serde_json::json;

    #[tokio::test]
    async fn invoke_runs_pipeline() {
        let llm = Arc::new(ScriptedLlm::replying(&[
            r#"{"cypher": "MATCH (m:Model {model_num: 'FPHD2491KF0'}) RETURN m"}"#,
            "MATCH (m:Model {model_num: 'FPHD2491KF0'}) RETURN m",
        ]));
        let row = json!({"m": {"model_num": "FPHD2491KF0", "name": "Dishwasher"}})
            .as_object()
            .cloned()
            .unwrap();
        let store = Arc::new(FlakyStore::new(0, vec![row]));
        let pipeline = Arc::new(QueryPipeline::new(
            llm,
            store,
            QueryPipelineOptions::default(),
        ));
        let tool = GraphQueryTool::new(pipeline);

        let matches = tool.invoke("FPHD2491KF0").await.unwrap();
        assert_eq!(tool.name(), "Query");
        assert_eq!(
            matches,
            vec![Match::new()
                .with("model_num", "FPHD2491KF0")
                .with("name", "Dishwasher")]
        );
    }
}
