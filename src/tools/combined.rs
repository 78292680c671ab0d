//! Composite tool fanning one input out to the query and similarity tools.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Match, Tool, ToolError};

pub const COMBINED_TOOL_NAME: &str = "Combined Query Tool";

/// Runs two tools concurrently on the same input and concatenates their
/// results, primary first. Either branch failing fails the whole call.
pub struct CombinedTool {
    primary: Arc<dyn Tool>,
    secondary: Arc<dyn Tool>,
}

impl CombinedTool {
    pub fn new(primary: Arc<dyn Tool>, secondary: Arc<dyn Tool>) -> Self {
        Self { primary, secondary }
    }
}

fn branch(
    tool: &Arc<dyn Tool>,
    result: Result<Vec<Match>, ToolError>,
) -> Result<Vec<Match>, ToolError> {
    result.map_err(|e| ToolError::Branch {
        tool: tool.name().to_string(),
        source: Box::new(e),
    })
}

#[async_trait]
impl Tool for CombinedTool {
    fn name(&self) -> &str {
        COMBINED_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Runs Query and Similarity Search in parallel and returns combined results."
    }

    async fn invoke(&self, input: &str) -> Result<Vec<Match>, ToolError> {
        let (primary, secondary) =
            tokio::join!(self.primary.invoke(input), self.secondary.invoke(input));

        let mut combined = branch(&self.primary, primary)?;
        combined.extend(branch(&self.secondary, secondary)?);
        Ok(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubTool;
    use futures::future::join_all;
    use std::time::Duration;

    fn combined(primary: StubTool, secondary: StubTool) -> CombinedTool {
        CombinedTool::new(Arc::new(primary), Arc::new(secondary))
    }

    #[tokio::test]
    async fn merge_order_is_query_first_under_concurrency() {
        // The slower primary branch must still come first.
        let tool = Arc::new(combined(
            StubTool::new("Query", vec![Match::new().with("id", "A")])
                .with_delay(Duration::from_millis(5)),
            StubTool::new("Similarity Search", vec![Match::new().with("id", "B")]),
        ));

        let runs = (0..100).map(|_| {
            let tool = tool.clone();
            tokio::spawn(async move { tool.invoke("FPHD2491KF0").await })
        });
        let expected = vec![Match::new().with("id", "A"), Match::new().with("id", "B")];
        for joined in join_all(runs).await {
            assert_eq!(joined.unwrap().unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn both_branches_receive_same_input() {
        let primary = Arc::new(StubTool::new("Query", vec![]));
        let secondary = Arc::new(StubTool::new("Similarity Search", vec![]));
        let tool = CombinedTool::new(primary.clone(), secondary.clone());

        tool.invoke("ice maker").await.unwrap();
        assert_eq!(primary.inputs(), vec!["ice maker".to_string()]);
        assert_eq!(secondary.inputs(), vec!["ice maker".to_string()]);
    }

    #[tokio::test]
    async fn failing_branch_fails_whole_call() {
        let tool = combined(
            StubTool::new("Query", vec![Match::new().with("id", "A")]),
            StubTool::failing("Similarity Search"),
        );
        let err = tool.invoke("x").await.unwrap_err();
        assert!(matches!(err, ToolError::Branch { ref tool, .. } if tool == "Similarity Search"));
    }

    #[tokio::test]
    async fn primary_failure_named_in_error() {
        let tool = combined(
            StubTool::failing("Query"),
            StubTool::new("Similarity Search", vec![Match::new().with("id", "B")]),
        );
        let err = tool.invoke("x").await.unwrap_err();
        assert!(err.to_string().starts_with("Tool 'Query' failed"));
    }
}
