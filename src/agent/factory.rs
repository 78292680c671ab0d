//! Builds fully wired agents from configuration.

use std::sync::Arc;

use thiserror::Error;

use super::agent_loop::{Agent, AgentOptions};
use super::DispatchStrategy;
use crate::config::Config;
use crate::graph::{
    GraphStore, Neo4jHttpStore, QueryPipeline, QueryPipelineOptions, RetryPolicy, StoreError,
};
use crate::llm::{EmbeddingClient, LlmClient, LlmError, OpenAiClient};
use crate::tools::{
    CombinedTool, GraphQueryTool, RegistryError, SimilarityTool, Tool, ToolRegistry,
};

#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("Failed to create LLM client: {0}")]
    Llm(#[from] LlmError),

    #[error("Failed to create graph store client: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Shared collaborators plus the options every new agent gets.
///
/// Tools are stateless and shared; each agent built here gets its own
/// registry handle and its own memory.
#[derive(Clone)]
pub struct AgentFactory {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    options: AgentOptions,
}

impl AgentFactory {
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolRegistry, options: AgentOptions) -> Self {
        Self {
            llm,
            tools,
            options,
        }
    }

    /// Wire the OpenAI client, the Neo4j store and the lookup tools from `config`.
    pub fn from_config(config: &Config) -> Result<Self, FactoryError> {
        let client = Arc::new(OpenAiClient::new(
            &config.api_key,
            &config.api_base_url,
            config.llm_timeout,
        )?);
        let store: Arc<dyn GraphStore> =
            Arc::new(Neo4jHttpStore::new(&config.graph, config.tool_timeout)?);

        let pipeline = Arc::new(QueryPipeline::new(
            client.clone(),
            store.clone(),
            QueryPipelineOptions {
                query_model: config.models.query_model.clone(),
                correction_model: config.models.correction_model.clone(),
                temperature: config.models.temperature,
                threshold: config.graph.similarity_threshold,
                result_limit: config.graph.result_limit,
                retry: RetryPolicy::default().with_max_attempts(config.graph.max_attempts),
            },
        ));
        let query: Arc<dyn Tool> = Arc::new(GraphQueryTool::new(pipeline));

        let embedder: Arc<dyn EmbeddingClient> = client.clone();
        let similarity: Arc<dyn Tool> = Arc::new(SimilarityTool::new(
            embedder,
            store,
            &config.models.embeddings_model,
            &config.graph.vector_index,
            config.graph.similarity_threshold,
            config.graph.result_limit,
        ));

        let tools = build_tools(config.strategy, query, similarity)?;
        let options = AgentOptions {
            model: config.models.agent_model.clone(),
            temperature: config.models.temperature,
            max_iterations: config.max_iterations,
            llm_timeout: config.llm_timeout,
            tool_timeout: config.tool_timeout,
            memory: config.memory,
            strategy: config.strategy,
        };

        Ok(Self::new(client, tools, options))
    }

    /// A fresh agent with empty memory.
    pub fn build(&self) -> Agent {
        Agent::new(self.llm.clone(), self.tools.clone(), self.options.clone())
    }

    pub fn options(&self) -> &AgentOptions {
        &self.options
    }
}

/// Sequential agents see both tools; parallel agents see one composite tool.
pub fn build_tools(
    strategy: DispatchStrategy,
    query: Arc<dyn Tool>,
    similarity: Arc<dyn Tool>,
) -> Result<ToolRegistry, RegistryError> {
    match strategy {
        DispatchStrategy::Sequential => ToolRegistry::new().with_tool(query)?.with_tool(similarity),
        DispatchStrategy::Parallel => {
            ToolRegistry::new().with_tool(Arc::new(CombinedTool::new(query, similarity)))
        }
    }
}
