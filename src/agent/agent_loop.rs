//! Core agent loop implementation.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::memory::ConversationMemory;
use super::parser::{parse, ParseError, OBSERVATION_MARKER};
use super::prompt::{template_for, PromptRenderer};
use super::types::{AgentAction, AgentDecision, AgentRun, IntermediateStep};
use super::DispatchStrategy;
use crate::llm::{CompletionRequest, LlmClient, LlmError};
use crate::tools::{observation_text, Match, ToolError, ToolRegistry};

/// Output of the forced finish when the step budget runs out.
pub const STEP_BUDGET_EXHAUSTED: &str = "Agent stopped due to iteration limit.";

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Unknown tool '{tool}' (available: {available})")]
    UnknownTool { tool: String, available: String },

    #[error("Tool '{tool}' failed: {source}")]
    Tool {
        tool: String,
        #[source]
        source: ToolError,
    },

    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),
}

/// Where one invocation currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Thinking,
    Acting,
    Observing,
    Finished,
}

/// Tunables for one agent.
#[derive(Debug, Clone)]
pub struct AgentOptions {
    pub model: String,
    pub temperature: f32,
    /// LLM calls allowed per invocation before a forced finish
    pub max_iterations: usize,
    pub llm_timeout: Duration,
    pub tool_timeout: Duration,
    /// Keep and render conversation history
    pub memory: bool,
    pub strategy: DispatchStrategy,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            temperature: 0.0,
            max_iterations: 15,
            llm_timeout: Duration::from_secs(60),
            tool_timeout: Duration::from_secs(120),
            memory: true,
            strategy: DispatchStrategy::Sequential,
        }
    }
}

/// A tool-using agent with its own tools and (optionally) its own memory.
///
/// `invoke` takes `&mut self`: one invocation per agent at a time. Share an
/// agent between callers behind an async mutex.
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    renderer: PromptRenderer,
    memory: Option<ConversationMemory>,
    options: AgentOptions,
}

impl Agent {
    /// Create an agent; the prompt template follows `options.memory` and `options.strategy`.
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolRegistry, options: AgentOptions) -> Self {
        let renderer = PromptRenderer::new(template_for(options.memory, options.strategy));
        let memory = options.memory.then(ConversationMemory::new);
        Self {
            llm,
            tools,
            renderer,
            memory,
            options,
        }
    }

    /// Replace the prompt template.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.renderer = PromptRenderer::new(template);
        self
    }

    pub fn memory(&self) -> Option<&ConversationMemory> {
        self.memory.as_ref()
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn options(&self) -> &AgentOptions {
        &self.options
    }

    /// Answer `input`, returning only the final text.
    pub async fn invoke(&mut self, input: &str) -> Result<String, AgentError> {
        self.run(input).await.map(|run| run.output)
    }

    /// Answer `input`, returning the final text and every intermediate step.
    pub async fn run(&mut self, input: &str) -> Result<AgentRun, AgentError> {
        let chat_history = self
            .memory
            .as_ref()
            .map(ConversationMemory::render)
            .unwrap_or_default();
        let mut steps: Vec<IntermediateStep> = Vec::new();
        let mut state = LoopState::Thinking;

        for iteration in 0..self.options.max_iterations {
            tracing::debug!(?state, "Agent iteration {}", iteration + 1);

            let prompt = self
                .renderer
                .render(&self.tools, &chat_history, input, &steps);
            let completion = self.call_llm(prompt).await?;

            let action = match parse(&completion)? {
                AgentDecision::Finish(finish) => {
                    state = LoopState::Finished;
                    tracing::info!(
                        ?state,
                        iterations = iteration + 1,
                        "Agent finished: {}",
                        truncate_for_log(&finish.output, 200)
                    );
                    return Ok(self.finish(input, finish.output, steps, iteration + 1, false));
                }
                AgentDecision::Act(action) => action,
            };

            state = LoopState::Acting;
            tracing::debug!(?state, tool = %action.tool, input = %action.input, "Dispatching tool");
            let matches = self.dispatch(&action).await?;

            state = LoopState::Observing;
            let observation = observation_text(&matches);
            tracing::debug!(
                ?state,
                matches = matches.len(),
                "Observation: {}",
                truncate_for_log(&observation, 1000)
            );
            steps.push(IntermediateStep {
                action,
                observation,
            });
            state = LoopState::Thinking;
        }

        tracing::warn!(
            max_iterations = self.options.max_iterations,
            "Step budget exhausted without a final answer"
        );
        let iterations = self.options.max_iterations;
        Ok(self.finish(input, STEP_BUDGET_EXHAUSTED.to_string(), steps, iterations, true))
    }

    fn finish(
        &mut self,
        input: &str,
        output: String,
        steps: Vec<IntermediateStep>,
        iterations: usize,
        budget_exhausted: bool,
    ) -> AgentRun {
        if let Some(memory) = self.memory.as_mut() {
            memory.record(input, output.clone());
        }
        AgentRun {
            output,
            steps,
            iterations,
            budget_exhausted,
        }
    }

    async fn call_llm(&self, prompt: String) -> Result<String, LlmError> {
        let request =
            CompletionRequest::prompt(&self.options.model, self.options.temperature, prompt)
                .with_stop(format!("\n{}", OBSERVATION_MARKER));

        match tokio::time::timeout(self.options.llm_timeout, self.llm.complete(&request)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(self.options.llm_timeout)),
        }
    }

    /// Run the tool named by `action`, bounded by the tool timeout.
    async fn dispatch(&self, action: &AgentAction) -> Result<Vec<Match>, AgentError> {
        let call = self.tools.execute(&action.tool, &action.input);
        let result = match tokio::time::timeout(self.options.tool_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ToolError::Timeout {
                tool: action.tool.clone(),
                after: self.options.tool_timeout,
            }),
        };

        result.map_err(|source| match source {
            ToolError::UnknownTool(tool) => AgentError::UnknownTool {
                tool,
                available: self.tools.names().join(", "),
            },
            source => AgentError::Tool {
                tool: action.tool.clone(),
                source,
            },
        })
    }
}

/// Truncate a string for logging purposes.
fn truncate_for_log(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}... [truncated]", &s[..idx]),
        None => s.to_string(),
    }
}
