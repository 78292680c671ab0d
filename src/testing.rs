//! Scripted doubles for the LLM, tools and graph store.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::graph::{GraphStore, Row, StoreError};
use crate::llm::{CompletionRequest, EmbeddingClient, LlmClient, LlmError};
use crate::tools::{Match, Tool, ToolError};

/// Replies with queued responses in order; records every request.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    delay: Option<Duration>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Text of the last user message of each request.
    pub fn prompts(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|r| r.messages.last().map(|m| m.content.clone()))
            .collect()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyResponse))
    }
}

/// Returns a fixed embedding.
pub struct FixedEmbedder(pub Vec<f32>);

#[async_trait]
impl EmbeddingClient for FixedEmbedder {
    async fn embed(&self, _text: &str, _model: &str) -> Result<Vec<f32>, LlmError> {
        Ok(self.0.clone())
    }
}

/// Tool returning canned matches (or a canned failure).
pub struct StubTool {
    name: String,
    matches: Vec<Match>,
    fail: bool,
    delay: Option<Duration>,
    inputs: Mutex<Vec<String>>,
}

impl StubTool {
    pub fn new(name: &str, matches: Vec<Match>) -> Self {
        Self {
            name: name.to_string(),
            matches,
            fail: false,
            delay: None,
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(name: &str) -> Self {
        Self {
            fail: true,
            ..Self::new(name, Vec::new())
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tool for StubTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "stub"
    }

    async fn invoke(&self, input: &str) -> Result<Vec<Match>, ToolError> {
        self.inputs.lock().unwrap().push(input.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(ToolError::Store(StoreError::Transport(
                "connection refused".to_string(),
            )));
        }
        Ok(self.matches.clone())
    }
}

/// Fails the first `failures` executions, then returns `rows`.
pub struct FlakyStore {
    failures: u32,
    rows: Vec<Row>,
    queries: Mutex<Vec<String>>,
    params: Mutex<Vec<Value>>,
}

impl FlakyStore {
    pub fn new(failures: u32, rows: Vec<Row>) -> Self {
        Self {
            failures,
            rows,
            queries: Mutex::new(Vec::new()),
            params: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn params(&self) -> Vec<Value> {
        self.params.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphStore for FlakyStore {
    async fn execute(&self, query: &str, params: Value) -> Result<Vec<Row>, StoreError> {
        let attempt = {
            let mut queries = self.queries.lock().unwrap();
            queries.push(query.to_string());
            queries.len() as u32
        };
        self.params.lock().unwrap().push(params);
        if attempt <= self.failures {
            return Err(StoreError::Transport(format!("attempt {} refused", attempt)));
        }
        Ok(self.rows.clone())
    }
}
