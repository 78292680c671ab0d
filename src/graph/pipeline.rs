//! Question -> Cypher -> reviewed Cypher -> rows.
//!
//! The generation and review stages degrade gracefully: when the model call
//! fails, the stage passes its input through unchanged. Execution retries with
//! backoff and gives up with [`ToolError::RetryExhausted`].

use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::{json, Value};

use super::retry::RetryPolicy;
use super::schema::{generation_instruction, CORRECTION_INSTRUCTION};
use super::{GraphStore, Row};
use crate::llm::{CompletionRequest, LlmClient};
use crate::tools::{Match, ToolError};

/// Models and limits used by a [`QueryPipeline`].
#[derive(Debug, Clone)]
pub struct QueryPipelineOptions {
    pub query_model: String,
    pub correction_model: String,
    pub temperature: f32,
    /// Bound to `$threshold` on every execution
    pub threshold: f64,
    pub result_limit: usize,
    pub retry: RetryPolicy,
}

impl Default for QueryPipelineOptions {
    fn default() -> Self {
        Self {
            query_model: "gpt-4".to_string(),
            correction_model: "gpt-4o".to_string(),
            temperature: 0.0,
            threshold: 0.8,
            result_limit: 10,
            retry: RetryPolicy::default(),
        }
    }
}

pub struct QueryPipeline {
    llm: Arc<dyn LlmClient>,
    store: Arc<dyn GraphStore>,
    options: QueryPipelineOptions,
    instruction: String,
}

impl QueryPipeline {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        store: Arc<dyn GraphStore>,
        options: QueryPipelineOptions,
    ) -> Self {
        let instruction = generation_instruction(options.result_limit);
        Self {
            llm,
            store,
            options,
            instruction,
        }
    }

    /// Stage 1: ask the model for a Cypher query. Falls back to `input`.
    pub async fn generate(&self, input: &str) -> String {
        let request = CompletionRequest::instructed(
            &self.options.query_model,
            self.options.temperature,
            &self.instruction,
            input,
        );
        match self.llm.complete(&request).await {
            Ok(text) => non_empty_or(extract_cypher(&text), input),
            Err(e) => {
                tracing::warn!("Cypher generation failed, using input as query: {}", e);
                input.to_string()
            }
        }
    }

    /// Stage 2: ask the model to review `query`. Falls back to `query`.
    pub async fn correct(&self, query: &str) -> String {
        let request = CompletionRequest::instructed(
            &self.options.correction_model,
            self.options.temperature,
            CORRECTION_INSTRUCTION,
            query,
        );
        match self.llm.complete(&request).await {
            Ok(text) => non_empty_or(extract_cypher(&text), query),
            Err(e) => {
                tracing::warn!("Cypher review failed, keeping unreviewed query: {}", e);
                query.to_string()
            }
        }
    }

    /// Stage 3: run `query` with retry, keeping at most `result_limit` rows.
    pub async fn execute(&self, query: &str) -> Result<Vec<Row>, ToolError> {
        let params = json!({ "threshold": self.options.threshold });
        let mut rows = self
            .options
            .retry
            .run(|attempt| {
                tracing::debug!(attempt, query, "Executing graph query");
                self.store.execute(query, params.clone())
            })
            .await
            .map_err(|(attempts, last_error)| ToolError::RetryExhausted {
                attempts,
                last_error,
            })?;
        rows.truncate(self.options.result_limit);
        Ok(rows)
    }

    /// All three stages, projected into matches.
    pub async fn run(&self, input: &str) -> Result<Vec<Match>, ToolError> {
        let generated = self.generate(input).await;
        let reviewed = self.correct(&generated).await;
        let rows = self.execute(&reviewed).await?;
        let matches = project_rows(&rows);
        tracing::info!(rows = rows.len(), matches = matches.len(), "Graph query complete");
        Ok(matches)
    }
}

/// Every object-valued column of every row becomes one match.
pub(crate) fn project_rows(rows: &[Row]) -> Vec<Match> {
    rows.iter()
        .flat_map(|row| row.values())
        .filter_map(Value::as_object)
        .map(Match::from_entity)
        .collect()
}

fn non_empty_or(extracted: String, fallback: &str) -> String {
    if extracted.is_empty() {
        tracing::warn!("Model reply held no query, keeping stage input");
        fallback.to_string()
    } else {
        extracted
    }
}

fn cypher_field() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#""cypher"\s*:\s*("(?:[^"\\]|\\.)*")"#).expect("cypher field pattern is valid")
    })
}

/// Pull the query out of a model reply.
///
/// Strips Markdown fences and unwraps `{"cypher": ...}` objects, tolerating the
/// trailing comma the prompt's example shape invites. Anything else is returned
/// trimmed.
pub fn extract_cypher(text: &str) -> String {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        let rest = rest.trim_end();
        let rest = rest.strip_suffix("```").unwrap_or(rest);
        body = strip_fence_tag(rest).trim();
    }

    if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(body) {
        if let Some(Value::String(query)) = obj.get("cypher") {
            return query.trim().to_string();
        }
    }

    if body.starts_with('{') {
        if let Some(caps) = cypher_field().captures(body) {
            if let Ok(query) = serde_json::from_str::<String>(&caps[1]) {
                return query.trim().to_string();
            }
        }
    }

    body.to_string()
}

/// Drop the language tag that may follow an opening fence.
///
/// On a multi-line block the first line is a tag when it is empty or a single
/// lowercase word. On a single line only well-known tags are stripped, so a
/// bare query is never mistaken for one.
fn strip_fence_tag(block: &str) -> &str {
    match block.split_once('\n') {
        Some((first, code)) if is_tag(first.trim()) => code,
        Some(_) => block,
        None => match block.split_once(char::is_whitespace) {
            Some((first, code)) if KNOWN_FENCE_TAGS.contains(&first) => code,
            _ => block,
        },
    }
}

const KNOWN_FENCE_TAGS: &[&str] = &["cypher", "json", "sql"];

fn is_tag(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '+'))
}
