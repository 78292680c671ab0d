//! Configuration management for the parts agent.
//!
//! Configuration can be set via environment variables:
//! - `OPENAI_API_KEY` - Required. API key for the OpenAI-compatible endpoint.
//! - `OPENAI_BASE_URL` - Optional. Defaults to `https://api.openai.com/v1`.
//! - `AGENT_MODEL` - Optional. Model driving the reasoning loop. Defaults to `gpt-4`.
//! - `QUERY_MODEL` - Optional. Model generating Cypher. Defaults to `gpt-4`.
//! - `CORRECTION_MODEL` - Optional. Model reviewing Cypher. Defaults to `gpt-4o`.
//! - `EMBEDDINGS_MODEL` - Optional. Defaults to `text-embedding-3-small`.
//! - `NEO4J_URI` - Required. Base URL of the Neo4j HTTP API.
//! - `NEO4J_USERNAME` / `NEO4J_PASSWORD` - Optional. Basic auth credentials.
//! - `NEO4J_DATABASE` - Optional. Defaults to `neo4j`.
//! - `VECTOR_INDEX` - Optional. Vector index used by similarity search.
//! - `HOST` - Optional. Server host. Defaults to `0.0.0.0`.
//! - `PORT` - Optional. Server port. Defaults to `8000`.
//! - `AGENT_MODE` - Optional. `sequential` or `parallel`. Defaults to `sequential`.
//! - `AGENT_MEMORY` - Optional. Keep conversation history per session. Defaults to `true`.
//! - `MAX_ITERATIONS` - Optional. Maximum agent loop iterations. Defaults to `15`.
//! - `LLM_TIMEOUT_SECS` / `TOOL_TIMEOUT_SECS` - Optional. Defaults to `60` / `120`.
//! - `QUERY_MAX_ATTEMPTS` - Optional. Graph query attempts before giving up. Defaults to `5`.
//! - `SIMILARITY_THRESHOLD` - Optional. Defaults to `0.8`.
//! - `RESULT_LIMIT` - Optional. Rows kept per graph query. Defaults to `10`.
//! - `SESSION_TTL_SECS` - Optional. Idle session lifetime. Defaults to `3600`.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::agent::DispatchStrategy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Model selection for every LLM touch point.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Model driving the Thought/Action loop
    pub agent_model: String,

    /// Model turning questions into Cypher
    pub query_model: String,

    /// Model reviewing generated Cypher
    pub correction_model: String,

    /// Embedding model for similarity search
    pub embeddings_model: String,

    /// Sampling temperature for all completions
    pub temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            agent_model: "gpt-4".to_string(),
            query_model: "gpt-4".to_string(),
            correction_model: "gpt-4o".to_string(),
            embeddings_model: "text-embedding-3-small".to_string(),
            temperature: 0.0,
        }
    }
}

/// Neo4j connection and lookup tuning.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Base URL of the Neo4j HTTP API, e.g. `http://localhost:7474`
    pub uri: String,

    pub username: Option<String>,

    pub password: Option<String>,

    pub database: String,

    /// Vector index queried by the similarity tool
    pub vector_index: String,

    /// Minimum similarity score passed to queries as `$threshold`
    pub similarity_threshold: f64,

    /// Rows kept per query
    pub result_limit: usize,

    /// Attempts before a failing query is given up
    pub max_attempts: u32,
}

impl GraphConfig {
    fn with_uri(uri: String) -> Self {
        Self {
            uri,
            username: None,
            password: None,
            database: "neo4j".to_string(),
            vector_index: "entity_embeddings".to_string(),
            similarity_threshold: 0.8,
            result_limit: 10,
            max_attempts: 5,
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the completion/embedding endpoint
    pub api_key: String,

    /// Base URL of the OpenAI-compatible API
    pub api_base_url: String,

    pub models: ModelConfig,

    pub graph: GraphConfig,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Tool dispatch strategy for new agents
    pub strategy: DispatchStrategy,

    /// Whether agents keep conversation history
    pub memory: bool,

    /// Maximum iterations for the agent loop
    pub max_iterations: usize,

    /// Upper bound on a single LLM call
    pub llm_timeout: Duration,

    /// Upper bound on a single tool invocation
    pub tool_timeout: Duration,

    /// Idle sessions older than this are dropped
    pub session_ttl: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `OPENAI_API_KEY` or `NEO4J_URI` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = required(&lookup, "OPENAI_API_KEY")?;
        let api_base_url = lookup("OPENAI_BASE_URL")
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string());

        let defaults = ModelConfig::default();
        let models = ModelConfig {
            agent_model: lookup("AGENT_MODEL").unwrap_or(defaults.agent_model),
            query_model: lookup("QUERY_MODEL").unwrap_or(defaults.query_model),
            correction_model: lookup("CORRECTION_MODEL").unwrap_or(defaults.correction_model),
            embeddings_model: lookup("EMBEDDINGS_MODEL").unwrap_or(defaults.embeddings_model),
            temperature: defaults.temperature,
        };

        let mut graph = GraphConfig::with_uri(required(&lookup, "NEO4J_URI")?);
        graph.username = lookup("NEO4J_USERNAME");
        graph.password = lookup("NEO4J_PASSWORD");
        if let Some(database) = lookup("NEO4J_DATABASE") {
            graph.database = database;
        }
        if let Some(index) = lookup("VECTOR_INDEX") {
            graph.vector_index = index;
        }
        graph.similarity_threshold =
            parsed(&lookup, "SIMILARITY_THRESHOLD", graph.similarity_threshold)?;
        graph.result_limit = parsed(&lookup, "RESULT_LIMIT", graph.result_limit)?;
        graph.max_attempts = parsed(&lookup, "QUERY_MAX_ATTEMPTS", graph.max_attempts)?;
        if graph.max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "QUERY_MAX_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parsed(&lookup, "PORT", 8000u16)?;

        let strategy = parsed(&lookup, "AGENT_MODE", DispatchStrategy::Sequential)?;

        let memory = lookup("AGENT_MEMORY")
            .map(|v| {
                parse_bool(&v).map_err(|e| ConfigError::InvalidValue("AGENT_MEMORY".to_string(), e))
            })
            .transpose()?
            .unwrap_or(true);

        let max_iterations = parsed(&lookup, "MAX_ITERATIONS", 15usize)?;
        if max_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ITERATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let llm_timeout = Duration::from_secs(parsed(&lookup, "LLM_TIMEOUT_SECS", 60u64)?);
        let tool_timeout = Duration::from_secs(parsed(&lookup, "TOOL_TIMEOUT_SECS", 120u64)?);
        let session_ttl = Duration::from_secs(parsed(&lookup, "SESSION_TTL_SECS", 3600u64)?);

        Ok(Self {
            api_key,
            api_base_url,
            models,
            graph,
            host,
            port,
            strategy,
            memory,
            max_iterations,
            llm_timeout,
            tool_timeout,
            session_ttl,
        })
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("expected boolean-like value, got: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_required_vars_set() {
        let config = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("NEO4J_URI", "http://localhost:7474"),
        ]))
        .unwrap();

        assert_eq!(config.models.agent_model, "gpt-4");
        assert_eq!(config.models.correction_model, "gpt-4o");
        assert_eq!(config.port, 8000);
        assert_eq!(config.strategy, DispatchStrategy::Sequential);
        assert!(config.memory);
        assert_eq!(config.max_iterations, 15);
        assert_eq!(config.graph.result_limit, 10);
        assert_eq!(config.graph.similarity_threshold, 0.8);
        assert_eq!(config.graph.database, "neo4j");
    }

    #[test]
    fn missing_api_key_is_reported() {
        let err = Config::from_lookup(lookup_from(&[("NEO4J_URI", "http://localhost:7474")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "OPENAI_API_KEY"));
    }

    #[test]
    fn parallel_mode_and_memory_flag_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("NEO4J_URI", "http://localhost:7474"),
            ("AGENT_MODE", "Parallel"),
            ("AGENT_MEMORY", "off"),
        ]))
        .unwrap();
        assert_eq!(config.strategy, DispatchStrategy::Parallel);
        assert!(!config.memory);
    }

    #[test]
    fn invalid_port_names_the_variable() {
        let err = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("NEO4J_URI", "http://localhost:7474"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k, _) if k == "PORT"));
    }

    #[test]
    fn zero_query_attempts_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("NEO4J_URI", "http://localhost:7474"),
            ("QUERY_MAX_ATTEMPTS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k, _) if k == "QUERY_MAX_ATTEMPTS"));
    }

    #[test]
    fn zero_iteration_budget_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("NEO4J_URI", "http://localhost:7474"),
            ("MAX_ITERATIONS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k, _) if k == "MAX_ITERATIONS"));
    }
}
