//! Neo4j over the HTTP transactional endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{GraphStore, Row, StoreError};
use crate::config::GraphConfig;

/// [`GraphStore`] backed by `POST /db/{database}/tx/commit`.
#[derive(Clone)]
pub struct Neo4jHttpStore {
    http: reqwest::Client,
    commit_url: String,
    username: Option<String>,
    password: Option<String>,
}

#[derive(Serialize)]
struct CommitRequest<'a> {
    statements: [Statement<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Statement<'a> {
    statement: &'a str,
    parameters: Value,
    result_data_contents: [&'static str; 1],
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<Neo4jError>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<RowData>,
}

#[derive(Debug, Deserialize)]
struct RowData {
    #[serde(default)]
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Neo4jError {
    code: String,
    message: String,
}

impl Neo4jHttpStore {
    pub fn new(config: &GraphConfig, timeout: std::time::Duration) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            commit_url: format!(
                "{}/db/{}/tx/commit",
                config.uri.trim_end_matches('/'),
                config.database
            ),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }
}

/// Turn a commit response into rows, surfacing Neo4j-reported errors.
fn rows_from_response(response: CommitResponse) -> Result<Vec<Row>, StoreError> {
    if let Some(err) = response.errors.into_iter().next() {
        return Err(StoreError::Query {
            code: err.code,
            message: err.message,
        });
    }

    let rows = response
        .results
        .into_iter()
        .flat_map(|result| {
            let columns = result.columns;
            result.data.into_iter().map(move |data| {
                columns
                    .iter()
                    .cloned()
                    .zip(data.row)
                    .collect::<Row>()
            })
        })
        .collect();
    Ok(rows)
}

#[async_trait]
impl GraphStore for Neo4jHttpStore {
    async fn execute(&self, query: &str, params: Value) -> Result<Vec<Row>, StoreError> {
        let body = CommitRequest {
            statements: [Statement {
                statement: query,
                parameters: params,
                result_data_contents: ["row"],
            }],
        };

        let mut request = self.http.post(&self.commit_url).json(&body);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CommitResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        rows_from_response(parsed)
    }
}
