//! HTTP routes.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::sessions::SessionStore;
use super::types::{AgentQuery, AgentResponse, HealthResponse};
use crate::agent::{AgentError, AgentFactory};
use crate::config::Config;

/// Response header carrying the session token.
pub const SESSION_HEADER: &str = "x-session-id";

pub struct AppState {
    pub sessions: SessionStore,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/agent/", get(ask_agent))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let factory = AgentFactory::from_config(&config)?;
    tracing::info!(
        strategy = %config.strategy,
        memory = config.memory,
        max_iterations = config.max_iterations,
        "Agent factory ready"
    );
    let state = Arc::new(AppState {
        sessions: SessionStore::new(factory, config.session_ttl),
    });

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /agent/?message=...&session=... - Ask the agent a question.
/// The session header is sent on failures too.
async fn ask_agent(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AgentQuery>,
) -> Result<(HeaderMap, Json<AgentResponse>), (StatusCode, HeaderMap, String)> {
    if query.message.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            HeaderMap::new(),
            "message must not be empty".to_string(),
        ));
    }

    let (session_id, agent) = state.sessions.checkout(query.session.as_deref()).await;
    let result = agent.lock().await.invoke(&query.message).await;
    state.sessions.touch(&session_id).await;

    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&session_id) {
        headers.insert(SESSION_HEADER, value);
    }

    match result {
        Ok(response) => Ok((headers, Json(AgentResponse { response }))),
        Err(e) => {
            tracing::error!(session = %session_id, "Agent invocation failed: {}", e);
            Err((status_for(&e), headers, e.to_string()))
        }
    }
}

fn status_for(err: &AgentError) -> StatusCode {
    match err {
        AgentError::Llm(crate::llm::LlmError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_GATEWAY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentOptions;
    use crate::testing::{ScriptedLlm, StubTool};
    use crate::tools::{Match, ToolRegistry};
    use std::time::Duration;

    fn state(replies: &[&str]) -> Arc<AppState> {
        let llm = Arc::new(ScriptedLlm::replying(replies));
        let tools = ToolRegistry::new()
            .with_tool(Arc::new(StubTool::new(
                "Query",
                vec![Match::new().with("id", "PS1")],
            )))
            .unwrap();
        let factory = AgentFactory::new(llm, tools, AgentOptions::default());
        Arc::new(AppState {
            sessions: SessionStore::new(factory, Duration::from_secs(60)),
        })
    }

    fn query(message: &str, session: Option<&str>) -> Query<AgentQuery> {
        Query(AgentQuery {
            message: message.to_string(),
            session: session.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn answers_and_echoes_session() {
        let state = state(&["Action: Query\nAction Input: PS1", "Final Answer: PS1 fits."]);
        let (headers, Json(body)) = ask_agent(State(state), query("Does PS1 fit?", Some("s1")))
            .await
            .unwrap();
        assert_eq!(body.response, "PS1 fits.");
        assert_eq!(headers.get(SESSION_HEADER).unwrap(), "s1");
    }

    #[tokio::test]
    async fn empty_message_rejected() {
        let err = ask_agent(State(state(&[])), query("  ", None))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn parse_failure_is_bad_gateway() {
        let err = ask_agent(State(state(&["no idea"])), query("q", None))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_GATEWAY);
        assert!(err.2.contains("Could not parse LLM output"));
    }

    #[tokio::test]
    async fn failure_still_reports_new_session() {
        let state = state(&["no idea", "Final Answer: second try"]);
        let err = ask_agent(State(state.clone()), query("q", None))
            .await
            .unwrap_err();
        let session = err.1.get(SESSION_HEADER).unwrap().to_str().unwrap().to_string();
        assert_eq!(state.sessions.len().await, 1);

        let (headers, Json(body)) =
            ask_agent(State(state.clone()), query("q", Some(session.as_str())))
                .await
                .unwrap();
        assert_eq!(body.response, "second try");
        assert_eq!(headers.get(SESSION_HEADER).unwrap(), session.as_str());
        assert_eq!(state.sessions.len().await, 1);
    }

    #[tokio::test]
    async fn health_reports_version() {
        let Json(body) = health().await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }
}
