//! In-memory session store (non-persistent).
//!
//! Each session owns one [`Agent`] behind an async mutex, so requests on the
//! same session run one at a time while different sessions run concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::agent::{Agent, AgentFactory};

struct Session {
    agent: Arc<Mutex<Agent>>,
    last_used: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionStore {
    factory: AgentFactory,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(factory: AgentFactory, ttl: Duration) -> Self {
        Self {
            factory,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Agent for `token`, creating the session if needed.
    ///
    /// Returns the session id actually used (a new one when `token` is `None`).
    pub async fn checkout(&self, token: Option<&str>) -> (String, Arc<Mutex<Agent>>) {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        self.evict_idle(&mut sessions, now);

        let id = token
            .map(str::to_string)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let session = sessions.entry(id.clone()).or_insert_with(|| {
            tracing::debug!(session = %id, "Creating session");
            Session {
                agent: Arc::new(Mutex::new(self.factory.build())),
                last_used: now,
            }
        });
        session.last_used = now;
        (id, session.agent.clone())
    }

    /// Mark `id` as used now, so a long invocation restarts its idle clock.
    pub async fn touch(&self, id: &str) {
        if let Some(session) = self.sessions.write().await.get_mut(id) {
            session.last_used = Utc::now();
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    fn evict_idle(&self, sessions: &mut HashMap<String, Session>, now: DateTime<Utc>) {
        let Ok(ttl) = chrono::Duration::from_std(self.ttl) else {
            return;
        };
        let before = sessions.len();
        // A checked-out agent is still referenced by its request handler.
        sessions.retain(|_, s| Arc::strong_count(&s.agent) > 1 || now - s.last_used < ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, "Evicted idle sessions");
        }
    }
}
