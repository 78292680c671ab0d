//! HTTP API exposing the agent.
//!
//! - `GET /agent/?message=...&session=...` - ask a question
//! - `GET /health` - liveness

mod routes;
mod sessions;
pub mod types;

pub use routes::{router, serve, AppState, SESSION_HEADER};
pub use sessions::SessionStore;
