//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: String,
    version: String,
    agent_id: String,
    agent_type: String,
    state: String,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let handle = state.handle();
    let lifecycle = handle.state().await;

    Json(HealthResponse {
        status: if lifecycle.can_execute() {
            "ok".to_string()
        } else {
            "unavailable".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        agent_id: handle.id().to_string(),
        agent_type: handle.agent_type().to_string(),
        state: lifecycle.as_str().to_string(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
