//! Route handlers

pub mod agent;
pub mod health;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Full application with CORS and HTTP tracing
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(agent::router())
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
