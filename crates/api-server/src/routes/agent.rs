//! Agent execution endpoints
//!
//! - `POST /agent/invoke`: run to completion, JSON response
//! - `POST /agent/stream`: canonical events as server-sent events
//! - `GET /agent/config`: active configuration, for diagnostics

use axum::{
    extract::State,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use hub_core::{AgentConfig, ExecutionRequest, ExecutionResponse};
use serde::Serialize;
use tracing::info;

use crate::error::ApiError;
use crate::sse::{event_frames, sse_response};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardrailSummary {
    pub name: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfigResponse {
    pub agent: AgentConfig,
    pub state: String,
    pub input_guardrails: Vec<GuardrailSummary>,
    pub output_guardrails: Vec<GuardrailSummary>,
    pub stream_buffer: usize,
    pub stream_output_check: bool,
}

/// POST /agent/invoke
async fn invoke_agent(
    State(state): State<AppState>,
    Json(request): Json<ExecutionRequest>,
) -> Result<Json<ExecutionResponse>, ApiError> {
    info!("Invoke request for session {}", request.session_id);
    let response = state.router().invoke(&request).await?;
    Ok(Json(ExecutionResponse {
        session_id: request.session_id,
        response,
    }))
}

/// POST /agent/stream
async fn stream_agent(
    State(state): State<AppState>,
    Json(request): Json<ExecutionRequest>,
) -> Result<Response, ApiError> {
    info!("Stream request for session {}", request.session_id);
    let events = state.router().stream(request).await?;
    Ok(sse_response(event_frames(events)))
}

/// GET /agent/config
async fn agent_config(State(state): State<AppState>) -> Json<AgentConfigResponse> {
    let router = state.router();
    let summarize = |guardrails: &[agent_runner::Guardrail]| -> Vec<GuardrailSummary> {
        guardrails
            .iter()
            .map(|g| GuardrailSummary {
                name: g.name().to_string(),
                message: g.message().to_string(),
            })
            .collect()
    };

    Json(AgentConfigResponse {
        agent: router.handle().config().clone(),
        state: router.handle().state().await.as_str().to_string(),
        input_guardrails: summarize(router.gate().input()),
        output_guardrails: summarize(router.gate().output()),
        stream_buffer: router.config().stream_buffer,
        stream_output_check: router.config().stream_output_check,
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/agent/invoke", post(invoke_agent))
        .route("/agent/stream", post(stream_agent))
        .route("/agent/config", get(agent_config))
}

#[cfg(test)]
mod tests {
    use super::*;

    use agent_runner::{FrameworkCatalog, GuardrailSpec, RouterConfig};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use hub_core::CanonicalEvent;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::HostConfig;
    use crate::demo;

    async fn build_state(agent: AgentConfig, guardrails: Value) -> AppState {
        let guardrails: Vec<GuardrailSpec> = serde_json::from_value(guardrails).unwrap();
        let mut catalog = FrameworkCatalog::new();
        demo::register(&mut catalog);
        AppState::from_host(
            &HostConfig { agent, guardrails },
            catalog,
            RouterConfig::default(),
        )
        .await
        .unwrap()
    }

    async fn echo_state() -> AppState {
        build_state(
            AgentConfig::new("echo", "Echo", "echo"),
            json!([{
                "name": "blocked-terms",
                "position": "input",
                "message": "Let's talk about something else",
                "validator": "blocked_terms",
                "terms": ["forbidden"]
            }]),
        )
        .await
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn sse_events(response: Response) -> Vec<CanonicalEvent> {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        body.split("\n\n")
            .filter_map(|frame| frame.strip_prefix("data: "))
            .map(|data| serde_json::from_str(data).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn invoke_is_sticky_per_session() {
        let state = echo_state().await;

        for expected in ["echo #1: ping", "echo #2: ping"] {
            let response = router()
                .with_state(state.clone())
                .oneshot(post_json(
                    "/agent/invoke",
                    json!({"session_id": "s1", "query": "ping"}),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let payload = json_body(response).await;
            assert_eq!(payload["session_id"], "s1");
            assert_eq!(payload["response"], expected);
        }
    }

    #[tokio::test]
    async fn guardrail_rejection_is_429_with_detail() {
        let state = echo_state().await;

        for uri in ["/agent/invoke", "/agent/stream"] {
            let response = router()
                .with_state(state.clone())
                .oneshot(post_json(
                    uri,
                    json!({"session_id": "s1", "query": "a forbidden topic"}),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
            let payload = json_body(response).await;
            assert_eq!(payload["detail"], "Let's talk about something else");
        }
    }

    #[tokio::test]
    async fn empty_session_is_400() {
        let response = router()
            .with_state(echo_state().await)
            .oneshot(post_json(
                "/agent/invoke",
                json!({"session_id": "", "query": "ping"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn adapter_failure_is_500() {
        let state = build_state(
            AgentConfig::new("calc", "Calculator", "tool_loop")
                .with_params(json!({"agent": "calculator"})),
            json!([]),
        )
        .await;

        let response = router()
            .with_state(state)
            .oneshot(post_json(
                "/agent/invoke",
                json!({"session_id": "s1", "query": "1 / 0"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let payload = json_body(response).await;
        assert!(payload["detail"].as_str().unwrap().contains("division by zero"));
    }

    #[tokio::test]
    async fn stream_emits_terminated_event_sequence() {
        let state = build_state(
            AgentConfig::new("demo", "Demo graph", "graph").with_params(json!({"graph": "demo"})),
            json!([]),
        )
        .await;

        let response = router()
            .with_state(state)
            .oneshot(post_json(
                "/agent/stream",
                json!({"session_id": "s1", "query": "rust"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );

        let events = sse_events(response).await;
        assert!(matches!(events.first(), Some(CanonicalEvent::RunStarted { .. })));
        assert!(matches!(events.last(), Some(CanonicalEvent::RunFinished { .. })));
        assert!(events.iter().any(|e| matches!(
            e,
            CanonicalEvent::ToolCallStart { tool_call_name, .. } if tool_call_name == "lookup"
        )));
        hub_core::run::check_event_sequence(&events).unwrap();
    }

    #[tokio::test]
    async fn stream_failure_still_ends_with_run_finished() {
        let state = build_state(
            AgentConfig::new("calc", "Calculator", "tool_loop")
                .with_params(json!({"agent": "calculator"})),
            json!([]),
        )
        .await;

        let response = router()
            .with_state(state)
            .oneshot(post_json(
                "/agent/stream",
                json!({"session_id": "s1", "query": "1 / 0"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let events = sse_events(response).await;
        let error_note = events.iter().any(|e| matches!(
            e,
            CanonicalEvent::TextMessageContent { delta, .. } if delta.contains("division by zero")
        ));
        assert!(error_note);
        assert!(matches!(events.last(), Some(CanonicalEvent::RunFinished { .. })));
        hub_core::run::check_event_sequence(&events).unwrap();
    }

    #[tokio::test]
    async fn config_reports_agent_and_guardrails() {
        let response = router()
            .with_state(echo_state().await)
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/agent/config")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let payload = json_body(response).await;
        assert_eq!(payload["agent"]["type"], "echo");
        assert_eq!(payload["state"], "initialized");
        assert_eq!(payload["inputGuardrails"][0]["name"], "blocked-terms");
        assert_eq!(payload["streamOutputCheck"], false);
    }
}
