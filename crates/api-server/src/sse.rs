//! Server-sent event framing for canonical event streams

use std::convert::Infallible;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use hub_core::CanonicalEvent;

/// One `data:` frame per event
pub fn event_frames<S>(events: S) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static
where
    S: Stream<Item = CanonicalEvent> + Send + 'static,
{
    events.filter_map(|event| async move {
        match serde_json::to_string(&event) {
            Ok(json) => Some(Ok(Bytes::from(format!("data: {json}\n\n")))),
            Err(e) => {
                tracing::warn!("Failed to serialize {} event: {}", event.name(), e);
                None
            }
        }
    })
}

pub fn sse_response<S>(stream: S) -> Response
where
    S: Stream<Item = Result<Bytes, Infallible>> + Send + 'static,
{
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    (headers, Body::from_stream(stream)).into_response()
}
