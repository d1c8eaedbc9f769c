//! HTTP transport adapter
//!
//! The concrete router binding and JSON codec around the dispatcher: a
//! single `POST /` scripting endpoint plus a liveness probe. The envelope's
//! status code is mirrored onto the HTTP frame.

use crate::dispatcher::Dispatcher;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use scriptgate_core::{RequestEnvelope, ResponseEnvelope};
use tracing::debug;

/// Build the public router.
pub fn router(dispatcher: Dispatcher) -> Router {
    Router::new()
        .route("/", post(execute))
        .route("/health", get(health))
        .with_state(dispatcher)
}

/// `POST /` — parse the body, dispatch, reply with the envelope.
///
/// The handler takes raw bytes and parses them itself so a malformed body
/// stays inside the envelope contract (deterministic 400) instead of
/// surfacing as a framework rejection with a different shape.
async fn execute(State(dispatcher): State<Dispatcher>, body: Bytes) -> Response {
    let envelope = match serde_json::from_slice::<RequestEnvelope>(&body) {
        Ok(request) => dispatcher.dispatch(request).await,
        Err(e) => {
            debug!(error = %e, "rejecting malformed request body");
            ResponseEnvelope::bad_request("invalid request body")
        }
    };
    into_response(envelope)
}

/// `GET /health` — liveness probe.
async fn health() -> &'static str {
    "OK"
}

fn into_response(envelope: ResponseEnvelope) -> Response {
    let status =
        StatusCode::from_u16(envelope.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(envelope)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_response_mirrors_envelope_status() {
        let response = into_response(ResponseEnvelope::new(404, "nope"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_into_response_rejects_invalid_status() {
        let response = into_response(ResponseEnvelope::new(0, "broken"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
