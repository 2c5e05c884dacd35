//! Gateway endpoints: ping, the unified submission route and the gRPC log route.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use courier_core::{Action, ResponseEnvelope};
use tracing::{debug, error};

use super::AppState;
use crate::service::{translate, OperationError, Outcome};

/// Served when a reply envelope cannot be encoded.
const FALLBACK_BODY: &str = r#"{"error":true,"message":"internal error"}"#;

/// `POST /`: liveness check for clients of the gateway itself.
pub async fn ping_handler() -> Json<ResponseEnvelope> {
    Json(ResponseEnvelope::ok("Hit the broker"))
}

/// `POST /handle`: decodes the unified envelope and routes it by action.
pub async fn submit_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let _guard = state.shutdown.in_flight_guard();
    let outcome = match body {
        Ok(body) => state.gateway.submit(&body).await,
        Err(rejection) => Err(unreadable(&rejection)),
    };
    reply(&state, &outcome)
}

/// `POST /log-grpc`: logs the envelope's `log` payload over gRPC, whatever
/// its action tag says.
pub async fn log_grpc_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let _guard = state.shutdown.in_flight_guard();
    let outcome = match body {
        Ok(body) => state.gateway.submit_as(Action::LogGrpc, &body).await,
        Err(rejection) => Err(unreadable(&rejection)),
    };
    reply(&state, &outcome)
}

fn unreadable(rejection: &BytesRejection) -> OperationError {
    debug!(error = %rejection, "request body rejected");
    OperationError::MalformedInput {
        reason: rejection.body_text(),
    }
}

fn reply(state: &AppState, outcome: &Outcome) -> Response {
    if let Err(err) = outcome {
        debug!(kind = err.kind(), error = %err, "replying with error envelope");
    }

    let (status, envelope) = translate(outcome);
    match state.gateway.codec().encode(&envelope) {
        Ok(body) => (status, [(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode response envelope");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "application/json")],
                FALLBACK_BODY,
            )
                .into_response()
        }
    }
}
