//! Response translation: the single point where outcomes become HTTP replies.

use courier_core::ResponseEnvelope;
use http::StatusCode;

use super::operation::{OperationError, Outcome};

impl OperationError {
    /// HTTP status reported to the client for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            OperationError::MalformedInput { .. } | OperationError::UnknownAction { .. } => {
                StatusCode::BAD_REQUEST
            }
            OperationError::UpstreamRejected { .. } => StatusCode::UNAUTHORIZED,
            OperationError::TransportFailure { .. } => StatusCode::BAD_GATEWAY,
            OperationError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            OperationError::Overloaded => StatusCode::SERVICE_UNAVAILABLE,
            OperationError::WrongService => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Maps an outcome to the status and envelope sent back to the client.
///
/// Successes are `202 Accepted` with `error: false`; every error carries
/// `error: true` and the error's display text as its message.
#[must_use]
pub fn translate(outcome: &Outcome) -> (StatusCode, ResponseEnvelope) {
    match outcome {
        Ok(resp) => (
            StatusCode::ACCEPTED,
            ResponseEnvelope::ok(resp.message.clone()).with_data(resp.data.clone()),
        ),
        Err(err) => (err.status(), ResponseEnvelope::error(err.to_string())),
    }
}
