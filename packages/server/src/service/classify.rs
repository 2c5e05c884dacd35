//! Envelope classification: converts a `RequestEnvelope` into a typed `Operation`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use courier_core::{Action, RequestEnvelope};
use tracing::debug;

use super::config::GatewayConfig;
use super::operation::{ClassifyError, Operation, OperationContext};

// ---------------------------------------------------------------------------
// OperationClassifier
// ---------------------------------------------------------------------------

/// Turns decoded envelopes into `Operation` values.
///
/// Each call gets a unique call ID and the configured operation timeout. The
/// payload variant is chosen by the action alone; a missing variant is
/// replaced by its empty default, matching what existing clients rely on.
pub struct OperationClassifier {
    config: Arc<GatewayConfig>,
    call_id_counter: AtomicU64,
}

impl OperationClassifier {
    #[must_use]
    pub fn new(config: Arc<GatewayConfig>) -> Self {
        Self {
            config,
            call_id_counter: AtomicU64::new(1),
        }
    }

    fn next_call_id(&self) -> u64 {
        self.call_id_counter.fetch_add(1, Ordering::Relaxed)
    }

    /// Classify an envelope by its `action` tag.
    ///
    /// # Errors
    ///
    /// Returns `ClassifyError::UnknownAction` when the tag names no action.
    pub fn classify(&self, envelope: RequestEnvelope) -> Result<Operation, ClassifyError> {
        let action: Action = envelope
            .action
            .parse()
            .map_err(|_| ClassifyError::UnknownAction {
                action: envelope.action.clone(),
            })?;
        Ok(self.classify_as(action, envelope))
    }

    /// Classify an envelope as the given action, ignoring its `action` tag.
    #[must_use]
    pub fn classify_as(&self, action: Action, envelope: RequestEnvelope) -> Operation {
        let ctx = OperationContext::new(
            self.next_call_id(),
            action,
            self.config.default_operation_timeout_ms,
        );

        let call_id = ctx.call_id;

        match action {
            Action::Auth => Operation::Authenticate {
                payload: or_empty(envelope.auth, call_id, action),
                ctx,
            },
            Action::LogHttp => Operation::LogHttp {
                payload: or_empty(envelope.log, call_id, action),
                ctx,
            },
            Action::LogRpc => Operation::LogRpc {
                payload: or_empty(envelope.log, call_id, action),
                ctx,
            },
            Action::LogGrpc => Operation::LogGrpc {
                payload: or_empty(envelope.log, call_id, action),
                ctx,
            },
            Action::LogQueue => Operation::LogQueue {
                payload: or_empty(envelope.log, call_id, action),
                ctx,
            },
            Action::Mail => Operation::SendMail {
                payload: or_empty(envelope.mail, call_id, action),
                ctx,
            },
        }
    }
}

/// Returns the payload, or its empty default when the envelope omitted it.
fn or_empty<T: Default>(payload: Option<T>, call_id: u64, action: Action) -> T {
    payload.unwrap_or_else(|| {
        debug!(
            call_id,
            action = action.as_str(),
            "payload for action missing from envelope, using empty payload"
        );
        T::default()
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
