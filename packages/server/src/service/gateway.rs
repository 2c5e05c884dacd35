//! The gateway facade: bytes in, outcome out.

use std::sync::Arc;

use courier_core::{Action, EnvelopeCodec, RequestEnvelope};
use tower::ServiceExt;
use tracing::debug;

use super::classify::OperationClassifier;
use super::config::GatewayConfig;
use super::middleware::{build_operation_pipeline, OperationPipeline};
use super::operation::{OperationError, Outcome};
use super::router::OperationRouter;

/// Decodes, classifies and dispatches gateway requests.
///
/// Holds no per-request state, so one instance is shared by every handler.
pub struct Gateway {
    codec: EnvelopeCodec,
    classifier: OperationClassifier,
    pipeline: OperationPipeline,
}

impl Gateway {
    #[must_use]
    pub fn new(config: Arc<GatewayConfig>, codec: EnvelopeCodec, router: OperationRouter) -> Self {
        let pipeline = build_operation_pipeline(router, &config);
        Self {
            codec,
            classifier: OperationClassifier::new(config),
            pipeline,
        }
    }

    #[must_use]
    pub fn codec(&self) -> &EnvelopeCodec {
        &self.codec
    }

    /// Decodes a raw request body and routes it by its action tag.
    pub async fn submit(&self, body: &[u8]) -> Outcome {
        let envelope = self.codec.decode(body)?;
        self.route(envelope).await
    }

    /// Decodes a raw request body and routes it as `action`.
    pub async fn submit_as(&self, action: Action, body: &[u8]) -> Outcome {
        let envelope = self.codec.decode(body)?;
        self.route_as(action, envelope).await
    }

    /// Routes an envelope to the adapter for its action tag.
    pub async fn route(&self, envelope: RequestEnvelope) -> Outcome {
        let op = self.classifier.classify(envelope).map_err(|e| {
            debug!(error = %e, "rejecting envelope");
            OperationError::from(e)
        })?;
        self.pipeline.clone().oneshot(op).await
    }

    /// Routes an envelope as `action`, whatever its tag says.
    pub async fn route_as(&self, action: Action, envelope: RequestEnvelope) -> Outcome {
        let op = self.classifier.classify_as(action, envelope);
        self.pipeline.clone().oneshot(op).await
    }
}
