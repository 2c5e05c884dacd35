//! Metrics middleware for operations.
//!
//! Wraps each operation in a `tracing` span and records the outcome through
//! the `metrics` facade. Without an installed recorder the metric calls are
//! no-ops, so tests need no exporter.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use tower::{Layer, Service};
use tracing::{info_span, Instrument};

use crate::service::operation::{Operation, OperationError, OperationResponse};

/// Counter of finished operations, labelled by `action` and `outcome`.
pub const OPERATIONS_TOTAL: &str = "courier_operations_total";
/// Histogram of operation durations in seconds, labelled by `action`.
pub const OPERATION_DURATION_SECONDS: &str = "courier_operation_duration_seconds";

#[derive(Debug, Clone)]
pub struct MetricsLayer;

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsService<S> {
    inner: S,
}

impl<S> Service<Operation> for MetricsService<S>
where
    S: Service<Operation, Response = OperationResponse, Error = OperationError> + Send,
    S::Future: Send + 'static,
{
    type Response = OperationResponse;
    type Error = OperationError;
    type Future = Pin<Box<dyn Future<Output = Result<OperationResponse, OperationError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, op: Operation) -> Self::Future {
        let action = op.action();
        let call_id = op.ctx().call_id;

        let span = info_span!(
            "operation",
            action = action.as_str(),
            transport = action.transport().as_str(),
            call_id,
            outcome = tracing::field::Empty,
        );

        let fut = self.inner.call(op);

        Box::pin(
            async move {
                let start = Instant::now();
                let result = fut.await;
                let elapsed = start.elapsed();

                let outcome = match &result {
                    Ok(_) => "ok",
                    Err(err) => err.kind(),
                };
                tracing::Span::current().record("outcome", outcome);

                ::metrics::counter!(OPERATIONS_TOTAL, "action" => action.as_str(), "outcome" => outcome)
                    .increment(1);
                ::metrics::histogram!(OPERATION_DURATION_SECONDS, "action" => action.as_str())
                    .record(elapsed.as_secs_f64());

                #[allow(clippy::cast_possible_truncation)]
                let duration_ms = elapsed.as_millis() as u64;
                match &result {
                    Ok(_) => tracing::info!(duration_ms, "operation complete"),
                    Err(err) => tracing::warn!(duration_ms, error = %err, "operation failed"),
                }

                result
            }
            .instrument(span),
        )
    }
}
