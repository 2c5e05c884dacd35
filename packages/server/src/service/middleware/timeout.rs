//! Operation budget enforcement.
//!
//! Every operation carries `call_timeout_ms` in its context. This is the
//! outer bound on a whole adapter call; transport-specific limits such as the
//! gRPC deadline sit inside it and normally fire first.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tower::{Layer, Service};
use tracing::warn;

use crate::service::operation::{Operation, OperationError, OperationResponse};

#[derive(Debug, Clone)]
pub struct TimeoutLayer;

impl<S> Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct TimeoutService<S> {
    inner: S,
}

impl<S> Service<Operation> for TimeoutService<S>
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
        let timeout_ms = op.ctx().call_timeout_ms;
        let call_id = op.ctx().call_id;
        let action = op.action();
        let fut = self.inner.call(op);

        Box::pin(async move {
            if let Ok(result) = tokio::time::timeout(Duration::from_millis(timeout_ms), fut).await {
                result
            } else {
                warn!(call_id, action = action.as_str(), timeout_ms, "operation budget exhausted");
                Err(OperationError::Timeout { timeout_ms })
            }
        })
    }
}
