//! Pipeline composition: wraps the router in the operation middleware stack.

use tower::util::BoxCloneSyncService;
use tower::ServiceBuilder;

use super::load_shed::LoadShedLayer;
use super::metrics::MetricsLayer;
use super::timeout::TimeoutLayer;
use crate::service::config::GatewayConfig;
use crate::service::operation::{Operation, OperationError, OperationResponse};
use crate::service::router::OperationRouter;

/// The fully layered operation service, cheap to clone per request.
pub type OperationPipeline = BoxCloneSyncService<Operation, OperationResponse, OperationError>;

/// Build the operation pipeline around an `OperationRouter`.
///
/// Layer order (outermost to innermost):
/// 1. `LoadShedLayer` -- reject when overloaded, before any backend work
/// 2. `TimeoutLayer` -- bound the whole operation
/// 3. `MetricsLayer` -- time and count what actually reached an adapter
#[must_use]
pub fn build_operation_pipeline(router: OperationRouter, config: &GatewayConfig) -> OperationPipeline {
    let svc = ServiceBuilder::new()
        .layer(LoadShedLayer::new(config.max_concurrent_operations))
        .layer(TimeoutLayer)
        .layer(MetricsLayer)
        .service(router);
    BoxCloneSyncService::new(svc)
}
