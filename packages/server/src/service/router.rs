//! Operation routing: dispatches `Operation` to the adapter for its transport.

use std::task::{Context, Poll};

use courier_core::Transport;
use tower::util::BoxCloneSyncService;
use tower::Service;

use super::operation::{Operation, OperationError, OperationResponse};

/// A type-erased, cloneable adapter service.
pub type AdapterService = BoxCloneSyncService<Operation, OperationResponse, OperationError>;

// ---------------------------------------------------------------------------
// OperationRouter
// ---------------------------------------------------------------------------

/// Routes `Operation` values to exactly one adapter per `Transport`.
///
/// The table is closed: every transport has one slot and dispatch is an
/// exhaustive match on `Action::transport()`, so there is no "unregistered"
/// case at runtime. Unknown action tags never reach the router; they are
/// rejected during classification. The router returns the adapter's result
/// unchanged.
#[derive(Clone)]
pub struct OperationRouter {
    http: AdapterService,
    rpc: AdapterService,
    grpc: AdapterService,
    queue: AdapterService,
}

/// One adapter per transport, used to build an [`OperationRouter`].
pub struct Adapters<H, R, G, Q> {
    pub http: H,
    pub rpc: R,
    pub grpc: G,
    pub queue: Q,
}

impl OperationRouter {
    /// Create a router from one adapter per transport.
    #[must_use]
    pub fn new<H, R, G, Q>(adapters: Adapters<H, R, G, Q>) -> Self
    where
        H: Service<Operation, Response = OperationResponse, Error = OperationError>
            + Clone
            + Send
            + Sync
            + 'static,
        H::Future: Send + 'static,
        R: Service<Operation, Response = OperationResponse, Error = OperationError>
            + Clone
            + Send
            + Sync
            + 'static,
        R::Future: Send + 'static,
        G: Service<Operation, Response = OperationResponse, Error = OperationError>
            + Clone
            + Send
            + Sync
            + 'static,
        G::Future: Send + 'static,
        Q: Service<Operation, Response = OperationResponse, Error = OperationError>
            + Clone
            + Send
            + Sync
            + 'static,
        Q::Future: Send + 'static,
    {
        Self {
            http: BoxCloneSyncService::new(adapters.http),
            rpc: BoxCloneSyncService::new(adapters.rpc),
            grpc: BoxCloneSyncService::new(adapters.grpc),
            queue: BoxCloneSyncService::new(adapters.queue),
        }
    }

    fn adapter_mut(&mut self, transport: Transport) -> &mut AdapterService {
        match transport {
            Transport::Http => &mut self.http,
            Transport::Rpc => &mut self.rpc,
            Transport::Grpc => &mut self.grpc,
            Transport::Queue => &mut self.queue,
        }
    }
}

impl Service<Operation> for OperationRouter {
    type Response = OperationResponse;
    type Error = OperationError;
    type Future = <AdapterService as Service<Operation>>::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Ready only once every adapter is ready.
        for transport in Transport::ALL {
            match self.adapter_mut(transport).poll_ready(cx) {
                Poll::Ready(Ok(())) => {}
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending => return Poll::Pending,
            }
        }
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, op: Operation) -> Self::Future {
        let transport = op.action().transport();
        self.adapter_mut(transport).call(op)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
