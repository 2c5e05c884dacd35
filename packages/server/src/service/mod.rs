//! Request routing and execution.
//!
//! A request flows through these stages:
//!
//! 1. **Classification** (`classify`): `RequestEnvelope` -> `Result<Operation, ClassifyError>`
//! 2. **Middleware** (`middleware`): Tower layers (load-shedding, timeout, metrics)
//! 3. **Routing** (`router`): Dispatch to one adapter per `Transport`
//! 4. **Adapters** (`adapters`): HTTP, RPC, gRPC and queue backends
//! 5. **Translation** (`translate`): `Outcome` -> status code and `ResponseEnvelope`
//!
//! [`Gateway`] ties the stages together behind a single call.

pub mod adapters;
pub mod classify;
pub mod config;
pub mod gateway;
pub mod middleware;
pub mod operation;
pub mod router;
pub mod translate;

// Re-export key types for convenient access.
pub use classify::OperationClassifier;
pub use config::{BackendConfig, GatewayConfig};
pub use gateway::Gateway;
pub use operation::{
    ClassifyError, Operation, OperationContext, OperationError, OperationResponse, Outcome,
};
pub use router::{Adapters, OperationRouter};
pub use translate::translate;
