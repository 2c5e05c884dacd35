//! Transport adapters, one `tower::Service<Operation>` per backend protocol.
//!
//! | Transport | Actions                   | Adapter          |
//! |-----------|---------------------------|------------------|
//! | Http      | `auth`, `log.http`, `mail` | [`HttpAdapter`]  |
//! | Rpc       | `log`                     | [`RpcAdapter`]   |
//! | Grpc      | `log.grpc`                | [`GrpcAdapter`]  |
//! | Queue     | `log.rabbit`              | [`QueueAdapter`] |

pub mod grpc;
pub mod http;
pub mod queue;
pub mod rpc;

#[cfg(test)]
pub(crate) mod testing;

pub use grpc::GrpcAdapter;
pub use http::{HttpAdapter, HttpEndpoints};
pub use queue::{AmqpConnection, BrokerConnection, PublishChannel, QueueAdapter};
pub use rpc::RpcAdapter;
