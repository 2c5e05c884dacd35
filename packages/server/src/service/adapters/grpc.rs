//! gRPC unary adapter for the logger's `LogService`.
//!
//! The messages and client below mirror what `tonic-build` generates for
//! `logs.proto`; they are written out so the build needs no `protoc`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use courier_core::{LogPayload, Transport};
use tonic::transport::{Channel, Endpoint};
use tower::Service;

use crate::service::operation::{Operation, OperationError, OperationResponse, Outcome};

pub mod proto {
    //! Messages of the `logs` protobuf package.

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Log {
        #[prost(string, tag = "1")]
        pub name: String,
        #[prost(string, tag = "2")]
        pub data: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct LogRequest {
        #[prost(message, optional, tag = "1")]
        pub log_entry: Option<Log>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct LogResponse {
        #[prost(string, tag = "1")]
        pub result: String,
    }
}

/// Full method path of `LogService.WriteLog`.
pub const WRITE_LOG_PATH: &str = "/logs.LogService/WriteLog";

/// Minimal client for `logs.LogService`.
#[derive(Debug, Clone)]
pub struct LogServiceClient {
    inner: tonic::client::Grpc<Channel>,
}

impl LogServiceClient {
    #[must_use]
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    /// Unary `WriteLog` call.
    ///
    /// # Errors
    ///
    /// Returns the RPC `Status` on any transport or server-side failure.
    pub async fn write_log(
        &mut self,
        request: tonic::Request<proto::LogRequest>,
    ) -> Result<tonic::Response<proto::LogResponse>, tonic::Status> {
        self.inner
            .ready()
            .await
            .map_err(|e| tonic::Status::unknown(format!("service was not ready: {e}")))?;
        let codec = tonic::codec::ProstCodec::default();
        let path = http::uri::PathAndQuery::from_static(WRITE_LOG_PATH);
        self.inner.unary(request, path, codec).await
    }
}

fn failure(reason: impl Into<String>) -> OperationError {
    OperationError::transport(Transport::Grpc, reason)
}

/// Writes log entries over gRPC with a fixed per-call deadline.
///
/// Every call opens its own plaintext channel and drops it when the call
/// finishes, so no channel outlives a request.
#[derive(Debug, Clone)]
pub struct GrpcAdapter {
    endpoint: Arc<str>,
    deadline: Duration,
}

impl GrpcAdapter {
    /// `endpoint` must use the `http://` scheme.
    #[must_use]
    pub fn new(endpoint: impl Into<Arc<str>>, deadline: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            deadline,
        }
    }

    /// Sends one `WriteLog` call. The deadline runs from the moment this is
    /// called and covers connecting as well as the call itself.
    pub async fn write_log(&self, payload: &LogPayload) -> Outcome {
        tokio::time::timeout(self.deadline, self.call_once(payload))
            .await
            .unwrap_or_else(|_| {
                Err(failure(format!(
                    "grpc deadline of {}ms exceeded",
                    self.deadline.as_millis()
                )))
            })
    }

    async fn call_once(&self, payload: &LogPayload) -> Outcome {
        let endpoint = Endpoint::from_shared(self.endpoint.to_string())
            .map_err(|e| failure(format!("invalid grpc endpoint {}: {e}", self.endpoint)))?
            .connect_timeout(self.deadline);
        let channel = endpoint
            .connect()
            .await
            .map_err(|e| failure(format!("connect to {}: {e}", self.endpoint)))?;

        let mut request = tonic::Request::new(proto::LogRequest {
            log_entry: Some(proto::Log {
                name: payload.name.clone(),
                data: payload.data.clone(),
            }),
        });
        request.set_timeout(self.deadline);

        LogServiceClient::new(channel)
            .write_log(request)
            .await
            .map_err(|status| {
                failure(format!(
                    "write log failed ({:?}): {}",
                    status.code(),
                    status.message()
                ))
            })?;
        Ok(OperationResponse::new("logged"))
    }
}

impl Service<Operation> for GrpcAdapter {
    type Response = OperationResponse;
    type Error = OperationError;
    type Future = Pin<Box<dyn Future<Output = Outcome> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, op: Operation) -> Self::Future {
        let adapter = self.clone();
        Box::pin(async move {
            match op {
                Operation::LogGrpc { payload, .. } => adapter.write_log(&payload).await,
                _ => Err(OperationError::WrongService),
            }
        })
    }
}
