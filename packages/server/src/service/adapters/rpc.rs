//! Synchronous RPC adapter for the logger's TCP RPC server.
//!
//! Wire format: each message is one frame with a 4-byte big-endian length
//! prefix, holding a named `MsgPack` map. A call is one request frame answered
//! by one reply frame carrying the same `seq`.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use courier_core::{LogPayload, Transport};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tower::Service;
use tracing::warn;

use crate::service::operation::{Operation, OperationError, OperationResponse, Outcome};

/// Remote procedure that stores a log entry.
pub const LOG_INFO_METHOD: &str = "RPCServer.LogInfo";

/// Arguments of [`LOG_INFO_METHOD`]. Field names are capitalised on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RpcLogArgs {
    pub name: String,
    pub data: String,
}

impl From<&LogPayload> for RpcLogArgs {
    fn from(payload: &LogPayload) -> Self {
        Self {
            name: payload.name.clone(),
            data: payload.data.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub seq: u64,
    pub method: String,
    pub params: RpcLogArgs,
}

/// Reply frame. A non-empty `error` means the call failed remotely.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RpcReply {
    pub seq: u64,
    #[serde(default)]
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn failure(reason: impl Into<String>) -> OperationError {
    OperationError::transport(Transport::Rpc, reason)
}

/// Calls the logger's RPC server, one TCP connection per call.
#[derive(Debug, Clone)]
pub struct RpcAdapter {
    addr: Arc<str>,
    timeout: Option<Duration>,
    seq: Arc<AtomicU64>,
}

impl RpcAdapter {
    /// `addr` is a `host:port` string. `timeout` bounds connect, request and
    /// reply together; `None` waits indefinitely.
    #[must_use]
    pub fn new(addr: impl Into<Arc<str>>, timeout: Option<Duration>) -> Self {
        Self {
            addr: addr.into(),
            timeout,
            seq: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Invokes [`LOG_INFO_METHOD`] and returns the server's acknowledgement as
    /// the success message.
    pub async fn log_info(&self, payload: &LogPayload) -> Outcome {
        let Some(limit) = self.timeout else {
            return self.exchange(payload).await;
        };
        tokio::time::timeout(limit, self.exchange(payload))
            .await
            .unwrap_or_else(|_| {
                Err(failure(format!(
                    "rpc call to {} timed out after {}ms",
                    self.addr,
                    limit.as_millis()
                )))
            })
    }

    async fn exchange(&self, payload: &LogPayload) -> Outcome {
        let stream = TcpStream::connect(&*self.addr)
            .await
            .map_err(|e| failure(format!("connect to {}: {e}", self.addr)))?;
        let mut framed = Framed::new(stream, LengthDelimitedCodec::new());

        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            seq,
            method: LOG_INFO_METHOD.to_string(),
            params: payload.into(),
        };
        let body = rmp_serde::to_vec_named(&request)
            .map_err(|e| failure(format!("encode rpc request: {e}")))?;

        framed
            .send(Bytes::from(body))
            .await
            .map_err(|e| failure(format!("send rpc request: {e}")))?;

        let frame = framed
            .next()
            .await
            .ok_or_else(|| failure("connection closed before rpc reply"))?
            .map_err(|e| failure(format!("read rpc reply: {e}")))?;

        // Done with the connection whatever the reply says.
        if let Err(e) = SinkExt::<Bytes>::close(&mut framed).await {
            warn!(addr = %self.addr, error = %e, "failed to close rpc connection");
        }

        let reply: RpcReply = rmp_serde::from_slice(&frame)
            .map_err(|e| failure(format!("decode rpc reply: {e}")))?;

        if reply.seq != seq {
            return Err(failure(format!(
                "rpc reply sequence mismatch: sent {seq}, got {}",
                reply.seq
            )));
        }
        if let Some(error) = reply.error.filter(|e| !e.is_empty()) {
            return Err(failure(error));
        }
        Ok(OperationResponse::new(reply.result))
    }
}

impl Service<Operation> for RpcAdapter {
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
                Operation::LogRpc { payload, .. } => adapter.log_info(&payload).await,
                _ => Err(OperationError::WrongService),
            }
        })
    }
}
