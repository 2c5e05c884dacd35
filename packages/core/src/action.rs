//! Action tags and the transports they are carried over.
//!
//! The set of actions is closed: every tag maps to exactly one [`Transport`]
//! through an exhaustive match, so adding an action forces a routing decision
//! at compile time.

use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Backend transport used to fulfil an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    /// Synchronous JSON request/response over HTTP.
    Http,
    /// Length-prefixed binary RPC over a plain TCP connection.
    Rpc,
    /// gRPC unary call over a plaintext HTTP/2 channel.
    Grpc,
    /// Fire-and-forget publish to a message broker.
    Queue,
}

impl Transport {
    /// Every transport, in dispatch-table order.
    pub const ALL: [Transport; 4] = [
        Transport::Http,
        Transport::Rpc,
        Transport::Grpc,
        Transport::Queue,
    ];

    /// Lowercase name used in logs and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Transport::Http => "http",
            Transport::Rpc => "rpc",
            Transport::Grpc => "grpc",
            Transport::Queue => "queue",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// A gateway action, selected by the `action` field of the request envelope.
///
/// Wire tags are fixed by existing clients and are not derived from variant
/// names: `"log"` means "log over RPC", `"log.rabbit"` means "log over the
/// broker".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// `"auth"`: credential check over HTTP.
    Auth,
    /// `"log.http"`: log entry over HTTP.
    LogHttp,
    /// `"log"`: log entry over the TCP RPC server.
    LogRpc,
    /// `"log.grpc"`: log entry over gRPC.
    LogGrpc,
    /// `"log.rabbit"`: log entry published to the broker.
    LogQueue,
    /// `"mail"`: email over HTTP.
    Mail,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Auth,
        Action::LogHttp,
        Action::LogRpc,
        Action::LogGrpc,
        Action::LogQueue,
        Action::Mail,
    ];

    /// Returns the wire tag for this action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Action::Auth => "auth",
            Action::LogHttp => "log.http",
            Action::LogRpc => "log",
            Action::LogGrpc => "log.grpc",
            Action::LogQueue => "log.rabbit",
            Action::Mail => "mail",
        }
    }

    /// Returns the transport that carries this action.
    #[must_use]
    pub const fn transport(self) -> Transport {
        match self {
            Action::Auth | Action::LogHttp | Action::Mail => Transport::Http,
            Action::LogRpc => Transport::Rpc,
            Action::LogGrpc => Transport::Grpc,
            Action::LogQueue => Transport::Queue,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a wire tag names no known action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action: {0:?}")]
pub struct UnknownActionTag(pub String);

impl FromStr for Action {
    type Err = UnknownActionTag;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == tag)
            .ok_or_else(|| UnknownActionTag(tag.to_string()))
    }
}
