//! Operation types flowing through the gateway pipeline.

use courier_core::{Action, AuthPayload, CodecError, LogPayload, MailPayload, Transport};
use serde_json::Value;

/// Context carried with every operation through the pipeline.
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub call_id: u64,
    pub action: Action,
    pub call_timeout_ms: u64,
}

impl OperationContext {
    #[must_use]
    pub fn new(call_id: u64, action: Action, call_timeout_ms: u64) -> Self {
        Self {
            call_id,
            action,
            call_timeout_ms,
        }
    }
}

/// One classified gateway request. Each variant carries the payload its
/// adapter consumes.
#[derive(Debug, Clone)]
pub enum Operation {
    Authenticate { ctx: OperationContext, payload: AuthPayload },
    LogHttp { ctx: OperationContext, payload: LogPayload },
    LogRpc { ctx: OperationContext, payload: LogPayload },
    LogGrpc { ctx: OperationContext, payload: LogPayload },
    LogQueue { ctx: OperationContext, payload: LogPayload },
    SendMail { ctx: OperationContext, payload: MailPayload },
}

impl Operation {
    #[must_use]
    pub fn ctx(&self) -> &OperationContext {
        match self {
            Operation::Authenticate { ctx, .. }
            | Operation::LogHttp { ctx, .. }
            | Operation::LogRpc { ctx, .. }
            | Operation::LogGrpc { ctx, .. }
            | Operation::LogQueue { ctx, .. }
            | Operation::SendMail { ctx, .. } => ctx,
        }
    }

    #[must_use]
    pub fn action(&self) -> Action {
        self.ctx().action
    }
}

/// Successful result of an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResponse {
    pub message: String,
    pub data: Option<Value>,
}

impl OperationResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: Option<Value>) -> Self {
        self.data = data;
        self
    }
}

/// Errors returned anywhere in the gateway pipeline.
///
/// This is the full client-visible taxonomy; the response translator maps
/// each variant to a status code.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OperationError {
    #[error("{reason}")]
    MalformedInput { reason: String },
    #[error("unknown action")]
    UnknownAction { action: String },
    #[error("{reason}")]
    UpstreamRejected { reason: String },
    #[error("{reason}")]
    TransportFailure { transport: Transport, reason: String },
    #[error("operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("server overloaded, try again later")]
    Overloaded,
    #[error("wrong service for operation")]
    WrongService,
}

impl OperationError {
    /// Shorthand for a transport-level failure.
    pub fn transport(transport: Transport, reason: impl Into<String>) -> Self {
        OperationError::TransportFailure {
            transport,
            reason: reason.into(),
        }
    }

    /// Shorthand for an application-level rejection by the backend.
    pub fn rejected(reason: impl Into<String>) -> Self {
        OperationError::UpstreamRejected {
            reason: reason.into(),
        }
    }

    /// Stable short name used for metric labels and structured logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            OperationError::MalformedInput { .. } => "malformed_input",
            OperationError::UnknownAction { .. } => "unknown_action",
            OperationError::UpstreamRejected { .. } => "upstream_rejected",
            OperationError::TransportFailure { .. } => "transport_failure",
            OperationError::Timeout { .. } => "timeout",
            OperationError::Overloaded => "overloaded",
            OperationError::WrongService => "wrong_service",
        }
    }
}

impl From<CodecError> for OperationError {
    fn from(err: CodecError) -> Self {
        OperationError::MalformedInput {
            reason: err.to_string(),
        }
    }
}

impl From<ClassifyError> for OperationError {
    fn from(err: ClassifyError) -> Self {
        match err {
            ClassifyError::UnknownAction { action } => OperationError::UnknownAction { action },
        }
    }
}

/// Result of running one operation.
pub type Outcome = Result<OperationResponse, OperationError>;

/// Errors from classifying a `RequestEnvelope` into an `Operation`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    #[error("unknown action: {action:?}")]
    UnknownAction { action: String },
}
