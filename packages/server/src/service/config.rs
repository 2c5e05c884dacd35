use std::time::Duration;

/// Gateway-level configuration for the operation pipeline.
///
/// Controls operation timeouts, concurrency limits, and where each backend
/// lives.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Budget for a whole operation, adapter call included, in milliseconds.
    pub default_operation_timeout_ms: u64,
    /// Maximum number of concurrent operations before load shedding.
    pub max_concurrent_operations: u32,
    /// Backend addresses and per-transport limits.
    pub backends: BackendConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            default_operation_timeout_ms: 30_000,
            max_concurrent_operations: 1000,
            backends: BackendConfig::default(),
        }
    }
}

/// Fixed addresses of the backend services and per-transport timeouts.
///
/// HTTP and RPC timeouts are optional: `None` blocks until the backend
/// answers or the operation-level timeout fires.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Full URL of the authentication endpoint.
    pub auth_url: String,
    /// Full URL of the HTTP log endpoint.
    pub log_url: String,
    /// Full URL of the mail endpoint.
    pub mail_url: String,
    /// `host:port` of the RPC log server.
    pub rpc_addr: String,
    /// Plaintext gRPC endpoint of the log service, including the `http://` scheme.
    pub grpc_endpoint: String,
    /// Deadline for a gRPC call, measured from call start.
    pub grpc_deadline: Duration,
    /// Topic exchange receiving queued log events.
    pub exchange: String,
    /// Routing key for queued log events.
    pub routing_key: String,
    /// Per-request timeout for HTTP backends.
    pub http_timeout: Option<Duration>,
    /// Timeout for one RPC exchange, connect included.
    pub rpc_timeout: Option<Duration>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            auth_url: "http://authentication-service/authenticate".to_string(),
            log_url: "http://logger-service/log".to_string(),
            mail_url: "http://mailer-service/send".to_string(),
            rpc_addr: "logger-service:5001".to_string(),
            grpc_endpoint: "http://logger-service:50001".to_string(),
            grpc_deadline: Duration::from_secs(1),
            exchange: "logs_topic".to_string(),
            routing_key: "log.INFO".to_string(),
            http_timeout: Some(Duration::from_secs(10)),
            rpc_timeout: Some(Duration::from_secs(10)),
        }
    }
}
