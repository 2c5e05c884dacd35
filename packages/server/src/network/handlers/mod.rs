//! Axum handlers and the state they share.

pub mod gateway;
pub mod health;

pub use gateway::{log_grpc_handler, ping_handler, submit_handler};
pub use health::{health_handler, liveness_handler, readiness_handler};

use std::sync::Arc;
use std::time::Instant;

use super::ShutdownController;
use crate::service::Gateway;

/// Shared state handed to every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub shutdown: Arc<ShutdownController>,
    /// Used for the uptime in `/health`.
    pub start_time: Instant,
}
