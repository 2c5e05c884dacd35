//! Gateway HTTP server with a deferred startup lifecycle.
//!
//! `new()` wires shared state, `start()` binds the listener, and `serve()`
//! accepts requests until shutdown. Binding before serving lets the caller
//! learn the real port when port 0 is configured.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::NetworkConfig;
use super::handlers::{
    health_handler, liveness_handler, log_grpc_handler, ping_handler, readiness_handler,
    submit_handler, AppState,
};
use super::middleware::apply_http_layers;
use super::shutdown::ShutdownController;
use crate::service::Gateway;

/// How long in-flight requests get to finish after shutdown is signalled.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Owns the HTTP listener and the gateway it serves.
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    gateway: Arc<Gateway>,
    shutdown: Arc<ShutdownController>,
    start_time: Instant,
}

impl NetworkModule {
    /// Creates the module without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig, gateway: Arc<Gateway>) -> Self {
        Self {
            config,
            listener: None,
            gateway,
            shutdown: Arc::new(ShutdownController::new()),
            start_time: Instant::now(),
        }
    }

    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Assembles the axum router with all routes and middleware.
    ///
    /// - `POST /` -- ping
    /// - `POST /handle` -- unified submission
    /// - `POST /log-grpc` -- log over gRPC
    /// - `GET /health`, `/health/live`, `/health/ready` -- probes
    pub fn build_router(&self) -> Router {
        let state = AppState {
            gateway: Arc::clone(&self.gateway),
            shutdown: Arc::clone(&self.shutdown),
            start_time: self.start_time,
        };

        let routes = Router::new()
            .route("/", post(ping_handler))
            .route("/handle", post(submit_handler))
            .route("/log-grpc", post(log_grpc_handler))
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler));

        apply_http_layers(routes, &self.config).with_state(state)
    }

    /// Binds the listener and returns the bound port.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        let port = listener.local_addr()?.port();

        info!(host = %self.config.host, port, "gateway listener bound");

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves requests until `signal` resolves or
    /// [`ShutdownController::trigger_shutdown`] is called, then drains.
    ///
    /// On shutdown the health state flips to `Draining` so readiness
    /// probes fail, the listener stops accepting, and in-flight requests get
    /// up to 30 seconds to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called or the server hits a
    /// fatal I/O error.
    pub async fn serve(
        mut self,
        signal: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .take()
            .context("start() must be called before serve()")?;
        let router = self.build_router();
        let shutdown = Arc::clone(&self.shutdown);

        shutdown.set_ready();
        info!("gateway ready");

        let mut stopping = shutdown.shutdown_receiver();
        let on_signal = Arc::clone(&shutdown);
        tokio::spawn(async move {
            signal.await;
            info!("shutdown signal received, draining");
            on_signal.trigger_shutdown();
        });

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                // A dropped sender also ends serving.
                let _ = stopping.wait_for(|stop| *stop).await;
            })
            .await?;

        if shutdown.wait_for_drain(DRAIN_TIMEOUT).await {
            info!("all requests drained");
        } else {
            warn!(
                in_flight = shutdown.in_flight_count(),
                "drain timeout expired with requests still in flight"
            );
        }
        Ok(())
    }
}
