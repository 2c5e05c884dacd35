//! HTTP-forward adapter: JSON POSTs to the auth, log and mail services.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use courier_core::{AuthPayload, LogPayload, MailPayload, ResponseEnvelope, Transport};
use reqwest::StatusCode;
use serde::Serialize;
use tower::Service;
use tracing::debug;

use crate::service::operation::{Operation, OperationError, OperationResponse, Outcome};

/// Endpoints the HTTP adapter posts to.
#[derive(Debug, Clone)]
pub struct HttpEndpoints {
    pub auth_url: String,
    pub log_url: String,
    pub mail_url: String,
}

/// Forwards auth, log and mail payloads to their HTTP backends.
///
/// One `reqwest::Client` is shared by all clones so connections are pooled.
/// Each response is owned by the call that made it and released when that
/// call returns, whichever path it takes.
#[derive(Debug, Clone)]
pub struct HttpAdapter {
    client: reqwest::Client,
    endpoints: Arc<HttpEndpoints>,
}

impl HttpAdapter {
    /// Creates an adapter. `timeout` bounds each request end to end; `None`
    /// waits for as long as the backend takes.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialised (e.g. the
    /// TLS backend fails to load).
    pub fn new(endpoints: HttpEndpoints, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            endpoints: Arc::new(endpoints),
        })
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<reqwest::Response, OperationError> {
        // `json` serializes compactly and sets `Content-Type: application/json`.
        self.client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| OperationError::transport(Transport::Http, format!("POST {url}: {e}")))
    }

    /// Checks credentials with the authentication service.
    ///
    /// `401` is an explicit rejection; any other non-2xx status is a transport
    /// failure. A 2xx reply carries the backend's own envelope, whose `error`
    /// flag is honoured and whose `data` is relayed on success.
    pub async fn authenticate(&self, payload: &AuthPayload) -> Outcome {
        let response = self.post(&self.endpoints.auth_url, payload).await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(OperationError::rejected("invalid credentials"));
        }
        if !status.is_success() {
            return Err(OperationError::transport(
                Transport::Http,
                format!("error calling auth service: status {status}"),
            ));
        }

        let envelope: ResponseEnvelope = response.json().await.map_err(|e| {
            OperationError::transport(Transport::Http, format!("malformed auth service reply: {e}"))
        })?;

        if envelope.error {
            debug!(message = %envelope.message, "auth service declined credentials");
            let reason = if envelope.message.is_empty() {
                "invalid credentials".to_string()
            } else {
                envelope.message
            };
            return Err(OperationError::rejected(reason));
        }

        Ok(OperationResponse::new("Authenticated!").with_data(envelope.data))
    }

    /// Writes a log entry through the logger's HTTP endpoint.
    pub async fn log(&self, payload: &LogPayload) -> Outcome {
        let response = self.post(&self.endpoints.log_url, payload).await?;
        expect_accepted(response.status(), "error calling logger service")?;
        Ok(OperationResponse::new("logged"))
    }

    /// Hands an email to the mail service.
    pub async fn send_mail(&self, payload: &MailPayload) -> Outcome {
        let response = self.post(&self.endpoints.mail_url, payload).await?;
        expect_accepted(response.status(), "error calling mail service")?;
        Ok(OperationResponse::new(format!("Message sent to {}", payload.to)))
    }
}

/// Fire-and-log backends answer `202 Accepted` and nothing else.
fn expect_accepted(status: StatusCode, reason: &str) -> Result<(), OperationError> {
    if status == StatusCode::ACCEPTED {
        Ok(())
    } else {
        Err(OperationError::transport(
            Transport::Http,
            format!("{reason}: status {status}"),
        ))
    }
}

impl Service<Operation> for HttpAdapter {
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
                Operation::Authenticate { payload, .. } => adapter.authenticate(&payload).await,
                Operation::LogHttp { payload, .. } => adapter.log(&payload).await,
                Operation::SendMail { payload, .. } => adapter.send_mail(&payload).await,
                _ => Err(OperationError::WrongService),
            }
        })
    }
}
