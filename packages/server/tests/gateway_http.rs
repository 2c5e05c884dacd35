//! End-to-end tests of the gateway's HTTP surface against in-process backends.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use courier_core::EnvelopeCodec;
use courier_server::network::{NetworkConfig, NetworkModule};
use courier_server::service::adapters::grpc::proto;
use courier_server::service::adapters::rpc::{RpcReply, RpcRequest};
use courier_server::service::adapters::{
    BrokerConnection, GrpcAdapter, HttpAdapter, HttpEndpoints, PublishChannel, QueueAdapter,
    RpcAdapter,
};
use courier_server::service::{Adapters, Gateway, GatewayConfig, OperationRouter};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tonic::body::BoxBody;
use tonic::codegen::{Body as GrpcBody, StdError};
use tonic::server::{NamedService, UnaryService};
use tonic::transport::server::TcpIncoming;
use tower::{Service, ServiceExt};

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

async fn spawn_http_backends() -> String {
    let router = Router::new()
        .route(
            "/authenticate",
            post(|Json(body): Json<Value>| async move {
                if body["password"] == "verysecret" {
                    (
                        StatusCode::ACCEPTED,
                        Json(json!({
                            "error": false,
                            "message": format!("Logged in user {}", body["email"].as_str().unwrap_or_default()),
                            "data": { "id": 1, "email": body["email"] }
                        })),
                    )
                } else {
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({ "error": true, "message": "invalid credentials" })),
                    )
                }
            }),
        )
        .route("/log", post(|| async { StatusCode::ACCEPTED }))
        .route("/send", post(|| async { StatusCode::ACCEPTED }));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn spawn_rpc_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut framed = Framed::new(stream, LengthDelimitedCodec::new());
                let Some(Ok(frame)) = framed.next().await else {
                    return;
                };
                let request: RpcRequest = rmp_serde::from_slice(&frame).unwrap();
                let reply = RpcReply {
                    seq: request.seq,
                    result: format!("Processed payload via RPC: {}", request.params.name),
                    error: None,
                };
                let body = rmp_serde::to_vec_named(&reply).unwrap();
                framed.send(Bytes::from(body)).await.unwrap();
            });
        }
    });
    addr
}

type GrpcLogs = Arc<Mutex<Vec<proto::Log>>>;

/// `logs.LogService` backend keeping every entry it was sent.
#[derive(Clone, Default)]
struct LogService {
    logs: GrpcLogs,
}

struct WriteLog {
    logs: GrpcLogs,
}

impl UnaryService<proto::LogRequest> for WriteLog {
    type Response = proto::LogResponse;
    type Future = std::future::Ready<Result<tonic::Response<proto::LogResponse>, tonic::Status>>;

    fn call(&mut self, request: tonic::Request<proto::LogRequest>) -> Self::Future {
        let entry = request.into_inner().log_entry.unwrap_or_default();
        self.logs.lock().unwrap().push(entry);
        std::future::ready(Ok(tonic::Response::new(proto::LogResponse {
            result: "stored".to_string(),
        })))
    }
}

impl<B> Service<http::Request<B>> for LogService
where
    B: GrpcBody + Send + 'static,
    B::Error: Into<StdError> + Send + 'static,
{
    type Response = http::Response<BoxBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: http::Request<B>) -> Self::Future {
        let method = WriteLog {
            logs: Arc::clone(&self.logs),
        };
        Box::pin(async move {
            let mut grpc = tonic::server::Grpc::new(tonic::codec::ProstCodec::default());
            Ok(grpc.unary(method, request).await)
        })
    }
}

impl NamedService for LogService {
    const NAME: &'static str = "logs.LogService";
}

async fn spawn_grpc_backend() -> (SocketAddr, GrpcLogs) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let incoming = TcpIncoming::from_listener(listener, true, None).unwrap();
    let service = LogService::default();
    let logs = Arc::clone(&service.logs);
    tokio::spawn(
        tonic::transport::Server::builder()
            .add_service(service)
            .serve_with_incoming(incoming),
    );
    (addr, logs)
}

async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Broker that accepts everything and keeps the routing keys it saw.
#[derive(Clone, Default)]
struct RecordingBroker {
    routing_keys: Arc<Mutex<Vec<String>>>,
}

struct RecordingChannel {
    routing_keys: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl BrokerConnection for RecordingBroker {
    async fn open_channel(&self) -> anyhow::Result<Box<dyn PublishChannel>> {
        Ok(Box::new(RecordingChannel {
            routing_keys: Arc::clone(&self.routing_keys),
        }))
    }

    async fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl PublishChannel for RecordingChannel {
    async fn declare_topic(&self, _exchange: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn publish(&self, _exchange: &str, routing_key: &str, _body: &[u8]) -> anyhow::Result<()> {
        self.routing_keys.lock().unwrap().push(routing_key.to_string());
        Ok(())
    }

    async fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct TestGateway {
    app: Router,
    broker: RecordingBroker,
    grpc_logs: GrpcLogs,
}

async fn gateway_with(rpc_addr: SocketAddr, grpc_addr: SocketAddr) -> TestGateway {
    let base = spawn_http_backends().await;
    let broker = RecordingBroker::default();

    let http = HttpAdapter::new(
        HttpEndpoints {
            auth_url: format!("{base}/authenticate"),
            log_url: format!("{base}/log"),
            mail_url: format!("{base}/send"),
        },
        Some(Duration::from_secs(5)),
    )
    .unwrap();

    let router = OperationRouter::new(Adapters {
        http,
        rpc: RpcAdapter::new(rpc_addr.to_string(), Some(Duration::from_secs(5))),
        grpc: GrpcAdapter::new(format!("http://{grpc_addr}"), Duration::from_secs(2)),
        queue: QueueAdapter::new(Arc::new(broker.clone()), "logs_topic", "log.INFO"),
    });

    let codec = EnvelopeCodec::new(4096);
    let config = NetworkConfig {
        max_body_bytes: codec.max_body_bytes(),
        ..NetworkConfig::default()
    };
    let gateway = Gateway::new(Arc::new(GatewayConfig::default()), codec, router);
    let module = NetworkModule::new(config, Arc::new(gateway));
    TestGateway {
        app: module.build_router(),
        broker,
        grpc_logs: GrpcLogs::default(),
    }
}

/// Gateway with every backend live.
async fn gateway() -> TestGateway {
    let (grpc_addr, grpc_logs) = spawn_grpc_backend().await;
    let mut gw = gateway_with(spawn_rpc_backend().await, grpc_addr).await;
    gw.grpc_logs = grpc_logs;
    gw
}

async fn post_raw(app: &Router, path: &str, body: impl Into<Body>) -> (StatusCode, Value) {
    let request = Request::post(path)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post_json(app: &Router, path: &str, body: &Value) -> (StatusCode, Value) {
    post_raw(app, path, body.to_string()).await
}

fn log_request(action: &str) -> Value {
    json!({ "action": action, "log": { "name": "event", "data": "some data" } })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ping_hits_the_broker() {
    let gw = gateway().await;
    let (status, body) = post_raw(&gw.app, "/", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "error": false, "message": "Hit the broker" }));
}

#[tokio::test]
async fn auth_relays_user_data() {
    let gw = gateway().await;
    let (status, body) = post_json(
        &gw.app,
        "/handle",
        &json!({ "action": "auth", "auth": { "email": "admin@example.com", "password": "verysecret" } }),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["error"], false);
    assert_eq!(body["message"], "Authenticated!");
    assert_eq!(body["data"]["email"], "admin@example.com");
}

#[tokio::test]
async fn bad_credentials_are_unauthorized() {
    let gw = gateway().await;
    let (status, body) = post_json(
        &gw.app,
        "/handle",
        &json!({ "action": "auth", "auth": { "email": "admin@example.com", "password": "nope" } }),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": true, "message": "invalid credentials" }));
}

#[tokio::test]
async fn every_live_action_succeeds() {
    let gw = gateway().await;
    let mail = json!({
        "action": "mail",
        "mail": { "from": "me@example.com", "to": "you@example.com", "subject": "Hi", "message": "Hello" }
    });
    let cases = [
        (log_request("log.http"), "logged".to_string()),
        (log_request("log"), "Processed payload via RPC: event".to_string()),
        (log_request("log.grpc"), "logged".to_string()),
        (log_request("log.rabbit"), "logged via RabbitMQ".to_string()),
        (mail, "Message sent to you@example.com".to_string()),
    ];

    for (request, expected) in cases {
        let (status, body) = post_json(&gw.app, "/handle", &request).await;
        assert_eq!(status, StatusCode::ACCEPTED, "{request}");
        assert_eq!(body["error"], false);
        assert_eq!(body["message"], expected);
        assert!(body.get("data").is_none());
    }
    assert_eq!(*gw.broker.routing_keys.lock().unwrap(), vec!["log.INFO".to_string()]);
    assert_eq!(gw.grpc_logs.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn log_grpc_route_logs_whatever_the_tag() {
    let gw = gateway().await;
    let (status, body) = post_json(&gw.app, "/log-grpc", &log_request("anything")).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body, json!({ "error": false, "message": "logged" }));
    assert_eq!(
        *gw.grpc_logs.lock().unwrap(),
        vec![proto::Log {
            name: "event".to_string(),
            data: "some data".to_string(),
        }]
    );
}

#[tokio::test]
async fn unreachable_rpc_server_is_bad_gateway() {
    let gw = gateway_with(closed_addr().await, closed_addr().await).await;
    let (status, body) = post_json(&gw.app, "/handle", &log_request("log")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], true);
}

#[tokio::test]
async fn unreachable_grpc_server_is_bad_gateway_on_both_routes() {
    let gw = gateway_with(spawn_rpc_backend().await, closed_addr().await).await;

    let (status, body) = post_json(&gw.app, "/handle", &log_request("log.grpc")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], true);

    // The dedicated route ignores the action tag.
    let (status, body) = post_json(&gw.app, "/log-grpc", &log_request("anything")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], true);
}

#[tokio::test]
async fn unknown_action_is_a_bad_request() {
    let gw = gateway().await;
    let (status, body) = post_json(&gw.app, "/handle", &json!({ "action": "unknown" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": true, "message": "unknown action" }));

    let (status, body) = post_json(&gw.app, "/handle", &json!({ "action": null })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": true, "message": "unknown action" }));
    assert!(gw.broker.routing_keys.lock().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_and_oversized_bodies_are_bad_requests() {
    let gw = gateway().await;

    let (status, body) = post_raw(&gw.app, "/handle", "{\"action\": ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);

    let (status, body) = post_raw(&gw.app, "/handle", Body::empty()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);

    let huge = json!({ "action": "log.http", "log": { "name": "x", "data": "y".repeat(10_000) } });
    let (status, body) = post_json(&gw.app, "/handle", &huge).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
}

#[tokio::test]
async fn identical_requests_get_identical_replies() {
    let gw = gateway().await;
    let first = post_json(&gw.app, "/handle", &log_request("log.http")).await;
    let second = post_json(&gw.app, "/handle", &log_request("log.http")).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn health_probes_respond() {
    let gw = gateway().await;

    let response = gw
        .app
        .clone()
        .oneshot(Request::get("/health/live").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Not serving yet, so the gateway is still starting.
    let response = gw
        .app
        .clone()
        .oneshot(Request::get("/health/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = gw
        .app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["state"], "starting");
}
