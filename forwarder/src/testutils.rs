use crate::alarm::Notifier;
use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::header::HeaderMap;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode, Uri};
use hyper_util::rt::{TokioExecutor, TokioIo};
use parking_lot::Mutex;
use regions::{Endpoint, Region, RegionDirectory};
use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

struct UpstreamState {
    status: AtomicU16,
    body: &'static str,
    headers: Vec<(&'static str, &'static str)>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// An in-process backend that answers every request with a fixed response and
/// records what it received.
pub struct TestUpstream {
    port: u16,
    state: Arc<UpstreamState>,
}

impl TestUpstream {
    pub async fn spawn(status: StatusCode, body: &'static str) -> Self {
        Self::spawn_with_headers(status, body, vec![]).await
    }

    pub async fn spawn_with_headers(
        status: StatusCode,
        body: &'static str,
        headers: Vec<(&'static str, &'static str)>,
    ) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let port = listener.local_addr().unwrap().port();

        let state = Arc::new(UpstreamState {
            status: AtomicU16::new(status.as_u16()),
            body,
            headers,
            requests: Mutex::new(Vec::new()),
        });

        let server_state = state.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let state = server_state.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req| handle(state.clone(), req));
                    let _ = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        TestUpstream { port, state }
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new("127.0.0.1", self.port, 0)
    }

    pub fn prefix(&self) -> String {
        self.endpoint().prefix()
    }

    pub fn set_status(&self, status: StatusCode) {
        self.state.status.store(status.as_u16(), Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }

    pub fn hits(&self) -> usize {
        self.state.requests.lock().len()
    }
}

async fn handle(
    state: Arc<UpstreamState>,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = body
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .unwrap_or_else(|_| Bytes::new());

    state.requests.lock().push(RecordedRequest {
        method: parts.method,
        uri: parts.uri,
        headers: parts.headers,
        body,
    });

    let mut builder = Response::builder().status(state.status.load(Ordering::SeqCst));
    for (name, value) in &state.headers {
        builder = builder.header(*name, *value);
    }
    Ok(builder
        .body(Full::new(Bytes::from_static(state.body.as_bytes())))
        .unwrap())
}

/// Prefix of a local server that accepts connections and never answers.
pub async fn silent_server_prefix() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    format!("http://127.0.0.1:{port}")
}

/// Prefix of a local port nothing listens on.
pub async fn closed_port_prefix() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

pub fn region(gateway: Endpoint, is_default: bool) -> Region {
    Region {
        name: "aws-us-west-2".to_string(),
        provider: None,
        location: None,
        token: None,
        is_default,
        label: None,
        operator: gateway.clone(),
        prometheus: gateway.clone(),
        gateway,
        external_dns: None,
        integration_external_dns: None,
    }
}

/// Directory over the given upstreams; the first one is the default cluster.
pub fn directory(upstreams: &[&TestUpstream]) -> Arc<RegionDirectory> {
    let records = upstreams
        .iter()
        .enumerate()
        .map(|(i, upstream)| region(upstream.endpoint(), i == 0))
        .collect();
    Arc::new(RegionDirectory::from_records("aws-us-west-2", records).unwrap())
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    /// Alarms are delivered on background tasks. Lets them run, then returns
    /// what was recorded once at least `count` alarms arrived or 2s passed.
    pub async fn wait_for(&self, count: usize) -> Vec<String> {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let messages = self.messages.lock().clone();
            if messages.len() >= count || Instant::now() >= deadline {
                return messages;
            }
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}
