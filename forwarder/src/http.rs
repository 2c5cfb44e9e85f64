use http::request::Parts;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Request, Response};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use shared::http::copy_headers;
use std::time::Duration;
use tokio::time::timeout;

use crate::errors::ForwarderError;

pub type UpstreamClient = Client<HttpConnector, Full<Bytes>>;

pub fn build_client() -> UpstreamClient {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

/// Send one copy of a buffered request to the upstream at `endpoint`.
///
/// The target URI is `endpoint` followed by the inbound path and query. Every
/// inbound header is copied onto the outbound request and every upstream
/// response header is kept.
///
/// # Timeout Behavior
///
/// When `attempt_timeout` is set it bounds the entire request/response cycle,
/// including collecting the response body. Without it the call waits for as
/// long as the connection stays open.
pub async fn send_to_upstream(
    client: &UpstreamClient,
    endpoint: &str,
    parts: &Parts,
    body: Bytes,
    attempt_timeout: Option<Duration>,
) -> Result<Response<Bytes>, ForwarderError> {
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let upstream_uri = format!("{endpoint}{path_and_query}");

    let mut upstream_request = Request::builder()
        .method(parts.method.clone())
        .uri(upstream_uri)
        .body(Full::new(body))
        .map_err(|e| ForwarderError::RequestBuildError(e.to_string()))?;
    copy_headers(&parts.headers, upstream_request.headers_mut());

    let exchange = async {
        let response = client.request(upstream_request).await.map_err(|e| {
            ForwarderError::UpstreamRequestFailed(endpoint.to_string(), e.to_string())
        })?;

        let (parts, body) = response.into_parts();
        let body_bytes = body
            .collect()
            .await
            .map(|collected| collected.to_bytes())
            .map_err(|e| ForwarderError::ResponseBodyError(e.to_string()))?;

        Ok::<_, ForwarderError>(Response::from_parts(parts, body_bytes))
    };

    match attempt_timeout {
        Some(duration) => timeout(duration, exchange)
            .await
            .map_err(|_| ForwarderError::UpstreamTimeout(endpoint.to_string()))?,
        None => exchange.await,
    }
}
