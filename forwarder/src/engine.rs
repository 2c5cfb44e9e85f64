//! Request forwarding and failover across regions.
//!
//! A request is first sent to the endpoint that last served its path, if any.
//! When that fails, every region is tried in directory order (default first),
//! skipping the endpoint already tried. The first attempt answered with
//! exactly 200 is relayed to the client; when every attempt fails the client
//! gets a 500. Alarms for failed attempts are sent in the background.
//!
//! ```text
//! START -> (CACHE_TRY) -> SUCCESS
//!                      \-> SCAN -> TRY region 1 -> SUCCESS
//!                                   TRY region 2 -> SUCCESS
//!                                   ...
//!                                   ALL_FAILED (500)
//! ```

use crate::alarm::{Notifier, failure_message};
use crate::config::{Config, MonitorConfig};
use crate::errors::ForwarderError;
use crate::http::{UpstreamClient, build_client, send_to_upstream};
use crate::metrics_defs::{ATTEMPTS, REQUEST_DURATION, REQUESTS, REQUESTS_INFLIGHT};
use crate::route_cache::RouteCache;
use http::request::Parts;
use hyper::body::Bytes;
use hyper::{Request, Response, StatusCode};
use regions::RegionDirectory;
use shared::http::make_text_response;
use shared::{counter, gauge, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

pub const ALL_FAILED_MESSAGE: &str = "all proxy requests failed";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineOptions {
    /// Bound for each upstream attempt; `None` waits indefinitely.
    pub attempt_timeout: Option<Duration>,
    /// Alarm when the cached endpoint of a path fails.
    pub alarm_on_cached_route_failure: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            attempt_timeout: None,
            alarm_on_cached_route_failure: true,
        }
    }
}

impl EngineOptions {
    pub fn from_config(config: &Config, monitor: &MonitorConfig) -> Self {
        EngineOptions {
            attempt_timeout: config.attempt_timeout(),
            alarm_on_cached_route_failure: monitor.alarm_on_cached_route_failure,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum AttemptSource {
    Cache,
    Scan,
}

impl AttemptSource {
    fn as_str(&self) -> &'static str {
        match self {
            AttemptSource::Cache => "cache",
            AttemptSource::Scan => "scan",
        }
    }
}

/// Why an attempt did not produce the response relayed to the client.
#[derive(Debug)]
enum AttemptFailure {
    /// The upstream answered with something other than 200.
    Status(StatusCode),
    Error(ForwarderError),
}

impl AttemptFailure {
    fn raises_alarm(&self) -> bool {
        match self {
            AttemptFailure::Status(_) => true,
            AttemptFailure::Error(e) => e.is_backend_failure(),
        }
    }

    fn result_tag(&self) -> &'static str {
        match self {
            AttemptFailure::Status(_) => "bad_status",
            AttemptFailure::Error(ForwarderError::RequestBuildError(_)) => "build_error",
            AttemptFailure::Error(ForwarderError::UpstreamTimeout(_)) => "timeout",
            AttemptFailure::Error(_) => "transport_error",
        }
    }
}

pub struct ForwardingEngine {
    client: UpstreamClient,
    regions: Arc<RegionDirectory>,
    route_cache: RouteCache,
    notifier: Arc<dyn Notifier>,
    options: EngineOptions,
}

impl ForwardingEngine {
    pub fn new(
        regions: Arc<RegionDirectory>,
        route_cache: RouteCache,
        notifier: Arc<dyn Notifier>,
        options: EngineOptions,
    ) -> Self {
        Self {
            client: build_client(),
            regions,
            route_cache,
            notifier,
            options,
        }
    }

    pub fn route_cache(&self) -> &RouteCache {
        &self.route_cache
    }

    /// Forwards a buffered request and returns the response for the client.
    ///
    /// Backend failures never surface as errors: they end in either a relayed
    /// 200 or the 500 "all proxy requests failed" response.
    pub async fn forward(&self, request: Request<Bytes>) -> Response<Bytes> {
        let start = Instant::now();
        gauge!(REQUESTS_INFLIGHT).increment(1.0);

        let (parts, body) = request.into_parts();
        let span = tracing::info_span!(
            "forward",
            method = %parts.method,
            path = %parts.uri.path(),
        );
        let (response, outcome) = self.forward_parts(&parts, body).instrument(span).await;

        gauge!(REQUESTS_INFLIGHT).decrement(1.0);
        counter!(REQUESTS, "outcome" => outcome).increment(1);
        histogram!(REQUEST_DURATION, "outcome" => outcome).record(start.elapsed().as_secs_f64());

        response
    }

    async fn forward_parts(&self, parts: &Parts, body: Bytes) -> (Response<Bytes>, &'static str) {
        let path = parts.uri.path();
        let mut requested: Option<String> = None;

        if let Some(endpoint) = self.route_cache.lookup(path) {
            match self
                .attempt(AttemptSource::Cache, &endpoint, parts, body.clone())
                .await
            {
                Ok(response) => return (response, "cached"),
                Err(failure) => {
                    if self.options.alarm_on_cached_route_failure && failure.raises_alarm() {
                        let label = self
                            .regions
                            .find_by_gateway(&endpoint)
                            .map(|region| region.label())
                            .unwrap_or(endpoint.as_str());
                        self.raise_alarm(failure_message(path, label));
                    }
                    requested = Some(endpoint);
                }
            }
        }

        for region in self.regions.all_regions() {
            let endpoint = region.gateway.prefix();
            if requested.as_deref() == Some(endpoint.as_str()) {
                continue;
            }

            match self
                .attempt(AttemptSource::Scan, &endpoint, parts, body.clone())
                .await
            {
                Ok(response) => {
                    // Nothing to fail over to with a single region
                    if self.regions.len() > 1 {
                        self.route_cache.set(path, &endpoint);
                    }
                    return (response, "scanned");
                }
                Err(failure) => {
                    if failure.raises_alarm() {
                        self.raise_alarm(failure_message(path, region.label()));
                    }
                }
            }
        }

        tracing::error!(tried_cached = requested.is_some(), "all proxy requests failed");
        (
            make_text_response(StatusCode::INTERNAL_SERVER_ERROR, ALL_FAILED_MESSAGE),
            "failed",
        )
    }

    /// Delivers an alarm on its own task; the request never waits for it.
    fn raise_alarm(&self, message: String) {
        let notifier = self.notifier.clone();
        tokio::spawn(
            async move {
                notifier.notify(&message).await;
            }
            .in_current_span(),
        );
    }

    /// One upstream call. Succeeds only on status 200.
    async fn attempt(
        &self,
        source: AttemptSource,
        endpoint: &str,
        parts: &Parts,
        body: Bytes,
    ) -> Result<Response<Bytes>, AttemptFailure> {
        let result = send_to_upstream(
            &self.client,
            endpoint,
            parts,
            body,
            self.options.attempt_timeout,
        )
        .await;

        let outcome = match result {
            Ok(response) if response.status() == StatusCode::OK => Ok(response),
            Ok(response) => Err(AttemptFailure::Status(response.status())),
            Err(e) => Err(AttemptFailure::Error(e)),
        };

        match &outcome {
            Ok(_) => {
                tracing::debug!(endpoint, source = source.as_str(), "proxy request succeeded");
                counter!(ATTEMPTS, "source" => source.as_str(), "result" => "success")
                    .increment(1);
            }
            Err(AttemptFailure::Status(status)) => {
                tracing::warn!(
                    endpoint,
                    source = source.as_str(),
                    resp_code = status.as_u16(),
                    "proxy request to cluster failed"
                );
            }
            Err(AttemptFailure::Error(e @ ForwarderError::RequestBuildError(_))) => {
                tracing::info!(endpoint, error = %e, "failed to create proxy request");
            }
            Err(AttemptFailure::Error(e)) => {
                tracing::warn!(
                    endpoint,
                    source = source.as_str(),
                    error = %e,
                    "proxy request to cluster failed"
                );
            }
        }
        if let Err(failure) = &outcome {
            counter!(ATTEMPTS, "source" => source.as_str(), "result" => failure.result_tag())
                .increment(1);
        }

        outcome
    }
}
