//! Forwarding gateway: relays each request to the first region cluster that
//! answers it successfully, remembering the winner per path.

pub mod alarm;
pub mod config;
pub mod engine;
pub mod errors;
pub mod http;
pub mod metrics_defs;
pub mod route_cache;

#[cfg(test)]
mod testutils;

use crate::config::{Config, MonitorConfig};
use crate::engine::{EngineOptions, ForwardingEngine};
use crate::errors::ForwarderError;
use crate::route_cache::RouteCache;
use http_body_util::BodyExt;
use http_body_util::combinators::BoxBody;
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use shared::admin_service::AdminService;
use shared::http::{boxed_body, make_boxed_error_response, run_http_service};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Starts the admin listener, loads the region directory and then serves
/// forwarded traffic until a listener fails.
///
/// `/ready` on the admin listener reports ready only once the region
/// directory is loaded and the main listener is about to accept requests.
pub async fn run(
    config: Config,
    monitor: MonitorConfig,
    region_config: regions::config::Config,
) -> Result<(), ForwarderError> {
    config.validate()?;
    monitor.validate()?;

    let ready = Arc::new(AtomicBool::new(false));
    let ready_flag = ready.clone();
    let admin_service =
        AdminService::<_, ForwarderError>::new(move || ready_flag.load(Ordering::Relaxed));
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    let forward_task = async {
        let regions = Arc::new(regions::load(&region_config).await?);
        let engine = ForwardingEngine::new(
            regions,
            RouteCache::new(),
            alarm::get_notifier(&monitor)?,
            EngineOptions::from_config(&config, &monitor),
        );
        let service = ForwarderService::new(engine);

        ready.store(true, Ordering::Relaxed);
        run_http_service(&config.listener.host, config.listener.port, service).await
    };

    tokio::try_join!(forward_task, admin_task)?;
    Ok(())
}

pub struct ForwarderService {
    engine: Arc<ForwardingEngine>,
}

impl ForwarderService {
    pub fn new(engine: ForwardingEngine) -> Self {
        ForwarderService {
            engine: Arc::new(engine),
        }
    }
}

impl Service<Request<Incoming>> for ForwarderService {
    type Response = Response<BoxBody<Bytes, Self::Error>>;
    type Error = ForwarderError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let engine = self.engine.clone();

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            // The body is replayed to every attempt, so buffer it once
            let body = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    let e = ForwarderError::RequestBodyError(e.to_string());
                    tracing::info!(path = %parts.uri.path(), error = %e, "rejecting request");
                    return Ok(make_boxed_error_response(StatusCode::BAD_REQUEST));
                }
            };

            let response = engine.forward(Request::from_parts(parts, body)).await;
            Ok(response.map(|body| boxed_body(body)))
        })
    }
}
