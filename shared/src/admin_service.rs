use crate::http::{boxed_body, make_boxed_error_response};
use http_body_util::combinators::BoxBody;
use hyper::body::Bytes;
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

/// Liveness and readiness probes, served on the admin listener.
///
/// `/health` answers ok as long as the process runs. `/ready` answers ok once
/// `is_ready` reports true.
pub struct AdminService<F, E> {
    is_ready: F,
    _error: PhantomData<fn() -> E>,
}

impl<F, E> AdminService<F, E>
where
    F: Fn() -> bool,
{
    pub fn new(is_ready: F) -> Self {
        Self {
            is_ready,
            _error: PhantomData,
        }
    }
}

impl<F, E, B> Service<Request<B>> for AdminService<F, E>
where
    F: Fn() -> bool + Send + Sync + 'static,
    E: Send + 'static,
{
    type Response = Response<BoxBody<Bytes, E>>;
    type Error = E;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<B>) -> Self::Future {
        let is_ready = (self.is_ready)();
        let path = req.uri().path().to_owned();

        Box::pin(async move {
            let ok = || Response::new(boxed_body("ok\n"));

            let res = match path.as_str() {
                "/health" => ok(),
                "/ready" => match is_ready {
                    true => ok(),
                    false => make_boxed_error_response(StatusCode::SERVICE_UNAVAILABLE),
                },
                _ => make_boxed_error_response(StatusCode::NOT_FOUND),
            };
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use std::convert::Infallible;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    async fn get(
        service: &AdminService<impl Fn() -> bool + Send + Sync + 'static, Infallible>,
        path: &str,
    ) -> (StatusCode, Bytes) {
        let req = Request::builder().uri(path).body(()).unwrap();
        let response = service.call(req).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body)
    }

    #[tokio::test]
    async fn test_admin_probes() {
        let ready = Arc::new(AtomicBool::new(false));
        let ready_flag = ready.clone();
        let service = AdminService::new(move || ready_flag.load(Ordering::Relaxed));

        let (status, body) = get(&service, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_ref(), b"ok\n");

        let (status, _) = get(&service, "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        ready.store(true, Ordering::Relaxed);
        let (status, _) = get(&service, "/ready").await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = get(&service, "/unknown").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
