//! Request tracing.
//!
//! One `api_request` span per request, carrying the carrier's session
//! id when the callback names one in a header.

use axum::{body::Body, http::Request, response::Response};
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::{debug, info_span, Instrument, Span};

/// Header some aggregators set with the USSD session id.
const SESSION_HEADER: &str = "x-session-id";

/// Tracing layer that creates spans for each request
#[derive(Clone, Default)]
pub struct TracingLayer;

impl TracingLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for TracingLayer {
    type Service = TracingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TracingService { inner }
    }
}

/// Tracing service
#[derive(Clone)]
pub struct TracingService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for TracingService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();
        let span = request_span(&req);
        let started = Instant::now();

        Box::pin(
            async move {
                let result = inner.call(req).await;

                match &result {
                    Ok(response) => {
                        Span::current().record("http.status_code", response.status().as_u16());
                    }
                    Err(_) => {
                        Span::current().record("http.status_code", 500u16);
                    }
                }
                debug!(latency_ms = started.elapsed().as_millis() as u64, "Request finished");

                result
            }
            .instrument(span),
        )
    }
}

fn request_span<B>(req: &Request<B>) -> Span {
    let session = req
        .headers()
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok());

    match session {
        Some(session_id) => info_span!(
            "api_request",
            http.method = %req.method(),
            http.target = %req.uri().path(),
            ussd.session_id = %session_id,
            http.status_code = tracing::field::Empty,
        ),
        None => info_span!(
            "api_request",
            http.method = %req.method(),
            http.target = %req.uri().path(),
            http.status_code = tracing::field::Empty,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_passes_response_through() {
        let app = Router::new()
            .route("/health", get(|| async { "ok" }))
            .layer(TracingLayer::new());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(SESSION_HEADER, "ATUid_1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_success());
    }
}
