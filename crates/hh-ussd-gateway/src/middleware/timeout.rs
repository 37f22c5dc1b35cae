//! Per-route request budgets.
//!
//! USSD turns are not cut off here. The layer stamps the request with a
//! [`UssdDeadline`] and the engine enforces it where the vote is committed,
//! so a carrier is never told a turn failed after its vote was recorded.
//! Other routes are raced against their budget and get `504`.

use super::metrics::GatewayMetrics;
use crate::domain::config::TimeoutConfig;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tower::{Layer, Service};
use tracing::warn;

/// Route served under the USSD turn budget.
pub const USSD_PATH: &str = "/ussd/vote";

/// Point by which a USSD turn must have decided its outcome.
#[derive(Debug, Clone, Copy)]
pub struct UssdDeadline(pub Instant);

/// Timeout layer
#[derive(Clone)]
pub struct TimeoutLayer {
    config: Arc<TimeoutConfig>,
    metrics: Arc<GatewayMetrics>,
}

impl TimeoutLayer {
    pub fn new(config: TimeoutConfig, metrics: Arc<GatewayMetrics>) -> Self {
        Self {
            config: Arc::new(config),
            metrics,
        }
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutService {
            inner,
            config: Arc::clone(&self.config),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

/// Timeout service
#[derive(Clone)]
pub struct TimeoutService<S> {
    inner: S,
    config: Arc<TimeoutConfig>,
    metrics: Arc<GatewayMetrics>,
}

impl<S> Service<Request<Body>> for TimeoutService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let metrics = Arc::clone(&self.metrics);
        let mut inner = self.inner.clone();

        if req.uri().path() == USSD_PATH {
            let deadline = Instant::now() + self.config.ussd_turn();
            req.extensions_mut().insert(UssdDeadline(deadline));
            return Box::pin(async move { inner.call(req).await });
        }

        let budget = self.config.default_timeout();
        Box::pin(async move {
            match timeout(budget, inner.call(req)).await {
                Ok(result) => result,
                Err(_) => {
                    metrics.record_timeout();
                    warn!(timeout_ms = budget.as_millis() as u64, "Request timed out");
                    Ok(timeout_response(budget))
                }
            }
        })
    }
}

fn timeout_response(budget: Duration) -> Response {
    (
        StatusCode::GATEWAY_TIMEOUT,
        [(header::CONTENT_TYPE, "text/plain")],
        format!("Request exceeded {}ms timeout", budget.as_millis()),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Extension, Router};
    use tower::ServiceExt;

    fn app(metrics: Arc<GatewayMetrics>) -> Router {
        let slow = || async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            "late"
        };
        let slow_turn = |deadline: Option<Extension<UssdDeadline>>| async move {
            tokio::time::sleep(Duration::from_millis(60)).await;
            match deadline {
                Some(Extension(UssdDeadline(at))) if at <= Instant::now() => "CON late",
                Some(_) => "CON early",
                None => "CON no deadline",
            }
        };
        Router::new()
            .route(USSD_PATH, post(slow_turn))
            .route("/sms/vote", post(slow))
            .layer(TimeoutLayer::new(
                TimeoutConfig {
                    ussd_turn_ms: 20,
                    default_ms: 20,
                },
                metrics,
            ))
    }

    async fn call(app: Router, path: &str) -> Response {
        app.oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_ussd_turn_carries_deadline_and_is_not_cut_off() {
        let metrics = Arc::new(GatewayMetrics::new());
        let response = call(app(Arc::clone(&metrics)), USSD_PATH).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(std::str::from_utf8(&body).unwrap(), "CON late");
        assert_eq!(metrics.to_json()["timeouts"], 0);
    }

    #[tokio::test]
    async fn test_other_routes_get_504() {
        let metrics = Arc::new(GatewayMetrics::new());
        let response = call(app(Arc::clone(&metrics)), "/sms/vote").await;
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(metrics.to_json()["timeouts"], 1);
    }
}
