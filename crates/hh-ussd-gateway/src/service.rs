//! Gateway service: HTTP surface, background tasks, and shutdown.

use crate::adapters::{LoggingSubmitter, SubmissionQueue, SubmissionWorker, SystemTimeSource};
use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::domain::{UssdReply, VoteSalt};
use crate::engine::{reaper_task, screens, GovernanceEngine};
use crate::extract::{CarrierPayload, PayloadRejection, SmsRequest, UssdRequest};
use crate::middleware::{
    create_cors_layer, GatewayMetrics, TimeoutLayer, TracingLayer, UssdDeadline, USSD_PATH,
};
use crate::ports::VoteSubmitter;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, error, info, warn};

/// How long shutdown waits for queued ledger submissions.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// USSD/SMS gateway service
pub struct UssdGatewayService {
    config: GatewayConfig,
    engine: Arc<GovernanceEngine>,
    metrics: Arc<GatewayMetrics>,
    worker: SubmissionWorker,
}

impl UssdGatewayService {
    /// Create the service with the logging ledger submitter.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let submitter = Arc::new(LoggingSubmitter::new(config.chain.polygon_rpc.clone()));
        Self::with_submitter(config, submitter)
    }

    /// Create the service with a custom ledger submitter.
    pub fn with_submitter(
        config: GatewayConfig,
        submitter: Arc<dyn VoteSubmitter>,
    ) -> Result<Self, GatewayError> {
        config.validate()?;

        let salt = match &config.votes.salt {
            Some(salt) => VoteSalt::new(salt.as_bytes()),
            None => {
                warn!(
                    "VOTE_SALT not set; using a random per-process salt. \
                     Receipts will not be reproducible after a restart"
                );
                VoteSalt::random()
            }
        };

        let metrics = Arc::new(GatewayMetrics::new());
        let (queue, worker) = SubmissionQueue::new(submitter);
        let engine = GovernanceEngine::in_memory(Arc::new(SystemTimeSource), salt)
            .with_submissions(queue)
            .with_metrics(Arc::clone(&metrics));

        Ok(Self {
            config,
            engine: Arc::new(engine),
            metrics,
            worker,
        })
    }

    pub fn engine(&self) -> Arc<GovernanceEngine> {
        Arc::clone(&self.engine)
    }

    pub fn metrics(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Serve until `shutdown` resolves, then drain background work.
    pub async fn run<F>(self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Self {
            config,
            engine,
            metrics: _,
            worker,
        } = self;

        let addr = config.http_addr();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{addr}: {e}")))?;

        let worker_handle = tokio::spawn(worker.run());
        let reaper_handle = tokio::spawn(reaper_task(
            Arc::clone(&engine),
            config.sessions.sweep_interval(),
            config.sessions.max_idle(),
        ));

        info!(
            addr = %addr,
            session_ttl_secs = config.sessions.max_idle_secs,
            sweep_secs = config.sessions.sweep_interval_secs,
            "USSD gateway listening"
        );

        let router = build_router(Arc::clone(&engine), &config);
        let served = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await;

        reaper_handle.abort();
        let _ = reaper_handle.await;

        // the worker exits once the engine's queue handle is dropped
        drop(engine);
        if tokio::time::timeout(DRAIN_TIMEOUT, worker_handle).await.is_err() {
            warn!("Ledger submission queue not drained before shutdown");
        }

        served.map_err(|e| GatewayError::Internal(format!("server error: {e}")))?;
        info!("USSD gateway stopped");
        Ok(())
    }
}

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    engine: Arc<GovernanceEngine>,
}

/// Build the HTTP router with the full middleware stack.
///
/// Layer order (outermost first): CORS → Tracing → Timeout → BodyLimit.
pub fn build_router(engine: Arc<GovernanceEngine>, config: &GatewayConfig) -> Router {
    let metrics = Arc::clone(engine.metrics());
    let state = AppState { engine };

    Router::new()
        .route(USSD_PATH, post(handle_ussd))
        .route("/sms/vote", post(handle_sms))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_report))
        .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
        .layer(TimeoutLayer::new(config.timeouts.clone(), metrics))
        .layer(TracingLayer::new())
        .layer(create_cors_layer(&config.cors))
        .with_state(state)
}

fn plain_text(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "text/plain")], body).into_response()
}

/// `POST /ussd/vote`: always `200 text/plain` with a `CON`/`END` body.
async fn handle_ussd(
    State(state): State<AppState>,
    deadline: Option<Extension<UssdDeadline>>,
    payload: Result<CarrierPayload<UssdRequest>, PayloadRejection>,
) -> Response {
    let reply = match payload {
        Ok(CarrierPayload(req)) => {
            debug!(
                session_id = %req.session_id,
                service_code = req.service_code.as_deref().unwrap_or("-"),
                "USSD callback"
            );
            let engine = Arc::clone(&state.engine);
            let turn = tokio::task::spawn_blocking(move || match deadline {
                Some(Extension(UssdDeadline(deadline))) => engine.handle_ussd_before(
                    &req.session_id,
                    &req.phone_number,
                    &req.text,
                    deadline,
                ),
                None => engine.handle_ussd(&req.session_id, &req.phone_number, &req.text),
            })
            .await;
            match turn {
                Ok(reply) => reply,
                Err(e) => {
                    error!(error = %e, "USSD turn aborted");
                    state.engine.metrics().record_ussd(true, true);
                    UssdReply::unavailable()
                }
            }
        }
        Err(PayloadRejection(reason)) => {
            warn!(reason = %reason, "Malformed USSD callback");
            state.engine.metrics().record_ussd(true, true);
            UssdReply::unavailable()
        }
    };

    plain_text(StatusCode::OK, reply.to_wire())
}

/// `POST /sms/vote`
async fn handle_sms(
    State(state): State<AppState>,
    payload: Result<CarrierPayload<SmsRequest>, PayloadRejection>,
) -> Response {
    let req = match payload {
        Ok(CarrierPayload(req)) => req,
        Err(rejection) => {
            warn!(reason = %rejection.0, "Malformed SMS callback");
            state.engine.metrics().record_sms(true);
            return rejection.into_response();
        }
    };

    let engine = Arc::clone(&state.engine);
    match tokio::task::spawn_blocking(move || engine.handle_sms(&req.from, &req.text)).await {
        Ok(reply) => plain_text(StatusCode::OK, reply),
        Err(e) => {
            error!(error = %e, "SMS command aborted");
            state.engine.metrics().record_sms(true);
            plain_text(
                StatusCode::INTERNAL_SERVER_ERROR,
                screens::SMS_SERVICE_ERROR.to_string(),
            )
        }
    }
}

/// `GET /health`
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.engine.health())
}

/// `GET /metrics`
async fn metrics_report(State(state): State<AppState>) -> impl IntoResponse {
    let mut report = state.engine.metrics().to_json();
    report["activeSessions"] = state.engine.active_sessions().into();
    report["pendingVotes"] = state.engine.pending_votes().into();
    if let Some(stats) = state.engine.submission_stats() {
        report["submissions"] = serde_json::json!({
            "enqueued": stats.enqueued.load(Ordering::Relaxed),
            "submitted": stats.submitted.load(Ordering::Relaxed),
            "failed": stats.failed.load(Ordering::Relaxed),
            "dropped": stats.dropped.load(Ordering::Relaxed),
        });
    }
    Json(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConfigError;

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = GatewayConfig::default();
        config.http.port = 0;
        let result = UssdGatewayService::new(config);
        assert!(matches!(
            result,
            Err(GatewayError::Config(ConfigError::InvalidPort(_)))
        ));
    }
}
