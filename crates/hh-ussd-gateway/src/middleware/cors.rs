//! CORS for the dashboard origins.
//!
//! Carrier callbacks are server-to-server and ignore CORS; this only matters
//! for the web dashboard polling `/health` and `/metrics`.

use crate::domain::config::CorsConfig;
use axum::http::{HeaderName, Method};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer as TowerCorsLayer};

fn is_wildcard(values: &[String]) -> bool {
    values.iter().any(|v| v == "*")
}

/// Create CORS layer from gateway config
pub fn create_cors_layer(config: &CorsConfig) -> TowerCorsLayer {
    if !config.enabled {
        return TowerCorsLayer::very_permissive();
    }

    let mut cors = TowerCorsLayer::new();

    let any_origin = is_wildcard(&config.allowed_origins);
    if any_origin {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<_> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    let methods: Vec<Method> = config
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    cors = cors.allow_methods(methods);

    let any_header = is_wildcard(&config.allowed_headers);
    if any_header {
        cors = cors.allow_headers(Any);
    } else {
        let headers: Vec<HeaderName> = config
            .allowed_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();
        cors = cors.allow_headers(headers);
    }

    cors = cors.max_age(Duration::from_secs(config.max_age));

    // browsers reject credentials combined with a wildcard
    if config.allow_credentials && !any_origin && !any_header {
        cors = cors.allow_credentials(true);
    }

    cors
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    async fn preflight(config: &CorsConfig, origin: &str) -> axum::http::Response<Body> {
        let app = Router::new()
            .route("/health", get(|| async { "ok" }))
            .layer(create_cors_layer(config));
        app.oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/health")
                .header("origin", origin)
                .header("access-control-request-method", "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_dashboard_origin_allowed() {
        let config = CorsConfig::default();
        let response = preflight(&config, "http://localhost:3001").await;
        let headers = response.headers();
        assert_eq!(
            headers.get("access-control-allow-origin").unwrap(),
            "http://localhost:3001"
        );
        assert_eq!(
            headers.get("access-control-allow-credentials").unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn test_unknown_origin_not_echoed() {
        let config = CorsConfig::default();
        let response = preflight(&config, "http://evil.example").await;
        assert!(response.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn test_wildcard_drops_credentials() {
        let config = CorsConfig {
            allowed_origins: vec!["*".to_string()],
            ..CorsConfig::default()
        };
        let response = preflight(&config, "http://anywhere.example").await;
        let headers = response.headers();
        assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
        assert!(headers.get("access-control-allow-credentials").is_none());
    }
}
