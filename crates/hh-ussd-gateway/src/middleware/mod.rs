//! HTTP middleware for the gateway.
//!
//! Layer order: Request → CORS → Tracing → Timeout → BodyLimit → Handler

pub mod cors;
pub mod metrics;
pub mod timeout;
pub mod tracing;

pub use cors::create_cors_layer;
pub use metrics::GatewayMetrics;
pub use timeout::{TimeoutLayer, UssdDeadline, USSD_PATH};
pub use self::tracing::TracingLayer;
