// Allow missing docs for internal items in development
#![allow(missing_docs)]

//! HeliosHash USSD/SMS gateway - feature-phone access to DAO proposals and
//! voting.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        USSD / SMS GATEWAY                           │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  POST /ussd/vote   POST /sms/vote   GET /health   GET /metrics      │
//! │         │                │                                          │
//! │  ┌──────┴────────────────┴──────────────────────┐                   │
//! │  │              Middleware Stack                 │                   │
//! │  │     CORS → Tracing → Timeout → BodyLimit      │                   │
//! │  └──────────────────────┬────────────────────────┘                   │
//! │                         │                                           │
//! │  ┌──────────────────────┴────────────────────────┐                  │
//! │  │              GovernanceEngine                  │                  │
//! │  │   menu state machine · SMS parser · receipts   │                  │
//! │  └───┬─────────────┬─────────────┬─────────────┬──┘                  │
//! │      ▼             ▼             ▼             ▼                     │
//! │  SessionStore  VoteStore  ProposalStore  SubmissionQueue ──→ ledger  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use hh_ussd_gateway::{GatewayConfig, UssdGatewayService};
//!
//! let config = GatewayConfig::from_env();
//! let service = UssdGatewayService::new(config)?;
//! service.run(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! ```
//!
//! # Wire format
//!
//! USSD replies are `text/plain` and always start with `CON ` (session
//! continues) or `END ` (session closes). Carrier callbacks are accepted as
//! JSON or form-encoded bodies.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod engine;
pub mod extract;
pub mod middleware;
pub mod ports;
pub mod service;

// Re-exports for public API
pub use domain::config::GatewayConfig;
pub use domain::error::{ConfigError, GatewayError, GatewayResult};
pub use domain::types::*;
pub use domain::{MenuState, Session, UssdReply, VoteHash, VoteSalt};
pub use engine::GovernanceEngine;
pub use middleware::GatewayMetrics;
pub use service::{build_router, UssdGatewayService};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
