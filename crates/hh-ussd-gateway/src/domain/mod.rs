//! Domain types for the USSD/SMS gateway.
//!
//! This module contains the core types, configuration, and error handling.
//! Nothing here performs I/O; stores and clocks are reached through
//! `crate::ports`.

pub mod config;
pub mod error;
pub mod receipt;
pub mod reply;
pub mod session;
pub mod sms;
pub mod types;

// Re-exports for convenience
pub use config::GatewayConfig;
pub use error::{ConfigError, GatewayError, GatewayResult};
pub use receipt::{VoteHash, VoteSalt};
pub use reply::UssdReply;
pub use session::{MenuState, RegistrationStep, Session};
pub use sms::SmsCommand;
pub use types::*;
