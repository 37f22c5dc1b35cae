//! Gateway error types.
//!
//! None of these reach a carrier client as structured errors: the HTTP
//! boundary turns them into fixed plain-text replies and logs the cause.

use super::types::ProposalId;

/// Gateway-level errors
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(String),

    /// Proposal id not present in the proposal store
    #[error("unknown proposal: {0}")]
    UnknownProposal(ProposalId),

    /// Session state refers to data that is no longer available
    #[error("inconsistent session {session_id}: {reason}")]
    InconsistentSession { session_id: String, reason: String },

    /// The turn's deadline passed before a vote could be committed
    #[error("turn deadline passed before commit")]
    DeadlineExceeded,

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid port: {0}")]
    InvalidPort(String),

    #[error("invalid session setting: {0}")]
    InvalidSessions(String),

    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("invalid limit: {0}")]
    InvalidLimit(String),

    #[error("invalid CORS setting: {0}")]
    InvalidCors(String),

    /// Receipts would use a per-process random salt.
    #[error(
        "SECURITY: no vote salt configured. \
         Set VOTE_SALT so vote receipts can be verified across restarts."
    )]
    MissingVoteSalt,
}

/// Result type for engine operations
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GatewayError::UnknownProposal(99);
        assert_eq!(err.to_string(), "unknown proposal: 99");

        let err: GatewayError = ConfigError::InvalidPort("0".into()).into();
        assert!(err.to_string().contains("invalid port"));
    }

    #[test]
    fn test_missing_salt_message_names_variable() {
        assert!(ConfigError::MissingVoteSalt.to_string().contains("VOTE_SALT"));
    }
}
