//! Outbound (Driven) ports for the gateway.
//!
//! The engine owns no global state: sessions, votes, proposals, time and
//! ledger submission are all reached through these traits so tests can
//! inject fresh stores and a durable backend can replace the in-memory one.

use crate::domain::{
    GatewayResult, PendingVote, Proposal, ProposalId, Session, Timestamp, VoteChoice,
};
use async_trait::async_trait;
use std::time::Duration;

/// Session storage keyed by carrier session id.
pub trait SessionStore: Send + Sync {
    /// Look up a session.
    fn get(&self, session_id: &str) -> Option<Session>;

    /// Return the existing session or create one in `Main` at `now`.
    ///
    /// The returned flag is `true` when the session was created.
    fn get_or_create(&self, session_id: &str, phone_number: &str, now: Timestamp) -> (Session, bool);

    /// Insert or replace a session.
    fn set(&self, session: Session);

    /// Remove a session.
    fn delete(&self, session_id: &str) -> Option<Session>;

    /// Remove every session idle longer than `max_idle` at `now`.
    ///
    /// Returns the number of sessions removed.
    fn sweep(&self, now: Timestamp, max_idle: Duration) -> usize;

    /// Number of live sessions.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Append-only record of vote receipts.
pub trait VoteStore: Send + Sync {
    /// Store a vote under its receipt. Re-inserting a receipt replaces the
    /// value but keeps its original position.
    fn insert(&self, vote: PendingVote);

    /// Look up a vote by full hex receipt.
    fn get(&self, receipt: &str) -> Option<PendingVote>;

    /// Up to `limit` most recent votes cast from `phone_number`, oldest first.
    fn recent_for_phone(&self, phone_number: &str, limit: usize) -> Vec<PendingVote>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Proposal catalogue and tallies.
pub trait ProposalStore: Send + Sync {
    /// All proposals in id order.
    fn list(&self) -> Vec<Proposal>;

    fn get(&self, id: ProposalId) -> Option<Proposal>;

    /// Add one vote to a proposal's tally, returning the updated proposal.
    fn apply_vote(&self, id: ProposalId, choice: VoteChoice) -> GatewayResult<Proposal>;
}

/// Time source for consistent timestamp handling.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    /// Returns the current timestamp in epoch milliseconds.
    fn now(&self) -> Timestamp;
}

/// Ledger submission for recorded votes.
///
/// Submission happens off the request path; a USSD turn never waits on it.
#[async_trait]
pub trait VoteSubmitter: Send + Sync {
    async fn submit(&self, vote: &PendingVote) -> GatewayResult<()>;
}
