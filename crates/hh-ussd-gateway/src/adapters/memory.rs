//! In-memory store adapters.
//!
//! Process memory only: a restart discards every session and vote.

use crate::domain::{
    GatewayError, GatewayResult, PendingVote, Proposal, ProposalId, Session, Timestamp,
    VoteChoice,
};
use crate::ports::{ProposalStore, SessionStore, VoteStore};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Concurrent session map.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, Session>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.get(session_id).map(|s| s.value().clone())
    }

    fn get_or_create(&self, session_id: &str, phone_number: &str, now: Timestamp) -> (Session, bool) {
        let mut created = false;
        let entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                created = true;
                Session::new(session_id, phone_number, now)
            });
        (entry.value().clone(), created)
    }

    fn set(&self, session: Session) {
        self.sessions.insert(session.session_id().to_string(), session);
    }

    fn delete(&self, session_id: &str) -> Option<Session> {
        self.sessions.remove(session_id).map(|(_, s)| s)
    }

    fn sweep(&self, now: Timestamp, max_idle: Duration) -> usize {
        let mut removed = 0;

        self.sessions.retain(|id, session| {
            if session.is_idle(now, max_idle) {
                debug!(
                    session_id = %id,
                    idle_ms = now.saturating_sub(session.last_seen()),
                    "Evicting idle session"
                );
                removed += 1;
                false // Remove
            } else {
                true // Keep
            }
        });

        removed
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}

#[derive(Default)]
struct Ledger {
    /// Receipts in first-insertion order
    order: Vec<String>,
    by_receipt: HashMap<String, PendingVote>,
}

/// Insertion-ordered vote ledger.
#[derive(Default)]
pub struct InMemoryVoteStore {
    ledger: RwLock<Ledger>,
}

impl InMemoryVoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VoteStore for InMemoryVoteStore {
    fn insert(&self, vote: PendingVote) {
        let mut ledger = self.ledger.write();
        if !ledger.by_receipt.contains_key(&vote.receipt) {
            ledger.order.push(vote.receipt.clone());
        }
        ledger.by_receipt.insert(vote.receipt.clone(), vote);
    }

    fn get(&self, receipt: &str) -> Option<PendingVote> {
        self.ledger.read().by_receipt.get(receipt).cloned()
    }

    fn recent_for_phone(&self, phone_number: &str, limit: usize) -> Vec<PendingVote> {
        let ledger = self.ledger.read();
        let mut recent: Vec<PendingVote> = ledger
            .order
            .iter()
            .rev()
            .filter_map(|receipt| ledger.by_receipt.get(receipt))
            .filter(|vote| vote.phone_number == phone_number)
            .take(limit)
            .cloned()
            .collect();
        recent.reverse();
        recent
    }

    fn len(&self) -> usize {
        self.ledger.read().order.len()
    }
}

/// Proposal catalogue behind a single lock.
pub struct InMemoryProposalStore {
    proposals: RwLock<Vec<Proposal>>,
}

impl InMemoryProposalStore {
    pub fn new(mut proposals: Vec<Proposal>) -> Self {
        proposals.sort_by_key(|p| p.id);
        Self {
            proposals: RwLock::new(proposals),
        }
    }
}

impl ProposalStore for InMemoryProposalStore {
    fn list(&self) -> Vec<Proposal> {
        self.proposals.read().clone()
    }

    fn get(&self, id: ProposalId) -> Option<Proposal> {
        self.proposals.read().iter().find(|p| p.id == id).cloned()
    }

    fn apply_vote(&self, id: ProposalId, choice: VoteChoice) -> GatewayResult<Proposal> {
        let mut proposals = self.proposals.write();
        let proposal = proposals
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(GatewayError::UnknownProposal(id))?;
        proposal.record(choice);
        Ok(proposal.clone())
    }
}
