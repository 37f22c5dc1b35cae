//! Governance engine.
//!
//! Owns the USSD menu state machine, SMS command handling, and the shared
//! vote pipeline. Every store is injected; the engine holds no globals.
//!
//! ## USSD turn
//!
//! ```text
//! text "1*2*1" ──last token──→ "1"
//!                                │
//! SessionStore::get_or_create ───┤
//!                                ▼
//!                    menu step (state, input)
//!                                │
//!          ┌─────────────────────┼──────────────────────┐
//!          ▼                     ▼                      ▼
//!   Continue(screen)     Terminate(screen)      Err → reset + END
//!                                │
//!                      session.touch + set
//! ```
//!
//! A turn reads and writes the session under a single engine-wide lock, so
//! two requests for the same session never interleave their read and write.

mod menu;
mod reaper;
pub mod screens;

pub use reaper::reaper_task;

use crate::adapters::{
    InMemoryProposalStore, InMemorySessionStore, InMemoryVoteStore, SubmissionQueue,
    SubmissionStats,
};
use crate::domain::{
    seed_proposals, GatewayError, GatewayResult, PendingVote, ProposalId, SmsCommand, Timestamp,
    UssdReply, VoteChannel, VoteChoice, VoteHash, VoteSalt, VoteStatus,
};
use crate::middleware::GatewayMetrics;
use crate::ports::{ProposalStore, SessionStore, TimeSource, VoteStore};
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Number of votes shown on the status screens.
pub const STATUS_HISTORY_LEN: usize = 3;

/// Take the input for this turn from the cumulative carrier text.
///
/// Carriers send every answer so far joined by `*`; only the last one is
/// new. Empty text is the dial-in turn.
pub fn last_input(text: &str) -> &str {
    text.rsplit('*').next().unwrap_or_default().trim()
}

/// One vote about to be recorded.
#[derive(Debug, Clone)]
pub(crate) struct Ballot<'a> {
    /// Hash identity: session id for USSD, phone number for SMS.
    pub voter: &'a str,
    pub session_id: Option<&'a str>,
    pub phone_number: &'a str,
    pub proposal_id: ProposalId,
    pub choice: VoteChoice,
    pub status: VoteStatus,
    pub channel: VoteChannel,
}

/// Liveness report served on `GET /health`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub active_sessions: usize,
    pub pending_votes: usize,
    /// Seconds since the engine was built
    pub uptime: f64,
    /// RFC 3339 UTC
    pub timestamp: String,
}

/// The USSD/SMS governance engine.
pub struct GovernanceEngine {
    sessions: Arc<dyn SessionStore>,
    votes: Arc<dyn VoteStore>,
    proposals: Arc<dyn ProposalStore>,
    clock: Arc<dyn TimeSource>,
    salt: VoteSalt,
    submissions: Option<SubmissionQueue>,
    metrics: Arc<GatewayMetrics>,
    turn_lock: Mutex<()>,
    started: Instant,
}

impl GovernanceEngine {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        votes: Arc<dyn VoteStore>,
        proposals: Arc<dyn ProposalStore>,
        clock: Arc<dyn TimeSource>,
        salt: VoteSalt,
    ) -> Self {
        Self {
            sessions,
            votes,
            proposals,
            clock,
            salt,
            submissions: None,
            metrics: Arc::new(GatewayMetrics::new()),
            turn_lock: Mutex::new(()),
            started: Instant::now(),
        }
    }

    /// Fresh in-memory stores with the launch proposals seeded at the
    /// clock's current time.
    pub fn in_memory(clock: Arc<dyn TimeSource>, salt: VoteSalt) -> Self {
        let proposals = InMemoryProposalStore::new(seed_proposals(clock.now()));
        Self::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(InMemoryVoteStore::new()),
            Arc::new(proposals),
            clock,
            salt,
        )
    }

    /// Forward recorded votes to a ledger submission queue.
    pub fn with_submissions(mut self, queue: SubmissionQueue) -> Self {
        self.submissions = Some(queue);
        self
    }

    /// Share a metrics instance with the HTTP layers.
    pub fn with_metrics(mut self, metrics: Arc<GatewayMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub fn votes(&self) -> &Arc<dyn VoteStore> {
        &self.votes
    }

    pub fn proposals(&self) -> &Arc<dyn ProposalStore> {
        &self.proposals
    }

    pub fn metrics(&self) -> &Arc<GatewayMetrics> {
        &self.metrics
    }

    /// Counters of the attached ledger submission queue, if any.
    pub fn submission_stats(&self) -> Option<&SubmissionStats> {
        self.submissions.as_ref().map(SubmissionQueue::stats)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    pub fn pending_votes(&self) -> usize {
        self.votes.len()
    }

    /// Process one USSD turn. Always produces a reply.
    pub fn handle_ussd(&self, session_id: &str, phone_number: &str, text: &str) -> UssdReply {
        self.turn(session_id, phone_number, text, None)
    }

    /// Process one USSD turn that must decide by `deadline`.
    ///
    /// If the turn lock is not acquired in time the session is left
    /// untouched. A vote is only recorded while the deadline has not passed;
    /// a turn that has recorded one always answers with its receipt.
    pub fn handle_ussd_before(
        &self,
        session_id: &str,
        phone_number: &str,
        text: &str,
        deadline: Instant,
    ) -> UssdReply {
        self.turn(session_id, phone_number, text, Some(deadline))
    }

    fn turn(
        &self,
        session_id: &str,
        phone_number: &str,
        text: &str,
        deadline: Option<Instant>,
    ) -> UssdReply {
        let _turn = match deadline {
            Some(deadline) => match self.turn_lock.try_lock_until(deadline) {
                Some(guard) => guard,
                None => {
                    warn!(session_id = %session_id, "USSD turn timed out waiting for its session");
                    self.metrics.record_timeout();
                    self.metrics.record_ussd(true, true);
                    return UssdReply::unavailable();
                }
            },
            None => self.turn_lock.lock(),
        };
        let now = self.clock.now();

        let (mut session, created) = self.sessions.get_or_create(session_id, phone_number, now);
        if created {
            self.metrics.record_session_created();
            debug!(session_id = %session_id, "New USSD session");
        }

        let input = last_input(text);
        let from = session.state.name();
        let (reply, failed) = match self.step(&mut session, input, now, deadline) {
            Ok(reply) => (reply, false),
            Err(GatewayError::DeadlineExceeded) => {
                warn!(session_id = %session_id, state = from, "USSD turn deadline passed; vote not recorded");
                self.metrics.record_timeout();
                session.reset();
                (UssdReply::unavailable(), true)
            }
            Err(e) => {
                error!(session_id = %session_id, state = from, error = %e, "USSD turn failed");
                session.reset();
                (UssdReply::unavailable(), true)
            }
        };

        debug!(
            session_id = %session_id,
            input = %input,
            from = from,
            to = session.state.name(),
            terminal = reply.is_terminal(),
            "USSD turn"
        );

        session.touch(now);
        self.sessions.set(session);
        self.metrics.record_ussd(reply.is_terminal(), failed);
        reply
    }

    /// Process one inbound SMS and return the reply body.
    pub fn handle_sms(&self, from: &str, text: &str) -> String {
        let (reply, failed) = match self.sms_reply(from, text) {
            Ok(reply) => (reply, false),
            Err(e) => {
                error!(from = %from, error = %e, "SMS command failed");
                (screens::SMS_SERVICE_ERROR.to_string(), true)
            }
        };
        self.metrics.record_sms(failed);
        reply
    }

    fn sms_reply(&self, from: &str, text: &str) -> GatewayResult<String> {
        let now = self.clock.now();
        let reply = match SmsCommand::parse(text) {
            SmsCommand::Vote {
                proposal_id,
                choice,
            } => {
                let Some(proposal_id) = proposal_id.filter(|id| self.proposals.get(*id).is_some())
                else {
                    return Ok(screens::SMS_INVALID_PROPOSAL.to_string());
                };
                let vote = self.record_vote(
                    Ballot {
                        voter: from,
                        session_id: None,
                        phone_number: from,
                        proposal_id,
                        choice,
                        status: VoteStatus::Confirmed,
                        channel: VoteChannel::Sms,
                    },
                    now,
                )?;
                screens::sms_vote_confirmed(proposal_id, choice, &short_receipt(&vote.receipt))
            }
            SmsCommand::InvalidChoice => screens::SMS_INVALID_VOTE.to_string(),
            SmsCommand::Help => screens::SMS_HELP.to_string(),
            SmsCommand::Proposals => screens::sms_proposals(&self.proposals.list(), now),
            SmsCommand::Status => {
                let votes = self.votes.recent_for_phone(from, STATUS_HISTORY_LEN);
                if votes.is_empty() {
                    screens::SMS_NO_HISTORY.to_string()
                } else {
                    screens::sms_status(&votes)
                }
            }
            SmsCommand::Register { name } => {
                info!(from = %from, name = %name, "SMS registration request");
                screens::sms_register(&name)
            }
            SmsCommand::Unrecognized => screens::SMS_INVALID_COMMAND.to_string(),
        };
        Ok(reply)
    }

    /// Record a vote: tally, receipt, then ledger queue.
    ///
    /// The tally is applied first so an unknown proposal leaves no receipt.
    pub(crate) fn record_vote(&self, ballot: Ballot<'_>, now: Timestamp) -> GatewayResult<PendingVote> {
        let hash = VoteHash::compute(
            ballot.voter,
            ballot.proposal_id,
            ballot.choice,
            now,
            &self.salt,
        );

        let proposal = self.proposals.apply_vote(ballot.proposal_id, ballot.choice)?;

        let vote = PendingVote {
            receipt: hash.to_hex(),
            session_id: ballot.session_id.map(str::to_string),
            phone_number: ballot.phone_number.to_string(),
            proposal_id: ballot.proposal_id,
            choice: ballot.choice,
            timestamp: now,
            status: ballot.status,
            channel: ballot.channel,
        };
        self.votes.insert(vote.clone());

        if let Some(queue) = &self.submissions {
            if !queue.enqueue(vote.clone()) {
                warn!(receipt = %hash, "Vote recorded but not queued for ledger submission");
            }
        }

        match ballot.channel {
            VoteChannel::Ussd => self.metrics.record_ussd_vote(),
            VoteChannel::Sms => self.metrics.record_sms_vote(),
        }

        info!(
            receipt = %hash.short(),
            proposal_id = proposal.id,
            choice = %ballot.choice,
            channel = ?ballot.channel,
            votes_for = proposal.votes_for,
            votes_against = proposal.votes_against,
            "Vote recorded"
        );
        Ok(vote)
    }

    /// Remove sessions idle longer than `max_idle`.
    pub fn sweep_sessions(&self, max_idle: Duration) -> usize {
        let removed = self.sessions.sweep(self.clock.now(), max_idle);
        if removed > 0 {
            self.metrics.record_sessions_reaped(removed);
            debug!(removed = removed, "Reaped idle USSD sessions");
        }
        removed
    }

    pub fn health(&self) -> HealthReport {
        let timestamp = i64::try_from(self.clock.now())
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Millis, true);

        HealthReport {
            status: "healthy",
            active_sessions: self.active_sessions(),
            pending_votes: self.pending_votes(),
            uptime: self.started.elapsed().as_secs_f64(),
            timestamp,
        }
    }

    fn inconsistent(session_id: &str, reason: impl Into<String>) -> GatewayError {
        GatewayError::InconsistentSession {
            session_id: session_id.to_string(),
            reason: reason.into(),
        }
    }
}

fn short_receipt(receipt: &str) -> String {
    receipt.chars().take(crate::domain::receipt::SHORT_RECEIPT_LEN).collect()
}
