//! Ledger submission queue.
//!
//! Votes are tallied in memory immediately. Submission to the ledger is
//! best effort and runs on a background worker, because a USSD turn has a
//! carrier budget of a few seconds and cannot wait for chain confirmation.
//!
//! ```text
//! engine ──enqueue──→ [mpsc] ──→ SubmissionWorker ──→ VoteSubmitter
//! ```

use crate::domain::{GatewayResult, PendingVote};
use crate::ports::VoteSubmitter;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Submitter that records the submission in the log only.
///
/// Stands in for the chain integration, which is outside this service.
pub struct LoggingSubmitter {
    rpc_url: String,
}

impl LoggingSubmitter {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
        }
    }
}

#[async_trait]
impl VoteSubmitter for LoggingSubmitter {
    async fn submit(&self, vote: &PendingVote) -> GatewayResult<()> {
        info!(
            receipt = %vote.receipt,
            proposal_id = vote.proposal_id,
            choice = %vote.choice,
            channel = ?vote.channel,
            rpc = %self.rpc_url,
            "Ledger submission recorded (chain integration not configured)"
        );
        Ok(())
    }
}

/// Submission counters
#[derive(Debug, Default)]
pub struct SubmissionStats {
    pub enqueued: AtomicU64,
    pub submitted: AtomicU64,
    pub failed: AtomicU64,
    pub dropped: AtomicU64,
}

/// Engine-side handle; never blocks.
#[derive(Clone)]
pub struct SubmissionQueue {
    tx: mpsc::UnboundedSender<PendingVote>,
    stats: Arc<SubmissionStats>,
}

impl SubmissionQueue {
    /// Create a queue and the worker that drains it.
    pub fn new(submitter: Arc<dyn VoteSubmitter>) -> (Self, SubmissionWorker) {
        let (tx, rx) = mpsc::unbounded_channel();
        let stats = Arc::new(SubmissionStats::default());
        (
            Self {
                tx,
                stats: Arc::clone(&stats),
            },
            SubmissionWorker {
                rx,
                submitter,
                stats,
            },
        )
    }

    /// Queue a vote for submission. Returns `false` if the worker has stopped.
    pub fn enqueue(&self, vote: PendingVote) -> bool {
        match self.tx.send(vote) {
            Ok(()) => {
                self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(err) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(receipt = %err.0.receipt, "Submission worker stopped, vote not queued");
                false
            }
        }
    }

    pub fn stats(&self) -> &SubmissionStats {
        &self.stats
    }
}

/// Background worker draining the submission queue.
pub struct SubmissionWorker {
    rx: mpsc::UnboundedReceiver<PendingVote>,
    submitter: Arc<dyn VoteSubmitter>,
    stats: Arc<SubmissionStats>,
}

impl SubmissionWorker {
    /// Run until every queue handle is dropped.
    pub async fn run(mut self) {
        while let Some(vote) = self.rx.recv().await {
            match self.submitter.submit(&vote).await {
                Ok(()) => {
                    self.stats.submitted.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    self.stats.failed.fetch_add(1, Ordering::Relaxed);
                    warn!(receipt = %vote.receipt, error = %e, "Ledger submission failed");
                }
            }
        }
        debug!("Submission queue closed");
    }
}
