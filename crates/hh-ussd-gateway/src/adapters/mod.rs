//! Adapters for the gateway ports.
//!
//! In-memory stores, clocks, and the ledger submission queue.

pub mod clock;
pub mod memory;
pub mod submitter;

pub use clock::{ManualClock, SystemTimeSource};
pub use memory::{InMemoryProposalStore, InMemorySessionStore, InMemoryVoteStore};
pub use submitter::{LoggingSubmitter, SubmissionQueue, SubmissionStats, SubmissionWorker};
