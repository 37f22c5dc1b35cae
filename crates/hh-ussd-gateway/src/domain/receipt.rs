//! Vote receipts.
//!
//! A receipt is `SHA-256(voter | proposal | choice | timestamp | salt)`.
//! The salt is a deployment secret, so only the operator can recompute a
//! receipt from its inputs; voters keep the 8-character prefix.

use super::types::{ProposalId, Timestamp, VoteChoice};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of the human-checkable receipt prefix.
pub const SHORT_RECEIPT_LEN: usize = 8;

/// Field separator inside the hashed preimage.
const SEPARATOR: u8 = b'|';

/// Secret salt mixed into every receipt.
#[derive(Clone)]
pub struct VoteSalt(Vec<u8>);

impl VoteSalt {
    pub fn new(salt: impl Into<Vec<u8>>) -> Self {
        Self(salt.into())
    }

    /// Random 32-byte salt, used when no salt is configured.
    pub fn random() -> Self {
        let bytes: [u8; 32] = rand::random();
        Self(hex::encode(bytes).into_bytes())
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for VoteSalt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VoteSalt(<redacted>)")
    }
}

/// 32-byte vote receipt hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoteHash([u8; 32]);

impl VoteHash {
    /// Compute the receipt for one vote.
    ///
    /// `voter` is the carrier session id for USSD votes and the sender's
    /// phone number for SMS votes.
    pub fn compute(
        voter: &str,
        proposal_id: ProposalId,
        choice: VoteChoice,
        timestamp: Timestamp,
        salt: &VoteSalt,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(voter.as_bytes());
        hasher.update([SEPARATOR]);
        hasher.update(proposal_id.to_string().as_bytes());
        hasher.update([SEPARATOR]);
        hasher.update(choice.as_str().as_bytes());
        hasher.update([SEPARATOR]);
        hasher.update(timestamp.to_string().as_bytes());
        hasher.update([SEPARATOR]);
        hasher.update(salt.as_bytes());
        Self(hasher.finalize().into())
    }

    /// Full lowercase hex encoding (64 chars).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 hex characters, shown to the voter.
    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(SHORT_RECEIPT_LEN);
        hex
    }
}

impl fmt::Debug for VoteHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VoteHash({})", self.short())
    }
}

impl fmt::Display for VoteHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
