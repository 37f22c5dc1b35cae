//! Core governance types shared by the USSD and SMS channels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Proposal identifier (small, human-dialable integer)
pub type ProposalId = u32;

/// Epoch milliseconds
pub type Timestamp = u64;

/// One day in milliseconds
pub const DAY_MS: u64 = 24 * 60 * 60 * 1000;

/// A voter's choice on a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoteChoice {
    Yes,
    No,
}

impl VoteChoice {
    /// Wire token used in receipts and SMS replies.
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteChoice::Yes => "YES",
            VoteChoice::No => "NO",
        }
    }

    /// Label shown on USSD screens.
    pub fn label(&self) -> &'static str {
        match self {
            VoteChoice::Yes => "Yes (Support)",
            VoteChoice::No => "No (Against)",
        }
    }

    /// Parse an upper-cased `YES` / `NO` token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "YES" => Some(VoteChoice::Yes),
            "NO" => Some(VoteChoice::No),
            _ => None,
        }
    }
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a locally recorded vote.
///
/// USSD votes are recorded as `Pending`; SMS votes skip the confirmation
/// screen and are recorded as `Confirmed`. Nothing currently moves a vote
/// from `Pending` to `Confirmed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteStatus {
    Pending,
    Confirmed,
}

impl fmt::Display for VoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteStatus::Pending => f.write_str("pending"),
            VoteStatus::Confirmed => f.write_str("confirmed"),
        }
    }
}

/// Channel a vote arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChannel {
    Ussd,
    Sms,
}

/// A governance proposal with its in-memory tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: ProposalId,
    pub title: String,
    pub description: String,
    pub votes_for: u64,
    pub votes_against: u64,
    /// Informational only; expired proposals remain votable.
    pub end_time: Timestamp,
}

impl Proposal {
    /// Apply one vote to the tally.
    pub fn record(&mut self, choice: VoteChoice) {
        match choice {
            VoteChoice::Yes => self.votes_for += 1,
            VoteChoice::No => self.votes_against += 1,
        }
    }

    /// Whole days until `end_time`, rounded up. Negative once expired.
    pub fn days_left(&self, now: Timestamp) -> i64 {
        let remaining = self.end_time as i128 - now as i128;
        let day = DAY_MS as i128;
        // ceil for both signs
        let days = if remaining > 0 {
            (remaining + day - 1) / day
        } else {
            remaining / day
        };
        days as i64
    }
}

/// Seed proposals installed at startup, ending relative to `now`.
pub fn seed_proposals(now: Timestamp) -> Vec<Proposal> {
    vec![
        Proposal {
            id: 1,
            title: "Increase Solar Panel Efficiency Target".to_string(),
            description: "Proposal to upgrade solar panels for 15% efficiency gain".to_string(),
            votes_for: 45,
            votes_against: 12,
            end_time: now + 7 * DAY_MS,
        },
        Proposal {
            id: 2,
            title: "Community Training Program".to_string(),
            description: "Fund training program for local technicians".to_string(),
            votes_for: 38,
            votes_against: 8,
            end_time: now + 5 * DAY_MS,
        },
    ]
}

/// A locally recorded vote receipt awaiting ledger submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingVote {
    /// Hex receipt hash (store key)
    pub receipt: String,
    /// Carrier session id; `None` for SMS votes
    pub session_id: Option<String>,
    pub phone_number: String,
    pub proposal_id: ProposalId,
    pub choice: VoteChoice,
    pub timestamp: Timestamp,
    pub status: VoteStatus,
    pub channel: VoteChannel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_yes_and_no() {
        let mut proposal = seed_proposals(0).remove(0);
        proposal.record(VoteChoice::Yes);
        assert_eq!(proposal.votes_for, 46);
        assert_eq!(proposal.votes_against, 12);

        proposal.record(VoteChoice::No);
        assert_eq!(proposal.votes_for, 46);
        assert_eq!(proposal.votes_against, 13);
    }

    #[test]
    fn test_days_left_rounds_up() {
        let proposal = seed_proposals(0).remove(0);
        assert_eq!(proposal.days_left(0), 7);
        assert_eq!(proposal.days_left(1), 7);
        assert_eq!(proposal.days_left(DAY_MS), 6);
        assert_eq!(proposal.days_left(7 * DAY_MS), 0);
        assert_eq!(proposal.days_left(8 * DAY_MS), -1);
    }

    #[test]
    fn test_choice_tokens() {
        assert_eq!(VoteChoice::from_token("YES"), Some(VoteChoice::Yes));
        assert_eq!(VoteChoice::from_token("NO"), Some(VoteChoice::No));
        assert_eq!(VoteChoice::from_token("yes"), None);
        assert_eq!(VoteChoice::Yes.to_string(), "YES");
    }

    #[test]
    fn test_vote_serialization() {
        let json = serde_json::to_value(VoteStatus::Pending).unwrap();
        assert_eq!(json, "pending");
        let json = serde_json::to_value(VoteChoice::No).unwrap();
        assert_eq!(json, "NO");
    }
}
