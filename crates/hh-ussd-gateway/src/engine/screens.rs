//! Screen and reply texts.
//!
//! Carrier screens are short: titles are clipped and every list fits a
//! feature-phone display. The `CON ` / `END ` prefix is never part of these
//! strings.

use crate::domain::{PendingVote, Proposal, ProposalId, Timestamp, VoteChoice};
use chrono::{DateTime, Utc};
use std::fmt::Write;

pub const MAIN_MENU: &str = "Welcome to HeliosHash DAO
1. View Proposals
2. Vote on Proposal
3. Check Vote Status
4. Register for DAO
5. Help
0. Exit";

pub const INVALID_MAIN_OPTION: &str = "Invalid option. Please select:
1. View Proposals
2. Vote on Proposal
3. Check Vote Status
4. Register for DAO
0. Exit";

pub const HELP: &str = "Help: Call *123# for DAO voting
- Dial *123*1# to view proposals
- Dial *123*2# to vote
- SMS votes: \"VOTE [ID] YES/NO\" to 4567
Visit: urgam.community for more info";

pub const GOODBYE: &str = "Thank you for using HeliosHash DAO!";

pub const INVALID_PROPOSAL: &str = "Invalid proposal ID. Try again or press 0 to go back.";

pub const INVALID_VOTE_CHOICE: &str = "Invalid choice. Select:\n1. Yes\n2. No\n0. Back";

pub const INVALID_CONFIRM_CHOICE: &str = "Invalid choice.\n1. Confirm\n2. Change\n0. Cancel";

pub const REGISTRATION_INTRO: &str = "HeliosHash DAO Registration
To participate you need:
1. Indian mobile number
2. Aadhaar verification
3. NFT membership tier

Current step: Phone verification
Enter 1 to continue or 0 for main menu";

pub const AADHAAR_VERIFICATION: &str = "Aadhaar Verification
Visit urgam.community/verify
OR
SMS \"VERIFY [AADHAAR]\" to 4567

1. I have completed verification
0. Back to phone verification";

pub const INVALID_REGISTRATION_CHOICE: &str =
    "Invalid choice. Enter 1 to continue or 0 to cancel.";

pub const NO_HISTORY: &str = "No voting history found.

To participate:
1. Register at urgam.community
2. Complete KYC verification
3. Purchase NFT membership

Call *123*4# to start registration";

pub const SMS_HELP: &str = "HeliosHash DAO SMS Commands:
VOTE [ID] YES/NO - Vote on proposal
REGISTER [NAME] - Start registration
PROPOSALS - List active proposals
STATUS - Check your votes
Call *123# for full menu";

pub const SMS_INVALID_VOTE: &str = "Invalid vote. Use: VOTE [ID] YES or VOTE [ID] NO";

pub const SMS_INVALID_PROPOSAL: &str = "Invalid proposal ID.";

pub const SMS_INVALID_COMMAND: &str = "Invalid command. Text HELP for instructions.";

pub const SMS_SERVICE_ERROR: &str = "Service error. Please try again.";

pub const SMS_NO_HISTORY: &str = "No voting history found. Text VOTE [ID] YES/NO to vote.";

fn clip(title: &str, max_chars: usize) -> String {
    let mut clipped: String = title.chars().take(max_chars).collect();
    clipped.push_str("...");
    clipped
}

/// `Proposals` screen with tallies and days left.
pub fn proposal_list(proposals: &[Proposal], now: Timestamp) -> String {
    let mut text = String::from("Active Proposals:\n");
    for proposal in proposals {
        let _ = writeln!(text, "{}. {}", proposal.id, clip(&proposal.title, 30));
        let _ = writeln!(
            text,
            "   For: {} Against: {}",
            proposal.votes_for, proposal.votes_against
        );
        let _ = writeln!(text, "   Days left: {}\n", proposal.days_left(now));
    }
    text.push_str("Enter proposal ID to vote, or 0 to return");
    text
}

/// `Vote` screen shown before a proposal is selected.
pub fn select_proposal(proposals: &[Proposal]) -> String {
    let lines: Vec<String> = proposals
        .iter()
        .map(|p| format!("{}. {}", p.id, clip(&p.title, 40)))
        .collect();
    format!("Select proposal to vote on:\n{}\n\nEnter proposal ID:", lines.join("\n"))
}

/// Proposal detail with the vote prompt.
pub fn proposal_detail(proposal: &Proposal) -> String {
    format!(
        "Proposal {}:\n{}\n\n{}\n\nCurrent votes:\nFor: {}\nAgainst: {}\n\n\
         Your vote:\n1. Yes (Support)\n2. No (Against)\n0. Back to proposals",
        proposal.id,
        proposal.title,
        proposal.description,
        proposal.votes_for,
        proposal.votes_against
    )
}

pub fn confirm_prompt(proposal: &Proposal, choice: VoteChoice) -> String {
    format!(
        "Confirm your vote:\nProposal: {}\nYour vote: {}\n\n1. Confirm\n2. Change vote\n0. Cancel",
        proposal.title,
        choice.label()
    )
}

/// Final USSD screen after a vote is recorded.
pub fn vote_receipt(proposal_id: ProposalId, choice: VoteChoice, short_receipt: &str) -> String {
    format!(
        "Vote confirmed!\nProposal: {}\nVote: {}\nHash: {}...\n\n\
         Thank you for participating in HeliosHash DAO governance!",
        proposal_id, choice, short_receipt
    )
}

pub fn phone_verification(phone_number: &str) -> String {
    format!(
        "Phone Verification\nYour number: {}\n\n1. Confirm this number\n2. Use different number\n0. Cancel registration",
        phone_number
    )
}

/// `d/m/yyyy`, as Indian locale short dates are written.
fn vote_date(timestamp: Timestamp) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.format("%-d/%-m/%Y").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// `Status` screen for a non-empty history (oldest first).
pub fn vote_history(votes: &[PendingVote]) -> String {
    let mut text = String::from("Your recent votes:\n\n");
    for (index, vote) in votes.iter().enumerate() {
        let _ = writeln!(text, "{}. Proposal {}: {}", index + 1, vote.proposal_id, vote.choice);
        let _ = writeln!(text, "   Status: {}", vote.status);
        let _ = writeln!(text, "   Date: {}\n", vote_date(vote.timestamp));
    }
    let _ = writeln!(text, "Total votes cast: {}", votes.len());
    text.push_str("Call *123*2# to vote on active proposals");
    text
}

pub fn sms_vote_confirmed(proposal_id: ProposalId, choice: VoteChoice, short_receipt: &str) -> String {
    format!(
        "Vote confirmed! Proposal {}: {}. Hash: {}...",
        proposal_id, choice, short_receipt
    )
}

pub fn sms_proposals(proposals: &[Proposal], now: Timestamp) -> String {
    let mut text = String::from("Active proposals:");
    for proposal in proposals {
        let _ = write!(
            text,
            "\n{}. {} (For {} / Against {}, {}d left)",
            proposal.id,
            clip(&proposal.title, 30),
            proposal.votes_for,
            proposal.votes_against,
            proposal.days_left(now)
        );
    }
    text.push_str("\nReply VOTE [ID] YES/NO");
    text
}

pub fn sms_status(votes: &[PendingVote]) -> String {
    let mut text = String::from("Your recent votes:");
    for vote in votes {
        let _ = write!(
            text,
            "\nProposal {}: {} ({}, {})",
            vote.proposal_id,
            vote.choice,
            vote.status,
            vote_date(vote.timestamp)
        );
    }
    text
}

pub fn sms_register(name: &str) -> String {
    format!(
        "Welcome {}! Dial *123*4# to verify your phone and Aadhaar and complete HeliosHash DAO registration.",
        name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{seed_proposals, VoteChannel, VoteStatus, DAY_MS};

    #[test]
    fn test_proposal_list() {
        let text = proposal_list(&seed_proposals(0), 0);
        assert!(text.starts_with("Active Proposals:\n"));
        assert!(text.contains("1. Increase Solar Panel Efficienc..."));
        assert!(text.contains("   For: 45 Against: 12\n"));
        assert!(text.contains("   Days left: 7\n"));
        assert!(text.contains("   Days left: 5\n"));
        assert!(text.ends_with("Enter proposal ID to vote, or 0 to return"));
    }

    #[test]
    fn test_days_left_follow_clock() {
        let text = proposal_list(&seed_proposals(0), 2 * DAY_MS);
        assert!(text.contains("   Days left: 5\n"));
        assert!(text.contains("   Days left: 3\n"));
    }

    #[test]
    fn test_select_proposal() {
        let text = select_proposal(&seed_proposals(0));
        assert!(text.starts_with("Select proposal to vote on:\n"));
        assert!(text.contains("2. Community Training Program..."));
        assert!(text.ends_with("Enter proposal ID:"));
    }

    #[test]
    fn test_confirm_prompt_shows_label() {
        let proposal = &seed_proposals(0)[0];
        let text = confirm_prompt(proposal, VoteChoice::Yes);
        assert!(text.contains("Your vote: Yes (Support)"));
        assert!(text.contains(&proposal.title));
    }

    #[test]
    fn test_vote_receipt() {
        let text = vote_receipt(1, VoteChoice::No, "deadbeef");
        assert!(text.contains("Proposal: 1\n"));
        assert!(text.contains("Vote: NO\n"));
        assert!(text.contains("Hash: deadbeef..."));
    }

    #[test]
    fn test_vote_history() {
        let votes = vec![PendingVote {
            receipt: "r".to_string(),
            session_id: None,
            phone_number: "+91".to_string(),
            proposal_id: 2,
            choice: VoteChoice::Yes,
            // 2025-03-04T00:00:00Z
            timestamp: 1_741_046_400_000,
            status: VoteStatus::Pending,
            channel: VoteChannel::Ussd,
        }];
        let text = vote_history(&votes);
        assert!(text.contains("1. Proposal 2: YES\n"));
        assert!(text.contains("   Status: pending\n"));
        assert!(text.contains("   Date: 4/3/2025\n"));
        assert!(text.contains("Total votes cast: 1\n"));
    }

    #[test]
    fn test_sms_vote_confirmed() {
        assert_eq!(
            sms_vote_confirmed(1, VoteChoice::Yes, "0123abcd"),
            "Vote confirmed! Proposal 1: YES. Hash: 0123abcd..."
        );
    }

    #[test]
    fn test_clip_is_char_safe() {
        assert_eq!(clip("सौर ऊर्जा", 3), "सौर...");
    }
}
