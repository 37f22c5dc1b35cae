//! SMS command grammar.
//!
//! ```text
//! VOTE <id> <YES|NO>
//! HELP
//! PROPOSALS
//! STATUS
//! REGISTER <name...>
//! ```
//!
//! Parsing is case-insensitive and stateless; proposal existence is checked
//! by the engine, not here.

use super::types::{ProposalId, VoteChoice};

/// A parsed SMS command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmsCommand {
    /// `VOTE <id> <YES|NO>`. `proposal_id` is `None` when the id token is
    /// not a number.
    Vote {
        proposal_id: Option<ProposalId>,
        choice: VoteChoice,
    },
    /// `VOTE <id> <token>` where the token is not `YES` / `NO`.
    InvalidChoice,
    Help,
    Proposals,
    Status,
    Register { name: String },
    /// Anything else, including a `VOTE` with missing arguments.
    Unrecognized,
}

impl SmsCommand {
    pub fn parse(text: &str) -> Self {
        let upper = text.to_uppercase();
        let parts: Vec<&str> = upper.split_whitespace().collect();

        match parts.as_slice() {
            ["VOTE", id, choice, ..] => match VoteChoice::from_token(choice) {
                Some(choice) => SmsCommand::Vote {
                    proposal_id: id.parse().ok(),
                    choice,
                },
                None => SmsCommand::InvalidChoice,
            },
            ["HELP", ..] => SmsCommand::Help,
            ["PROPOSALS", ..] => SmsCommand::Proposals,
            ["STATUS", ..] => SmsCommand::Status,
            ["REGISTER", name @ ..] if !name.is_empty() => {
                // keep the caller's original casing for the name
                let name = text
                    .split_whitespace()
                    .skip(1)
                    .collect::<Vec<_>>()
                    .join(" ");
                SmsCommand::Register { name }
            }
            _ => SmsCommand::Unrecognized,
        }
    }
}
