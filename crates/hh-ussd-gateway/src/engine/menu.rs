//! USSD menu transitions.

use super::{screens, Ballot, GovernanceEngine, STATUS_HISTORY_LEN};
use crate::domain::{
    GatewayError, GatewayResult, MenuState, ProposalId, RegistrationStep, Session, Timestamp,
    UssdReply, VoteChannel, VoteChoice, VoteStatus,
};
use std::time::Instant;

impl GovernanceEngine {
    /// Apply one input to the session's current state.
    pub(super) fn step(
        &self,
        session: &mut Session,
        input: &str,
        now: Timestamp,
        deadline: Option<Instant>,
    ) -> GatewayResult<UssdReply> {
        match session.state {
            MenuState::Main => self.main_menu(session, input, now),
            MenuState::Proposals => Ok(self.proposals_menu(session, input, now)),
            MenuState::Vote { selected } => Ok(self.vote_menu(session, selected, input, now)),
            MenuState::Confirm { proposal, choice } => {
                self.confirm_menu(session, proposal, choice, input, now, deadline)
            }
            MenuState::Register { step } => Ok(register_menu(session, step, input)),
            MenuState::Status => Ok(self.status_screen(session)),
        }
    }

    fn main_menu(&self, session: &mut Session, input: &str, now: Timestamp) -> GatewayResult<UssdReply> {
        let reply = match input {
            "" => UssdReply::cont(screens::MAIN_MENU),
            "1" => {
                session.state = MenuState::Proposals;
                self.proposals_menu(session, "", now)
            }
            "2" => {
                session.state = MenuState::Vote { selected: None };
                self.vote_menu(session, None, "", now)
            }
            "3" => {
                session.state = MenuState::Status;
                self.status_screen(session)
            }
            "4" => {
                session.state = MenuState::Register {
                    step: RegistrationStep::Intro,
                };
                register_menu(session, RegistrationStep::Intro, "")
            }
            "5" => UssdReply::end(screens::HELP),
            "0" => UssdReply::end(screens::GOODBYE),
            _ => UssdReply::cont(screens::INVALID_MAIN_OPTION),
        };
        Ok(reply)
    }

    fn proposals_menu(&self, session: &mut Session, input: &str, now: Timestamp) -> UssdReply {
        match input {
            "" => UssdReply::cont(screens::proposal_list(&self.proposals.list(), now)),
            "0" => {
                session.reset();
                UssdReply::cont(screens::MAIN_MENU)
            }
            _ => self
                .select(session, input)
                .unwrap_or_else(|| UssdReply::cont(screens::INVALID_PROPOSAL)),
        }
    }

    fn vote_menu(
        &self,
        session: &mut Session,
        selected: Option<ProposalId>,
        input: &str,
        now: Timestamp,
    ) -> UssdReply {
        let Some(proposal_id) = selected else {
            // no proposal chosen yet: accept an id or re-list
            return match input {
                "0" => {
                    session.state = MenuState::Proposals;
                    self.proposals_menu(session, "", now)
                }
                _ => self.select(session, input).unwrap_or_else(|| {
                    UssdReply::cont(screens::select_proposal(&self.proposals.list()))
                }),
            };
        };

        match input {
            "0" => {
                session.state = MenuState::Proposals;
                self.proposals_menu(session, "", now)
            }
            "" => match self.proposals.get(proposal_id) {
                Some(proposal) => UssdReply::cont(screens::proposal_detail(&proposal)),
                None => UssdReply::cont(screens::INVALID_VOTE_CHOICE),
            },
            _ => match choice_from_key(input) {
                Some(choice) => {
                    session.state = MenuState::Confirm {
                        proposal: proposal_id,
                        choice,
                    };
                    match self.proposals.get(proposal_id) {
                        Some(proposal) => UssdReply::cont(screens::confirm_prompt(&proposal, choice)),
                        None => UssdReply::cont(screens::INVALID_VOTE_CHOICE),
                    }
                }
                None => UssdReply::cont(screens::INVALID_VOTE_CHOICE),
            },
        }
    }

    fn confirm_menu(
        &self,
        session: &mut Session,
        proposal_id: ProposalId,
        choice: VoteChoice,
        input: &str,
        now: Timestamp,
        deadline: Option<Instant>,
    ) -> GatewayResult<UssdReply> {
        let proposal = self.proposals.get(proposal_id).ok_or_else(|| {
            Self::inconsistent(
                session.session_id(),
                format!("proposal {proposal_id} is gone"),
            )
        })?;

        let reply = match input {
            "" => UssdReply::cont(screens::confirm_prompt(&proposal, choice)),
            "1" => {
                // once the vote is recorded the turn runs to completion
                if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                    return Err(GatewayError::DeadlineExceeded);
                }
                let vote = self.record_vote(
                    Ballot {
                        voter: session.session_id(),
                        session_id: Some(session.session_id()),
                        phone_number: session.phone_number(),
                        proposal_id,
                        choice,
                        status: VoteStatus::Pending,
                        channel: VoteChannel::Ussd,
                    },
                    now,
                )?;
                session.reset();
                UssdReply::end(screens::vote_receipt(
                    proposal_id,
                    choice,
                    &super::short_receipt(&vote.receipt),
                ))
            }
            "2" => {
                session.state = MenuState::Vote {
                    selected: Some(proposal_id),
                };
                UssdReply::cont(screens::proposal_detail(&proposal))
            }
            "0" => {
                session.reset();
                UssdReply::cont(screens::MAIN_MENU)
            }
            _ => UssdReply::cont(screens::INVALID_CONFIRM_CHOICE),
        };
        Ok(reply)
    }

    /// Recent votes for the session's phone. Leaves the session in `Status`.
    fn status_screen(&self, session: &Session) -> UssdReply {
        let votes = self
            .votes
            .recent_for_phone(session.phone_number(), STATUS_HISTORY_LEN);
        if votes.is_empty() {
            UssdReply::end(screens::NO_HISTORY)
        } else {
            UssdReply::end(screens::vote_history(&votes))
        }
    }

    /// Select a proposal by typed id and show its detail screen.
    fn select(&self, session: &mut Session, input: &str) -> Option<UssdReply> {
        let id: ProposalId = input.parse().ok()?;
        let proposal = self.proposals.get(id)?;
        session.state = MenuState::Vote { selected: Some(id) };
        Some(UssdReply::cont(screens::proposal_detail(&proposal)))
    }
}

fn choice_from_key(input: &str) -> Option<VoteChoice> {
    match input {
        "1" => Some(VoteChoice::Yes),
        "2" => Some(VoteChoice::No),
        _ => None,
    }
}

fn register_menu(session: &mut Session, step: RegistrationStep, input: &str) -> UssdReply {
    match input {
        "" => UssdReply::cont(screens::REGISTRATION_INTRO),
        "1" => {
            session.state = MenuState::Register {
                step: RegistrationStep::Phone,
            };
            UssdReply::cont(screens::phone_verification(session.phone_number()))
        }
        "2" if step == RegistrationStep::Phone => {
            session.state = MenuState::Register {
                step: RegistrationStep::Aadhaar,
            };
            UssdReply::cont(screens::AADHAAR_VERIFICATION)
        }
        "2" => UssdReply::cont(screens::REGISTRATION_INTRO),
        "0" => {
            session.reset();
            UssdReply::cont(screens::MAIN_MENU)
        }
        _ => UssdReply::cont(screens::INVALID_REGISTRATION_CHOICE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ManualClock;
    use crate::domain::VoteSalt;
    use std::sync::Arc;

    const PHONE: &str = "+919876543210";

    fn engine() -> GovernanceEngine {
        GovernanceEngine::in_memory(Arc::new(ManualClock::new(0)), VoteSalt::new("menu"))
    }

    /// Drive a session through cumulative carrier texts, returning the last reply.
    fn dial(engine: &GovernanceEngine, session_id: &str, inputs: &[&str]) -> UssdReply {
        let mut text = String::new();
        let mut reply = engine.handle_ussd(session_id, PHONE, "");
        for input in inputs {
            if !text.is_empty() {
                text.push('*');
            }
            text.push_str(input);
            reply = engine.handle_ussd(session_id, PHONE, &text);
        }
        reply
    }

    fn state(engine: &GovernanceEngine, session_id: &str) -> Option<MenuState> {
        engine.sessions().get(session_id).map(|s| s.state)
    }

    #[test]
    fn test_main_menu_options() {
        let engine = engine();

        assert_eq!(dial(&engine, "a", &["5"]), UssdReply::end(screens::HELP));
        assert_eq!(dial(&engine, "b", &["0"]), UssdReply::end(screens::GOODBYE));
        assert_eq!(dial(&engine, "c", &["9"]), UssdReply::cont(screens::INVALID_MAIN_OPTION));
        assert_eq!(state(&engine, "c"), Some(MenuState::Main));
    }

    #[test]
    fn test_invalid_proposal_id() {
        let engine = engine();
        let reply = dial(&engine, "s", &["1", "99"]);
        assert_eq!(reply, UssdReply::cont(screens::INVALID_PROPOSAL));
        assert_eq!(state(&engine, "s"), Some(MenuState::Proposals));

        let reply = dial(&engine, "t", &["1", "0"]);
        assert_eq!(reply, UssdReply::cont(screens::MAIN_MENU));
    }

    #[test]
    fn test_vote_menu_selects_by_id() {
        let engine = engine();
        let reply = dial(&engine, "s", &["2"]);
        assert!(reply.text().starts_with("Select proposal to vote on:"));

        let reply = dial(&engine, "t", &["2", "1"]);
        assert!(reply.text().starts_with("Proposal 1:\nIncrease Solar Panel Efficiency Target"));
        assert_eq!(state(&engine, "t"), Some(MenuState::Vote { selected: Some(1) }));

        // unknown id re-lists
        let reply = dial(&engine, "u", &["2", "7"]);
        assert!(reply.text().starts_with("Select proposal to vote on:"));
    }

    #[test]
    fn test_vote_menu_invalid_choice_and_back() {
        let engine = engine();
        let reply = dial(&engine, "s", &["1", "2", "3"]);
        assert_eq!(reply, UssdReply::cont(screens::INVALID_VOTE_CHOICE));

        let reply = dial(&engine, "t", &["1", "2", "0"]);
        assert!(reply.text().starts_with("Active Proposals:"));
        assert_eq!(state(&engine, "t"), Some(MenuState::Proposals));
    }

    #[test]
    fn test_confirm_change_and_cancel() {
        let engine = engine();

        let reply = dial(&engine, "s", &["1", "2", "2", "2"]);
        assert!(reply.text().starts_with("Proposal 2:"));
        assert_eq!(state(&engine, "s"), Some(MenuState::Vote { selected: Some(2) }));

        let reply = dial(&engine, "t", &["1", "2", "2", "0"]);
        assert_eq!(reply, UssdReply::cont(screens::MAIN_MENU));
        assert_eq!(engine.pending_votes(), 0);

        let reply = dial(&engine, "u", &["1", "2", "1", "7"]);
        assert_eq!(reply, UssdReply::cont(screens::INVALID_CONFIRM_CHOICE));
        assert_eq!(
            state(&engine, "u"),
            Some(MenuState::Confirm {
                proposal: 2,
                choice: VoteChoice::Yes
            })
        );
    }

    #[test]
    fn test_confirm_empty_input_reshows_selection() {
        let engine = engine();
        dial(&engine, "s", &["2", "1", "1"]);

        let reply = engine.handle_ussd("s", PHONE, "2*1*1*");
        assert!(!reply.is_terminal());
        assert!(reply.text().starts_with("Confirm your vote:"));
        assert!(reply.text().contains("Your vote: Yes (Support)"));
        assert_eq!(
            state(&engine, "s"),
            Some(MenuState::Confirm {
                proposal: 1,
                choice: VoteChoice::Yes
            })
        );
        assert_eq!(engine.pending_votes(), 0);
    }

    #[test]
    fn test_ussd_no_vote_counts_against() {
        let engine = engine();
        let reply = dial(&engine, "s", &["2", "2", "2", "1"]);

        assert!(reply.is_terminal());
        assert!(reply.text().contains("Vote: NO\n"));
        let proposal = engine.proposals().get(2).map(|p| (p.votes_for, p.votes_against));
        assert_eq!(proposal, Some((38, 9)));
    }

    #[test]
    fn test_registration_flow() {
        let engine = engine();

        let reply = dial(&engine, "s", &["4"]);
        assert_eq!(reply, UssdReply::cont(screens::REGISTRATION_INTRO));

        let reply = dial(&engine, "s2", &["4", "1"]);
        assert!(reply.text().contains(&format!("Your number: {PHONE}")));

        let reply = dial(&engine, "t", &["4", "1", "2"]);
        assert_eq!(reply, UssdReply::cont(screens::AADHAAR_VERIFICATION));
        assert_eq!(
            state(&engine, "t"),
            Some(MenuState::Register {
                step: RegistrationStep::Aadhaar
            })
        );

        let reply = dial(&engine, "u", &["4", "2"]);
        assert_eq!(reply, UssdReply::cont(screens::REGISTRATION_INTRO));

        let reply = dial(&engine, "v", &["4", "8"]);
        assert_eq!(reply, UssdReply::cont(screens::INVALID_REGISTRATION_CHOICE));

        let reply = dial(&engine, "w", &["4", "1", "0"]);
        assert_eq!(reply, UssdReply::cont(screens::MAIN_MENU));
    }

    #[test]
    fn test_status_screen() {
        let engine = engine();
        assert_eq!(dial(&engine, "s", &["3"]), UssdReply::end(screens::NO_HISTORY));
        assert_eq!(state(&engine, "s"), Some(MenuState::Status));

        dial(&engine, "v", &["1", "1", "1", "1"]);
        let reply = dial(&engine, "t", &["3"]);
        assert!(reply.is_terminal());
        assert!(reply.text().contains("1. Proposal 1: YES\n   Status: pending"));
        assert!(reply.text().contains("Total votes cast: 1"));
    }

    #[test]
    fn test_status_shows_last_three() {
        let engine = engine();
        for (i, id) in ["1", "2", "1", "2"].iter().enumerate() {
            dial(&engine, &format!("v{i}"), &["2", id, "1", "1"]);
        }
        let reply = dial(&engine, "s", &["3"]);
        assert!(reply.text().contains("Total votes cast: 3"));
        assert!(reply.text().starts_with("Your recent votes:\n\n1. Proposal 2: YES"));
    }

    #[test]
    fn test_sessions_are_isolated() {
        let engine = engine();
        dial(&engine, "a", &["1", "1", "1"]);
        let reply = engine.handle_ussd("b", PHONE, "");
        assert_eq!(reply, UssdReply::cont(screens::MAIN_MENU));
        assert!(matches!(state(&engine, "a"), Some(MenuState::Confirm { .. })));
    }
}
