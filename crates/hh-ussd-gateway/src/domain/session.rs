//! USSD session state.
//!
//! Each menu state carries exactly the scratch data it owns, so a value
//! written by one screen cannot be read by another after a reset.
//!
//! ```text
//! [Main] ─1→ [Proposals] ─id→ [Vote{Some}] ─1/2→ [Confirm] ─1→ commit → [Main] (END)
//!   │ ─2→ [Vote{None}] ─id→ [Vote{Some}]
//!   │ ─3→ [Status] (END)
//!   │ ─4→ [Register{Intro}] ─1→ [Register{Phone}] ─2→ [Register{Aadhaar}]
//!   └ ─5/0→ END
//! ```

use super::types::{ProposalId, Timestamp, VoteChoice};
use std::time::Duration;

/// Step marker for the registration flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStep {
    Intro,
    Phone,
    Aadhaar,
}

/// Menu state with its state-local data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    Main,
    Proposals,
    Vote { selected: Option<ProposalId> },
    Confirm { proposal: ProposalId, choice: VoteChoice },
    Register { step: RegistrationStep },
    Status,
}

impl MenuState {
    /// Stable name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            MenuState::Main => "main",
            MenuState::Proposals => "proposals",
            MenuState::Vote { .. } => "vote",
            MenuState::Confirm { .. } => "confirm",
            MenuState::Register { .. } => "register",
            MenuState::Status => "status",
        }
    }
}

/// A carrier session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    session_id: String,
    phone_number: String,
    pub state: MenuState,
    last_seen: Timestamp,
}

impl Session {
    pub fn new(session_id: impl Into<String>, phone_number: impl Into<String>, now: Timestamp) -> Self {
        Self {
            session_id: session_id.into(),
            phone_number: phone_number.into(),
            state: MenuState::Main,
            last_seen: now,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn last_seen(&self) -> Timestamp {
        self.last_seen
    }

    /// Mark the session as active at `now`.
    pub fn touch(&mut self, now: Timestamp) {
        self.last_seen = now;
    }

    /// Back to the main menu, dropping any in-progress selection.
    pub fn reset(&mut self) {
        self.state = MenuState::Main;
    }

    /// True when the session was last seen more than `max_idle` before `now`.
    pub fn is_idle(&self, now: Timestamp, max_idle: Duration) -> bool {
        let max_idle_ms = u64::try_from(max_idle.as_millis()).unwrap_or(u64::MAX);
        self.last_seen < now.saturating_sub(max_idle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR_MS: u64 = 60 * 60 * 1000;

    #[test]
    fn test_new_session_starts_in_main() {
        let session = Session::new("s1", "+911234", 42);
        assert_eq!(session.state, MenuState::Main);
        assert_eq!(session.last_seen(), 42);
        assert_eq!(session.session_id(), "s1");
        assert_eq!(session.phone_number(), "+911234");
    }

    #[test]
    fn test_reset_drops_selection() {
        let mut session = Session::new("s1", "+911234", 0);
        session.state = MenuState::Confirm {
            proposal: 1,
            choice: VoteChoice::Yes,
        };
        session.reset();
        assert_eq!(session.state, MenuState::Main);
    }

    #[test]
    fn test_idle_boundary() {
        let now = 10 * HOUR_MS;
        let hour = Duration::from_secs(3600);

        assert!(Session::new("a", "p", now - 2 * HOUR_MS).is_idle(now, hour));
        assert!(!Session::new("b", "p", now - HOUR_MS / 2).is_idle(now, hour));
        // exactly at the boundary is still live
        assert!(!Session::new("c", "p", now - HOUR_MS).is_idle(now, hour));
    }

    #[test]
    fn test_touch_refreshes() {
        let now = 10 * HOUR_MS;
        let mut session = Session::new("a", "p", 0);
        assert!(session.is_idle(now, Duration::from_secs(3600)));
        session.touch(now);
        assert!(!session.is_idle(now, Duration::from_secs(3600)));
    }
}
