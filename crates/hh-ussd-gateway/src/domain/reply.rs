//! USSD reply type.
//!
//! The menu engine returns `Continue` / `Terminate`; the carrier `CON ` /
//! `END ` prefixes are applied only when the reply is written to the wire.

use std::fmt;

/// Fixed text returned when a turn fails for any internal reason.
pub const SERVICE_UNAVAILABLE: &str = "Service temporarily unavailable. Please try again later.";

/// Result of one USSD turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UssdReply {
    /// Show the text and wait for more input.
    Continue(String),
    /// Show the text and close the session.
    Terminate(String),
}

impl UssdReply {
    pub fn cont(text: impl Into<String>) -> Self {
        UssdReply::Continue(text.into())
    }

    pub fn end(text: impl Into<String>) -> Self {
        UssdReply::Terminate(text.into())
    }

    /// Generic failure reply.
    pub fn unavailable() -> Self {
        UssdReply::Terminate(SERVICE_UNAVAILABLE.to_string())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, UssdReply::Terminate(_))
    }

    /// Screen text without the carrier prefix.
    pub fn text(&self) -> &str {
        match self {
            UssdReply::Continue(text) | UssdReply::Terminate(text) => text,
        }
    }

    /// Carrier wire form (`CON ...` / `END ...`).
    pub fn to_wire(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for UssdReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UssdReply::Continue(text) => write!(f, "CON {}", text),
            UssdReply::Terminate(text) => write!(f, "END {}", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_prefixes() {
        assert_eq!(UssdReply::cont("Menu").to_wire(), "CON Menu");
        assert_eq!(UssdReply::end("Bye").to_wire(), "END Bye");
    }

    #[test]
    fn test_unavailable_is_terminal() {
        let reply = UssdReply::unavailable();
        assert!(reply.is_terminal());
        assert_eq!(
            reply.to_wire(),
            "END Service temporarily unavailable. Please try again later."
        );
    }
}
