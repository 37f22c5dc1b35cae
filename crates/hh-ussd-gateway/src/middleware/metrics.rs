//! Gateway counters.
//!
//! Exposed as JSON on `GET /metrics`.

use std::sync::atomic::{AtomicU64, Ordering};

/// Gateway metrics
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    // USSD turns
    pub ussd_requests: AtomicU64,
    pub ussd_terminated: AtomicU64,
    pub ussd_failures: AtomicU64,

    // SMS commands
    pub sms_requests: AtomicU64,
    pub sms_failures: AtomicU64,

    // Votes
    pub votes_ussd: AtomicU64,
    pub votes_sms: AtomicU64,

    // Sessions
    pub sessions_created: AtomicU64,
    pub sessions_reaped: AtomicU64,

    // Requests or USSD turns that overran their budget
    pub timeouts: AtomicU64,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a USSD turn
    pub fn record_ussd(&self, terminal: bool, failed: bool) {
        self.ussd_requests.fetch_add(1, Ordering::Relaxed);
        if terminal {
            self.ussd_terminated.fetch_add(1, Ordering::Relaxed);
        }
        if failed {
            self.ussd_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an SMS command
    pub fn record_sms(&self, failed: bool) {
        self.sms_requests.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.sms_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_ussd_vote(&self) {
        self.votes_ussd.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sms_vote(&self) {
        self.votes_sms.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_created(&self) {
        self.sessions_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sessions_reaped(&self, count: usize) {
        self.sessions_reaped
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Export metrics as JSON
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "ussd": {
                "requests": self.ussd_requests.load(Ordering::Relaxed),
                "terminated": self.ussd_terminated.load(Ordering::Relaxed),
                "failures": self.ussd_failures.load(Ordering::Relaxed),
            },
            "sms": {
                "requests": self.sms_requests.load(Ordering::Relaxed),
                "failures": self.sms_failures.load(Ordering::Relaxed),
            },
            "votes": {
                "ussd": self.votes_ussd.load(Ordering::Relaxed),
                "sms": self.votes_sms.load(Ordering::Relaxed),
            },
            "sessions": {
                "created": self.sessions_created.load(Ordering::Relaxed),
                "reaped": self.sessions_reaped.load(Ordering::Relaxed),
            },
            "timeouts": self.timeouts.load(Ordering::Relaxed),
        })
    }
}
