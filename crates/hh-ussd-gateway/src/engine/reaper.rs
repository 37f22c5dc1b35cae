//! Idle session reaper.

use super::GovernanceEngine;
use std::sync::Arc;
use std::time::Duration;

/// Periodically evict sessions idle longer than `max_idle`.
///
/// Runs until the task is aborted.
pub async fn reaper_task(engine: Arc<GovernanceEngine>, interval: Duration, max_idle: Duration) {
    let mut sweep_interval = tokio::time::interval(interval);
    sweep_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        sweep_interval.tick().await;
        engine.sweep_sessions(max_idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ManualClock;
    use crate::domain::VoteSalt;

    #[tokio::test]
    async fn test_reaper_evicts_idle_sessions() {
        let clock = Arc::new(ManualClock::new(0));
        let engine = Arc::new(GovernanceEngine::in_memory(clock.clone(), VoteSalt::new("r")));

        engine.handle_ussd("idle", "+91", "");
        clock.advance(Duration::from_secs(2 * 3600));
        engine.handle_ussd("live", "+92", "");

        let task = tokio::spawn(reaper_task(
            Arc::clone(&engine),
            Duration::from_secs(600),
            Duration::from_secs(3600),
        ));
        // first tick fires immediately
        tokio::time::sleep(Duration::from_millis(10)).await;
        task.abort();

        assert!(engine.sessions().get("idle").is_none());
        assert!(engine.sessions().get("live").is_some());
    }
}
