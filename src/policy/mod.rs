//! Decision policy
//!
//! Combines the advisory oracle's suggestion with deterministic local rules
//! into the action dispatched each loop iteration. The pipeline is strictly
//! ordered:
//!
//! 1. A defensive signal forces `Stop` before the oracle is consulted.
//! 2. Otherwise the oracle is queried with a situational summary.
//! 3. If no usable advice comes back, a local fallback picks the action
//!    from the page signals alone.
//! 4. An advisory `Stop` while the quota is unmet and content remains is
//!    overridden to keep the session productive.

use crate::advisory::{Action, AdvisoryService, Decision, RetryingAdvisory};
use crate::session::CrawlMemory;
use tracing::{debug, info};

/// Deterministic observations about the current page and session
#[derive(Debug, Clone)]
pub struct PageSignals {
    /// Records currently persisted in the shared store
    pub record_count: u64,

    /// Global record quota
    pub quota: u64,

    /// Candidates visible on the current page
    pub candidate_count: usize,

    /// Whether a next results page is reachable
    pub pagination_available: bool,

    /// Whether the page presents an anti-automation signal
    pub defensive_signal: bool,
}

/// Per-iteration decision pipeline
pub struct DecisionPolicy<S> {
    advisory: RetryingAdvisory<S>,
}

impl<S: AdvisoryService> DecisionPolicy<S> {
    /// Creates a policy backed by the given advisory
    pub fn new(advisory: RetryingAdvisory<S>) -> Self {
        Self { advisory }
    }

    /// Chooses the next action for one loop iteration
    ///
    /// # Arguments
    ///
    /// * `signals` - Deterministic page and session observations
    /// * `memory` - The session's crawl memory (read-only here)
    pub async fn decide(&self, signals: &PageSignals, memory: &CrawlMemory) -> Decision {
        if signals.defensive_signal {
            info!("Defensive signal detected, stopping without advisory");
            return Decision::new(Action::Stop, "defensive signal detected");
        }

        let prompt = build_prompt(signals, memory);
        debug!("Advisory prompt:\n{}", prompt);

        let decision = match self.advisory.query(&prompt).await {
            Some(decision) => decision,
            None => return local_fallback(signals),
        };

        apply_quota_override(decision, signals)
    }
}

/// Builds the situational summary sent to the oracle
fn build_prompt(signals: &PageSignals, memory: &CrawlMemory) -> String {
    format!(
        "Current state:\n\
         - Records collected: {} of {}\n\
         - Candidates visible on this page: {}\n\
         - Next page available: {}\n\
         - Last action: {}\n\
         - Same action repeated {} time(s) in a row\n\
         \n\
         Choose the next action:\n\
         1. Paginate to the next results page\n\
         2. Extract the visible results\n\
         3. Stop the session",
        signals.record_count,
        signals.quota,
        signals.candidate_count,
        if signals.pagination_available { "yes" } else { "no" },
        memory
            .last_action
            .map(|a| a.as_str())
            .unwrap_or("none"),
        memory.action_repeat_count,
    )
}

/// Picks an action from page signals alone, when the oracle gave no advice
fn local_fallback(signals: &PageSignals) -> Decision {
    if signals.candidate_count > 0 {
        Decision::advisory_unavailable()
    } else if signals.pagination_available {
        Decision::new(
            Action::Paginate,
            "advisory unavailable, advancing to next page",
        )
    } else {
        Decision::new(Action::Stop, "advisory unavailable, nothing left to do")
    }
}

/// Overrides a premature advisory `Stop` while the quota is unmet
///
/// The oracle is advisory, the quota is binding: as long as records remain
/// short of the quota and the page still offers content or a next page,
/// a `Stop` suggestion is replaced. Extraction wins over pagination when
/// candidates are visible.
fn apply_quota_override(decision: Decision, signals: &PageSignals) -> Decision {
    if decision.action != Action::Stop || signals.record_count >= signals.quota {
        return decision;
    }

    if signals.candidate_count > 0 {
        info!(
            record_count = signals.record_count,
            quota = signals.quota,
            "Overriding advisory stop: quota unmet and candidates visible"
        );
        return Decision::new(
            Action::Extract,
            format!(
                "quota unmet ({}/{}), overriding stop to extract",
                signals.record_count, signals.quota
            ),
        );
    }

    if signals.pagination_available {
        info!(
            record_count = signals.record_count,
            quota = signals.quota,
            "Overriding advisory stop: quota unmet and next page available"
        );
        return Decision::new(
            Action::Paginate,
            format!(
                "quota unmet ({}/{}), overriding stop to paginate",
                signals.record_count, signals.quota
            ),
        );
    }

    decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::AdvisoryError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Advisory stub returning a fixed action and counting invocations
    struct FixedAdvisory {
        action: Action,
        calls: Arc<AtomicU32>,
    }

    impl FixedAdvisory {
        fn new(action: Action) -> Self {
            Self {
                action,
                calls: Arc::new(AtomicU32::new(0)),
            }
        }
    }

    #[async_trait]
    impl AdvisoryService for FixedAdvisory {
        async fn advise(&self, _prompt: &str) -> Result<Decision, AdvisoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Decision::new(self.action, "stub"))
        }
    }

    /// Advisory stub that always fails
    struct BrokenAdvisory;

    #[async_trait]
    impl AdvisoryService for BrokenAdvisory {
        async fn advise(&self, _prompt: &str) -> Result<Decision, AdvisoryError> {
            Err(AdvisoryError::EmptyResponse)
        }
    }

    fn policy<S: AdvisoryService>(service: S) -> DecisionPolicy<S> {
        DecisionPolicy::new(RetryingAdvisory::new(service, 1, Duration::from_millis(1)))
    }

    fn signals(record_count: u64, quota: u64, candidates: usize, pagination: bool) -> PageSignals {
        PageSignals {
            record_count,
            quota,
            candidate_count: candidates,
            pagination_available: pagination,
            defensive_signal: false,
        }
    }

    #[tokio::test]
    async fn test_defensive_signal_skips_advisory() {
        let service = FixedAdvisory::new(Action::Extract);
        let calls = Arc::clone(&service.calls);
        let policy = policy(service);

        let mut signals = signals(0, 100, 5, true);
        signals.defensive_signal = true;

        let decision = policy.decide(&signals, &CrawlMemory::new()).await;
        assert_eq!(decision.action, Action::Stop);
        // The oracle must never have been consulted
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_advisory_answer_passes_through() {
        let policy = policy(FixedAdvisory::new(Action::Paginate));
        let decision = policy
            .decide(&signals(0, 100, 5, true), &CrawlMemory::new())
            .await;
        assert_eq!(decision.action, Action::Paginate);
    }

    #[tokio::test]
    async fn test_quota_override_prefers_extract() {
        let policy = policy(FixedAdvisory::new(Action::Stop));
        let decision = policy
            .decide(&signals(5, 200, 3, true), &CrawlMemory::new())
            .await;
        assert_eq!(decision.action, Action::Extract);
    }

    #[tokio::test]
    async fn test_quota_override_paginates_without_candidates() {
        let policy = policy(FixedAdvisory::new(Action::Stop));
        let decision = policy
            .decide(&signals(5, 200, 0, true), &CrawlMemory::new())
            .await;
        assert_eq!(decision.action, Action::Paginate);
    }

    #[tokio::test]
    async fn test_stop_honored_when_quota_met() {
        let policy = policy(FixedAdvisory::new(Action::Stop));
        let decision = policy
            .decide(&signals(200, 200, 3, true), &CrawlMemory::new())
            .await;
        assert_eq!(decision.action, Action::Stop);
    }

    #[tokio::test]
    async fn test_stop_honored_when_nothing_remains() {
        let policy = policy(FixedAdvisory::new(Action::Stop));
        let decision = policy
            .decide(&signals(5, 200, 0, false), &CrawlMemory::new())
            .await;
        assert_eq!(decision.action, Action::Stop);
    }

    #[tokio::test]
    async fn test_fallback_extracts_when_candidates_visible() {
        let policy = policy(BrokenAdvisory);
        let decision = policy
            .decide(&signals(0, 100, 4, true), &CrawlMemory::new())
            .await;
        assert_eq!(decision.action, Action::Extract);
    }

    #[tokio::test]
    async fn test_fallback_paginates_on_empty_page() {
        let policy = policy(BrokenAdvisory);
        let decision = policy
            .decide(&signals(0, 100, 0, true), &CrawlMemory::new())
            .await;
        assert_eq!(decision.action, Action::Paginate);
    }

    #[tokio::test]
    async fn test_fallback_stops_at_dead_end() {
        let policy = policy(BrokenAdvisory);
        let decision = policy
            .decide(&signals(0, 100, 0, false), &CrawlMemory::new())
            .await;
        assert_eq!(decision.action, Action::Stop);
    }

    #[test]
    fn test_prompt_carries_repeat_count() {
        let mut memory = CrawlMemory::new();
        memory.update("page-0", Action::Extract, "fp");
        memory.update("page-0", Action::Extract, "fp");

        let prompt = build_prompt(&signals(10, 100, 5, true), &memory);
        assert!(prompt.contains("10 of 100"));
        assert!(prompt.contains("Last action: extract"));
        assert!(prompt.contains("repeated 2 time(s)"));
    }
}
