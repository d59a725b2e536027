//! Per-session orchestration
//!
//! The [`Orchestrator`] owns one crawl session end to end: login with
//! retries, navigation, the observe/decide/dispatch loop, and teardown.
//! Every exit path flushes the export and closes the driver, so collected
//! records are durable no matter how the session ends.

use crate::advisory::{Action, AdvisoryService};
use crate::config::{Config, SearchEntry};
use crate::driver::PageDriver;
use crate::harvest::extract::extract_new_records;
use crate::output::flush_export;
use crate::policy::{DecisionPolicy, PageSignals};
use crate::session::{humanized_delay, CrawlMemory};
use crate::storage::{RecordStore, SessionStatus, SqliteStore};
use crate::TrawlError;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The session ran out of work: quota met, advisory stop, pagination
    /// exhausted, or the iteration ceiling reached
    Completed,

    /// Stall detection or the session runtime ceiling fired
    Stalled,

    /// Cancellation was requested
    Cancelled,
}

impl SessionOutcome {
    fn to_status(self) -> SessionStatus {
        match self {
            Self::Completed => SessionStatus::Completed,
            Self::Stalled => SessionStatus::Stalled,
            Self::Cancelled => SessionStatus::Cancelled,
        }
    }
}

/// Drives a single crawl session
pub struct Orchestrator<D, S> {
    config: Arc<Config>,
    store: Arc<Mutex<SqliteStore>>,
    policy: Arc<DecisionPolicy<S>>,
    driver: D,
    search: SearchEntry,
    config_hash: String,
    cancel: CancellationToken,
    memory: CrawlMemory,
    session_records: u64,
}

impl<D: PageDriver, S: AdvisoryService> Orchestrator<D, S> {
    /// Creates an orchestrator for one search session
    ///
    /// # Arguments
    ///
    /// * `config` - Shared harvester configuration
    /// * `store` - Shared record store
    /// * `policy` - Shared decision policy
    /// * `driver` - This session's page driver (exclusively owned)
    /// * `search` - The search this session runs
    /// * `config_hash` - Hash of the active configuration, for bookkeeping
    /// * `cancel` - Cancellation token observed at iteration boundaries
    pub fn new(
        config: Arc<Config>,
        store: Arc<Mutex<SqliteStore>>,
        policy: Arc<DecisionPolicy<S>>,
        driver: D,
        search: SearchEntry,
        config_hash: String,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            store,
            policy,
            driver,
            search,
            config_hash,
            cancel,
            memory: CrawlMemory::new(),
            session_records: 0,
        }
    }

    /// Runs the session to completion
    ///
    /// # Returns
    ///
    /// * `Ok(SessionOutcome)` - How the session ended
    /// * `Err(TrawlError)` - The session failed; its session row is marked
    ///   failed and any collected records remain persisted
    pub async fn run(mut self) -> crate::Result<SessionOutcome> {
        let session_id = {
            let mut store = self.store.lock().unwrap();
            store.create_session(&self.search.keyword, &self.search.location, &self.config_hash)?
        };
        info!(
            session_id,
            keyword = %self.search.keyword,
            location = %self.search.location,
            "Session started"
        );

        let result = self.run_session().await;

        // Export flush and driver teardown happen on every exit path
        {
            let store = self.store.lock().unwrap();
            if let Err(e) = flush_export(&*store, Path::new(&self.config.output.export_path)) {
                warn!("Final export flush failed: {}", e);
            }
        }
        self.driver.close().await;

        let status = match &result {
            Ok(outcome) => outcome.to_status(),
            Err(_) => SessionStatus::Failed,
        };
        {
            let mut store = self.store.lock().unwrap();
            store.finish_session(session_id, status, self.session_records)?;
        }

        match &result {
            Ok(outcome) => info!(
                session_id,
                records = self.session_records,
                outcome = ?outcome,
                "Session finished"
            ),
            Err(e) => warn!(session_id, "Session failed: {}", e),
        }

        result
    }

    async fn run_session(&mut self) -> crate::Result<SessionOutcome> {
        self.login_with_retries().await?;

        let query = format!("{} {}", self.search.keyword, self.search.location);
        self.driver.navigate_to_search(&query).await?;

        let harvest = self.config.harvest.clone();
        let max_runtime = Duration::from_secs(harvest.max_session_runtime_secs);

        for iteration in 0..harvest.max_iterations {
            if self.cancel.is_cancelled() {
                info!("Cancellation requested, ending session");
                return Ok(SessionOutcome::Cancelled);
            }

            let stored = {
                let store = self.store.lock().unwrap();
                store.count_records()?
            };
            if stored >= harvest.max_records {
                info!(stored, quota = harvest.max_records, "Record quota met");
                return Ok(SessionOutcome::Completed);
            }

            if self
                .memory
                .should_stop(harvest.stall_threshold, max_runtime)
            {
                info!(
                    repeats = self.memory.action_repeat_count,
                    elapsed_secs = self.memory.elapsed().as_secs(),
                    "Stall or runtime ceiling hit"
                );
                return Ok(SessionOutcome::Stalled);
            }

            // Observe the page once; the candidate list is reused on Extract
            let fingerprint = self.driver.page_fingerprint().await?;
            let defensive_signal = self.driver.defensive_signal_detected().await?;
            let candidates = self.driver.extract_candidates().await?;
            let pagination_available = self.driver.has_next_page().await?;

            let signals = PageSignals {
                record_count: stored,
                quota: harvest.max_records,
                candidate_count: candidates.len(),
                pagination_available,
                defensive_signal,
            };
            let decision = self.policy.decide(&signals, &self.memory).await;
            debug!(
                iteration,
                action = %decision.action,
                reasoning = %decision.reasoning,
                "Decision made"
            );

            let locator = self.driver.current_location();
            self.memory.update(&locator, decision.action, &fingerprint);

            match decision.action {
                Action::Stop => {
                    info!(reasoning = %decision.reasoning, "Stopping session");
                    return Ok(SessionOutcome::Completed);
                }

                Action::Extract => {
                    let inserted = {
                        let mut store = self.store.lock().unwrap();
                        extract_new_records(
                            &candidates,
                            &mut self.memory,
                            &mut *store,
                            harvest.max_records,
                        )?
                    };
                    self.session_records += inserted as u64;
                    info!(inserted, candidates = candidates.len(), "Extracted page");

                    // Each persisted batch becomes visible in the export
                    // immediately; a later crash loses nothing already stored
                    if inserted > 0 {
                        let store = self.store.lock().unwrap();
                        if let Err(e) =
                            flush_export(&*store, Path::new(&self.config.output.export_path))
                        {
                            warn!("Export flush failed: {}", e);
                        }
                    }
                }

                Action::Paginate => {
                    if !self.paginate_with_retries().await? {
                        info!("Pagination exhausted, ending session");
                        return Ok(SessionOutcome::Completed);
                    }
                }
            }

            let stored_after = {
                let store = self.store.lock().unwrap();
                store.count_records()?
            };
            tokio::time::sleep(humanized_delay(&self.config.pacing, stored_after)).await;
        }

        info!(
            max_iterations = harvest.max_iterations,
            "Iteration ceiling reached"
        );
        Ok(SessionOutcome::Completed)
    }

    /// Attempts login with doubling backoff between attempts
    async fn login_with_retries(&mut self) -> crate::Result<()> {
        let retries = self.config.harvest.login_retries;
        let mut delay = Duration::from_millis(self.config.harvest.login_retry_delay_ms);
        let mut last_error = String::new();

        for attempt in 1..=retries {
            match self.driver.login().await {
                Ok(()) => {
                    info!(attempt, "Logged in");
                    return Ok(());
                }
                Err(e) => {
                    warn!(attempt, retries, "Login attempt failed: {}", e);
                    last_error = e.to_string();
                    if attempt < retries {
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    }
                }
            }
        }

        Err(TrawlError::LoginFailed {
            attempts: retries,
            last_error,
        })
    }

    /// Attempts to advance to the next page with a fixed inter-attempt delay
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Advanced to the next page
    /// * `Ok(false)` - All attempts failed; the caller ends the session
    async fn paginate_with_retries(&mut self) -> crate::Result<bool> {
        let retries = self.config.harvest.pagination_retries;
        let delay = Duration::from_millis(self.config.harvest.pagination_retry_delay_ms);

        for attempt in 1..=retries {
            match self.driver.click_next().await {
                Ok(()) => return Ok(true),
                Err(e) => {
                    warn!(attempt, retries, "Pagination attempt failed: {}", e);
                    if attempt < retries {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Ok(false)
    }
}
