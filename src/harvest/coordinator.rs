//! Multi-session coordination
//!
//! Runs every configured search as its own session against one shared store,
//! bounded by a concurrency limit and a global record quota. Session
//! failures are logged and isolated; one broken session never takes down
//! the harvest.

use crate::advisory::AdvisoryService;
use crate::config::{Config, SearchEntry};
use crate::driver::PageDriver;
use crate::harvest::orchestrator::Orchestrator;
use crate::policy::DecisionPolicy;
use crate::storage::{open_store, RecordStore, SqliteStore};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Coordinates concurrent sessions over one shared store
pub struct Coordinator<S> {
    config: Arc<Config>,
    store: Arc<Mutex<SqliteStore>>,
    policy: Arc<DecisionPolicy<S>>,
    config_hash: String,
    cancel: CancellationToken,
}

impl<S: AdvisoryService + 'static> Coordinator<S> {
    /// Creates a coordinator, opening the configured database
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration
    /// * `config_hash` - Hash of the active configuration, for bookkeeping
    /// * `policy` - The decision policy shared by all sessions
    /// * `cancel` - Cancellation token observed at iteration boundaries
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully initialized
    /// * `Err(TrawlError)` - Failed to open storage
    pub fn new(
        config: Config,
        config_hash: String,
        policy: DecisionPolicy<S>,
        cancel: CancellationToken,
    ) -> crate::Result<Self> {
        let store = open_store(Path::new(&config.output.database_path))?;
        Ok(Self::with_store(config, config_hash, policy, cancel, store))
    }

    /// Creates a coordinator over an existing store (used by tests)
    pub fn with_store(
        config: Config,
        config_hash: String,
        policy: DecisionPolicy<S>,
        cancel: CancellationToken,
        store: SqliteStore,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(Mutex::new(store)),
            policy: Arc::new(policy),
            config_hash,
            cancel,
        }
    }

    /// Runs all configured searches to completion
    ///
    /// Sessions are spawned per search entry and admitted by a semaphore
    /// sized to the configured concurrency bound. Before starting, each
    /// session re-checks the global quota and is skipped if it is already
    /// met. Per-session failures are logged, not propagated.
    ///
    /// # Arguments
    ///
    /// * `make_driver` - Builds the page driver for each search
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - Total records in the store after all sessions
    pub async fn run_all<D, F>(&self, mut make_driver: F) -> crate::Result<u64>
    where
        D: PageDriver + 'static,
        F: FnMut(&SearchEntry) -> D,
    {
        let quota = self.config.harvest.max_records;
        let semaphore = Arc::new(Semaphore::new(
            self.config.harvest.max_concurrent_sessions as usize,
        ));
        info!(
            searches = self.config.searches.len(),
            concurrency = self.config.harvest.max_concurrent_sessions,
            quota,
            "Starting harvest"
        );

        let mut handles = Vec::new();
        for search in &self.config.searches {
            let driver = make_driver(search);
            let semaphore = Arc::clone(&semaphore);
            let config = Arc::clone(&self.config);
            let store = Arc::clone(&self.store);
            let policy = Arc::clone(&self.policy);
            let config_hash = self.config_hash.clone();
            let cancel = self.cancel.clone();
            let search = search.clone();

            handles.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };

                if cancel.is_cancelled() {
                    info!(keyword = %search.keyword, "Skipping session, cancelled");
                    return;
                }

                // Quota may have been met while this session waited its turn
                let stored = match store.lock().unwrap().count_records() {
                    Ok(count) => count,
                    Err(e) => {
                        error!("Could not read record count: {}", e);
                        return;
                    }
                };
                if stored >= quota {
                    info!(
                        keyword = %search.keyword,
                        stored,
                        quota,
                        "Skipping session, quota already met"
                    );
                    return;
                }

                let orchestrator = Orchestrator::new(
                    config,
                    store,
                    policy,
                    driver,
                    search.clone(),
                    config_hash,
                    cancel,
                );
                match orchestrator.run().await {
                    Ok(outcome) => {
                        info!(keyword = %search.keyword, outcome = ?outcome, "Session done")
                    }
                    Err(e) => error!(keyword = %search.keyword, "Session failed: {}", e),
                }
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Session task panicked: {}", e);
            }
        }

        let total = {
            let store = self.store.lock().unwrap();
            store.count_records()?
        };
        info!(total, "Harvest finished");
        Ok(total)
    }
}
