//! Harvest module: the crawl control loop
//!
//! This module contains the core of the harvester:
//! - Candidate extraction and deduplication against the shared store
//! - The per-session [`Orchestrator`] (login, observe/decide/dispatch loop)
//! - The [`Coordinator`] running all configured searches concurrently

mod coordinator;
mod extract;
mod orchestrator;

pub use coordinator::Coordinator;
pub use extract::{candidate_to_record, derive_record_id, extract_new_records};
pub use orchestrator::{Orchestrator, SessionOutcome};

use crate::advisory::{HttpAdvisoryClient, RetryingAdvisory};
use crate::config::Config;
use crate::driver::ScriptedDriver;
use crate::policy::DecisionPolicy;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs the full harvest with the configured advisory service
///
/// This is the binary's run mode: sessions are driven by the bundled
/// synthetic page driver. Library consumers with a real page automation
/// backend build a [`Coordinator`] directly and pass their own driver.
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `config_hash` - Hash of the active configuration, for bookkeeping
/// * `cancel` - Cancellation token; cancelling ends sessions at the next
///   iteration boundary
///
/// # Returns
///
/// * `Ok(u64)` - Total records in the store after all sessions
/// * `Err(TrawlError)` - Initialization failed
pub async fn harvest(
    config: Config,
    config_hash: String,
    cancel: CancellationToken,
) -> crate::Result<u64> {
    let client = HttpAdvisoryClient::from_config(&config.advisory)?;
    let advisory = RetryingAdvisory::new(
        client,
        config.advisory.max_attempts,
        Duration::from_millis(config.advisory.backoff_base_ms),
    );
    let policy = DecisionPolicy::new(advisory);

    let coordinator = Coordinator::new(config, config_hash, policy, cancel)?;
    coordinator
        .run_all(|search| ScriptedDriver::synthetic(&search.keyword, &search.location, 5, 10))
        .await
}
