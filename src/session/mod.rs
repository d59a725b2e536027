//! Per-session state
//!
//! This module contains the state owned by a single crawl session:
//! - [`CrawlMemory`] - visited identifiers, content fingerprints, and the
//!   repeat counter backing stall detection
//! - humanized pacing delays injected between page actions

mod memory;
mod pacing;

pub use memory::CrawlMemory;
pub use pacing::{humanized_delay, record_count_scale};
