//! Output module for exports and reporting
//!
//! This module handles:
//! - The merged, atomically-written JSON export of collected records
//! - Statistics reporting over the record and session tables

mod export;
pub mod stats;

pub use export::{flush_export, merge_records, ExportError};
pub use stats::{load_statistics, print_statistics, HarvestStatistics};
