//! Merged JSON export
//!
//! The export file is the operator-visible artifact: a JSON array of all
//! collected records, regenerated after every successfully persisted batch
//! so a crash never loses more than the in-flight batch.
//!
//! Writes are atomic (temp file + rename) and merging: entries already in
//! the file are preserved, store records are added by URL. A missing or
//! unreadable existing file is treated as empty rather than fatal, so a
//! half-written artifact from a previous crash cannot wedge the harvest.

use crate::storage::{Record, RecordStore, StorageError};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while writing the export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Export I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Export storage read failed: {0}")]
    Storage(#[from] StorageError),
}

/// Merges stored records into an existing export set
///
/// Existing entries win: a record whose URL is already present is skipped.
///
/// # Arguments
///
/// * `existing` - Records currently in the export file
/// * `fresh` - Records read from the store
///
/// # Returns
///
/// The merged record list, existing entries first
pub fn merge_records(existing: Vec<Record>, fresh: Vec<Record>) -> Vec<Record> {
    let mut seen: HashSet<String> = existing.iter().map(|r| r.url.clone()).collect();
    let mut merged = existing;

    for record in fresh {
        if seen.insert(record.url.clone()) {
            merged.push(record);
        }
    }

    merged
}

/// Rewrites the export file from the store's current contents
///
/// # Arguments
///
/// * `store` - The record store to read from
/// * `path` - Destination path for the JSON export
///
/// # Returns
///
/// * `Ok(usize)` - Total number of records in the written export
/// * `Err(ExportError)` - Failed to read the store or write the file
pub fn flush_export<S: RecordStore>(store: &S, path: &Path) -> Result<usize, ExportError> {
    let existing = read_existing(path);
    let fresh = store.list_records()?;
    let merged = merge_records(existing, fresh);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(&merged)?;
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;

    debug!(records = merged.len(), path = %path.display(), "Export flushed");
    Ok(merged.len())
}

/// Reads the current export file, tolerating absence and corruption
fn read_existing(path: &Path) -> Vec<Record> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!("Could not read existing export {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    match serde_json::from_str(&contents) {
        Ok(records) => records,
        Err(e) => {
            warn!(
                "Existing export {} is not valid JSON, starting fresh: {}",
                path.display(),
                e
            );
            Vec::new()
        }
    }
}
