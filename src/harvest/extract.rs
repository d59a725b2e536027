//! Candidate extraction and deduplication
//!
//! Converts raw page candidates into records and persists the ones that are
//! new to both this session and the shared store. Deduplication happens at
//! three layers: session memory (cheap, in-process), the store's existence
//! check, and the insert-or-ignore write itself.

use crate::driver::RawCandidate;
use crate::session::CrawlMemory;
use crate::storage::{Record, RecordStore, StorageResult};
use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::debug;
use url::Url;

/// Derives a stable record identifier from a candidate URL
///
/// The last non-empty path segment is the natural slug for results URLs.
/// URLs without one (opaque, query-only, unparseable) fall back to a hash
/// prefix of the full URL string, so every candidate still gets a stable id.
pub fn derive_record_id(url: &str) -> String {
    if let Ok(parsed) = Url::parse(url) {
        if let Some(segments) = parsed.path_segments() {
            if let Some(slug) = segments.filter(|s| !s.is_empty()).last() {
                return slug.to_string();
            }
        }
    }

    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())[..16].to_string()
}

/// Converts a raw candidate into a record
///
/// # Returns
///
/// * `Some(Record)` - A well-formed record
/// * `None` - The candidate is malformed (blank URL or name) and is skipped
pub fn candidate_to_record(candidate: &RawCandidate) -> Option<Record> {
    if candidate.url.trim().is_empty() || candidate.display_name.trim().is_empty() {
        return None;
    }

    Some(Record {
        id: derive_record_id(&candidate.url),
        name: candidate.display_name.trim().to_string(),
        url: candidate.url.clone(),
        title: candidate.title.clone(),
        company: candidate.company.clone(),
        location: candidate.location.clone(),
        connection_degree: candidate.connection_degree.clone(),
        collected_at: Utc::now().to_rfc3339(),
    })
}

/// Persists the new records from one page of candidates
///
/// Malformed candidates are skipped with a debug log. Candidates already
/// seen this session or already present in the store are skipped and marked
/// visited. Selection stops early once the batch would push the store past
/// the quota.
///
/// # Arguments
///
/// * `candidates` - Raw candidates extracted from the current page
/// * `memory` - This session's crawl memory
/// * `store` - The shared record store
/// * `quota` - Global record quota
///
/// # Returns
///
/// * `Ok(usize)` - Number of records actually inserted
pub fn extract_new_records<S: RecordStore>(
    candidates: &[RawCandidate],
    memory: &mut CrawlMemory,
    store: &mut S,
    quota: u64,
) -> StorageResult<usize> {
    let stored = store.count_records()?;
    let mut batch: Vec<Record> = Vec::new();

    for candidate in candidates {
        if stored + batch.len() as u64 >= quota {
            debug!("Quota boundary reached mid-page, truncating batch");
            break;
        }

        let record = match candidate_to_record(candidate) {
            Some(record) => record,
            None => {
                debug!("Skipping malformed candidate: {:?}", candidate);
                continue;
            }
        };

        if memory.has_visited(&record.url) {
            continue;
        }
        memory.mark_visited(&record.url);

        if store.record_exists(&record.id)? {
            continue;
        }

        batch.push(record);
    }

    if batch.is_empty() {
        return Ok(0);
    }
    store.insert_records(&batch)
}
