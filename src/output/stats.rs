//! Statistics generation from the harvest database
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics from the storage layer.

use crate::storage::{RecordStore, SessionRow, SessionStatus, StorageResult};
use std::collections::HashMap;

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    /// Total number of records collected
    pub total_records: u64,

    /// Count of sessions by terminal status
    pub sessions_by_status: HashMap<&'static str, u64>,

    /// All recorded sessions, most recent first
    pub sessions: Vec<SessionRow>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The storage backend to query
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics<S: RecordStore>(store: &S) -> StorageResult<HarvestStatistics> {
    let total_records = store.count_records()?;
    let sessions = store.list_sessions()?;

    let mut sessions_by_status: HashMap<&'static str, u64> = HashMap::new();
    for session in &sessions {
        *sessions_by_status
            .entry(session.status.to_db_string())
            .or_insert(0) += 1;
    }

    Ok(HarvestStatistics {
        total_records,
        sessions_by_status,
        sessions,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Total records collected: {}", stats.total_records);
    println!("  Sessions recorded: {}", stats.sessions.len());
    println!();

    if !stats.sessions_by_status.is_empty() {
        println!("Sessions by Status:");
        let mut status_counts: Vec<_> = stats.sessions_by_status.iter().collect();
        status_counts.sort_by(|a, b| b.1.cmp(a.1));

        for (status, count) in status_counts {
            println!("  {}: {}", status, count);
        }
        println!();
    }

    if !stats.sessions.is_empty() {
        println!("Recent Sessions:");
        for session in stats.sessions.iter().take(10) {
            println!(
                "  #{} \"{}\" in \"{}\" - {} ({} records, started {})",
                session.id,
                session.keyword,
                session.location,
                session.status.to_db_string(),
                session.records_collected,
                session.started_at,
            );
        }
        println!();
    }

    let completed = stats
        .sessions_by_status
        .get(SessionStatus::Completed.to_db_string())
        .copied()
        .unwrap_or(0);
    let total_sessions = stats.sessions.len() as u64;
    let completion_rate = if total_sessions > 0 {
        (completed as f64 / total_sessions as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Completion Rate: {:.1}% ({} / {} sessions completed)",
        completion_rate, completed, total_sessions
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStore;

    #[test]
    fn test_statistics_from_empty_store() {
        let store = SqliteStore::new_in_memory().unwrap();
        let stats = load_statistics(&store).unwrap();

        assert_eq!(stats.total_records, 0);
        assert!(stats.sessions.is_empty());
        assert!(stats.sessions_by_status.is_empty());
    }

    #[test]
    fn test_statistics_count_sessions_by_status() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let a = store.create_session("Engineer", "Oslo", "h").unwrap();
        let b = store.create_session("Engineer", "Bergen", "h").unwrap();
        store.finish_session(a, SessionStatus::Completed, 5).unwrap();
        store.finish_session(b, SessionStatus::Stalled, 2).unwrap();

        let stats = load_statistics(&store).unwrap();
        assert_eq!(stats.sessions.len(), 2);
        assert_eq!(stats.sessions_by_status.get("completed"), Some(&1));
        assert_eq!(stats.sessions_by_status.get("stalled"), Some(&1));
    }
}
