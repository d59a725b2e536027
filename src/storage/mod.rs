//! Storage module for persisting collected records
//!
//! This module handles all database operations for the harvester, including:
//! - SQLite database initialization and schema management
//! - Idempotent, deduplicated record persistence
//! - Session bookkeeping for reporting and traceability

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{RecordStore, StorageError, StorageResult};

use crate::TrawlError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Initializes or opens a record store
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully initialized storage
/// * `Err(TrawlError)` - Failed to initialize storage
pub fn open_store(path: &Path) -> Result<SqliteStore, TrawlError> {
    Ok(SqliteStore::new(path)?)
}

/// A collected record
///
/// Identity key is `id`; the store guarantees at most one row per `id`
/// (insert-or-ignore), and the export merge guarantees at most one entry
/// per `url`. Records are created on extraction and never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier derived from the source URL
    pub id: String,

    /// Display name
    pub name: String,

    /// Source URL
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_degree: Option<String>,

    /// RFC 3339 timestamp of collection
    pub collected_at: String,
}

/// A session row from the bookkeeping table
#[derive(Debug, Clone)]
pub struct SessionRow {
    pub id: i64,
    pub keyword: String,
    pub location: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: SessionStatus,
    pub records_collected: u64,
    pub config_hash: String,
}

/// Terminal status of a crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Completed,
    Stalled,
    Failed,
    Cancelled,
}

impl SessionStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Stalled => "stalled",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "stalled" => Some(Self::Stalled),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_status_roundtrip() {
        for status in &[
            SessionStatus::Running,
            SessionStatus::Completed,
            SessionStatus::Stalled,
            SessionStatus::Failed,
            SessionStatus::Cancelled,
        ] {
            let db_str = status.to_db_string();
            let parsed = SessionStatus::from_db_string(db_str);
            assert_eq!(Some(*status), parsed);
        }
    }

    #[test]
    fn test_session_status_invalid() {
        assert_eq!(SessionStatus::from_db_string("invalid"), None);
    }

    #[test]
    fn test_record_serializes_without_empty_fields() {
        let record = Record {
            id: "jane-doe".to_string(),
            name: "Jane Doe".to_string(),
            url: "https://results.example/profiles/jane-doe".to_string(),
            title: None,
            company: None,
            location: None,
            connection_degree: None,
            collected_at: "2024-01-01T00:00:00Z".to_string(),
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("title"));
        assert!(!json.contains("company"));
    }
}
