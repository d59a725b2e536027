use crate::storage::{Record, SessionRow, SessionStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Corrupt row: {0}")]
    CorruptRow(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait defining the storage interface for collected records
///
/// Implementations must guarantee that `insert_records` is idempotent:
/// re-inserting a record whose `id` already exists is a no-op and does not
/// count toward the returned insert total.
pub trait RecordStore {
    /// Inserts a batch of records, ignoring ids that already exist
    ///
    /// # Arguments
    ///
    /// * `records` - Records to persist
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of rows actually inserted (duplicates excluded)
    fn insert_records(&mut self, records: &[Record]) -> StorageResult<usize>;

    /// Checks whether a record with the given id exists
    fn record_exists(&self, id: &str) -> StorageResult<bool>;

    /// Counts all stored records
    fn count_records(&self) -> StorageResult<u64>;

    /// Returns all stored records ordered by collection time
    fn list_records(&self) -> StorageResult<Vec<Record>>;

    /// Opens a new session row in `running` state
    ///
    /// # Returns
    ///
    /// * `Ok(i64)` - Rowid of the new session
    fn create_session(&mut self, keyword: &str, location: &str, config_hash: &str)
        -> StorageResult<i64>;

    /// Finalizes a session row with its terminal status and record count
    fn finish_session(
        &mut self,
        session_id: i64,
        status: SessionStatus,
        records_collected: u64,
    ) -> StorageResult<()>;

    /// Returns all session rows, most recent first
    fn list_sessions(&self) -> StorageResult<Vec<SessionRow>>;
}
