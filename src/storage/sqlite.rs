//! SQLite storage implementation

use crate::storage::schema::ALL_SCHEMA_STATEMENTS;
use crate::storage::traits::{RecordStore, StorageError, StorageResult};
use crate::storage::{Record, SessionRow, SessionStatus};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::debug;

/// SQLite-backed record store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new store backed by a database file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened and initialized
    /// * `Err(StorageError)` - Failed to open or initialize
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Creates a new in-memory store
    ///
    /// Contents are lost when the store is dropped.
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        // WAL keeps readers (stats, export) unblocked during session writes
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        for statement in ALL_SCHEMA_STATEMENTS {
            conn.execute(statement, [])?;
        }

        debug!("Storage schema initialized");
        Ok(Self { conn })
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<Record> {
        Ok(Record {
            id: row.get(0)?,
            name: row.get(1)?,
            url: row.get(2)?,
            title: row.get(3)?,
            company: row.get(4)?,
            location: row.get(5)?,
            connection_degree: row.get(6)?,
            collected_at: row.get(7)?,
        })
    }
}

impl RecordStore for SqliteStore {
    fn insert_records(&mut self, records: &[Record]) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;

        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR IGNORE INTO records
                 (id, name, url, title, company, location, connection_degree, collected_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;

            for record in records {
                inserted += stmt.execute(params![
                    record.id,
                    record.name,
                    record.url,
                    record.title,
                    record.company,
                    record.location,
                    record.connection_degree,
                    record.collected_at,
                ])?;
            }
        }

        tx.commit()?;
        debug!(
            attempted = records.len(),
            inserted, "Persisted record batch"
        );
        Ok(inserted)
    }

    fn record_exists(&self, id: &str) -> StorageResult<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM records WHERE id = ?1)",
            params![id],
            |row| row.get::<_, bool>(0),
        )?;
        Ok(exists)
    }

    fn count_records(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn list_records(&self) -> StorageResult<Vec<Record>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, url, title, company, location, connection_degree, collected_at
             FROM records ORDER BY collected_at, id",
        )?;

        let records = stmt
            .query_map([], Self::row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn create_session(
        &mut self,
        keyword: &str,
        location: &str,
        config_hash: &str,
    ) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO sessions (keyword, location, started_at, status, config_hash)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                keyword,
                location,
                Utc::now().to_rfc3339(),
                SessionStatus::Running.to_db_string(),
                config_hash,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_session(
        &mut self,
        session_id: i64,
        status: SessionStatus,
        records_collected: u64,
    ) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE sessions
             SET finished_at = ?1, status = ?2, records_collected = ?3
             WHERE id = ?4",
            params![
                Utc::now().to_rfc3339(),
                status.to_db_string(),
                records_collected as i64,
                session_id,
            ],
        )?;
        Ok(())
    }

    fn list_sessions(&self) -> StorageResult<Vec<SessionRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, keyword, location, started_at, finished_at, status,
                    records_collected, config_hash
             FROM sessions ORDER BY id DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            let (id, keyword, location, started_at, finished_at, status, collected, hash) = row?;
            let status = SessionStatus::from_db_string(&status).ok_or_else(|| {
                StorageError::CorruptRow(format!("unknown session status '{}'", status))
            })?;
            sessions.push(SessionRow {
                id,
                keyword,
                location,
                started_at,
                finished_at,
                status,
                records_collected: collected as u64,
                config_hash: hash,
            });
        }
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(id: &str) -> Record {
        Record {
            id: id.to_string(),
            name: format!("Name {}", id),
            url: format!("https://results.example/profiles/{}", id),
            title: Some("Engineer".to_string()),
            company: Some("Acme".to_string()),
            location: Some("Oslo".to_string()),
            connection_degree: Some("2nd".to_string()),
            collected_at: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_insert_and_count() {
        let mut store = SqliteStore::new_in_memory().unwrap();

        let inserted = store
            .insert_records(&[sample_record("a"), sample_record("b")])
            .unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(store.count_records().unwrap(), 2);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut store = SqliteStore::new_in_memory().unwrap();

        assert_eq!(store.insert_records(&[sample_record("a")]).unwrap(), 1);
        assert_eq!(store.insert_records(&[sample_record("a")]).unwrap(), 0);
        assert_eq!(store.count_records().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_within_batch_counted_once() {
        let mut store = SqliteStore::new_in_memory().unwrap();

        let inserted = store
            .insert_records(&[sample_record("a"), sample_record("a"), sample_record("b")])
            .unwrap();
        assert_eq!(inserted, 2);
    }

    #[test]
    fn test_record_exists() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        assert!(!store.record_exists("a").unwrap());

        store.insert_records(&[sample_record("a")]).unwrap();
        assert!(store.record_exists("a").unwrap());
    }

    #[test]
    fn test_list_records_preserves_fields() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let record = sample_record("a");
        store.insert_records(std::slice::from_ref(&record)).unwrap();

        let listed = store.list_records().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], record);
    }

    #[test]
    fn test_session_lifecycle() {
        let mut store = SqliteStore::new_in_memory().unwrap();

        let id = store.create_session("Engineer", "Oslo", "deadbeef").unwrap();
        let sessions = store.list_sessions().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].status, SessionStatus::Running);
        assert!(sessions[0].finished_at.is_none());

        store
            .finish_session(id, SessionStatus::Completed, 42)
            .unwrap();
        let sessions = store.list_sessions().unwrap();
        assert_eq!(sessions[0].status, SessionStatus::Completed);
        assert_eq!(sessions[0].records_collected, 42);
        assert!(sessions[0].finished_at.is_some());
    }

    #[test]
    fn test_sessions_most_recent_first() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store.create_session("A", "X", "h").unwrap();
        store.create_session("B", "Y", "h").unwrap();

        let sessions = store.list_sessions().unwrap();
        assert_eq!(sessions[0].keyword, "B");
        assert_eq!(sessions[1].keyword, "A");
    }
}
