//! Database schema definitions

/// SQL statement to create the records table
pub const CREATE_RECORDS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    url TEXT NOT NULL,
    title TEXT,
    company TEXT,
    location TEXT,
    connection_degree TEXT,
    collected_at TEXT NOT NULL
)
"#;

/// SQL statement to create the sessions table
pub const CREATE_SESSIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    keyword TEXT NOT NULL,
    location TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    status TEXT NOT NULL,
    records_collected INTEGER NOT NULL DEFAULT 0,
    config_hash TEXT NOT NULL
)
"#;

/// SQL statement to create an index on record URLs
pub const CREATE_RECORDS_URL_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_records_url ON records(url)
"#;

/// SQL statement to create an index on session status
pub const CREATE_SESSIONS_STATUS_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_sessions_status ON sessions(status)
"#;

/// All schema statements in creation order
pub const ALL_SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_RECORDS_TABLE,
    CREATE_SESSIONS_TABLE,
    CREATE_RECORDS_URL_INDEX,
    CREATE_SESSIONS_STATUS_INDEX,
];
